use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Portal registration number.
///
/// The legacy portal uses the same string as login identifier and password, so
/// a single value covers both. Construction goes through [`Credential::parse`],
/// which guarantees the value is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Credential(String);

impl Credential {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, CoreError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyCredential);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn username(&self) -> &str {
        &self.0
    }

    /// The portal accepts the registration number as the password as well.
    pub fn password(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Credential {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Credential> for String {
    fn from(value: Credential) -> Self {
        value.0
    }
}
