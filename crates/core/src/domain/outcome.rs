use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Human-readable description of one automation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProgressEvent {
    pub message: String,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ProgressEvent {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ProgressEvent {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Terminal result of one scrape attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScrapeOutcome {
    /// Values read from the student area after a successful login.
    Success {
        student_name: String,
        total_percentage: String,
    },
    /// The portal refused the credential before authentication completed.
    Rejected { reason: String },
    /// Timeout, missing element, engine crash or transport failure.
    Faulted { message: String },
}

impl ScrapeOutcome {
    pub fn success(student_name: impl Into<String>, total_percentage: impl Into<String>) -> Self {
        Self::Success {
            student_name: student_name.into(),
            total_percentage: total_percentage.into(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Rejected { .. } => "rejected",
            Self::Faulted { .. } => "faulted",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
