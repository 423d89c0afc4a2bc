use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// CSS selectors for every element the login flow touches.
///
/// Defaults match the legacy ASP.NET portal. Any subset can be overridden from
/// configuration when the markup changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalLocators {
    pub username_field: String,
    pub next_button: String,
    /// Shown by the portal when the registration number is unknown
    pub warning_label: String,
    pub password_field: String,
    pub submit_button: String,
    pub student_main_link: String,
    pub student_name_label: String,
    pub total_percentage_label: String,
}

impl Default for PortalLocators {
    fn default() -> Self {
        Self {
            username_field: "#txtUserName".to_string(),
            next_button: "#btnNext".to_string(),
            warning_label: "#lblWarning".to_string(),
            password_field: "#txtPassword".to_string(),
            submit_button: "#btnSubmit".to_string(),
            student_main_link: "#ctl00_cpStud_lnkStudentMain".to_string(),
            student_name_label: "#ctl00_cpHeader_ucStud_lblStudentName".to_string(),
            total_percentage_label: "#ctl00_cpStud_lblTotalPercentage".to_string(),
        }
    }
}

impl PortalLocators {
    /// Logical step name paired with its selector.
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("username_field", &self.username_field),
            ("next_button", &self.next_button),
            ("warning_label", &self.warning_label),
            ("password_field", &self.password_field),
            ("submit_button", &self.submit_button),
            ("student_main_link", &self.student_main_link),
            ("student_name_label", &self.student_name_label),
            ("total_percentage_label", &self.total_percentage_label),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self
            .entries()
            .into_iter()
            .find(|(_, selector)| selector.trim().is_empty())
        {
            Some((name, _)) => Err(ConfigError::EmptyLocator(name)),
            None => Ok(()),
        }
    }
}
