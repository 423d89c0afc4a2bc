pub mod domain;
pub mod error;

pub use domain::credential::Credential;
pub use domain::outcome::{ProgressEvent, ScrapeOutcome};
pub use error::CoreError;
