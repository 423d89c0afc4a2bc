use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Credential must not be empty")]
    EmptyCredential,
}
