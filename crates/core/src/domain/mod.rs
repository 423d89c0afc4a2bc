pub mod credential;
pub mod outcome;
