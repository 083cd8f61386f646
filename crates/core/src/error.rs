use thiserror::Error;

/// Failure to turn scraped text into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid category (expected \"group:subgroup\"): {0}")]
    InvalidCategory(String),
    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),
}
