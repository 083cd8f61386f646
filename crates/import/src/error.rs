use kakeibo_core::ParseError;
use kakeibo_storage::StorageError;
use thiserror::Error;

use crate::csv::CsvError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Missing debit card details for: {}", .0.join(", "))]
    MissingDebitDetails(Vec<String>),
    #[error("Unrecognised statement table layout: {0:?}")]
    UnknownLayout(Vec<String>),
    #[error("Malformed statement row: {0}")]
    MalformedRow(String),
}
