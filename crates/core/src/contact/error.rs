use thiserror::Error;

use crate::storage::RepositoryError;

/// Errors raised while validating string-keyed filter and update fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Invalid value for field '{field}': expected {expected}")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
    },
}

impl From<FieldError> for RepositoryError {
    fn from(err: FieldError) -> Self {
        RepositoryError::InvalidFilter(err.to_string())
    }
}
