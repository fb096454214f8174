//! Pure functions for classifying repository errors.
//!
//! The request-handling layer maps these classes onto its own response codes.
//! Cache failures never reach this taxonomy; they are swallowed where they occur.

use super::RepositoryError;

/// Coarse error classes surfaced to business-logic callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The root or child row does not exist.
    NotFound,
    /// The caller sent something the store refuses: a duplicate key, a
    /// malformed filter, an invalid page token.
    Caller,
    /// The relational backend failed. The request must fail.
    BackendUnavailable,
}

/// Maps a [`RepositoryError`] to its [`ErrorClass`].
///
/// - `NotFound` -> `NotFound`
/// - `AlreadyExists`, `InvalidData`, `InvalidFilter` -> `Caller`
/// - `ConnectionFailed`, `QueryFailed`, `Serialization` -> `BackendUnavailable`
///
/// # Examples
///
/// ```
/// use contactstore_core::storage::{classify_error, ErrorClass, RepositoryError};
///
/// let error = RepositoryError::not_found("Contact", "abc-123");
/// assert_eq!(classify_error(&error), ErrorClass::NotFound);
/// ```
pub fn classify_error(error: &RepositoryError) -> ErrorClass {
    match error {
        RepositoryError::NotFound { .. } => ErrorClass::NotFound,
        RepositoryError::AlreadyExists { .. } => ErrorClass::Caller,
        RepositoryError::InvalidData(_) => ErrorClass::Caller,
        RepositoryError::InvalidFilter(_) => ErrorClass::Caller,
        RepositoryError::ConnectionFailed(_) => ErrorClass::BackendUnavailable,
        RepositoryError::QueryFailed(_) => ErrorClass::BackendUnavailable,
        RepositoryError::Serialization(_) => ErrorClass::BackendUnavailable,
    }
}
