//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `RepositoryError`.

use contactstore_core::storage::RepositoryError;
use rusqlite::ffi;

/// Maps a rusqlite error to a RepositoryError.
///
/// # Error Mapping
///
/// - UNIQUE / PRIMARY KEY violation → `AlreadyExists`
/// - NOT NULL / CHECK / FOREIGN KEY violation → `InvalidData`
/// - No rows → `NotFound`
/// - Column decode failure → `Serialization`
/// - Cannot open / busy / locked → `ConnectionFailed`
/// - Anything else → `QueryFailed`
fn map_rusqlite_error(
    err: &rusqlite::Error,
    entity_type: &'static str,
    id: Option<&str>,
) -> RepositoryError {
    let id = || id.unwrap_or("unknown").to_string();

    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _) => match sqlite_err.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                RepositoryError::AlreadyExists {
                    entity_type,
                    id: id(),
                }
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL
            | ffi::SQLITE_CONSTRAINT_CHECK
            | ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::InvalidData(format!(
                "Constraint violation for {entity_type}: {err}"
            )),
            _ => match sqlite_err.code {
                rusqlite::ErrorCode::CannotOpen
                | rusqlite::ErrorCode::DatabaseBusy
                | rusqlite::ErrorCode::DatabaseLocked => {
                    RepositoryError::ConnectionFailed(err.to_string())
                }
                _ => RepositoryError::QueryFailed(err.to_string()),
            },
        },

        rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
            entity_type,
            id: id(),
        },

        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            RepositoryError::Serialization(format!("Failed to decode {entity_type} row: {err}"))
        }

        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

fn map_tokio_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
    id: Option<&str>,
) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(rusqlite_err, entity_type, id)
        }
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => {
            RepositoryError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// This is the main entry point for error mapping in async code.
pub fn map_tokio_rusqlite_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
) -> RepositoryError {
    map_tokio_error(err, entity_type, None)
}

/// Maps a tokio_rusqlite error with a known ID to a RepositoryError.
pub fn map_tokio_rusqlite_error_with_id(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    let id = id.into();
    map_tokio_error(err, entity_type, Some(&id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(extended_code: std::os::raw::c_int) -> tokio_rusqlite::Error {
        let sqlite_err = ffi::Error {
            code: rusqlite::ErrorCode::ConstraintViolation,
            extended_code,
        };
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(sqlite_err, None))
    }

    #[test]
    fn test_primary_key_maps_to_already_exists_with_id() {
        let result = map_tokio_rusqlite_error_with_id(
            constraint(ffi::SQLITE_CONSTRAINT_PRIMARYKEY),
            "TagAssignment",
            "c-1:t-1",
        );

        assert_eq!(
            result,
            RepositoryError::AlreadyExists {
                entity_type: "TagAssignment",
                id: "c-1:t-1".to_string(),
            }
        );
    }

    #[test]
    fn test_unique_without_id_uses_placeholder() {
        let result = map_tokio_rusqlite_error(constraint(ffi::SQLITE_CONSTRAINT_UNIQUE), "Contact");

        assert_eq!(
            result,
            RepositoryError::AlreadyExists {
                entity_type: "Contact",
                id: "unknown".to_string(),
            }
        );
    }

    #[test]
    fn test_not_null_maps_to_invalid_data() {
        let result =
            map_tokio_rusqlite_error(constraint(ffi::SQLITE_CONSTRAINT_NOTNULL), "PhoneNumber");

        assert!(matches!(result, RepositoryError::InvalidData(_)));
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows);

        let result = map_tokio_rusqlite_error_with_id(err, "Email", "abc-123");

        assert_eq!(result, RepositoryError::not_found("Email", "abc-123"));
    }

    #[test]
    fn test_busy_maps_to_connection_failed() {
        let sqlite_err = ffi::Error {
            code: rusqlite::ErrorCode::DatabaseBusy,
            extended_code: ffi::SQLITE_BUSY,
        };
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(sqlite_err, None));

        let result = map_tokio_rusqlite_error(err, "Contact");

        assert!(matches!(result, RepositoryError::ConnectionFailed(_)));
    }

    #[test]
    fn test_connection_closed_maps_to_connection_failed() {
        let result = map_tokio_rusqlite_error(tokio_rusqlite::Error::ConnectionClosed, "Contact");

        assert!(matches!(result, RepositoryError::ConnectionFailed(_)));
    }

    #[test]
    fn test_other_error_maps_to_query_failed() {
        let err = tokio_rusqlite::Error::Other(Box::new(std::io::Error::other("test error")));

        let result = map_tokio_rusqlite_error(err, "Contact");

        assert!(matches!(result, RepositoryError::QueryFailed(_)));
    }
}
