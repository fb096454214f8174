//! Pure functions for serializing/deserializing contact aggregates to/from cache bytes.
//!
//! The cached value is the full aggregate as JSON, children included.

use crate::contact::Contact;
use thiserror::Error;

use super::CacheError;

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Failed to serialize a value to bytes.
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    /// Failed to deserialize bytes to a value.
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

impl From<SerializationError> for CacheError {
    fn from(err: SerializationError) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serializes a contact aggregate to JSON bytes.
pub fn serialize_contact(contact: &Contact) -> Result<Vec<u8>> {
    serde_json::to_vec(contact).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes to a contact aggregate.
pub fn deserialize_contact(bytes: &[u8]) -> Result<Contact> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}
