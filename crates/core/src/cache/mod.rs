mod error;
mod keys;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::contact_key;
pub use serialization::{deserialize_contact, serialize_contact, SerializationError};
pub use traits::Cache;
