use std::time::Duration;

use async_trait::async_trait;

use super::Result;

/// Byte-oriented key-value cache with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache with an optional TTL, overwriting any previous value.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes a value from the cache by key. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
