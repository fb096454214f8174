use thiserror::Error;

use contactstore_core::cache::CacheError;
use contactstore_core::storage::RepositoryError;

/// Errors raised while wiring the store backends together.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("storage backend initialization failed: {0}")]
    Storage(#[from] RepositoryError),
    #[error("cache backend initialization failed: {0}")]
    Cache(#[from] CacheError),
}
