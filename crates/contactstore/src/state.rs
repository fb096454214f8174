//! Backend wiring.
//!
//! Builds the cached contact store from [`Config`] for whichever storage and
//! cache backends are compiled in.

use std::sync::Arc;

use crate::config::Config;
use crate::error::StateError;
use crate::metrics::StoreMetrics;
use crate::storage::CachedContactStore;

// ============================================================================
// Compile-time feature validation
// ============================================================================

// Storage features: exactly one must be enabled, they are mutually exclusive
#[cfg(all(feature = "sqlite", feature = "inmemory"))]
compile_error!("Cannot enable both 'sqlite' and 'inmemory' storage features");

#[cfg(not(any(feature = "inmemory", feature = "sqlite")))]
compile_error!("Must enable exactly one storage feature: 'inmemory' or 'sqlite'");

// Cache features: exactly one must be enabled, they are mutually exclusive
#[cfg(all(feature = "memory", feature = "redis"))]
compile_error!("Cannot enable both 'memory' and 'redis' cache features");

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!("Must enable exactly one cache feature: 'memory' or 'redis'");

#[cfg(feature = "inmemory")]
pub type ActiveStore = crate::storage::InMemoryRepository;

#[cfg(feature = "sqlite")]
pub type ActiveStore = crate::storage::SqliteRepository;

#[cfg(feature = "memory")]
pub type ActiveCache = crate::cache::MemoryCache;

#[cfg(feature = "redis")]
pub type ActiveCache = crate::cache::RedisCache;

/// The coordinator over the compiled-in backends.
pub type ContactService = CachedContactStore<ActiveStore, ActiveCache>;

/// Shared store state.
///
/// Cheap to clone; every clone shares the same backends and counters.
#[derive(Clone)]
pub struct StoreState {
    pub contacts: Arc<ContactService>,
    pub metrics: Arc<StoreMetrics>,
    pub config: Config,
}

impl StoreState {
    /// Connects the configured backends and builds the coordinator.
    pub async fn from_config(config: Config) -> Result<Self, StateError> {
        let store = Arc::new(open_store(&config).await?);
        let cache = Arc::new(open_cache(&config).await?);
        let metrics = Arc::new(StoreMetrics::new());

        let contacts = Arc::new(CachedContactStore::new(
            store,
            cache,
            config.cache_ttl(),
            metrics.clone(),
        ));

        tracing::info!(
            storage = STORAGE_BACKEND,
            cache = CACHE_BACKEND,
            ttl_seconds = config.cache_ttl_seconds,
            "Contact store ready"
        );

        Ok(Self {
            contacts,
            metrics,
            config,
        })
    }
}

#[cfg(feature = "inmemory")]
const STORAGE_BACKEND: &str = "inmemory";

#[cfg(feature = "sqlite")]
const STORAGE_BACKEND: &str = "sqlite";

#[cfg(feature = "memory")]
const CACHE_BACKEND: &str = "memory";

#[cfg(feature = "redis")]
const CACHE_BACKEND: &str = "redis";

#[cfg(feature = "inmemory")]
async fn open_store(_config: &Config) -> Result<ActiveStore, StateError> {
    Ok(crate::storage::InMemoryRepository::new())
}

#[cfg(feature = "sqlite")]
async fn open_store(config: &Config) -> Result<ActiveStore, StateError> {
    Ok(crate::storage::SqliteRepository::new(&config.sqlite_path).await?)
}

#[cfg(feature = "memory")]
async fn open_cache(config: &Config) -> Result<ActiveCache, StateError> {
    Ok(crate::cache::MemoryCache::new(config.cache_max_entries))
}

#[cfg(feature = "redis")]
async fn open_cache(config: &Config) -> Result<ActiveCache, StateError> {
    Ok(crate::cache::RedisCache::new(&config.redis_url).await?)
}
