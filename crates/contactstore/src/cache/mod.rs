//! Cache backend implementations.
//!
//! This module provides concrete implementations of the [`Cache`] trait
//! defined in `contactstore_core::cache`. The implementations are selected
//! at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `memory` (default): In-memory LRU cache with per-entry TTL
//! - `redis`: Redis cache using the redis crate
//!
//! These features are mutually exclusive - only one cache backend can be
//! enabled at a time.
//!
//! [`Cache`]: contactstore_core::cache::Cache

// Compile-time checks for mutual exclusivity
#[cfg(all(feature = "memory", feature = "redis"))]
compile_error!(
    "Features 'memory' and 'redis' are mutually exclusive. \
    Enable only one cache backend at a time."
);

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!(
    "No cache backend selected. Enable 'memory' or 'redis' feature. \
    Example: cargo build -p contactstore --features memory"
);

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

#[cfg(feature = "memory")]
pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
