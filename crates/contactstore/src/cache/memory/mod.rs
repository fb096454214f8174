//! In-memory cache backend implementation.
//!
//! A bounded LRU map with per-entry TTL for single-instance deployments.

mod cache;

pub use cache::MemoryCache;
