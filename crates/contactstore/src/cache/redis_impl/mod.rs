//! Redis cache backend implementation.
//!
//! Shares cached aggregates between instances through a Redis server.

mod cache;
mod error;

pub use cache::RedisCache;
