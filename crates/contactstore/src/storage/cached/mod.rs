//! Cache-aside coordination for contact aggregates.
//!
//! - **Reads**: check the cache first, on miss assemble from the store and
//!   populate the cache
//! - **Writes**: persist to the store, re-assemble the owning contact and
//!   overwrite its cache entry
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let repo = Arc::new(SqliteRepository::new("contacts.db").await?);
//! let cache = Arc::new(MemoryCache::new(10_000));
//! let metrics = Arc::new(StoreMetrics::new());
//!
//! let contacts = CachedContactStore::new(repo, cache, Duration::from_secs(86_400), metrics);
//! ```

mod assembler;
mod contact;
#[cfg(test)]
mod testing;

pub use assembler::{
    assemble_contact, attach_children, AssembledContact, ChildCollection, ChildLoadFailure,
};
pub use contact::{CachedContactStore, ContactPage};
