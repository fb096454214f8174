//! In-memory storage backend.
//!
//! Implements every repository trait over vectors and maps wrapped in
//! `Arc<RwLock<_>>`. Nothing is persisted. The coordinator tests run against
//! this backend regardless of the selected storage feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use contactstore::storage::inmemory::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! ```

mod repository;

pub use repository::InMemoryRepository;
