//! Storage backend implementations.
//!
//! This module provides concrete implementations of the repository traits
//! defined in `contactstore_core::storage`, plus the cache-aside coordinator
//! that sits on top of them. Backends are selected at compile time via
//! feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): volatile storage over `tokio::sync::RwLock`
//! - `sqlite`: SQLite storage backend using `rusqlite` and `tokio-rusqlite`
//!
//! These features are mutually exclusive - only one storage backend can be
//! enabled at a time.
//!
//! # Examples
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p contactstore --no-default-features --features sqlite,memory
//! ```

// Compile-time checks for mutual exclusivity
#[cfg(all(feature = "inmemory", feature = "sqlite"))]
compile_error!(
    "Features 'inmemory' and 'sqlite' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "sqlite")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'sqlite' feature. \
    Example: cargo build -p contactstore --features sqlite"
);

pub mod cached;

#[cfg(any(feature = "inmemory", test))]
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use cached::{CachedContactStore, ContactPage};

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryRepository;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;
