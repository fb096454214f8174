//! SQLite storage backend implementation.
//!
//! Uses `rusqlite` for synchronous operations and `tokio-rusqlite` to run them
//! on a dedicated connection thread.

mod conversions;
mod error;
mod filters;
mod repository;
mod schema;

pub use repository::SqliteRepository;
