//! Cache-consistent persistence for contact aggregates.
//!
//! A contact and its phone numbers, emails and tag links live in a relational
//! store. [`CachedContactStore`] serves whole aggregates from a key-value
//! cache and re-materializes the cached copy after every successful write.
//!
//! Backends are picked with cargo features:
//!
//! | Concern | Features (pick one each) |
//! |---------|--------------------------|
//! | Storage | `inmemory` (default), `sqlite` |
//! | Cache   | `memory` (default), `redis` |
//!
//! ```ignore
//! use contactstore::{telemetry, Config, StoreState};
//!
//! telemetry::init();
//! let state = StoreState::from_config(Config::from_env()).await?;
//! let contact = state.contacts.get_contact(id).await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod state;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use error::StateError;
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use state::{ContactService, StoreState};
pub use storage::{CachedContactStore, ContactPage};
