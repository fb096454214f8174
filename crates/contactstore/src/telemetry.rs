//! Tracing subscriber setup for processes embedding the store.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "contactstore=info";

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Returns `false` when a global subscriber was already installed, which
/// leaves the existing one in place.
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Same as [`init`], emitting one JSON object per event.
pub fn init_json() -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .is_ok()
}
