use std::{env, time::Duration};

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cache TTL in seconds (default: 86,400)
    pub cache_ttl_seconds: u64,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Path to SQLite database file (default: "contacts.db")
    pub sqlite_path: String,
    /// Redis connection URL (default: "redis://localhost:6379")
    pub redis_url: String,
    /// Page size used when a caller does not pick one (default: 100)
    pub default_page_size: u64,
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 86,400)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `SQLITE_PATH` - SQLite database path (default: "contacts.db")
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `DEFAULT_PAGE_SIZE` - Listing page size (default: 100)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            cache_ttl_seconds: parsed("CACHE_TTL_SECONDS", 86_400),
            cache_max_entries: parsed("CACHE_MAX_ENTRIES", 10_000),
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "contacts.db".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            default_page_size: parsed::<u64>("DEFAULT_PAGE_SIZE", 100).max(1),
        }
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Resolves a caller-supplied page size, where 0 means "use the default".
    pub fn page_size(&self, requested: u64) -> u64 {
        if requested == 0 {
            self.default_page_size
        } else {
            requested
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
