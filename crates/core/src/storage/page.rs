use chrono::{DateTime, SecondsFormat, Utc};

use super::{RepositoryError, Result};

/// Formats a timestamp the way it is persisted and handed out as a page token.
///
/// Fixed microsecond precision with a `Z` suffix, so the textual form sorts in
/// time order.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp in RFC 3339 form.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InvalidData(format!("invalid timestamp '{s}': {e}")))
}

/// A validated keyset page request.
///
/// Results are ordered by creation time descending and only rows created
/// strictly before `before` are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub size: u64,
    pub before: DateTime<Utc>,
}

impl PageRequest {
    /// Builds a page request from the wire form.
    ///
    /// An empty token means "start from `now`". Tokens must not carry more
    /// than microsecond precision. A zero page size is rejected:
    /// callers pass a sane default rather than relying on an unbounded list.
    pub fn new(size: u64, token: &str, now: DateTime<Utc>) -> Result<Self> {
        if size == 0 {
            return Err(RepositoryError::InvalidData(
                "page size must be greater than zero".to_string(),
            ));
        }

        let before = if token.is_empty() {
            now
        } else {
            let before = parse_timestamp(token)?;
            // Stored timestamps stop at microseconds; finer tokens would
            // compare differently across backends.
            if before.timestamp_subsec_nanos() % 1_000 != 0 {
                return Err(RepositoryError::InvalidData(format!(
                    "page token '{token}' is finer than microsecond precision"
                )));
            }
            before
        };

        Ok(Self { size, before })
    }

    /// The token value as it goes into the `tm_create < ?` predicate.
    pub fn before_token(&self) -> String {
        format_timestamp(&self.before)
    }
}

/// Returns the token for the page after `last_created`, the creation time of
/// the last row of the current page.
pub fn next_page_token(last_created: Option<&DateTime<Utc>>) -> String {
    last_created.map(format_timestamp).unwrap_or_default()
}
