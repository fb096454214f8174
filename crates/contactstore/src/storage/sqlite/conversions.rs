//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! These are testable in isolation without database access.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use contactstore_core::contact::{Contact, Email, PhoneNumber};
use contactstore_core::storage::format_timestamp;

// ============================================================================
// Contact conversions
// ============================================================================

/// Convert a SQLite row to a contact root (children left empty).
///
/// Expected columns: id, customer_id, first_name, last_name, display_name,
/// company, job_title, source, external_id, notes, tm_create, tm_update, tm_delete
pub fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
    let id: String = row.get(0)?;
    let customer_id: String = row.get(1)?;
    let tm_create: Option<String> = row.get(10)?;
    let tm_update: Option<String> = row.get(11)?;
    let tm_delete: Option<String> = row.get(12)?;

    Ok(Contact {
        id: parse_uuid(0, &id)?,
        customer_id: parse_uuid(1, &customer_id)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        display_name: row.get(4)?,
        company: row.get(5)?,
        job_title: row.get(6)?,
        source: row.get(7)?,
        external_id: row.get(8)?,
        notes: row.get(9)?,
        phone_numbers: Vec::new(),
        emails: Vec::new(),
        tag_ids: Vec::new(),
        tm_create: parse_optional_datetime(10, tm_create)?,
        tm_update: parse_optional_datetime(11, tm_update)?,
        tm_delete: parse_optional_datetime(12, tm_delete)?,
    })
}

// ============================================================================
// Child conversions
// ============================================================================

/// Convert a SQLite row to a PhoneNumber.
///
/// Expected columns: id, customer_id, contact_id, number, number_e164, type, is_primary, tm_create
pub fn row_to_phone_number(row: &Row) -> rusqlite::Result<PhoneNumber> {
    let id: String = row.get(0)?;
    let customer_id: String = row.get(1)?;
    let contact_id: String = row.get(2)?;
    let tm_create: Option<String> = row.get(7)?;

    Ok(PhoneNumber {
        id: parse_uuid(0, &id)?,
        customer_id: parse_uuid(1, &customer_id)?,
        contact_id: parse_uuid(2, &contact_id)?,
        number: row.get(3)?,
        number_e164: row.get(4)?,
        kind: row.get(5)?,
        is_primary: row.get(6)?,
        tm_create: parse_optional_datetime(7, tm_create)?,
    })
}

/// Convert a SQLite row to an Email.
///
/// Expected columns: id, customer_id, contact_id, address, type, is_primary, tm_create
pub fn row_to_email(row: &Row) -> rusqlite::Result<Email> {
    let id: String = row.get(0)?;
    let customer_id: String = row.get(1)?;
    let contact_id: String = row.get(2)?;
    let tm_create: Option<String> = row.get(6)?;

    Ok(Email {
        id: parse_uuid(0, &id)?,
        customer_id: parse_uuid(1, &customer_id)?,
        contact_id: parse_uuid(2, &contact_id)?,
        address: row.get(3)?,
        kind: row.get(4)?,
        is_primary: row.get(5)?,
        tm_create: parse_optional_datetime(6, tm_create)?,
    })
}

/// Convert a single-column row holding a UUID.
pub fn row_to_uuid(row: &Row) -> rusqlite::Result<Uuid> {
    let id: String = row.get(0)?;
    parse_uuid(0, &id)
}

// ============================================================================
// Helper functions
// ============================================================================

/// Parse a UUID from string.
pub fn parse_uuid(column: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a nullable RFC 3339 timestamp column.
fn parse_optional_datetime(
    column: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        column,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
        })
        .transpose()
}

/// Format a DateTime<Utc> for SQLite storage.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    format_timestamp(dt)
}
