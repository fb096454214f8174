//! Pure builders for dynamic contact statements.
//!
//! Only column names from the closed filter/update sets are ever interpolated
//! into SQL. Values always travel as bound parameters.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use uuid::Uuid;

use contactstore_core::contact::{ContactFilter, ContactFilters, ContactUpdate};
use contactstore_core::storage::{format_timestamp, PageRequest};

use super::schema::CONTACT_COLUMNS;

/// A SQL statement paired with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Translates one typed filter into a predicate, pushing its parameter if any.
fn filter_predicate(filter: &ContactFilter, params: &mut Vec<Value>) -> String {
    let (column, value) = match filter {
        ContactFilter::Deleted(false) => return "tm_delete IS NULL".to_string(),
        ContactFilter::Deleted(true) => return "tm_delete IS NOT NULL".to_string(),
        ContactFilter::CustomerId(id) => ("customer_id", id.to_string()),
        ContactFilter::FirstName(v) => ("first_name", v.clone()),
        ContactFilter::LastName(v) => ("last_name", v.clone()),
        ContactFilter::DisplayName(v) => ("display_name", v.clone()),
        ContactFilter::Company(v) => ("company", v.clone()),
        ContactFilter::JobTitle(v) => ("job_title", v.clone()),
        ContactFilter::Source(v) => ("source", v.clone()),
        ContactFilter::ExternalId(v) => ("external_id", v.clone()),
    };

    params.push(Value::Text(value));
    format!("{column} = ?{}", params.len())
}

/// Builds the keyset-paginated list query.
pub fn list_contacts_statement(page: &PageRequest, filters: &ContactFilters) -> Statement {
    let mut params = vec![Value::Text(page.before_token())];
    let mut predicates = vec!["tm_create < ?1".to_string()];

    for filter in filters.iter() {
        predicates.push(filter_predicate(filter, &mut params));
    }

    let limit = i64::try_from(page.size).unwrap_or(i64::MAX);
    params.push(Value::Integer(limit));

    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contact_contacts WHERE {} ORDER BY tm_create DESC LIMIT ?{}",
        predicates.join(" AND "),
        params.len()
    );

    Statement { sql, params }
}

/// Builds the contact update statement. `tm_update` is always set.
pub fn update_contact_statement(
    id: Uuid,
    update: &ContactUpdate,
    now: &DateTime<Utc>,
) -> Statement {
    let mut params = vec![Value::Text(id.to_string()), Value::Text(format_timestamp(now))];
    let mut assignments = vec!["tm_update = ?2".to_string()];

    for (column, value) in update.columns() {
        params.push(Value::Text(value.to_string()));
        assignments.push(format!("{column} = ?{}", params.len()));
    }

    let sql = format!(
        "UPDATE contact_contacts SET {} WHERE id = ?1",
        assignments.join(", ")
    );

    Statement { sql, params }
}
