//! Typed filters for contact list queries.
//!
//! The set of filterable fields is closed. Callers that receive filters as
//! string-keyed JSON (the queue RPC boundary) go through
//! [`ContactFilters::from_fields`], which rejects unknown field names instead
//! of silently ignoring them.

use std::str::FromStr;

use serde_json::Value;
use uuid::Uuid;

use super::{Contact, FieldError};

/// Contact root columns that can be used to filter list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactField {
    CustomerId,
    Deleted,
    FirstName,
    LastName,
    DisplayName,
    Company,
    JobTitle,
    Source,
    ExternalId,
}

impl ContactField {
    /// Returns the wire name of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactField::CustomerId => "customer_id",
            ContactField::Deleted => "deleted",
            ContactField::FirstName => "first_name",
            ContactField::LastName => "last_name",
            ContactField::DisplayName => "display_name",
            ContactField::Company => "company",
            ContactField::JobTitle => "job_title",
            ContactField::Source => "source",
            ContactField::ExternalId => "external_id",
        }
    }
}

impl FromStr for ContactField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer_id" => Ok(ContactField::CustomerId),
            "deleted" => Ok(ContactField::Deleted),
            "first_name" => Ok(ContactField::FirstName),
            "last_name" => Ok(ContactField::LastName),
            "display_name" => Ok(ContactField::DisplayName),
            "company" => Ok(ContactField::Company),
            "job_title" => Ok(ContactField::JobTitle),
            "source" => Ok(ContactField::Source),
            "external_id" => Ok(ContactField::ExternalId),
            other => Err(FieldError::UnknownField(other.to_string())),
        }
    }
}

/// A single typed predicate over the contact root row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactFilter {
    CustomerId(Uuid),
    /// `false` keeps live contacts only, `true` keeps soft-deleted ones only.
    Deleted(bool),
    FirstName(String),
    LastName(String),
    DisplayName(String),
    Company(String),
    JobTitle(String),
    Source(String),
    ExternalId(String),
}

impl ContactFilter {
    pub fn field(&self) -> ContactField {
        match self {
            ContactFilter::CustomerId(_) => ContactField::CustomerId,
            ContactFilter::Deleted(_) => ContactField::Deleted,
            ContactFilter::FirstName(_) => ContactField::FirstName,
            ContactFilter::LastName(_) => ContactField::LastName,
            ContactFilter::DisplayName(_) => ContactField::DisplayName,
            ContactFilter::Company(_) => ContactField::Company,
            ContactFilter::JobTitle(_) => ContactField::JobTitle,
            ContactFilter::Source(_) => ContactField::Source,
            ContactFilter::ExternalId(_) => ContactField::ExternalId,
        }
    }

    /// Parses a typed filter from a wire field name and JSON value.
    ///
    /// Booleans are also accepted as the strings `"true"`/`"false"`, since
    /// query-string callers cannot send typed values.
    pub fn parse(name: &str, value: &Value) -> Result<Self, FieldError> {
        let field = ContactField::from_str(name)?;

        let filter = match field {
            ContactField::CustomerId => {
                let id = value
                    .as_str()
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or(FieldError::InvalidValue {
                        field: "customer_id",
                        expected: "a UUID string",
                    })?;
                ContactFilter::CustomerId(id)
            }
            ContactField::Deleted => {
                let deleted = match value {
                    Value::Bool(b) => Some(*b),
                    Value::String(s) => s.parse::<bool>().ok(),
                    _ => None,
                }
                .ok_or(FieldError::InvalidValue {
                    field: "deleted",
                    expected: "a boolean",
                })?;
                ContactFilter::Deleted(deleted)
            }
            ContactField::FirstName => ContactFilter::FirstName(expect_string(field, value)?),
            ContactField::LastName => ContactFilter::LastName(expect_string(field, value)?),
            ContactField::DisplayName => ContactFilter::DisplayName(expect_string(field, value)?),
            ContactField::Company => ContactFilter::Company(expect_string(field, value)?),
            ContactField::JobTitle => ContactFilter::JobTitle(expect_string(field, value)?),
            ContactField::Source => ContactFilter::Source(expect_string(field, value)?),
            ContactField::ExternalId => ContactFilter::ExternalId(expect_string(field, value)?),
        };

        Ok(filter)
    }

    /// Evaluates this predicate against a contact root.
    pub fn matches(&self, contact: &Contact) -> bool {
        match self {
            ContactFilter::CustomerId(id) => contact.customer_id == *id,
            ContactFilter::Deleted(deleted) => contact.is_deleted() == *deleted,
            ContactFilter::FirstName(v) => contact.first_name == *v,
            ContactFilter::LastName(v) => contact.last_name == *v,
            ContactFilter::DisplayName(v) => contact.display_name == *v,
            ContactFilter::Company(v) => contact.company == *v,
            ContactFilter::JobTitle(v) => contact.job_title == *v,
            ContactFilter::Source(v) => contact.source == *v,
            ContactFilter::ExternalId(v) => contact.external_id == *v,
        }
    }
}

fn expect_string(field: ContactField, value: &Value) -> Result<String, FieldError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(FieldError::InvalidValue {
            field: field.as_str(),
            expected: "a string",
        })
}

/// A conjunction of contact filters, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilters {
    filters: Vec<ContactFilter>,
}

impl ContactFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses string-keyed filters, rejecting unknown names and bad values.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut filters = Self::new();
        for (name, value) in fields {
            filters = filters.with(ContactFilter::parse(name, value)?);
        }
        Ok(filters)
    }

    /// Adds a filter, replacing any existing filter on the same field.
    pub fn with(mut self, filter: ContactFilter) -> Self {
        self.filters.retain(|f| f.field() != filter.field());
        self.filters.push(filter);
        self.filters.sort_by_key(|f| f.field());
        self
    }

    pub fn customer(self, customer_id: Uuid) -> Self {
        self.with(ContactFilter::CustomerId(customer_id))
    }

    pub fn deleted(self, deleted: bool) -> Self {
        self.with(ContactFilter::Deleted(deleted))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContactFilter> {
        self.filters.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns true if the contact satisfies every filter.
    pub fn matches(&self, contact: &Contact) -> bool {
        self.filters.iter().all(|f| f.matches(contact))
    }
}
