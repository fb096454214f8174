//! Typed partial updates for contacts and their child rows.
//!
//! Each update is an explicit struct of optional fields. The `from_fields`
//! constructors are the string-keyed boundary used by RPC callers; they reject
//! unknown names rather than dropping them.

use serde_json::Value;

use super::FieldError;

/// Partial update of a contact root row.
///
/// An empty update is valid: the store still stamps `tm_update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub external_id: Option<String>,
    pub notes: Option<String>,
}

impl ContactUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn display_name(mut self, value: impl Into<String>) -> Self {
        self.display_name = Some(value.into());
        self
    }

    pub fn company(mut self, value: impl Into<String>) -> Self {
        self.company = Some(value.into());
        self
    }

    pub fn job_title(mut self, value: impl Into<String>) -> Self {
        self.job_title = Some(value.into());
        self
    }

    pub fn external_id(mut self, value: impl Into<String>) -> Self {
        self.external_id = Some(value.into());
        self
    }

    pub fn notes(mut self, value: impl Into<String>) -> Self {
        self.notes = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `(column, value)` pairs for every field that is set.
    pub fn columns(&self) -> Vec<(&'static str, &str)> {
        [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("display_name", &self.display_name),
            ("company", &self.company),
            ("job_title", &self.job_title),
            ("external_id", &self.external_id),
            ("notes", &self.notes),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }

    /// Parses a string-keyed update map.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut update = Self::new();
        for (name, value) in fields {
            match name.as_str() {
                "first_name" => update.first_name = Some(string_field("first_name", value)?),
                "last_name" => update.last_name = Some(string_field("last_name", value)?),
                "display_name" => {
                    update.display_name = Some(string_field("display_name", value)?)
                }
                "company" => update.company = Some(string_field("company", value)?),
                "job_title" => update.job_title = Some(string_field("job_title", value)?),
                "external_id" => update.external_id = Some(string_field("external_id", value)?),
                "notes" => update.notes = Some(string_field("notes", value)?),
                other => return Err(FieldError::UnknownField(other.to_string())),
            }
        }
        Ok(update)
    }
}

/// Partial update of a phone number row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneNumberUpdate {
    pub number: Option<String>,
    pub number_e164: Option<String>,
    pub kind: Option<String>,
    pub is_primary: Option<bool>,
}

impl PhoneNumberUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number(mut self, number: impl Into<String>, number_e164: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self.number_e164 = Some(number_e164.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn is_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = Some(is_primary);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn from_fields<'a, I>(fields: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut update = Self::new();
        for (name, value) in fields {
            match name.as_str() {
                "number" => update.number = Some(string_field("number", value)?),
                "number_e164" => update.number_e164 = Some(string_field("number_e164", value)?),
                "type" => update.kind = Some(string_field("type", value)?),
                "is_primary" => update.is_primary = Some(bool_field("is_primary", value)?),
                other => return Err(FieldError::UnknownField(other.to_string())),
            }
        }
        Ok(update)
    }
}

/// Partial update of an email row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailUpdate {
    pub address: Option<String>,
    pub kind: Option<String>,
    pub is_primary: Option<bool>,
}

impl EmailUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn is_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = Some(is_primary);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn from_fields<'a, I>(fields: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut update = Self::new();
        for (name, value) in fields {
            match name.as_str() {
                "address" => update.address = Some(string_field("address", value)?),
                "type" => update.kind = Some(string_field("type", value)?),
                "is_primary" => update.is_primary = Some(bool_field("is_primary", value)?),
                other => return Err(FieldError::UnknownField(other.to_string())),
            }
        }
        Ok(update)
    }
}

fn string_field(field: &'static str, value: &Value) -> Result<String, FieldError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(FieldError::InvalidValue {
            field,
            expected: "a string",
        })
}

fn bool_field(field: &'static str, value: &Value) -> Result<bool, FieldError> {
    value.as_bool().ok_or(FieldError::InvalidValue {
        field,
        expected: "a boolean",
    })
}
