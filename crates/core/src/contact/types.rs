use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contact aggregate: the root record plus its owned child collections.
///
/// The child collections are always derived from the relational rows. They
/// are populated by the assembler and never persisted through the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub company: String,
    pub job_title: String,
    /// Where the contact came from (e.g. "manual", "import", "crm").
    pub source: String,
    pub external_id: String,
    pub notes: String,

    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub emails: Vec<Email>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,

    pub tm_create: Option<DateTime<Utc>>,
    pub tm_update: Option<DateTime<Utc>>,
    pub tm_delete: Option<DateTime<Utc>>,
}

impl Contact {
    /// Creates a new contact for the given customer with a random ID.
    pub fn new(
        customer_id: Uuid,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let first_name = first_name.into();
        let last_name = last_name.into();
        let display_name = format!("{first_name} {last_name}").trim().to_string();

        Self {
            id: Uuid::new_v4(),
            customer_id,
            first_name,
            last_name,
            display_name,
            company: String::new(),
            job_title: String::new(),
            source: "manual".to_string(),
            external_id: String::new(),
            notes: String::new(),
            phone_numbers: Vec::new(),
            emails: Vec::new(),
            tag_ids: Vec::new(),
            tm_create: None,
            tm_update: None,
            tm_delete: None,
        }
    }

    /// Sets a specific ID for this contact (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_job_title(mut self, job_title: impl Into<String>) -> Self {
        self.job_title = job_title.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = external_id.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Returns true if the contact has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.tm_delete.is_some()
    }

    /// Returns the primary phone number, if one is flagged.
    pub fn primary_phone_number(&self) -> Option<&PhoneNumber> {
        self.phone_numbers.iter().find(|p| p.is_primary)
    }

    /// Returns the primary email, if one is flagged.
    pub fn primary_email(&self) -> Option<&Email> {
        self.emails.iter().find(|e| e.is_primary)
    }

    /// Drops the child collections, leaving only the root row attributes.
    pub fn without_children(mut self) -> Self {
        self.phone_numbers.clear();
        self.emails.clear();
        self.tag_ids.clear();
        self
    }
}

/// A phone number owned by a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub contact_id: Uuid,
    /// The number as the caller entered it.
    pub number: String,
    /// Canonical lookup form: digits with a single leading `+`.
    pub number_e164: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_primary: bool,
    pub tm_create: Option<DateTime<Utc>>,
}

impl PhoneNumber {
    /// Creates a new phone number for the given contact.
    pub fn new(
        contact: &Contact,
        number: impl Into<String>,
        number_e164: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: contact.customer_id,
            contact_id: contact.id,
            number: number.into(),
            number_e164: number_e164.into(),
            kind: kind.into(),
            is_primary: false,
            tm_create: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// An email address owned by a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub contact_id: Uuid,
    pub address: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_primary: bool,
    pub tm_create: Option<DateTime<Utc>>,
}

impl Email {
    /// Creates a new email for the given contact.
    pub fn new(contact: &Contact, address: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: contact.customer_id,
            contact_id: contact.id,
            address: address.into(),
            kind: kind.into(),
            is_primary: false,
            tm_create: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// Association between a contact and a tag. The pair is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAssignment {
    pub contact_id: Uuid,
    pub tag_id: Uuid,
    pub tm_create: Option<DateTime<Utc>>,
}

impl TagAssignment {
    pub fn new(contact_id: Uuid, tag_id: Uuid) -> Self {
        Self {
            contact_id,
            tag_id,
            tm_create: None,
        }
    }
}
