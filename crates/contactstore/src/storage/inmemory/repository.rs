//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use contactstore_core::clock::{Clock, SystemClock};
use contactstore_core::contact::{
    Contact, ContactFilters, ContactUpdate, Email, EmailUpdate, PhoneNumber, PhoneNumberUpdate,
    TagAssignment,
};
use contactstore_core::storage::{
    ContactRepository, EmailRepository, PageRequest, PhoneNumberRepository, RepositoryError,
    Result, TagAssignmentRepository,
};

/// In-memory storage backend for testing.
///
/// Child rows live in insertion-ordered vectors so that ties on `tm_create`
/// resolve the same way on every read.
#[derive(Clone)]
pub struct InMemoryRepository {
    contacts: Arc<RwLock<HashMap<Uuid, Contact>>>,
    phone_numbers: Arc<RwLock<Vec<PhoneNumber>>>,
    emails: Arc<RwLock<Vec<Email>>>,
    tags: Arc<RwLock<Vec<TagAssignment>>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository stamping wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a new empty in-memory repository stamping time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            contacts: Arc::new(RwLock::new(HashMap::new())),
            phone_numbers: Arc::new(RwLock::new(Vec::new())),
            emails: Arc::new(RwLock::new(Vec::new())),
            tags: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }
}

// ============================================================================
// ContactRepository implementation
// ============================================================================

#[async_trait]
impl ContactRepository for InMemoryRepository {
    async fn create_contact(&self, contact: &Contact) -> Result<()> {
        let mut contacts = self.contacts.write().await;
        if contacts.contains_key(&contact.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Contact",
                id: contact.id.to_string(),
            });
        }

        let mut row = contact.clone().without_children();
        row.tm_create = Some(self.clock.now());
        row.tm_update = None;
        row.tm_delete = None;
        contacts.insert(row.id, row);
        Ok(())
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact> {
        let contacts = self.contacts.read().await;
        contacts
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("Contact", id))
    }

    async fn list_contacts(
        &self,
        page: &PageRequest,
        filters: &ContactFilters,
    ) -> Result<Vec<Contact>> {
        let contacts = self.contacts.read().await;

        let mut rows: Vec<Contact> = contacts
            .values()
            .filter(|c| c.tm_create.is_some_and(|t| t < page.before))
            .filter(|c| filters.matches(c))
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.tm_create.cmp(&a.tm_create));
        rows.truncate(usize::try_from(page.size).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn update_contact(&self, id: Uuid, update: &ContactUpdate) -> Result<()> {
        let mut contacts = self.contacts.write().await;
        let contact = contacts
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("Contact", id))?;

        for (column, value) in update.columns() {
            let value = value.to_string();
            match column {
                "first_name" => contact.first_name = value,
                "last_name" => contact.last_name = value,
                "display_name" => contact.display_name = value,
                "company" => contact.company = value,
                "job_title" => contact.job_title = value,
                "external_id" => contact.external_id = value,
                "notes" => contact.notes = value,
                other => {
                    return Err(RepositoryError::InvalidData(format!(
                        "Unknown contact column: {other}"
                    )))
                }
            }
        }
        contact.tm_update = Some(self.clock.now());
        Ok(())
    }

    async fn delete_contact(&self, id: Uuid) -> Result<()> {
        let mut contacts = self.contacts.write().await;
        let contact = contacts
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("Contact", id))?;

        let now = self.clock.now();
        contact.tm_update = Some(now);
        contact.tm_delete = Some(now);
        Ok(())
    }

    async fn delete_contacts_by_customer(&self, customer_id: Uuid) -> Result<u64> {
        let mut contacts = self.contacts.write().await;
        let now = self.clock.now();

        let mut affected = 0;
        for contact in contacts
            .values_mut()
            .filter(|c| c.customer_id == customer_id && c.tm_delete.is_none())
        {
            contact.tm_update = Some(now);
            contact.tm_delete = Some(now);
            affected += 1;
        }
        Ok(affected)
    }

    async fn find_contact_id_by_phone(
        &self,
        customer_id: Uuid,
        number_e164: &str,
    ) -> Result<Uuid> {
        let contacts = self.contacts.read().await;
        let phone_numbers = self.phone_numbers.read().await;

        let mut matches: Vec<&PhoneNumber> = phone_numbers
            .iter()
            .filter(|p| p.customer_id == customer_id && p.number_e164 == number_e164)
            .filter(|p| is_live(&contacts, p.contact_id))
            .collect();
        matches.sort_by(|a, b| a.tm_create.cmp(&b.tm_create));

        matches
            .first()
            .map(|p| p.contact_id)
            .ok_or_else(|| RepositoryError::not_found("Contact", number_e164))
    }

    async fn find_contact_id_by_email(&self, customer_id: Uuid, address: &str) -> Result<Uuid> {
        let contacts = self.contacts.read().await;
        let emails = self.emails.read().await;

        let mut matches: Vec<&Email> = emails
            .iter()
            .filter(|e| e.customer_id == customer_id && e.address == address)
            .filter(|e| is_live(&contacts, e.contact_id))
            .collect();
        matches.sort_by(|a, b| a.tm_create.cmp(&b.tm_create));

        matches
            .first()
            .map(|e| e.contact_id)
            .ok_or_else(|| RepositoryError::not_found("Contact", address))
    }
}

fn is_live(contacts: &HashMap<Uuid, Contact>, contact_id: Uuid) -> bool {
    contacts
        .get(&contact_id)
        .is_some_and(|c| c.tm_delete.is_none())
}

// ============================================================================
// PhoneNumberRepository implementation
// ============================================================================

#[async_trait]
impl PhoneNumberRepository for InMemoryRepository {
    async fn create_phone_number(&self, phone_number: &PhoneNumber) -> Result<()> {
        let mut phone_numbers = self.phone_numbers.write().await;
        if phone_numbers.iter().any(|p| p.id == phone_number.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "PhoneNumber",
                id: phone_number.id.to_string(),
            });
        }

        let mut row = phone_number.clone();
        row.tm_create = Some(self.clock.now());
        phone_numbers.push(row);
        Ok(())
    }

    async fn get_phone_number(&self, id: Uuid) -> Result<PhoneNumber> {
        let phone_numbers = self.phone_numbers.read().await;
        phone_numbers
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("PhoneNumber", id))
    }

    async fn update_phone_number(&self, id: Uuid, update: &PhoneNumberUpdate) -> Result<()> {
        let mut phone_numbers = self.phone_numbers.write().await;
        let phone_number = phone_numbers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepositoryError::not_found("PhoneNumber", id))?;

        if let Some(number) = &update.number {
            phone_number.number = number.clone();
        }
        if let Some(number_e164) = &update.number_e164 {
            phone_number.number_e164 = number_e164.clone();
        }
        if let Some(kind) = &update.kind {
            phone_number.kind = kind.clone();
        }
        if let Some(is_primary) = update.is_primary {
            phone_number.is_primary = is_primary;
        }
        Ok(())
    }

    async fn delete_phone_number(&self, id: Uuid) -> Result<()> {
        let mut phone_numbers = self.phone_numbers.write().await;
        let before = phone_numbers.len();
        phone_numbers.retain(|p| p.id != id);
        if phone_numbers.len() == before {
            return Err(RepositoryError::not_found("PhoneNumber", id));
        }
        Ok(())
    }

    async fn list_phone_numbers_by_contact(&self, contact_id: Uuid) -> Result<Vec<PhoneNumber>> {
        let phone_numbers = self.phone_numbers.read().await;
        let mut rows: Vec<PhoneNumber> = phone_numbers
            .iter()
            .filter(|p| p.contact_id == contact_id)
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then_with(|| a.tm_create.cmp(&b.tm_create))
        });
        Ok(rows)
    }

    async fn reset_primary_phone_numbers(&self, contact_id: Uuid) -> Result<()> {
        let mut phone_numbers = self.phone_numbers.write().await;
        for phone_number in phone_numbers.iter_mut().filter(|p| p.contact_id == contact_id) {
            phone_number.is_primary = false;
        }
        Ok(())
    }
}

// ============================================================================
// EmailRepository implementation
// ============================================================================

#[async_trait]
impl EmailRepository for InMemoryRepository {
    async fn create_email(&self, email: &Email) -> Result<()> {
        let mut emails = self.emails.write().await;
        if emails.iter().any(|e| e.id == email.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Email",
                id: email.id.to_string(),
            });
        }

        let mut row = email.clone();
        row.tm_create = Some(self.clock.now());
        emails.push(row);
        Ok(())
    }

    async fn get_email(&self, id: Uuid) -> Result<Email> {
        let emails = self.emails.read().await;
        emails
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("Email", id))
    }

    async fn update_email(&self, id: Uuid, update: &EmailUpdate) -> Result<()> {
        let mut emails = self.emails.write().await;
        let email = emails
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RepositoryError::not_found("Email", id))?;

        if let Some(address) = &update.address {
            email.address = address.clone();
        }
        if let Some(kind) = &update.kind {
            email.kind = kind.clone();
        }
        if let Some(is_primary) = update.is_primary {
            email.is_primary = is_primary;
        }
        Ok(())
    }

    async fn delete_email(&self, id: Uuid) -> Result<()> {
        let mut emails = self.emails.write().await;
        let before = emails.len();
        emails.retain(|e| e.id != id);
        if emails.len() == before {
            return Err(RepositoryError::not_found("Email", id));
        }
        Ok(())
    }

    async fn list_emails_by_contact(&self, contact_id: Uuid) -> Result<Vec<Email>> {
        let emails = self.emails.read().await;
        let mut rows: Vec<Email> = emails
            .iter()
            .filter(|e| e.contact_id == contact_id)
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then_with(|| a.tm_create.cmp(&b.tm_create))
        });
        Ok(rows)
    }

    async fn reset_primary_emails(&self, contact_id: Uuid) -> Result<()> {
        let mut emails = self.emails.write().await;
        for email in emails.iter_mut().filter(|e| e.contact_id == contact_id) {
            email.is_primary = false;
        }
        Ok(())
    }
}

// ============================================================================
// TagAssignmentRepository implementation
// ============================================================================

#[async_trait]
impl TagAssignmentRepository for InMemoryRepository {
    async fn create_tag_assignment(&self, assignment: &TagAssignment) -> Result<()> {
        let mut tags = self.tags.write().await;
        if tags
            .iter()
            .any(|t| t.contact_id == assignment.contact_id && t.tag_id == assignment.tag_id)
        {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "TagAssignment",
                id: format!("{}:{}", assignment.contact_id, assignment.tag_id),
            });
        }

        let mut row = assignment.clone();
        row.tm_create = Some(self.clock.now());
        tags.push(row);
        Ok(())
    }

    async fn delete_tag_assignment(&self, contact_id: Uuid, tag_id: Uuid) -> Result<()> {
        let mut tags = self.tags.write().await;
        tags.retain(|t| !(t.contact_id == contact_id && t.tag_id == tag_id));
        Ok(())
    }

    async fn list_tag_ids_by_contact(&self, contact_id: Uuid) -> Result<Vec<Uuid>> {
        let tags = self.tags.read().await;
        let mut rows: Vec<&TagAssignment> =
            tags.iter().filter(|t| t.contact_id == contact_id).collect();
        rows.sort_by(|a, b| a.tm_create.cmp(&b.tm_create));
        Ok(rows.into_iter().map(|t| t.tag_id).collect())
    }
}
