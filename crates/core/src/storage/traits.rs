use async_trait::async_trait;
use uuid::Uuid;

use crate::contact::{
    Contact, ContactFilters, ContactUpdate, Email, EmailUpdate, PhoneNumber, PhoneNumberUpdate,
    TagAssignment,
};

use super::{PageRequest, Result};

/// Repository for contact root rows.
///
/// Root rows never carry children; the assembler attaches them.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Inserts a contact root row. The adapter stamps `tm_create`.
    async fn create_contact(&self, contact: &Contact) -> Result<()>;

    /// Gets a contact root row by its ID. Soft-deleted rows are returned.
    async fn get_contact(&self, id: Uuid) -> Result<Contact>;

    /// Lists root rows created strictly before the page boundary, newest first.
    async fn list_contacts(
        &self,
        page: &PageRequest,
        filters: &ContactFilters,
    ) -> Result<Vec<Contact>>;

    /// Applies a partial update and stamps `tm_update`, even when the update is empty.
    async fn update_contact(&self, id: Uuid, update: &ContactUpdate) -> Result<()>;

    /// Soft-deletes a contact by stamping `tm_update` and `tm_delete`.
    async fn delete_contact(&self, id: Uuid) -> Result<()>;

    /// Soft-deletes every undeleted contact of a customer. Returns the number of rows touched.
    async fn delete_contacts_by_customer(&self, customer_id: Uuid) -> Result<u64>;

    /// Finds the live contact owning a canonical phone number.
    async fn find_contact_id_by_phone(&self, customer_id: Uuid, number_e164: &str)
        -> Result<Uuid>;

    /// Finds the live contact owning an email address.
    async fn find_contact_id_by_email(&self, customer_id: Uuid, address: &str) -> Result<Uuid>;
}

/// Repository for phone number rows.
#[async_trait]
pub trait PhoneNumberRepository: Send + Sync {
    /// Inserts a phone number row. The adapter stamps `tm_create`.
    async fn create_phone_number(&self, phone_number: &PhoneNumber) -> Result<()>;

    /// Gets a phone number by its ID.
    async fn get_phone_number(&self, id: Uuid) -> Result<PhoneNumber>;

    /// Applies a partial update.
    async fn update_phone_number(&self, id: Uuid, update: &PhoneNumberUpdate) -> Result<()>;

    /// Hard-deletes a phone number.
    async fn delete_phone_number(&self, id: Uuid) -> Result<()>;

    /// Lists the phone numbers of a contact, primary first, then oldest first.
    async fn list_phone_numbers_by_contact(&self, contact_id: Uuid) -> Result<Vec<PhoneNumber>>;

    /// Clears `is_primary` on every phone number of a contact.
    async fn reset_primary_phone_numbers(&self, contact_id: Uuid) -> Result<()>;
}

/// Repository for email rows.
#[async_trait]
pub trait EmailRepository: Send + Sync {
    /// Inserts an email row. The adapter stamps `tm_create`.
    async fn create_email(&self, email: &Email) -> Result<()>;

    /// Gets an email by its ID.
    async fn get_email(&self, id: Uuid) -> Result<Email>;

    /// Applies a partial update.
    async fn update_email(&self, id: Uuid, update: &EmailUpdate) -> Result<()>;

    /// Hard-deletes an email.
    async fn delete_email(&self, id: Uuid) -> Result<()>;

    /// Lists the emails of a contact, primary first, then oldest first.
    async fn list_emails_by_contact(&self, contact_id: Uuid) -> Result<Vec<Email>>;

    /// Clears `is_primary` on every email of a contact.
    async fn reset_primary_emails(&self, contact_id: Uuid) -> Result<()>;
}

/// Repository for tag assignments.
#[async_trait]
pub trait TagAssignmentRepository: Send + Sync {
    /// Assigns a tag to a contact. Fails with `AlreadyExists` for a duplicate pair.
    async fn create_tag_assignment(&self, assignment: &TagAssignment) -> Result<()>;

    /// Removes a tag from a contact. Removing an absent pair succeeds.
    async fn delete_tag_assignment(&self, contact_id: Uuid, tag_id: Uuid) -> Result<()>;

    /// Lists the tag IDs of a contact, oldest assignment first.
    async fn list_tag_ids_by_contact(&self, contact_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Everything the aggregate layer needs from a relational backend.
pub trait ContactStore:
    ContactRepository + PhoneNumberRepository + EmailRepository + TagAssignmentRepository
{
}

impl<T> ContactStore for T where
    T: ContactRepository + PhoneNumberRepository + EmailRepository + TagAssignmentRepository
{
}
