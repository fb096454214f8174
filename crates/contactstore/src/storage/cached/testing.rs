//! Test doubles shared by the assembler and coordinator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use contactstore_core::cache::{Cache, CacheError, Result as CacheResult};
use contactstore_core::contact::{
    Contact, ContactFilters, ContactUpdate, Email, EmailUpdate, PhoneNumber, PhoneNumberUpdate,
    TagAssignment,
};
use contactstore_core::storage::{
    ContactRepository, EmailRepository, PageRequest, PhoneNumberRepository, RepositoryError,
    Result, TagAssignmentRepository,
};

use crate::storage::inmemory::InMemoryRepository;

fn unavailable() -> RepositoryError {
    RepositoryError::ConnectionFailed("database unavailable".to_string())
}

/// Wraps the in-memory repository, counting reads and failing on demand.
pub struct FailingStore {
    pub inner: InMemoryRepository,
    pub get_contact_calls: AtomicUsize,
    fail_emails: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: InMemoryRepository) -> Self {
        Self {
            inner,
            get_contact_calls: AtomicUsize::new(0),
            fail_emails: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes `list_emails_by_contact` fail.
    pub fn fail_emails(&self) {
        self.fail_emails.store(true, Ordering::SeqCst);
    }

    /// Makes every mutating call fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.get_contact_calls.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContactRepository for FailingStore {
    async fn create_contact(&self, contact: &Contact) -> Result<()> {
        self.check_write()?;
        self.inner.create_contact(contact).await
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact> {
        self.get_contact_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_contact(id).await
    }

    async fn list_contacts(
        &self,
        page: &PageRequest,
        filters: &ContactFilters,
    ) -> Result<Vec<Contact>> {
        self.inner.list_contacts(page, filters).await
    }

    async fn update_contact(&self, id: Uuid, update: &ContactUpdate) -> Result<()> {
        self.check_write()?;
        self.inner.update_contact(id, update).await
    }

    async fn delete_contact(&self, id: Uuid) -> Result<()> {
        self.check_write()?;
        self.inner.delete_contact(id).await
    }

    async fn delete_contacts_by_customer(&self, customer_id: Uuid) -> Result<u64> {
        self.check_write()?;
        self.inner.delete_contacts_by_customer(customer_id).await
    }

    async fn find_contact_id_by_phone(
        &self,
        customer_id: Uuid,
        number_e164: &str,
    ) -> Result<Uuid> {
        self.inner
            .find_contact_id_by_phone(customer_id, number_e164)
            .await
    }

    async fn find_contact_id_by_email(&self, customer_id: Uuid, address: &str) -> Result<Uuid> {
        self.inner.find_contact_id_by_email(customer_id, address).await
    }
}

#[async_trait]
impl PhoneNumberRepository for FailingStore {
    async fn create_phone_number(&self, phone_number: &PhoneNumber) -> Result<()> {
        self.check_write()?;
        self.inner.create_phone_number(phone_number).await
    }

    async fn get_phone_number(&self, id: Uuid) -> Result<PhoneNumber> {
        self.inner.get_phone_number(id).await
    }

    async fn update_phone_number(&self, id: Uuid, update: &PhoneNumberUpdate) -> Result<()> {
        self.check_write()?;
        self.inner.update_phone_number(id, update).await
    }

    async fn delete_phone_number(&self, id: Uuid) -> Result<()> {
        self.check_write()?;
        self.inner.delete_phone_number(id).await
    }

    async fn list_phone_numbers_by_contact(&self, contact_id: Uuid) -> Result<Vec<PhoneNumber>> {
        self.inner.list_phone_numbers_by_contact(contact_id).await
    }

    async fn reset_primary_phone_numbers(&self, contact_id: Uuid) -> Result<()> {
        self.check_write()?;
        self.inner.reset_primary_phone_numbers(contact_id).await
    }
}

#[async_trait]
impl EmailRepository for FailingStore {
    async fn create_email(&self, email: &Email) -> Result<()> {
        self.check_write()?;
        self.inner.create_email(email).await
    }

    async fn get_email(&self, id: Uuid) -> Result<Email> {
        self.inner.get_email(id).await
    }

    async fn update_email(&self, id: Uuid, update: &EmailUpdate) -> Result<()> {
        self.check_write()?;
        self.inner.update_email(id, update).await
    }

    async fn delete_email(&self, id: Uuid) -> Result<()> {
        self.check_write()?;
        self.inner.delete_email(id).await
    }

    async fn list_emails_by_contact(&self, contact_id: Uuid) -> Result<Vec<Email>> {
        if self.fail_emails.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.list_emails_by_contact(contact_id).await
    }

    async fn reset_primary_emails(&self, contact_id: Uuid) -> Result<()> {
        self.check_write()?;
        self.inner.reset_primary_emails(contact_id).await
    }
}

#[async_trait]
impl TagAssignmentRepository for FailingStore {
    async fn create_tag_assignment(&self, assignment: &TagAssignment) -> Result<()> {
        self.check_write()?;
        self.inner.create_tag_assignment(assignment).await
    }

    async fn delete_tag_assignment(&self, contact_id: Uuid, tag_id: Uuid) -> Result<()> {
        self.check_write()?;
        self.inner.delete_tag_assignment(contact_id, tag_id).await
    }

    async fn list_tag_ids_by_contact(&self, contact_id: Uuid) -> Result<Vec<Uuid>> {
        self.inner.list_tag_ids_by_contact(contact_id).await
    }
}

/// Map-backed cache that records TTLs and can be switched to fail.
pub struct MockCache {
    pub store: RwLock<HashMap<String, Vec<u8>>>,
    pub ttls: RwLock<HashMap<String, Option<Duration>>>,
    pub set_calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockCache {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            ttls: RwLock::new(HashMap::new()),
            set_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every cache call fail.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sets(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::ConnectionFailed("cache unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Cache for MockCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.store.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.store
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        self.ttls.write().await.insert(key.to_string(), ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check()?;
        self.store.write().await.remove(key);
        Ok(())
    }
}
