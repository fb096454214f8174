//! Cache-aside coordinator for contact aggregates.
//!
//! Wraps a relational [`ContactStore`] and a [`Cache`]:
//! - **Reads**: check the cache first; on a miss assemble the aggregate from
//!   the store and populate the cache.
//! - **Writes**: persist to the store, then re-assemble the owning contact and
//!   overwrite its cache entry.
//!
//! Cache failures are logged and counted but never fail an operation.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use contactstore_core::cache::{contact_key, deserialize_contact, serialize_contact, Cache};
use contactstore_core::clock::{Clock, SystemClock};
use contactstore_core::contact::{
    Contact, ContactFilters, ContactUpdate, Email, EmailUpdate, PhoneNumber, PhoneNumberUpdate,
    TagAssignment,
};
use contactstore_core::storage::{
    classify_error, next_page_token, ContactStore, PageRequest, RepositoryError, Result,
};

use super::assembler::{assemble_contact, attach_children};
use crate::metrics::StoreMetrics;

/// One page of a contact listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    /// Token for the next page, empty when this page was the last one.
    pub next_page_token: String,
}

/// Cached contact store.
///
/// # Type Parameters
///
/// * `S` - The relational store
/// * `C` - The cache implementation
pub struct CachedContactStore<S, C>
where
    S: ContactStore,
    C: Cache,
{
    store: Arc<S>,
    cache: Arc<C>,
    ttl: Duration,
    metrics: Arc<StoreMetrics>,
    clock: Arc<dyn Clock>,
}

impl<S, C> CachedContactStore<S, C>
where
    S: ContactStore,
    C: Cache,
{
    /// Creates a new cached contact store.
    ///
    /// # Arguments
    ///
    /// * `store` - The relational store holding the source of truth
    /// * `cache` - The cache implementation
    /// * `ttl` - Time-to-live for cached aggregates
    /// * `metrics` - Counters updated by this store
    pub fn new(store: Arc<S>, cache: Arc<C>, ttl: Duration, metrics: Arc<StoreMetrics>) -> Self {
        Self {
            store,
            cache,
            ttl,
            metrics,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to resolve an empty page token.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &Arc<StoreMetrics> {
        &self.metrics
    }

    // ------------------------------------------------------------------------
    // Contacts
    // ------------------------------------------------------------------------

    /// Returns the full aggregate, serving it from the cache when possible.
    ///
    /// Soft-deleted contacts are still returned.
    pub async fn get_contact(&self, id: Uuid) -> Result<Contact> {
        let cache_key = contact_key(id);

        match self.cache.get(&cache_key).await {
            Ok(Some(bytes)) => match deserialize_contact(&bytes) {
                Ok(contact) => {
                    tracing::trace!(contact_id = %id, "Cache hit for contact");
                    self.metrics.record_hit();
                    return Ok(contact);
                }
                Err(err) => {
                    tracing::warn!(contact_id = %id, error = %err, "Cache contact deserialization failed");
                    self.metrics.record_cache_error();
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(contact_id = %id, error = %err, "Failed to read contact from cache");
                self.metrics.record_cache_error();
            }
        }

        tracing::trace!(contact_id = %id, "Cache miss for contact");
        self.metrics.record_miss();

        let assembled = assemble_contact(&*self.store, id).await?;
        if assembled.is_complete() {
            self.write_cache(&assembled.contact).await;
        } else {
            self.metrics.record_partial_assembly();
        }

        Ok(assembled.contact)
    }

    /// Lists contacts newest first, bypassing the cache.
    ///
    /// Each row gets its children attached individually.
    pub async fn list_contacts(
        &self,
        page_size: u64,
        page_token: &str,
        filters: &ContactFilters,
    ) -> Result<ContactPage> {
        let page = PageRequest::new(page_size, page_token, self.clock.now())?;
        let rows = self.store.list_contacts(&page, filters).await?;

        let next_page_token = if rows.len() as u64 == page.size {
            next_page_token(rows.last().and_then(|c| c.tm_create.as_ref()))
        } else {
            String::new()
        };

        let mut contacts = Vec::with_capacity(rows.len());
        for row in rows {
            let assembled = attach_children(&*self.store, row).await;
            if !assembled.is_complete() {
                self.metrics.record_partial_assembly();
            }
            contacts.push(assembled.contact);
        }

        tracing::trace!(count = contacts.len(), "Listed contacts");
        Ok(ContactPage {
            contacts,
            next_page_token,
        })
    }

    /// Persists the root row and caches the new aggregate.
    ///
    /// Children carried by `contact` are not persisted; add them through the
    /// child operations.
    pub async fn create_contact(&self, contact: &Contact) -> Result<()> {
        self.store.create_contact(contact).await?;
        self.refresh(contact.id).await;

        tracing::debug!(contact_id = %contact.id, customer_id = %contact.customer_id, "Contact created");
        Ok(())
    }

    pub async fn update_contact(&self, id: Uuid, update: &ContactUpdate) -> Result<()> {
        self.store.update_contact(id, update).await?;
        self.refresh(id).await;

        tracing::debug!(contact_id = %id, "Contact updated");
        Ok(())
    }

    /// Soft-deletes a contact. The cached aggregate keeps its children and
    /// gains a `tm_delete` stamp.
    pub async fn delete_contact(&self, id: Uuid) -> Result<()> {
        self.store.delete_contact(id).await?;
        self.refresh(id).await;

        tracing::debug!(contact_id = %id, "Contact deleted");
        Ok(())
    }

    /// Soft-deletes every live contact of a customer.
    ///
    /// The cache is not touched: affected entries expire through their TTL.
    pub async fn delete_contacts_by_customer(&self, customer_id: Uuid) -> Result<u64> {
        let deleted = self.store.delete_contacts_by_customer(customer_id).await?;

        tracing::debug!(customer_id = %customer_id, deleted, "Customer contacts deleted");
        Ok(deleted)
    }

    /// Finds the live contact owning a canonical phone number.
    pub async fn lookup_contact_by_phone(
        &self,
        customer_id: Uuid,
        number_e164: &str,
    ) -> Result<Contact> {
        let id = self
            .store
            .find_contact_id_by_phone(customer_id, number_e164)
            .await?;
        self.get_contact(id).await
    }

    /// Finds the live contact owning an email address.
    pub async fn lookup_contact_by_email(&self, customer_id: Uuid, address: &str) -> Result<Contact> {
        let id = self
            .store
            .find_contact_id_by_email(customer_id, address)
            .await?;
        self.get_contact(id).await
    }

    // ------------------------------------------------------------------------
    // Phone numbers
    // ------------------------------------------------------------------------

    pub async fn create_phone_number(&self, phone_number: &PhoneNumber) -> Result<()> {
        self.check_parent(phone_number.contact_id, phone_number.customer_id)
            .await?;
        self.store.create_phone_number(phone_number).await?;
        self.refresh(phone_number.contact_id).await;

        tracing::debug!(
            contact_id = %phone_number.contact_id,
            phone_number_id = %phone_number.id,
            "Phone number created"
        );
        Ok(())
    }

    pub async fn get_phone_number(&self, id: Uuid) -> Result<PhoneNumber> {
        self.store.get_phone_number(id).await
    }

    pub async fn update_phone_number(&self, id: Uuid, update: &PhoneNumberUpdate) -> Result<()> {
        let existing = self.store.get_phone_number(id).await?;
        self.store.update_phone_number(id, update).await?;
        self.refresh(existing.contact_id).await;

        tracing::debug!(contact_id = %existing.contact_id, phone_number_id = %id, "Phone number updated");
        Ok(())
    }

    /// Deletes a phone number. Deleting one that does not exist is a no-op.
    pub async fn delete_phone_number(&self, id: Uuid) -> Result<()> {
        let existing = match self.store.get_phone_number(id).await {
            Ok(phone_number) => phone_number,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        };

        match self.store.delete_phone_number(id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        }
        self.refresh(existing.contact_id).await;

        tracing::debug!(contact_id = %existing.contact_id, phone_number_id = %id, "Phone number deleted");
        Ok(())
    }

    /// Clears the primary flag on every phone number of a contact.
    pub async fn reset_primary_phone_numbers(&self, contact_id: Uuid) -> Result<()> {
        self.store.reset_primary_phone_numbers(contact_id).await?;
        self.refresh(contact_id).await;

        tracing::debug!(contact_id = %contact_id, "Primary phone numbers reset");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Emails
    // ------------------------------------------------------------------------

    pub async fn create_email(&self, email: &Email) -> Result<()> {
        self.check_parent(email.contact_id, email.customer_id)
            .await?;
        self.store.create_email(email).await?;
        self.refresh(email.contact_id).await;

        tracing::debug!(contact_id = %email.contact_id, email_id = %email.id, "Email created");
        Ok(())
    }

    pub async fn get_email(&self, id: Uuid) -> Result<Email> {
        self.store.get_email(id).await
    }

    pub async fn update_email(&self, id: Uuid, update: &EmailUpdate) -> Result<()> {
        let existing = self.store.get_email(id).await?;
        self.store.update_email(id, update).await?;
        self.refresh(existing.contact_id).await;

        tracing::debug!(contact_id = %existing.contact_id, email_id = %id, "Email updated");
        Ok(())
    }

    /// Deletes an email. Deleting one that does not exist is a no-op.
    pub async fn delete_email(&self, id: Uuid) -> Result<()> {
        let existing = match self.store.get_email(id).await {
            Ok(email) => email,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        };

        match self.store.delete_email(id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        }
        self.refresh(existing.contact_id).await;

        tracing::debug!(contact_id = %existing.contact_id, email_id = %id, "Email deleted");
        Ok(())
    }

    /// Clears the primary flag on every email of a contact.
    pub async fn reset_primary_emails(&self, contact_id: Uuid) -> Result<()> {
        self.store.reset_primary_emails(contact_id).await?;
        self.refresh(contact_id).await;

        tracing::debug!(contact_id = %contact_id, "Primary emails reset");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------------

    /// Links a tag to a contact.
    pub async fn add_tag(&self, contact_id: Uuid, tag_id: Uuid) -> Result<()> {
        self.store.get_contact(contact_id).await?;
        self.store
            .create_tag_assignment(&TagAssignment::new(contact_id, tag_id))
            .await?;
        self.refresh(contact_id).await;

        tracing::debug!(contact_id = %contact_id, tag_id = %tag_id, "Tag added");
        Ok(())
    }

    /// Unlinks a tag from a contact. Removing an absent link is a no-op.
    pub async fn remove_tag(&self, contact_id: Uuid, tag_id: Uuid) -> Result<()> {
        self.store.delete_tag_assignment(contact_id, tag_id).await?;
        self.refresh(contact_id).await;

        tracing::debug!(contact_id = %contact_id, tag_id = %tag_id, "Tag removed");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Children must belong to an existing contact of the same customer.
    async fn check_parent(&self, contact_id: Uuid, customer_id: Uuid) -> Result<()> {
        let parent = self.store.get_contact(contact_id).await?;
        if parent.customer_id != customer_id {
            return Err(RepositoryError::InvalidData(format!(
                "customer {customer_id} does not own contact {contact_id}"
            )));
        }
        Ok(())
    }

    /// Re-assembles a contact after a successful write and overwrites its
    /// cache entry. A partial or failed assembly evicts the entry instead, as
    /// does a contact that no longer exists.
    async fn refresh(&self, id: Uuid) {
        match assemble_contact(&*self.store, id).await {
            Ok(assembled) if assembled.is_complete() => {
                if self.write_cache(&assembled.contact).await {
                    self.metrics.record_refresh();
                }
            }
            Ok(_) => {
                self.metrics.record_partial_assembly();
                self.evict(id).await;
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(contact_id = %id, "Contact gone, dropping cache entry");
                self.evict(id).await;
            }
            Err(err) => {
                tracing::warn!(
                    contact_id = %id,
                    error = %err,
                    class = ?classify_error(&err),
                    "Failed to re-assemble contact after write"
                );
                self.evict(id).await;
            }
        }
    }

    async fn write_cache(&self, contact: &Contact) -> bool {
        let bytes = match serialize_contact(contact) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(contact_id = %contact.id, error = %err, "Failed to serialize contact");
                self.metrics.record_cache_error();
                return false;
            }
        };

        let cache_key = contact_key(contact.id);
        if let Err(err) = self.cache.set(&cache_key, &bytes, Some(self.ttl)).await {
            tracing::warn!(contact_id = %contact.id, error = %err, "Failed to cache contact");
            self.metrics.record_cache_error();
            return false;
        }
        true
    }

    async fn evict(&self, id: Uuid) {
        if let Err(err) = self.cache.delete(&contact_key(id)).await {
            tracing::warn!(contact_id = %id, error = %err, "Failed to invalidate contact cache");
            self.metrics.record_cache_error();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::{TimeZone, Utc};
    use contactstore_core::clock::ManualClock;
    use contactstore_core::contact::ContactFilter;
    use contactstore_core::storage::ContactRepository;

    use super::super::testing::{FailingStore, MockCache};
    use crate::storage::inmemory::InMemoryRepository;

    const TTL: Duration = Duration::from_secs(86_400);

    struct Fixture {
        contacts: CachedContactStore<FailingStore, MockCache>,
        store: Arc<FailingStore>,
        cache: Arc<MockCache>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap(),
            ));
            let store = Arc::new(FailingStore::new(InMemoryRepository::with_clock(
                clock.clone(),
            )));
            let cache = Arc::new(MockCache::new());
            let contacts = CachedContactStore::new(
                store.clone(),
                cache.clone(),
                TTL,
                Arc::new(StoreMetrics::new()),
            )
            .with_clock(clock.clone());

            Self {
                contacts,
                store,
                cache,
                clock,
            }
        }

        fn tick(&self) {
            self.clock.advance(chrono::Duration::seconds(1));
        }

        async fn cached(&self, id: Uuid) -> Option<Contact> {
            let bytes = self.cache.store.read().await.get(&contact_key(id)).cloned()?;
            Some(deserialize_contact(&bytes).unwrap())
        }

        async fn create(&self, customer_id: Uuid, first_name: &str) -> Contact {
            let contact = Contact::new(customer_id, first_name, "Doe");
            self.contacts.create_contact(&contact).await.unwrap();
            self.tick();
            contact
        }
    }

    #[tokio::test]
    async fn test_get_contact_miss_then_hit() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        fx.cache.store.write().await.clear();
        let reads_before = fx.store.reads();

        let first = fx.contacts.get_contact(contact.id).await.unwrap();
        let second = fx.contacts.get_contact(contact.id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.store.reads() - reads_before, 1);
        let snapshot = fx.contacts.metrics().snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
    }

    #[tokio::test]
    async fn test_cache_entry_uses_configured_ttl() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;

        let ttls = fx.cache.ttls.read().await;
        assert_eq!(ttls.get(&contact_key(contact.id)), Some(&Some(TTL)));
    }

    #[tokio::test]
    async fn test_get_contact_not_found_is_not_cached() {
        let fx = Fixture::new();
        let id = Uuid::new_v4();

        let result = fx.contacts.get_contact(id).await;

        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
        assert!(fx.cached(id).await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_cache_entry_is_treated_as_miss() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        fx.cache
            .store
            .write()
            .await
            .insert(contact_key(contact.id), b"not json".to_vec());

        let fetched = fx.contacts.get_contact(contact.id).await.unwrap();

        assert_eq!(fetched.first_name, "John");
        assert_eq!(fx.cached(contact.id).await.unwrap().id, contact.id);
        assert_eq!(fx.contacts.metrics().snapshot().cache_errors, 1);
    }

    #[tokio::test]
    async fn test_write_overwrites_cache_with_fresh_aggregate() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;

        fx.contacts
            .update_contact(contact.id, &ContactUpdate::new().first_name("Johnny"))
            .await
            .unwrap();

        let cached = fx.cached(contact.id).await.unwrap();
        assert_eq!(cached.first_name, "Johnny");
        assert!(cached.tm_update.is_some());
        assert_eq!(cached, fx.store.inner.get_contact(contact.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_untouched() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        let before = fx.cached(contact.id).await;
        let sets_before = fx.cache.sets();
        fx.store.fail_writes();

        let result = fx
            .contacts
            .update_contact(contact.id, &ContactUpdate::new().first_name("Johnny"))
            .await;

        assert!(matches!(result, Err(RepositoryError::ConnectionFailed(_))));
        assert_eq!(fx.cache.sets(), sets_before);
        assert_eq!(fx.cached(contact.id).await, before);
    }

    #[tokio::test]
    async fn test_cache_failures_never_fail_operations() {
        let fx = Fixture::new();
        fx.cache.fail();

        let contact = fx.create(Uuid::new_v4(), "John").await;
        let fetched = fx.contacts.get_contact(contact.id).await.unwrap();
        fx.contacts.delete_contact(contact.id).await.unwrap();

        assert_eq!(fetched.id, contact.id);
        let snapshot = fx.contacts.metrics().snapshot();
        assert!(snapshot.cache_errors >= 3);
        assert_eq!(snapshot.refreshes, 0);
    }

    #[tokio::test]
    async fn test_partial_aggregate_is_returned_but_not_cached() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        fx.contacts
            .create_email(&Email::new(&contact, "john@example.com", "work"))
            .await
            .unwrap();
        fx.cache.store.write().await.clear();
        fx.store.fail_emails();

        let first = fx.contacts.get_contact(contact.id).await.unwrap();
        let reads = fx.store.reads();
        fx.contacts.get_contact(contact.id).await.unwrap();

        assert!(first.emails.is_empty());
        assert!(fx.cached(contact.id).await.is_none());
        assert_eq!(fx.store.reads(), reads + 1);
        assert_eq!(fx.contacts.metrics().snapshot().partial_assemblies, 2);
    }

    #[tokio::test]
    async fn test_partial_refresh_evicts_stale_entry() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        assert!(fx.cached(contact.id).await.is_some());
        fx.store.fail_emails();

        fx.contacts
            .update_contact(contact.id, &ContactUpdate::new().company("Acme"))
            .await
            .unwrap();

        assert!(fx.cached(contact.id).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_child_is_noop() {
        let fx = Fixture::new();
        let sets_before = fx.cache.sets();

        fx.contacts.delete_phone_number(Uuid::new_v4()).await.unwrap();
        fx.contacts.delete_email(Uuid::new_v4()).await.unwrap();

        assert_eq!(fx.cache.sets(), sets_before);
    }

    #[tokio::test]
    async fn test_create_child_checks_parent() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;

        let orphan = Contact::new(contact.customer_id, "Ghost", "Doe");
        let result = fx
            .contacts
            .create_phone_number(&PhoneNumber::new(&orphan, "555", "+1555", "home"))
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));

        let mut foreign = Email::new(&contact, "x@example.com", "work");
        foreign.customer_id = Uuid::new_v4();
        let result = fx.contacts.create_email(&foreign).await;
        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));

        let result = fx.contacts.add_tag(orphan.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_child_updates_refresh_owning_contact() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        let phone = PhoneNumber::new(&contact, "555", "+1555", "home").primary();
        let email = Email::new(&contact, "john@example.com", "work").primary();
        fx.contacts.create_phone_number(&phone).await.unwrap();
        fx.contacts.create_email(&email).await.unwrap();

        fx.contacts
            .update_phone_number(phone.id, &PhoneNumberUpdate::new().kind("mobile"))
            .await
            .unwrap();
        fx.contacts
            .update_email(email.id, &EmailUpdate::new().address("j@example.com"))
            .await
            .unwrap();
        let cached = fx.cached(contact.id).await.unwrap();
        assert_eq!(cached.phone_numbers[0].kind, "mobile");
        assert_eq!(cached.emails[0].address, "j@example.com");

        fx.contacts
            .reset_primary_phone_numbers(contact.id)
            .await
            .unwrap();
        fx.contacts.reset_primary_emails(contact.id).await.unwrap();
        let cached = fx.cached(contact.id).await.unwrap();
        assert!(cached.primary_phone_number().is_none());
        assert!(cached.primary_email().is_none());

        fx.contacts.delete_phone_number(phone.id).await.unwrap();
        fx.contacts.delete_email(email.id).await.unwrap();
        let cached = fx.cached(contact.id).await.unwrap();
        assert!(cached.phone_numbers.is_empty());
        assert!(cached.emails.is_empty());
    }

    #[tokio::test]
    async fn test_promoting_child_after_reset_leaves_single_primary() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        let home = PhoneNumber::new(&contact, "555", "+1555", "home").primary();
        fx.contacts.create_phone_number(&home).await.unwrap();
        fx.tick();
        let mobile = PhoneNumber::new(&contact, "556", "+1556", "mobile");
        fx.contacts.create_phone_number(&mobile).await.unwrap();
        let work = Email::new(&contact, "john@work.example", "work").primary();
        fx.contacts.create_email(&work).await.unwrap();
        fx.tick();
        let personal = Email::new(&contact, "john@home.example", "personal");
        fx.contacts.create_email(&personal).await.unwrap();

        fx.contacts
            .reset_primary_phone_numbers(contact.id)
            .await
            .unwrap();
        fx.contacts
            .update_phone_number(mobile.id, &PhoneNumberUpdate::new().is_primary(true))
            .await
            .unwrap();
        fx.contacts.reset_primary_emails(contact.id).await.unwrap();
        fx.contacts
            .update_email(personal.id, &EmailUpdate::new().is_primary(true))
            .await
            .unwrap();

        let cached = fx.cached(contact.id).await.unwrap();
        let primary_phones: Vec<Uuid> = cached
            .phone_numbers
            .iter()
            .filter(|p| p.is_primary)
            .map(|p| p.id)
            .collect();
        assert_eq!(primary_phones, vec![mobile.id]);
        assert_eq!(cached.phone_numbers[0].id, mobile.id);

        let primary_emails: Vec<Uuid> = cached
            .emails
            .iter()
            .filter(|e| e.is_primary)
            .map(|e| e.id)
            .collect();
        assert_eq!(primary_emails, vec![personal.id]);
        assert_eq!(cached.emails[0].id, personal.id);
    }

    #[tokio::test]
    async fn test_writes_against_missing_contact_leave_cache_alone() {
        let fx = Fixture::new();
        let missing = Uuid::new_v4();
        let sets_before = fx.cache.sets();

        fx.contacts
            .reset_primary_phone_numbers(missing)
            .await
            .unwrap();
        fx.contacts.reset_primary_emails(missing).await.unwrap();
        fx.contacts.remove_tag(missing, Uuid::new_v4()).await.unwrap();

        assert_eq!(fx.cache.sets(), sets_before);
        assert!(fx.cached(missing).await.is_none());
        let snapshot = fx.contacts.metrics().snapshot();
        assert_eq!(snapshot.cache_errors, 0);
        assert_eq!(snapshot.partial_assemblies, 0);
    }

    #[tokio::test]
    async fn test_update_missing_child_is_not_found() {
        let fx = Fixture::new();

        let result = fx
            .contacts
            .update_phone_number(Uuid::new_v4(), &PhoneNumberUpdate::new().kind("home"))
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_tags_refresh_cache() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        let tag_id = Uuid::new_v4();

        fx.contacts.add_tag(contact.id, tag_id).await.unwrap();
        assert_eq!(fx.cached(contact.id).await.unwrap().tag_ids, vec![tag_id]);

        fx.contacts.remove_tag(contact.id, tag_id).await.unwrap();
        fx.contacts.remove_tag(contact.id, tag_id).await.unwrap();
        assert!(fx.cached(contact.id).await.unwrap().tag_ids.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_does_not_touch_cache() {
        let fx = Fixture::new();
        let customer_id = Uuid::new_v4();
        let contact = fx.create(customer_id, "John").await;
        fx.create(customer_id, "Jane").await;
        let sets_before = fx.cache.sets();

        let deleted = fx
            .contacts
            .delete_contacts_by_customer(customer_id)
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(fx.cache.sets(), sets_before);
        assert!(fx.cached(contact.id).await.unwrap().tm_delete.is_none());
        assert!(fx
            .store
            .inner
            .get_contact(contact.id)
            .await
            .unwrap()
            .is_deleted());
    }

    #[tokio::test]
    async fn test_lookups_go_through_cache() {
        let fx = Fixture::new();
        let contact = fx.create(Uuid::new_v4(), "John").await;
        fx.contacts
            .create_phone_number(&PhoneNumber::new(&contact, "555-0100", "+15550100", "home"))
            .await
            .unwrap();
        fx.contacts
            .create_email(&Email::new(&contact, "john@example.com", "work"))
            .await
            .unwrap();
        let reads_before = fx.store.reads();

        let by_phone = fx
            .contacts
            .lookup_contact_by_phone(contact.customer_id, "+15550100")
            .await
            .unwrap();
        let by_email = fx
            .contacts
            .lookup_contact_by_email(contact.customer_id, "john@example.com")
            .await
            .unwrap();

        assert_eq!(by_phone.id, contact.id);
        assert_eq!(by_email, by_phone);
        assert_eq!(fx.store.reads(), reads_before);

        let missing = fx
            .contacts
            .lookup_contact_by_phone(Uuid::new_v4(), "+15550100")
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_contacts_paginates_without_gaps_or_duplicates() {
        let fx = Fixture::new();
        let customer_id = Uuid::new_v4();
        let mut expected = HashSet::new();
        for name in ["A", "B", "C", "D", "E"] {
            let contact = fx.create(customer_id, name).await;
            fx.contacts.add_tag(contact.id, Uuid::nil()).await.unwrap();
            expected.insert(contact.id);
        }
        fx.create(Uuid::new_v4(), "Other").await;
        let filters = ContactFilters::new().with(ContactFilter::CustomerId(customer_id));

        let mut seen = Vec::new();
        let mut token = String::new();
        loop {
            let page = fx.contacts.list_contacts(2, &token, &filters).await.unwrap();
            assert!(page.contacts.len() <= 2);
            for contact in &page.contacts {
                assert_eq!(contact.tag_ids, vec![Uuid::nil()]);
                seen.push(contact.id);
            }
            if page.next_page_token.is_empty() {
                break;
            }
            token = page.next_page_token;
        }

        assert_eq!(seen.len(), expected.len());
        assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[tokio::test]
    async fn test_list_contacts_with_string_keyed_filters() {
        let fx = Fixture::new();
        let customer_id = Uuid::new_v4();
        let live = fx.create(customer_id, "Live").await;
        let gone = fx.create(customer_id, "Gone").await;
        fx.contacts.delete_contact(gone.id).await.unwrap();
        fx.tick();

        let raw = serde_json::json!({
            "customer_id": customer_id.to_string(),
            "deleted": false,
        });
        let map = raw.as_object().unwrap();
        let filters = ContactFilters::from_fields(map).unwrap();
        let page = fx.contacts.list_contacts(10, "", &filters).await.unwrap();

        assert_eq!(page.contacts.len(), 1);
        assert_eq!(page.contacts[0].id, live.id);
        assert!(page.next_page_token.is_empty());

        let unknown = serde_json::json!({ "favorite_color": "blue" });
        let result = ContactFilters::from_fields(unknown.as_object().unwrap())
            .map_err(RepositoryError::from);
        assert!(matches!(result, Err(RepositoryError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn test_list_contacts_rejects_bad_page_requests() {
        let fx = Fixture::new();

        let zero = fx.contacts.list_contacts(0, "", &ContactFilters::new()).await;
        let malformed = fx
            .contacts
            .list_contacts(10, "yesterday", &ContactFilters::new())
            .await;

        assert!(matches!(zero, Err(RepositoryError::InvalidData(_))));
        assert!(matches!(malformed, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_contact_lifecycle_scenario() {
        let fx = Fixture::new();
        let contact = Contact::new(Uuid::new_v4(), "John", "Doe");

        fx.contacts.create_contact(&contact).await.unwrap();
        fx.cache.store.write().await.clear();

        let fetched = fx.contacts.get_contact(contact.id).await.unwrap();
        assert!(fetched.phone_numbers.is_empty());
        assert!(fetched.emails.is_empty());
        assert!(fetched.tag_ids.is_empty());
        let reads = fx.store.reads();
        fx.contacts.get_contact(contact.id).await.unwrap();
        assert_eq!(fx.store.reads(), reads);

        let phone = PhoneNumber::new(&contact, "555-0100", "+15550100", "mobile").primary();
        fx.contacts.create_phone_number(&phone).await.unwrap();
        let cached = fx.cached(contact.id).await.unwrap();
        assert_eq!(cached.phone_numbers.len(), 1);
        assert!(cached.phone_numbers[0].is_primary);

        fx.tick();
        fx.contacts.delete_contact(contact.id).await.unwrap();
        let deleted = fx.contacts.get_contact(contact.id).await.unwrap();
        assert!(deleted.tm_delete.is_some());
        assert_eq!(deleted.tm_update, deleted.tm_delete);
        assert_eq!(deleted.phone_numbers.len(), 1);
    }
}
