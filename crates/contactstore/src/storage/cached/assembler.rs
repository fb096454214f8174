//! Builds contact aggregates from relational rows.
//!
//! The root row is mandatory. Child collections are loaded best-effort: a
//! failing collection is left empty and recorded in
//! [`AssembledContact::failures`] instead of failing the whole read.

use uuid::Uuid;

use contactstore_core::contact::Contact;
use contactstore_core::storage::{ContactStore, RepositoryError, Result};

/// The child collections of a contact aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildCollection {
    PhoneNumbers,
    Emails,
    TagIds,
}

impl ChildCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildCollection::PhoneNumbers => "phone_numbers",
            ChildCollection::Emails => "emails",
            ChildCollection::TagIds => "tag_ids",
        }
    }
}

/// A child collection that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildLoadFailure {
    pub collection: ChildCollection,
    pub error: RepositoryError,
}

/// An assembled aggregate plus the child collections that failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContact {
    pub contact: Contact,
    pub failures: Vec<ChildLoadFailure>,
}

impl AssembledContact {
    /// True when every child collection loaded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads the root row and all children of a contact.
///
/// Fails only when the root row cannot be read.
pub async fn assemble_contact<S>(store: &S, id: Uuid) -> Result<AssembledContact>
where
    S: ContactStore + ?Sized,
{
    let contact = store.get_contact(id).await?;
    Ok(attach_children(store, contact).await)
}

/// Attaches children to an already loaded root row.
pub async fn attach_children<S>(store: &S, mut contact: Contact) -> AssembledContact
where
    S: ContactStore + ?Sized,
{
    let id = contact.id;
    let (phone_numbers, emails, tag_ids) = tokio::join!(
        store.list_phone_numbers_by_contact(id),
        store.list_emails_by_contact(id),
        store.list_tag_ids_by_contact(id),
    );

    let mut failures = Vec::new();

    match phone_numbers {
        Ok(rows) => contact.phone_numbers = rows,
        Err(error) => failures.push(ChildLoadFailure {
            collection: ChildCollection::PhoneNumbers,
            error,
        }),
    }
    match emails {
        Ok(rows) => contact.emails = rows,
        Err(error) => failures.push(ChildLoadFailure {
            collection: ChildCollection::Emails,
            error,
        }),
    }
    match tag_ids {
        Ok(rows) => contact.tag_ids = rows,
        Err(error) => failures.push(ChildLoadFailure {
            collection: ChildCollection::TagIds,
            error,
        }),
    }

    for failure in &failures {
        tracing::warn!(
            contact_id = %id,
            collection = failure.collection.as_str(),
            error = %failure.error,
            "Failed to load contact children"
        );
    }

    AssembledContact { contact, failures }
}
