//! SQLite repository implementation.
//!
//! Implements the repository traits from `contactstore_core::storage` using SQLite.
//! Every statement is auto-committed; there are no spanning transactions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_rusqlite::Connection;
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

use super::conversions::{
    format_datetime, row_to_contact, row_to_email, row_to_phone_number, row_to_uuid,
};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::filters::{list_contacts_statement, update_contact_statement};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// Turns a zero-row write into `QueryReturnedNoRows` so it maps to `NotFound`.
fn expect_rows(rows: usize) -> std::result::Result<(), tokio_rusqlite::Error> {
    if rows == 0 {
        Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
    } else {
        Ok(())
    }
}

/// SQLite-based repository implementation.
///
/// All access goes through the single background thread owned by
/// `tokio_rusqlite::Connection`.
pub struct SqliteRepository {
    conn: Connection,
    clock: Arc<dyn Clock>,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self {
            conn,
            clock: Arc::new(SystemClock),
        })
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self {
            conn,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock used to stamp timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    fn now(&self) -> String {
        format_datetime(&self.clock.now())
    }
}

// ============================================================================
// ContactRepository implementation
// ============================================================================

#[async_trait]
impl ContactRepository for SqliteRepository {
    async fn create_contact(&self, contact: &Contact) -> Result<()> {
        let id = contact.id.to_string();
        let customer_id = contact.customer_id.to_string();
        let first_name = contact.first_name.clone();
        let last_name = contact.last_name.clone();
        let display_name = contact.display_name.clone();
        let company = contact.company.clone();
        let job_title = contact.job_title.clone();
        let source = contact.source.clone();
        let external_id = contact.external_id.clone();
        let notes = contact.notes.clone();
        let tm_create = self.now();
        let contact_id = contact.id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_CONTACT,
                    rusqlite::params![
                        id,
                        customer_id,
                        first_name,
                        last_name,
                        display_name,
                        company,
                        job_title,
                        source,
                        external_id,
                        notes,
                        tm_create
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Contact", contact_id))
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_CONTACT_BY_ID)
                    .map_err(wrap_err)?;
                stmt.query_row([&id_str], row_to_contact).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Contact", id.to_string()))
    }

    async fn list_contacts(
        &self,
        page: &PageRequest,
        filters: &ContactFilters,
    ) -> Result<Vec<Contact>> {
        let statement = list_contacts_statement(page, filters);

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&statement.sql).map_err(wrap_err)?;
                let rows = stmt
                    .query_map(
                        rusqlite::params_from_iter(statement.params.iter()),
                        row_to_contact,
                    )
                    .map_err(wrap_err)?;

                let mut contacts = Vec::new();
                for row_result in rows {
                    contacts.push(row_result.map_err(wrap_err)?);
                }
                Ok(contacts)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Contact"))
    }

    async fn update_contact(&self, id: Uuid, update: &ContactUpdate) -> Result<()> {
        let statement = update_contact_statement(id, update, &self.clock.now());

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        &statement.sql,
                        rusqlite::params_from_iter(statement.params.iter()),
                    )
                    .map_err(wrap_err)?;
                expect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Contact", id.to_string()))
    }

    async fn delete_contact(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        let now = self.now();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::SOFT_DELETE_CONTACT, rusqlite::params![id_str, now])
                    .map_err(wrap_err)?;
                expect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Contact", id.to_string()))
    }

    async fn delete_contacts_by_customer(&self, customer_id: Uuid) -> Result<u64> {
        let customer_id_str = customer_id.to_string();
        let now = self.now();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::SOFT_DELETE_CONTACTS_BY_CUSTOMER,
                        rusqlite::params![customer_id_str, now],
                    )
                    .map_err(wrap_err)?;
                Ok(rows as u64)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Contact"))
    }

    async fn find_contact_id_by_phone(
        &self,
        customer_id: Uuid,
        number_e164: &str,
    ) -> Result<Uuid> {
        let customer_id_str = customer_id.to_string();
        let number_e164 = number_e164.to_string();
        let lookup = number_e164.clone();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_CONTACT_ID_BY_PHONE)
                    .map_err(wrap_err)?;
                stmt.query_row([&customer_id_str, &number_e164], row_to_uuid)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Contact", lookup))
    }

    async fn find_contact_id_by_email(&self, customer_id: Uuid, address: &str) -> Result<Uuid> {
        let customer_id_str = customer_id.to_string();
        let address = address.to_string();
        let lookup = address.clone();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_CONTACT_ID_BY_EMAIL)
                    .map_err(wrap_err)?;
                stmt.query_row([&customer_id_str, &address], row_to_uuid)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Contact", lookup))
    }
}

// ============================================================================
// PhoneNumberRepository implementation
// ============================================================================

#[async_trait]
impl PhoneNumberRepository for SqliteRepository {
    async fn create_phone_number(&self, phone_number: &PhoneNumber) -> Result<()> {
        let id = phone_number.id.to_string();
        let customer_id = phone_number.customer_id.to_string();
        let contact_id = phone_number.contact_id.to_string();
        let number = phone_number.number.clone();
        let number_e164 = phone_number.number_e164.clone();
        let kind = phone_number.kind.clone();
        let is_primary = phone_number.is_primary;
        let tm_create = self.now();
        let phone_number_id = phone_number.id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_PHONE_NUMBER,
                    rusqlite::params![
                        id,
                        customer_id,
                        contact_id,
                        number,
                        number_e164,
                        kind,
                        is_primary,
                        tm_create
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "PhoneNumber", phone_number_id))
    }

    async fn get_phone_number(&self, id: Uuid) -> Result<PhoneNumber> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_PHONE_NUMBER_BY_ID)
                    .map_err(wrap_err)?;
                stmt.query_row([&id_str], row_to_phone_number)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "PhoneNumber", id.to_string()))
    }

    async fn update_phone_number(&self, id: Uuid, update: &PhoneNumberUpdate) -> Result<()> {
        let id_str = id.to_string();
        let number = update.number.clone();
        let number_e164 = update.number_e164.clone();
        let kind = update.kind.clone();
        let is_primary = update.is_primary;

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_PHONE_NUMBER,
                        rusqlite::params![id_str, number, number_e164, kind, is_primary],
                    )
                    .map_err(wrap_err)?;
                expect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "PhoneNumber", id.to_string()))
    }

    async fn delete_phone_number(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_PHONE_NUMBER, [&id_str])
                    .map_err(wrap_err)?;
                expect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "PhoneNumber", id.to_string()))
    }

    async fn list_phone_numbers_by_contact(&self, contact_id: Uuid) -> Result<Vec<PhoneNumber>> {
        let contact_id_str = contact_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_PHONE_NUMBERS_BY_CONTACT)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&contact_id_str], row_to_phone_number)
                    .map_err(wrap_err)?;

                let mut phone_numbers = Vec::new();
                for row_result in rows {
                    phone_numbers.push(row_result.map_err(wrap_err)?);
                }
                Ok(phone_numbers)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "PhoneNumber"))
    }

    async fn reset_primary_phone_numbers(&self, contact_id: Uuid) -> Result<()> {
        let contact_id_str = contact_id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(schema::RESET_PRIMARY_PHONE_NUMBERS, [&contact_id_str])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "PhoneNumber"))
    }
}

// ============================================================================
// EmailRepository implementation
// ============================================================================

#[async_trait]
impl EmailRepository for SqliteRepository {
    async fn create_email(&self, email: &Email) -> Result<()> {
        let id = email.id.to_string();
        let customer_id = email.customer_id.to_string();
        let contact_id = email.contact_id.to_string();
        let address = email.address.clone();
        let kind = email.kind.clone();
        let is_primary = email.is_primary;
        let tm_create = self.now();
        let email_id = email.id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_EMAIL,
                    rusqlite::params![
                        id,
                        customer_id,
                        contact_id,
                        address,
                        kind,
                        is_primary,
                        tm_create
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Email", email_id))
    }

    async fn get_email(&self, id: Uuid) -> Result<Email> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_EMAIL_BY_ID).map_err(wrap_err)?;
                stmt.query_row([&id_str], row_to_email).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Email", id.to_string()))
    }

    async fn update_email(&self, id: Uuid, update: &EmailUpdate) -> Result<()> {
        let id_str = id.to_string();
        let address = update.address.clone();
        let kind = update.kind.clone();
        let is_primary = update.is_primary;

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_EMAIL,
                        rusqlite::params![id_str, address, kind, is_primary],
                    )
                    .map_err(wrap_err)?;
                expect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Email", id.to_string()))
    }

    async fn delete_email(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_EMAIL, [&id_str])
                    .map_err(wrap_err)?;
                expect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Email", id.to_string()))
    }

    async fn list_emails_by_contact(&self, contact_id: Uuid) -> Result<Vec<Email>> {
        let contact_id_str = contact_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_EMAILS_BY_CONTACT)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&contact_id_str], row_to_email)
                    .map_err(wrap_err)?;

                let mut emails = Vec::new();
                for row_result in rows {
                    emails.push(row_result.map_err(wrap_err)?);
                }
                Ok(emails)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Email"))
    }

    async fn reset_primary_emails(&self, contact_id: Uuid) -> Result<()> {
        let contact_id_str = contact_id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(schema::RESET_PRIMARY_EMAILS, [&contact_id_str])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Email"))
    }
}

// ============================================================================
// TagAssignmentRepository implementation
// ============================================================================

#[async_trait]
impl TagAssignmentRepository for SqliteRepository {
    async fn create_tag_assignment(&self, assignment: &TagAssignment) -> Result<()> {
        let contact_id = assignment.contact_id.to_string();
        let tag_id = assignment.tag_id.to_string();
        let tm_create = self.now();
        let pair = format!("{}:{}", assignment.contact_id, assignment.tag_id);

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_TAG_ASSIGNMENT,
                    rusqlite::params![contact_id, tag_id, tm_create],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "TagAssignment", pair))
    }

    async fn delete_tag_assignment(&self, contact_id: Uuid, tag_id: Uuid) -> Result<()> {
        let contact_id_str = contact_id.to_string();
        let tag_id_str = tag_id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::DELETE_TAG_ASSIGNMENT,
                    [&contact_id_str, &tag_id_str],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "TagAssignment"))
    }

    async fn list_tag_ids_by_contact(&self, contact_id: Uuid) -> Result<Vec<Uuid>> {
        let contact_id_str = contact_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_TAG_IDS_BY_CONTACT)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&contact_id_str], row_to_uuid)
                    .map_err(wrap_err)?;

                let mut tag_ids = Vec::new();
                for row_result in rows {
                    tag_ids.push(row_result.map_err(wrap_err)?);
                }
                Ok(tag_ids)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "TagAssignment"))
    }
}
