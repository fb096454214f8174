//! SQLite schema definitions and SQL query constants.
//!
//! Timestamps are TEXT in fixed-precision RFC 3339 so that `<` and `ORDER BY`
//! compare them in time order.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- Contact root rows
CREATE TABLE IF NOT EXISTS contact_contacts (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    display_name TEXT NOT NULL DEFAULT '',
    company TEXT NOT NULL DEFAULT '',
    job_title TEXT NOT NULL DEFAULT '',
    source TEXT NOT NULL DEFAULT '',
    external_id TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    tm_create TEXT,
    tm_update TEXT,
    tm_delete TEXT
);

-- Phone numbers owned by a contact
CREATE TABLE IF NOT EXISTS contact_phone_numbers (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    contact_id TEXT NOT NULL,
    number TEXT NOT NULL DEFAULT '',
    number_e164 TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT '',
    is_primary INTEGER NOT NULL DEFAULT 0,
    tm_create TEXT
);

-- Emails owned by a contact
CREATE TABLE IF NOT EXISTS contact_emails (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    contact_id TEXT NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT '',
    is_primary INTEGER NOT NULL DEFAULT 0,
    tm_create TEXT
);

-- Tag assignments
CREATE TABLE IF NOT EXISTS contact_tags (
    contact_id TEXT NOT NULL,
    tag_id TEXT NOT NULL,
    tm_create TEXT,
    PRIMARY KEY (contact_id, tag_id)
);

-- Indexes for efficient queries
CREATE INDEX IF NOT EXISTS idx_contact_contacts_customer_id ON contact_contacts(customer_id);
CREATE INDEX IF NOT EXISTS idx_contact_contacts_tm_create ON contact_contacts(tm_create);
CREATE INDEX IF NOT EXISTS idx_contact_phone_numbers_contact_id ON contact_phone_numbers(contact_id);
CREATE INDEX IF NOT EXISTS idx_contact_phone_numbers_e164 ON contact_phone_numbers(customer_id, number_e164);
CREATE INDEX IF NOT EXISTS idx_contact_emails_contact_id ON contact_emails(contact_id);
CREATE INDEX IF NOT EXISTS idx_contact_emails_address ON contact_emails(customer_id, address);
"#;

/// Column list shared by every contact select. Order matches `row_to_contact`.
pub const CONTACT_COLUMNS: &str = "id, customer_id, first_name, last_name, display_name, \
     company, job_title, source, external_id, notes, tm_create, tm_update, tm_delete";

// Contact queries
pub const INSERT_CONTACT: &str = r#"
INSERT INTO contact_contacts (
    id, customer_id, first_name, last_name, display_name, company, job_title,
    source, external_id, notes, tm_create, tm_update, tm_delete
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL, NULL)
"#;

pub const SELECT_CONTACT_BY_ID: &str = r#"
SELECT id, customer_id, first_name, last_name, display_name, company, job_title,
       source, external_id, notes, tm_create, tm_update, tm_delete
FROM contact_contacts
WHERE id = ?1
"#;

pub const SOFT_DELETE_CONTACT: &str = r#"
UPDATE contact_contacts
SET tm_update = ?2, tm_delete = ?2
WHERE id = ?1
"#;

pub const SOFT_DELETE_CONTACTS_BY_CUSTOMER: &str = r#"
UPDATE contact_contacts
SET tm_update = ?2, tm_delete = ?2
WHERE customer_id = ?1 AND tm_delete IS NULL
"#;

pub const SELECT_CONTACT_ID_BY_PHONE: &str = r#"
SELECT c.id
FROM contact_contacts c
INNER JOIN contact_phone_numbers p ON c.id = p.contact_id
WHERE p.customer_id = ?1 AND p.number_e164 = ?2 AND c.tm_delete IS NULL
ORDER BY p.tm_create ASC
LIMIT 1
"#;

pub const SELECT_CONTACT_ID_BY_EMAIL: &str = r#"
SELECT c.id
FROM contact_contacts c
INNER JOIN contact_emails e ON c.id = e.contact_id
WHERE e.customer_id = ?1 AND e.address = ?2 AND c.tm_delete IS NULL
ORDER BY e.tm_create ASC
LIMIT 1
"#;

// Phone number queries
pub const INSERT_PHONE_NUMBER: &str = r#"
INSERT INTO contact_phone_numbers (id, customer_id, contact_id, number, number_e164, type, is_primary, tm_create)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub const SELECT_PHONE_NUMBER_BY_ID: &str = r#"
SELECT id, customer_id, contact_id, number, number_e164, type, is_primary, tm_create
FROM contact_phone_numbers
WHERE id = ?1
"#;

pub const SELECT_PHONE_NUMBERS_BY_CONTACT: &str = r#"
SELECT id, customer_id, contact_id, number, number_e164, type, is_primary, tm_create
FROM contact_phone_numbers
WHERE contact_id = ?1
ORDER BY is_primary DESC, tm_create ASC
"#;

pub const UPDATE_PHONE_NUMBER: &str = r#"
UPDATE contact_phone_numbers
SET number = COALESCE(?2, number),
    number_e164 = COALESCE(?3, number_e164),
    type = COALESCE(?4, type),
    is_primary = COALESCE(?5, is_primary)
WHERE id = ?1
"#;

pub const DELETE_PHONE_NUMBER: &str = r#"
DELETE FROM contact_phone_numbers
WHERE id = ?1
"#;

pub const RESET_PRIMARY_PHONE_NUMBERS: &str = r#"
UPDATE contact_phone_numbers
SET is_primary = 0
WHERE contact_id = ?1
"#;

// Email queries
pub const INSERT_EMAIL: &str = r#"
INSERT INTO contact_emails (id, customer_id, contact_id, address, type, is_primary, tm_create)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub const SELECT_EMAIL_BY_ID: &str = r#"
SELECT id, customer_id, contact_id, address, type, is_primary, tm_create
FROM contact_emails
WHERE id = ?1
"#;

pub const SELECT_EMAILS_BY_CONTACT: &str = r#"
SELECT id, customer_id, contact_id, address, type, is_primary, tm_create
FROM contact_emails
WHERE contact_id = ?1
ORDER BY is_primary DESC, tm_create ASC
"#;

pub const UPDATE_EMAIL: &str = r#"
UPDATE contact_emails
SET address = COALESCE(?2, address),
    type = COALESCE(?3, type),
    is_primary = COALESCE(?4, is_primary)
WHERE id = ?1
"#;

pub const DELETE_EMAIL: &str = r#"
DELETE FROM contact_emails
WHERE id = ?1
"#;

pub const RESET_PRIMARY_EMAILS: &str = r#"
UPDATE contact_emails
SET is_primary = 0
WHERE contact_id = ?1
"#;

// Tag assignment queries
pub const INSERT_TAG_ASSIGNMENT: &str = r#"
INSERT INTO contact_tags (contact_id, tag_id, tm_create)
VALUES (?1, ?2, ?3)
"#;

pub const DELETE_TAG_ASSIGNMENT: &str = r#"
DELETE FROM contact_tags
WHERE contact_id = ?1 AND tag_id = ?2
"#;

pub const SELECT_TAG_IDS_BY_CONTACT: &str = r#"
SELECT tag_id
FROM contact_tags
WHERE contact_id = ?1
ORDER BY tm_create ASC
"#;
