mod error;
mod filters;
mod types;
mod updates;

pub use error::FieldError;
pub use filters::{ContactField, ContactFilter, ContactFilters};
pub use types::{Contact, Email, PhoneNumber, TagAssignment};
pub use updates::{ContactUpdate, EmailUpdate, PhoneNumberUpdate};
