mod classify;
mod error;
mod page;
mod traits;

pub use classify::{classify_error, ErrorClass};
pub use error::{RepositoryError, Result};
pub use page::{format_timestamp, next_page_token, parse_timestamp, PageRequest};
pub use traits::{
    ContactRepository, ContactStore, EmailRepository, PhoneNumberRepository,
    TagAssignmentRepository,
};
