use uuid::Uuid;

/// Prefix shared by every cached contact aggregate.
const CONTACT_KEY_PREFIX: &str = "contact:";

/// Returns the cache key for a contact aggregate.
pub fn contact_key(contact_id: Uuid) -> String {
    format!("{CONTACT_KEY_PREFIX}{contact_id}")
}
