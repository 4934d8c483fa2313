//! User record keyed by a hash of the email address.

use serde::{Deserialize, Serialize};

use crate::utils::hash::fnv64;

/// A user known to the service.
///
/// `id` is derived from `email`, so looking a user up by email is an
/// idempotent create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Id")]
    pub id: u64,
}

impl UserRecord {
    /// Builds a record for `email`, deriving its id.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            id: user_id(&email),
            email,
            name: name.into(),
        }
    }
}

/// Deterministic user id for an email address.
pub fn user_id(email: &str) -> u64 {
    fnv64(email)
}
