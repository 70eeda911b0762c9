use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered user, as far as the login flow needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Emails compare case-insensitively and without surrounding whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
