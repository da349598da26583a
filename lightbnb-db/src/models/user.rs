//! User records

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Stored exactly as supplied; never written to output
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Insert payload for a user
///
/// No validation happens at this layer: email format, password strength
/// and uniqueness are left to the caller and the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Attach a database-assigned id
    pub fn with_id(self, id: i32) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password: self.password,
        }
    }
}
