//! Error types for lightbnb-db
//!
//! Absent rows are not errors: lookups resolve to `Ok(None)` and list
//! operations to an empty `Vec`. Anything in here is a genuine failure
//! the caller has to decide about.

use thiserror::Error;

/// Result type alias for lightbnb-db operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Database error type
#[derive(Debug, Error)]
pub enum DbError {
    /// Statement execution or connection failure
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A referenced row does not exist
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Connection settings could not be resolved
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl DbError {
    /// Create a not-found error for `resource` keyed by `id`
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True when the database rejected the statement with a unique violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}
