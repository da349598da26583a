//! User repository
//!
//! - lookups: exact match, `None` when absent
//! - create: plain INSERT, uniqueness left to the schema

use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;
use crate::models::{NewUser, User};

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a single user by exact email match.
    pub async fn get_with_email(&self, email: &str) -> Result<Option<User>> {
        debug!(email, "get_user_with_email");
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password
            FROM users
            WHERE email = $1
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a single user by id.
    pub async fn get_with_id(&self, id: i32) -> Result<Option<User>> {
        debug!(id, "get_user_with_id");
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Insert a user and return it with its assigned id.
    pub async fn create(&self, user: &NewUser) -> Result<User> {
        debug!(email = %user.email, "add_user");
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }
}
