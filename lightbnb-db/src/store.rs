//! Store trait and the PostgreSQL implementation
//!
//! Callers hold a `dyn Store` (or a generic `S: Store`) so the backing
//! database can be swapped for [`MemoryStore`](crate::memory::MemoryStore)
//! in tests.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{
    NewProperty, NewUser, Property, PropertyListing, PropertySearch, ReservationListing, User,
};
use crate::pool::create_pool;
use crate::repos::{PropertyRepo, ReservationRepo, UserRepo};

/// Data access for users, properties and reservations
///
/// Lookups resolve to `Ok(None)` when nothing matches; `Err` always means
/// the operation itself failed.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user_with_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_with_id(&self, id: i32) -> Result<Option<User>>;

    async fn add_user(&self, user: NewUser) -> Result<User>;

    /// Past reservations for a guest, ordered by start date
    async fn get_all_reservations(
        &self,
        guest_id: i32,
        limit: u32,
    ) -> Result<Vec<ReservationListing>>;

    /// Properties matching `search`, ordered by nightly cost
    async fn get_all_properties(
        &self,
        search: &PropertySearch,
        limit: u32,
    ) -> Result<Vec<PropertyListing>>;

    async fn get_property_with_id(&self, id: i32) -> Result<Option<PropertyListing>>;

    async fn add_property(&self, property: NewProperty) -> Result<Property>;
}

/// PostgreSQL-backed store
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool from resolved settings
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::new(create_pool(config).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed PostgreSQL pool");
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_user_with_email(&self, email: &str) -> Result<Option<User>> {
        UserRepo::new(&self.pool).get_with_email(email).await
    }

    async fn get_user_with_id(&self, id: i32) -> Result<Option<User>> {
        UserRepo::new(&self.pool).get_with_id(id).await
    }

    async fn add_user(&self, user: NewUser) -> Result<User> {
        UserRepo::new(&self.pool).create(&user).await
    }

    async fn get_all_reservations(
        &self,
        guest_id: i32,
        limit: u32,
    ) -> Result<Vec<ReservationListing>> {
        ReservationRepo::new(&self.pool)
            .list_past_for_guest(guest_id, limit)
            .await
    }

    async fn get_all_properties(
        &self,
        search: &PropertySearch,
        limit: u32,
    ) -> Result<Vec<PropertyListing>> {
        PropertyRepo::new(&self.pool).list(search, limit).await
    }

    async fn get_property_with_id(&self, id: i32) -> Result<Option<PropertyListing>> {
        PropertyRepo::new(&self.pool).get(id).await
    }

    async fn add_property(&self, property: NewProperty) -> Result<Property> {
        PropertyRepo::new(&self.pool).create(&property).await
    }
}
