//! lightbnb-db: data access for the LightBnB booking app
//!
//! Fetches and inserts users, properties and reservations in PostgreSQL.
//! Everything goes through the [`Store`] trait: [`PgStore`] for the real
//! database, [`MemoryStore`] for tests.
//!
//! ```ignore
//! use lightbnb_db::{DatabaseConfig, PgStore, PropertySearch, Store, DEFAULT_LIMIT};
//!
//! let store = PgStore::connect(&DatabaseConfig::load()?).await?;
//! let cheap = store
//!     .get_all_properties(&PropertySearch::default().city("Van"), DEFAULT_LIMIT)
//!     .await?;
//! store.close().await;
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod pool;
pub mod query;
pub mod repos;
pub mod store;

pub use config::{load_dotenv, DatabaseConfig, LightbnbConfig};
pub use error::{DbError, Result};
pub use memory::MemoryStore;
pub use models::{
    NewProperty, NewUser, Property, PropertyListing, PropertySearch, Reservation,
    ReservationListing, User, DEFAULT_LIMIT,
};
pub use pool::create_pool;
pub use store::{PgStore, Store};
