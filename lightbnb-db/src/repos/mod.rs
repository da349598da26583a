//! Repository implementations for database access
//!
//! Each repository borrows the shared pool and issues exactly one
//! statement per call. No transactions, no check-then-insert: the schema's
//! constraints are the only invariants enforced.

pub mod properties;
pub mod reservations;
pub mod users;

pub use properties::{listing_query, PropertyRepo};
pub use reservations::ReservationRepo;
pub use users::UserRepo;
