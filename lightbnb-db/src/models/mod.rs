//! Row types and query inputs

pub mod property;
pub mod reservation;
pub mod search;
pub mod user;

pub use property::{NewProperty, Property, PropertyListing};
pub use reservation::{Reservation, ReservationListing};
pub use search::{dollars_to_cents, PropertySearch, DEFAULT_LIMIT};
pub use user::{NewUser, User};
