//! Reservation records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::Property;

/// Reservation record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i32,
    pub guest_id: i32,
    pub property_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A guest's reservation with the reserved property and its review average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationListing {
    pub reservation: Reservation,
    pub property: Property,
    pub average_rating: Option<f64>,
}

/// Expects the reservation id aliased as `reservation_id` so that `id`
/// refers to the property.
impl<'r> FromRow<'r, PgRow> for ReservationListing {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            reservation: Reservation {
                id: row.try_get("reservation_id")?,
                guest_id: row.try_get("guest_id")?,
                property_id: row.try_get("property_id")?,
                start_date: row.try_get("start_date")?,
                end_date: row.try_get("end_date")?,
            },
            property: Property::from_row(row)?,
            average_rating: row.try_get("average_rating")?,
        })
    }
}
