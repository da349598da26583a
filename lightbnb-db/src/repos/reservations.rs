//! Reservation repository

use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;
use crate::models::ReservationListing;

/// Reservation repository
pub struct ReservationRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ReservationRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a guest's past reservations, earliest first.
    ///
    /// A reservation is past once its end date is before today. Every
    /// qualifying reservation is returned, up to `limit`.
    pub async fn list_past_for_guest(
        &self,
        guest_id: i32,
        limit: u32,
    ) -> Result<Vec<ReservationListing>> {
        debug!(guest_id, limit, "get_all_reservations");
        let rows = sqlx::query_as::<_, ReservationListing>(
            r#"
            SELECT
                reservations.id AS reservation_id,
                reservations.guest_id,
                reservations.property_id,
                reservations.start_date,
                reservations.end_date,
                properties.*,
                avg(property_reviews.rating)::float8 AS average_rating
            FROM reservations
            JOIN properties ON reservations.property_id = properties.id
            LEFT JOIN property_reviews ON property_reviews.property_id = properties.id
            WHERE reservations.guest_id = $1
            AND reservations.end_date < now()::date
            GROUP BY properties.id, reservations.id
            ORDER BY reservations.start_date, reservations.id
            LIMIT $2
            "#,
        )
        .bind(guest_id)
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
