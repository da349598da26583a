//! Property repository
//!
//! - list: dynamic filters, LEFT JOIN on reviews for the average rating
//! - create: 14-column INSERT returning the stored row

use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;
use crate::models::{NewProperty, Property, PropertyListing, PropertySearch};
use crate::query::{Op, SelectQuery};

/// Properties joined to their reviews; unreviewed properties keep a NULL average.
const LISTING_SELECT: &str = "SELECT properties.*, \
     avg(property_reviews.rating)::float8 AS average_rating \
     FROM properties \
     LEFT JOIN property_reviews ON property_reviews.property_id = properties.id";

/// Build the listing query for `search`.
///
/// Predicates are appended in a fixed order: city, owner, minimum price,
/// maximum price, then the rating threshold on the aggregate.
pub fn listing_query(search: &PropertySearch, limit: u32) -> SelectQuery {
    SelectQuery::new(LISTING_SELECT)
        .filter_opt("properties.city", Op::ILike, search.city_pattern())
        .filter_opt("properties.owner_id", Op::Eq, search.owner_id)
        .filter_opt("properties.cost_per_night", Op::Gte, search.minimum_cents())
        .filter_opt("properties.cost_per_night", Op::Lte, search.maximum_cents())
        .group_by("properties.id")
        .having_opt(
            "avg(property_reviews.rating)",
            Op::Gte,
            search.minimum_rating,
        )
        .order_by("properties.cost_per_night, properties.id")
        .limit(limit)
}

/// Property repository
pub struct PropertyRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PropertyRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List properties matching `search`, cheapest first.
    pub async fn list(&self, search: &PropertySearch, limit: u32) -> Result<Vec<PropertyListing>> {
        let query = listing_query(search, limit);
        let mut builder = query.to_builder();
        debug!(sql = builder.sql(), params = ?query.bind_values(), "get_all_properties");

        let rows = builder
            .build_query_as::<PropertyListing>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    /// Get a single property with its review average.
    pub async fn get(&self, id: i32) -> Result<Option<PropertyListing>> {
        debug!(id, "get_property_with_id");
        let mut builder = SelectQuery::new(LISTING_SELECT)
            .filter("properties.id", Op::Eq, id)
            .group_by("properties.id")
            .to_builder();

        let row = builder
            .build_query_as::<PropertyListing>()
            .fetch_optional(self.pool)
            .await?;

        Ok(row)
    }

    /// Insert a property and return the stored row.
    pub async fn create(&self, property: &NewProperty) -> Result<Property> {
        debug!(owner_id = property.owner_id, title = %property.title, "add_property");
        let property = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties (
                owner_id, title, description, thumbnail_photo_url, cover_photo_url,
                cost_per_night, street, city, province, post_code, country,
                parking_spaces, number_of_bathrooms, number_of_bedrooms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(property.owner_id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.thumbnail_photo_url)
        .bind(&property.cover_photo_url)
        .bind(property.cost_per_night)
        .bind(&property.street)
        .bind(&property.city)
        .bind(&property.province)
        .bind(&property.post_code)
        .bind(&property.country)
        .bind(property.parking_spaces)
        .bind(property.number_of_bathrooms)
        .bind(property.number_of_bedrooms)
        .fetch_one(self.pool)
        .await?;

        Ok(property)
    }
}
