//! Property records and listings

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Property record from database
///
/// `cost_per_night` is in cents.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Property {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    pub cost_per_night: i32,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub country: String,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
}

/// Insert payload for a property: every column except `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProperty {
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    pub cost_per_night: i32,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub country: String,
    #[serde(default)]
    pub parking_spaces: i32,
    #[serde(default)]
    pub number_of_bathrooms: i32,
    #[serde(default)]
    pub number_of_bedrooms: i32,
}

impl NewProperty {
    /// Attach a database-assigned id
    pub fn with_id(self, id: i32) -> Property {
        Property {
            id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            thumbnail_photo_url: self.thumbnail_photo_url,
            cover_photo_url: self.cover_photo_url,
            cost_per_night: self.cost_per_night,
            street: self.street,
            city: self.city,
            province: self.province,
            post_code: self.post_code,
            country: self.country,
            parking_spaces: self.parking_spaces,
            number_of_bathrooms: self.number_of_bathrooms,
            number_of_bedrooms: self.number_of_bedrooms,
        }
    }
}

/// Property joined to its review average
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PropertyListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    /// `None` when the property has no reviews
    pub average_rating: Option<f64>,
}
