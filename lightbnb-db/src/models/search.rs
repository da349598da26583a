//! Property search options

use serde::{Deserialize, Serialize};

/// Default number of rows returned by list operations
pub const DEFAULT_LIMIT: u32 = 10;

/// Optional filters for property listings
///
/// Prices are in whole currency units (dollars); the stored
/// `cost_per_night` is in cents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertySearch {
    /// Case-insensitive substring of the city name
    pub city: Option<String>,
    pub owner_id: Option<i32>,
    pub minimum_price_per_night: Option<f64>,
    pub maximum_price_per_night: Option<f64>,
    /// Threshold on the average review rating
    pub minimum_rating: Option<f64>,
}

impl PropertySearch {
    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn owner(mut self, owner_id: i32) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn price_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum_price_per_night = minimum;
        self.maximum_price_per_night = maximum;
        self
    }

    pub fn minimum_rating(mut self, rating: f64) -> Self {
        self.minimum_rating = Some(rating);
        self
    }

    /// The trimmed city filter, `None` when blank
    pub fn city_term(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }

    /// The city filter as a substring LIKE pattern
    ///
    /// `%`, `_` and `\` in the input are escaped so they only match
    /// themselves.
    pub fn city_pattern(&self) -> Option<String> {
        self.city_term().map(|city| {
            let mut pattern = String::with_capacity(city.len() + 2);
            pattern.push('%');
            for c in city.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }

    pub fn minimum_cents(&self) -> Option<i32> {
        self.minimum_price_per_night.map(dollars_to_cents)
    }

    pub fn maximum_cents(&self) -> Option<i32> {
        self.maximum_price_per_night.map(dollars_to_cents)
    }
}

/// Convert a dollar amount to cents, truncating any fraction of a cent.
pub fn dollars_to_cents(dollars: f64) -> i32 {
    (dollars * 100.0).trunc() as i32
}
