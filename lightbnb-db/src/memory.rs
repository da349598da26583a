//! In-memory store for tests and demos
//!
//! Mirrors the PostgreSQL semantics of [`PgStore`](crate::store::PgStore):
//! serial ids, foreign keys on owners/guests/properties, case-insensitive
//! city matching, averages over reviews and past-only reservations.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::error::{DbError, Result};
use crate::models::{
    NewProperty, NewUser, Property, PropertyListing, PropertySearch, Reservation,
    ReservationListing, User,
};
use crate::store::Store;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    properties: Vec<Property>,
    reservations: Vec<Reservation>,
    /// (property_id, rating)
    reviews: Vec<(i32, i32)>,
}

impl Tables {
    fn next_id<T>(rows: &[T], id: impl Fn(&T) -> i32) -> i32 {
        rows.iter().map(id).max().unwrap_or(0) + 1
    }

    fn average_rating(&self, property_id: i32) -> Option<f64> {
        let ratings: Vec<i32> = self
            .reviews
            .iter()
            .filter(|(id, _)| *id == property_id)
            .map(|(_, rating)| *rating)
            .collect();

        if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64)
        }
    }

    fn listing(&self, property: &Property) -> PropertyListing {
        PropertyListing {
            property: property.clone(),
            average_rating: self.average_rating(property.id),
        }
    }

    fn property(&self, id: i32) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }
}

/// Store backed by plain vectors behind an async mutex
pub struct MemoryStore {
    tables: Mutex<Tables>,
    today: Option<NaiveDate>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            today: None,
        }
    }

    /// Pin the date used to decide which reservations are past
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Record a reservation; guest and property must exist
    pub async fn insert_reservation(
        &self,
        guest_id: i32,
        property_id: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Reservation> {
        let mut tables = self.tables.lock().await;
        if !tables.users.iter().any(|u| u.id == guest_id) {
            return Err(DbError::not_found("user", guest_id));
        }
        if tables.property(property_id).is_none() {
            return Err(DbError::not_found("property", property_id));
        }

        let reservation = Reservation {
            id: Tables::next_id(&tables.reservations, |r| r.id),
            guest_id,
            property_id,
            start_date,
            end_date,
        };
        tables.reservations.push(reservation.clone());
        Ok(reservation)
    }

    /// Record a review rating for a property
    pub async fn insert_review(&self, property_id: i32, rating: i32) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.property(property_id).is_none() {
            return Err(DbError::not_found("property", property_id));
        }
        tables.reviews.push((property_id, rating));
        Ok(())
    }
}

fn satisfies(search: &PropertySearch, listing: &PropertyListing) -> bool {
    let property = &listing.property;

    if let Some(city) = search.city_term() {
        if !property.city.to_lowercase().contains(&city.to_lowercase()) {
            return false;
        }
    }
    if search.owner_id.is_some_and(|owner| owner != property.owner_id) {
        return false;
    }
    if search
        .minimum_cents()
        .is_some_and(|min| property.cost_per_night < min)
    {
        return false;
    }
    if search
        .maximum_cents()
        .is_some_and(|max| property.cost_per_night > max)
    {
        return false;
    }
    if let Some(threshold) = search.minimum_rating {
        // NULL average never satisfies the threshold
        match listing.average_rating {
            Some(rating) if rating >= threshold => {}
            _ => return false,
        }
    }
    true
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user_with_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_user_with_id(&self, id: i32) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn add_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.lock().await;
        let user = user.with_id(Tables::next_id(&tables.users, |u| u.id));
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_all_reservations(
        &self,
        guest_id: i32,
        limit: u32,
    ) -> Result<Vec<ReservationListing>> {
        let today = self.today();
        let tables = self.tables.lock().await;

        let mut past: Vec<&Reservation> = tables
            .reservations
            .iter()
            .filter(|r| r.guest_id == guest_id && r.end_date < today)
            .collect();
        past.sort_by_key(|r| (r.start_date, r.id));

        past.into_iter()
            .take(limit as usize)
            .map(|reservation| -> Result<ReservationListing> {
                let property = tables
                    .property(reservation.property_id)
                    .ok_or_else(|| DbError::not_found("property", reservation.property_id))?;
                Ok(ReservationListing {
                    reservation: reservation.clone(),
                    property: property.clone(),
                    average_rating: tables.average_rating(property.id),
                })
            })
            .collect()
    }

    async fn get_all_properties(
        &self,
        search: &PropertySearch,
        limit: u32,
    ) -> Result<Vec<PropertyListing>> {
        let tables = self.tables.lock().await;

        let mut listings: Vec<PropertyListing> = tables
            .properties
            .iter()
            .map(|p| tables.listing(p))
            .filter(|listing| satisfies(search, listing))
            .collect();
        listings.sort_by_key(|l| (l.property.cost_per_night, l.property.id));
        listings.truncate(limit as usize);

        Ok(listings)
    }

    async fn get_property_with_id(&self, id: i32) -> Result<Option<PropertyListing>> {
        let tables = self.tables.lock().await;
        Ok(tables.property(id).map(|p| tables.listing(p)))
    }

    async fn add_property(&self, property: NewProperty) -> Result<Property> {
        let mut tables = self.tables.lock().await;
        if !tables.users.iter().any(|u| u.id == property.owner_id) {
            return Err(DbError::not_found("user", property.owner_id));
        }

        let property = property.with_id(Tables::next_id(&tables.properties, |p| p.id));
        tables.properties.push(property.clone());
        Ok(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_LIMIT;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_property(owner_id: i32, city: &str, cost_per_night: i32) -> NewProperty {
        NewProperty {
            owner_id,
            title: format!("Stay in {}", city),
            description: "description".to_string(),
            thumbnail_photo_url: "https://images.example.com/thumb.jpg".to_string(),
            cover_photo_url: "https://images.example.com/cover.jpg".to_string(),
            cost_per_night,
            street: "1 Main St".to_string(),
            city: city.to_string(),
            province: "BC".to_string(),
            post_code: "V5K 0A1".to_string(),
            country: "Canada".to_string(),
            parking_spaces: 1,
            number_of_bathrooms: 1,
            number_of_bedrooms: 2,
        }
    }

    /// One owner with properties across a few cities and prices
    async fn seeded() -> (MemoryStore, User) {
        let store = MemoryStore::new().with_today(date(2024, 6, 1));
        let owner = store
            .add_user(NewUser::new("Owner", "owner@example.com", "pw"))
            .await
            .unwrap();

        for (city, cost) in [
            ("Vancouver", 12000),
            ("North Vancouver", 4000),
            ("Calgary", 9000),
            ("Toronto", 20000),
            ("vancouver island", 15000),
            ("Victoria", 5000),
            ("Montreal", 7000),
        ] {
            store
                .add_property(new_property(owner.id, city, cost))
                .await
                .unwrap();
        }

        (store, owner)
    }

    #[tokio::test]
    async fn get_user_with_email_exact_match() {
        let store = MemoryStore::new();
        store
            .add_user(NewUser::new("A", "a@x.com", "p"))
            .await
            .unwrap();

        let found = store.get_user_with_email("a@x.com").await.unwrap();
        assert_eq!(found.map(|u| u.name), Some("A".to_string()));

        assert!(store.get_user_with_email("A@X.COM").await.unwrap().is_none());
        assert!(store.get_user_with_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_user_assigns_ids() {
        let store = MemoryStore::new();
        let first = store
            .add_user(NewUser::new("A", "a@x.com", "p"))
            .await
            .unwrap();
        let second = store
            .add_user(NewUser::new("B", "b@x.com", "q"))
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.get_user_with_id(2).await.unwrap(), Some(second));
        assert!(store.get_user_with_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn properties_limited_and_ordered_by_cost() {
        let (store, _) = seeded().await;

        let listings = store
            .get_all_properties(&PropertySearch::default(), 5)
            .await
            .unwrap();

        let costs: Vec<i32> = listings.iter().map(|l| l.property.cost_per_night).collect();
        assert_eq!(costs, vec![4000, 5000, 7000, 9000, 12000]);
    }

    #[tokio::test]
    async fn properties_by_city_substring() {
        let (store, _) = seeded().await;

        let listings = store
            .get_all_properties(&PropertySearch::default().city("Van"), DEFAULT_LIMIT)
            .await
            .unwrap();

        assert_eq!(listings.len(), 3);
        assert!(listings
            .iter()
            .all(|l| l.property.city.to_lowercase().contains("van")));
    }

    #[tokio::test]
    async fn city_wildcards_match_literally() {
        let (store, _) = seeded().await;

        for city in ["V_ncouver", "%", "_"] {
            let listings = store
                .get_all_properties(&PropertySearch::default().city(city), DEFAULT_LIMIT)
                .await
                .unwrap();
            assert!(listings.is_empty(), "{} matched {:?}", city, listings);
        }
    }

    #[tokio::test]
    async fn properties_by_price_range_inclusive() {
        let (store, _) = seeded().await;

        let search = PropertySearch::default().price_range(Some(50.0), Some(150.0));
        let listings = store
            .get_all_properties(&search, DEFAULT_LIMIT)
            .await
            .unwrap();

        let costs: Vec<i32> = listings.iter().map(|l| l.property.cost_per_night).collect();
        assert_eq!(costs, vec![5000, 7000, 9000, 12000, 15000]);
    }

    #[tokio::test]
    async fn properties_by_owner() {
        let (store, owner) = seeded().await;
        let other = store
            .add_user(NewUser::new("Other", "other@example.com", "pw"))
            .await
            .unwrap();
        store
            .add_property(new_property(other.id, "Halifax", 100))
            .await
            .unwrap();

        let listings = store
            .get_all_properties(&PropertySearch::default().owner(other.id), DEFAULT_LIMIT)
            .await
            .unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].property.city, "Halifax");

        let listings = store
            .get_all_properties(&PropertySearch::default().owner(owner.id), DEFAULT_LIMIT)
            .await
            .unwrap();
        assert_eq!(listings.len(), 7);
    }

    #[tokio::test]
    async fn properties_by_minimum_rating() {
        let (store, _) = seeded().await;
        store.insert_review(1, 5).await.unwrap();
        store.insert_review(1, 4).await.unwrap();
        store.insert_review(2, 2).await.unwrap();

        let listings = store
            .get_all_properties(&PropertySearch::default().minimum_rating(4.0), DEFAULT_LIMIT)
            .await
            .unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].property.id, 1);
        assert_eq!(listings[0].average_rating, Some(4.5));
    }

    #[tokio::test]
    async fn add_property_round_trip() {
        let (store, owner) = seeded().await;
        let input = new_property(owner.id, "Kelowna", 13300);

        let stored = store.add_property(input.clone()).await.unwrap();
        assert_eq!(stored, input.with_id(stored.id));

        let fetched = store.get_property_with_id(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.property, stored);
        assert_eq!(fetched.average_rating, None);
    }

    #[tokio::test]
    async fn add_property_requires_owner() {
        let store = MemoryStore::new();
        let err = store
            .add_property(new_property(42, "Nowhere", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "user", .. }));
    }

    #[tokio::test]
    async fn all_past_reservations_are_returned() {
        let (store, _) = seeded().await;
        let guest = store
            .add_user(NewUser::new("Guest", "guest@example.com", "pw"))
            .await
            .unwrap();

        store
            .insert_reservation(guest.id, 3, date(2023, 9, 1), date(2023, 9, 5))
            .await
            .unwrap();
        store
            .insert_reservation(guest.id, 1, date(2022, 1, 10), date(2022, 1, 12))
            .await
            .unwrap();
        store
            .insert_reservation(guest.id, 2, date(2024, 5, 20), date(2024, 5, 25))
            .await
            .unwrap();
        // Still ongoing / upcoming
        store
            .insert_reservation(guest.id, 4, date(2024, 5, 30), date(2024, 6, 1))
            .await
            .unwrap();
        store
            .insert_reservation(guest.id, 5, date(2024, 7, 1), date(2024, 7, 3))
            .await
            .unwrap();

        let listings = store
            .get_all_reservations(guest.id, DEFAULT_LIMIT)
            .await
            .unwrap();

        assert_eq!(listings.len(), 3);
        let starts: Vec<NaiveDate> = listings.iter().map(|l| l.reservation.start_date).collect();
        assert_eq!(
            starts,
            vec![date(2022, 1, 10), date(2023, 9, 1), date(2024, 5, 20)]
        );
        assert_eq!(listings[0].property.id, 1);

        let capped = store.get_all_reservations(guest.id, 2).await.unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn reservations_for_unknown_guest_are_empty() {
        let (store, _) = seeded().await;
        assert!(store
            .get_all_reservations(999, DEFAULT_LIMIT)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn reservation_requires_property() {
        let (store, owner) = seeded().await;
        let err = store
            .insert_reservation(owner.id, 404, date(2020, 1, 1), date(2020, 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "property", .. }));
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let store: Box<dyn Store> = Box::new(MemoryStore::new());
        let user = store
            .add_user(NewUser::new("A", "a@x.com", "p"))
            .await
            .unwrap();
        assert_eq!(store.get_user_with_id(user.id).await.unwrap(), Some(user));
    }
}
