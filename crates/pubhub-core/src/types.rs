//! # Domain Types
//!
//! Core domain types used throughout Pubhub.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │      User        │   │       Pub        │   │      Event       │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  id (server)     │   │  id (server)     │   │  id (server)     │    │
//! │  │  name, email     │   │  name, address   │   │  name            │    │
//! │  │  photo_url       │   │  lat / lon       │   │  starts/ends_at  │    │
//! │  │  favorites ──────┼──►│                  │◄──┼── pub_ids        │    │
//! │  │  reg. token      │   │                  │   │                  │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutable Values
//! Domain values are only produced by their builders, which validate every
//! field in `build()`. To change a value, turn it back into a builder:
//!
//! ```rust
//! use pubhub_core::User;
//!
//! let user = User::builder("58b2aef6d9f0163f6eee636e")
//!     .name("Irene")
//!     .favorites(["1111", "2222"])
//!     .build()
//!     .unwrap();
//!
//! let refreshed = user
//!     .to_builder()
//!     .registration_token("fcm-token")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(refreshed.registration_token(), Some("fcm-token"));
//! assert_eq!(user.registration_token(), None);
//! ```
//!
//! Deserialization goes through the same builders, so a JSON payload can never
//! produce a value that `build()` would have rejected.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::validation::{
    validate_email, validate_entity_id, validate_latitude, validate_longitude,
    validate_max_length, validate_name, validate_registration_token, validate_url,
};
use crate::{MAX_NAME_LENGTH, MAX_TEXT_LENGTH};

// =============================================================================
// User
// =============================================================================

/// An account of the app.
///
/// Favorites are a set of pub ids: unique, order irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UserBuilder")]
pub struct User {
    id: String,
    name: String,
    email: Option<String>,
    photo_url: Option<String>,
    favorites: BTreeSet<String>,
    registration_token: Option<String>,
}

impl User {
    /// Starts building a user with the given server-assigned id.
    pub fn builder(id: impl Into<String>) -> UserBuilder {
        UserBuilder::new(id)
    }

    /// Returns a builder pre-filled with this user's fields.
    pub fn to_builder(&self) -> UserBuilder {
        UserBuilder {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            photo_url: self.photo_url.clone(),
            favorites: self.favorites.clone(),
            registration_token: self.registration_token.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name. Empty when the account was created from a token refresh
    /// before the profile was fetched.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    /// Favorite pub ids in ascending order.
    pub fn favorites(&self) -> &BTreeSet<String> {
        &self.favorites
    }

    /// Checks if the given pub is one of the user's favorites.
    pub fn is_favorite(&self, pub_id: &str) -> bool {
        self.favorites.contains(pub_id)
    }

    /// Push-notification registration token, if the device registered one.
    pub fn registration_token(&self) -> Option<&str> {
        self.registration_token.as_deref()
    }
}

/// Builder producing a validated [`User`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBuilder {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    favorites: BTreeSet<String>,
    #[serde(default)]
    registration_token: Option<String>,
}

impl UserBuilder {
    /// Creates a builder for the user with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        UserBuilder {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    /// Adds a single favorite pub id. Adding the same id twice is a no-op.
    pub fn favorite(mut self, pub_id: impl Into<String>) -> Self {
        self.favorites.insert(pub_id.into());
        self
    }

    /// Removes a favorite pub id.
    pub fn remove_favorite(mut self, pub_id: &str) -> Self {
        self.favorites.remove(pub_id);
        self
    }

    /// Replaces the favorites with the given pub ids.
    pub fn favorites<I, S>(mut self, pub_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.favorites = pub_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn registration_token(mut self, token: impl Into<String>) -> Self {
        self.registration_token = Some(token.into());
        self
    }

    /// Drops the registration token (e.g. on logout).
    pub fn clear_registration_token(mut self) -> Self {
        self.registration_token = None;
        self
    }

    /// Validates every field and produces the user.
    ///
    /// ## Rules
    /// - `id` and every favorite id must be valid entity ids
    /// - `name` at most 200 characters (may be empty)
    /// - `email`, `photo_url`, `registration_token` validated when present
    pub fn build(self) -> CoreResult<User> {
        validate_entity_id("id", &self.id)?;
        validate_max_length("name", &self.name, MAX_NAME_LENGTH)?;

        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(url) = &self.photo_url {
            validate_url("photo_url", url)?;
        }
        for pub_id in &self.favorites {
            validate_entity_id("favorites", pub_id)?;
        }
        if let Some(token) = &self.registration_token {
            validate_registration_token(token)?;
        }

        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            photo_url: self.photo_url,
            favorites: self.favorites,
            registration_token: self.registration_token,
        })
    }
}

impl TryFrom<UserBuilder> for User {
    type Error = CoreError;

    fn try_from(builder: UserBuilder) -> CoreResult<Self> {
        builder.build()
    }
}

// =============================================================================
// Pub
// =============================================================================

/// A venue listed in the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PubBuilder")]
pub struct Pub {
    id: String,
    name: String,
    address: Option<String>,
    description: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    photo_url: Option<String>,
    phone: Option<String>,
}

impl Pub {
    /// Starts building a pub.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> PubBuilder {
        PubBuilder::new(id, name)
    }

    /// Returns a builder pre-filled with this pub's fields.
    pub fn to_builder(&self) -> PubBuilder {
        PubBuilder {
            id: self.id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            description: self.description.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            photo_url: self.photo_url.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    /// Returns `(latitude, longitude)` when the pub is geolocated.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// Builder producing a validated [`Pub`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubBuilder {
    id: String,
    name: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

impl PubBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        PubBuilder {
            id: id.into(),
            name: name.into(),
            address: None,
            description: None,
            latitude: None,
            longitude: None,
            photo_url: None,
            phone: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets both coordinates at once.
    pub fn location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Validates every field and produces the pub.
    ///
    /// Latitude and longitude must be given together.
    pub fn build(self) -> CoreResult<Pub> {
        validate_entity_id("id", &self.id)?;
        validate_name("name", &self.name)?;

        if let Some(address) = &self.address {
            validate_max_length("address", address, MAX_TEXT_LENGTH)?;
        }
        if let Some(description) = &self.description {
            validate_max_length("description", description, MAX_TEXT_LENGTH)?;
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                validate_latitude(lat)?;
                validate_longitude(lon)?;
            }
            (Some(_), None) => {
                return Err(crate::ValidationError::required("longitude").into());
            }
            (None, Some(_)) => {
                return Err(crate::ValidationError::required("latitude").into());
            }
            (None, None) => {}
        }
        if let Some(url) = &self.photo_url {
            validate_url("photo_url", url)?;
        }
        if let Some(phone) = &self.phone {
            validate_max_length("phone", phone, 32)?;
        }

        Ok(Pub {
            id: self.id,
            name: self.name,
            address: self.address,
            description: self.description,
            latitude: self.latitude,
            longitude: self.longitude,
            photo_url: self.photo_url,
            phone: self.phone,
        })
    }
}

impl TryFrom<PubBuilder> for Pub {
    type Error = CoreError;

    fn try_from(builder: PubBuilder) -> CoreResult<Self> {
        builder.build()
    }
}

// =============================================================================
// Event
// =============================================================================

/// An event hosted at one or more pubs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EventBuilder")]
pub struct Event {
    id: String,
    name: String,
    description: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    photo_url: Option<String>,
    pub_ids: BTreeSet<String>,
}

impl Event {
    /// Starts building an event.
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        starts_at: DateTime<Utc>,
    ) -> EventBuilder {
        EventBuilder::new(id, name, starts_at)
    }

    /// Returns a builder pre-filled with this event's fields.
    pub fn to_builder(&self) -> EventBuilder {
        EventBuilder {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            photo_url: self.photo_url.clone(),
            pub_ids: self.pub_ids.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    /// Ids of the pubs hosting this event, in ascending order.
    pub fn pub_ids(&self) -> &BTreeSet<String> {
        &self.pub_ids
    }

    pub fn is_hosted_at(&self, pub_id: &str) -> bool {
        self.pub_ids.contains(pub_id)
    }

    /// An event without an end time is over once it has started.
    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        match self.ends_at {
            Some(ends_at) => ends_at < now,
            None => self.starts_at < now,
        }
    }
}

/// Builder producing a validated [`Event`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBuilder {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    starts_at: DateTime<Utc>,
    #[serde(default)]
    ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    pub_ids: BTreeSet<String>,
}

impl EventBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, starts_at: DateTime<Utc>) -> Self {
        EventBuilder {
            id: id.into(),
            name: name.into(),
            description: None,
            starts_at,
            ends_at: None,
            photo_url: None,
            pub_ids: BTreeSet::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn starts_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = starts_at;
        self
    }

    pub fn ends_at(mut self, ends_at: DateTime<Utc>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    pub fn photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    /// Adds a hosting pub.
    pub fn hosted_at(mut self, pub_id: impl Into<String>) -> Self {
        self.pub_ids.insert(pub_id.into());
        self
    }

    /// Replaces the hosting pubs.
    pub fn pub_ids<I, S>(mut self, pub_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pub_ids = pub_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Validates every field and produces the event.
    pub fn build(self) -> CoreResult<Event> {
        validate_entity_id("id", &self.id)?;
        validate_name("name", &self.name)?;

        if let Some(description) = &self.description {
            validate_max_length("description", description, MAX_TEXT_LENGTH)?;
        }
        if let Some(ends_at) = self.ends_at {
            if ends_at < self.starts_at {
                return Err(CoreError::InvalidSchedule {
                    event_id: self.id,
                    starts_at: self.starts_at,
                    ends_at,
                });
            }
        }
        if let Some(url) = &self.photo_url {
            validate_url("photo_url", url)?;
        }
        for pub_id in &self.pub_ids {
            validate_entity_id("pub_ids", pub_id)?;
        }

        Ok(Event {
            id: self.id,
            name: self.name,
            description: self.description,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            photo_url: self.photo_url,
            pub_ids: self.pub_ids,
        })
    }
}

impl TryFrom<EventBuilder> for Event {
    type Error = CoreError;

    fn try_from(builder: EventBuilder) -> CoreResult<Self> {
        builder.build()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn irene() -> User {
        User::builder("58b2aef6d9f0163f6eee636e")
            .name("Irene")
            .email("irene@gmail.com")
            .photo_url("http://images.com/irene.jpg")
            .favorites(["1111", "2222"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_user_builder() {
        let user = irene();
        assert_eq!(user.id(), "58b2aef6d9f0163f6eee636e");
        assert_eq!(user.name(), "Irene");
        assert_eq!(user.email(), Some("irene@gmail.com"));
        assert_eq!(user.photo_url(), Some("http://images.com/irene.jpg"));
        assert_eq!(user.favorites().len(), 2);
        assert!(user.is_favorite("1111"));
        assert!(user.is_favorite("2222"));
        assert_eq!(user.registration_token(), None);
    }

    #[test]
    fn test_user_favorites_are_unique() {
        let user = User::builder("u1")
            .favorite("1111")
            .favorite("1111")
            .favorite("2222")
            .build()
            .unwrap();
        assert_eq!(user.favorites().len(), 2);

        let user = user.to_builder().remove_favorite("1111").build().unwrap();
        assert!(!user.is_favorite("1111"));
    }

    #[test]
    fn test_user_equality_ignores_favorite_order() {
        let a = User::builder("u1").favorites(["2222", "1111"]).build().unwrap();
        let b = User::builder("u1").favorites(["1111", "2222"]).build().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_user_builder_rejects_invalid_fields() {
        assert!(User::builder("").build().is_err());
        assert!(User::builder("u1").email("not-an-email").build().is_err());
        assert!(User::builder("u1").photo_url("images/irene.jpg").build().is_err());
        assert!(User::builder("u1").favorite("").build().is_err());
        assert!(User::builder("u1").registration_token("").build().is_err());
    }

    #[test]
    fn test_to_builder_leaves_original_untouched() {
        let user = irene();
        let updated = user.to_builder().name("Irene G.").build().unwrap();
        assert_eq!(user.name(), "Irene");
        assert_eq!(updated.name(), "Irene G.");
        assert_eq!(updated.favorites(), user.favorites());
    }

    #[test]
    fn test_user_json_goes_through_builder() {
        let json = serde_json::to_string(&irene()).unwrap();
        assert!(json.contains("\"photoUrl\""));
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, irene());

        let bad = r#"{"id":"u1","email":"nope"}"#;
        assert!(serde_json::from_str::<User>(bad).is_err());
    }

    #[test]
    fn test_pub_builder() {
        let venue = Pub::builder("1111", "The Crown")
            .address("Calle Mayor 1, Madrid")
            .location(40.4168, -3.7038)
            .phone("+34 600 000 000")
            .build()
            .unwrap();
        assert_eq!(venue.name(), "The Crown");
        assert_eq!(venue.location(), Some((40.4168, -3.7038)));
    }

    #[test]
    fn test_pub_builder_rejects_invalid_fields() {
        assert!(Pub::builder("1111", "").build().is_err());
        assert!(Pub::builder("1111", "Bar").location(95.0, 0.0).build().is_err());

        let half_located: Pub = Pub::builder("1111", "Bar")
            .location(40.0, 3.0)
            .build()
            .unwrap();
        let json = serde_json::to_value(&half_located).unwrap();
        let mut json = json.as_object().unwrap().clone();
        json.insert("longitude".into(), serde_json::Value::Null);
        assert!(serde_json::from_value::<Pub>(serde_json::Value::Object(json)).is_err());
    }

    #[test]
    fn test_event_builder() {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 20, 0, 0).unwrap();
        let event = Event::builder("e1", "Pub Quiz", start)
            .ends_at(start + Duration::hours(3))
            .hosted_at("1111")
            .hosted_at("2222")
            .build()
            .unwrap();

        assert!(event.is_hosted_at("1111"));
        assert_eq!(event.pub_ids().len(), 2);
        assert!(!event.is_finished(start + Duration::hours(1)));
        assert!(event.is_finished(start + Duration::hours(4)));
    }

    #[test]
    fn test_event_rejects_end_before_start() {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 20, 0, 0).unwrap();
        let result = Event::builder("e1", "Pub Quiz", start)
            .ends_at(start - Duration::minutes(1))
            .build();
        assert!(matches!(result, Err(CoreError::InvalidSchedule { .. })));
    }
}
