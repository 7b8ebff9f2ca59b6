//! # Storage Records
//!
//! Row types mirroring the domain model, plus the mapping in both directions.
//!
//! ## Record Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Domain value  ⇄  Storage record                         │
//! │                                                                         │
//! │  User ─────────────────────────► UserRecord (users row)                │
//! │    favorites: {"1111","2222"}      favorites: [PubIdRecord("1111"),    │
//! │                                                PubIdRecord("2222")]    │
//! │                                      └── user_favorites rows           │
//! │                                                                         │
//! │  Pub ──────────────────────────► PubRecord (pubs row)                  │
//! │                                                                         │
//! │  Event ────────────────────────► EventRecord (events row)              │
//! │    pub_ids: {"1111"}               pub_ids: [PubIdRecord("1111")]      │
//! │                                      └── event_pubs rows               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mapping Rules
//! - Domain → record is infallible (`From`).
//! - Record → domain goes through the domain builders (`TryFrom`), so a row
//!   that no longer validates surfaces as [`DbError::Corrupted`].
//! - A record with no list rows maps to an empty set domain-side; duplicate
//!   ids in a stored list collapse into one element.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::error::{DbError, DbResult};
use pubhub_core::{Event, Pub, User};

// =============================================================================
// PubIdRecord
// =============================================================================

/// Single-field identifier record used for lists of pub ids.
///
/// Equality is defined by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, FromRow)]
pub struct PubIdRecord {
    pub id: String,
}

impl PubIdRecord {
    pub fn new(id: impl Into<String>) -> Self {
        PubIdRecord { id: id.into() }
    }
}

impl From<&str> for PubIdRecord {
    fn from(id: &str) -> Self {
        PubIdRecord::new(id)
    }
}

impl From<&String> for PubIdRecord {
    fn from(id: &String) -> Self {
        PubIdRecord::new(id.as_str())
    }
}

// =============================================================================
// UserRecord
// =============================================================================

/// Row of the `users` table plus its ordered favorites.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub registration_token: Option<String>,
    /// Loaded from `user_favorites`, ordered by position.
    #[sqlx(skip)]
    pub favorites: Vec<PubIdRecord>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        UserRecord {
            id: user.id().to_string(),
            name: user.name().to_string(),
            email: user.email().map(str::to_string),
            photo_url: user.photo_url().map(str::to_string),
            registration_token: user.registration_token().map(str::to_string),
            favorites: user.favorites().iter().map(PubIdRecord::from).collect(),
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = DbError;

    fn try_from(record: UserRecord) -> DbResult<Self> {
        let mut builder = User::builder(record.id.as_str())
            .name(record.name)
            .favorites(record.favorites.into_iter().map(|fav| fav.id));

        if let Some(email) = record.email {
            builder = builder.email(email);
        }
        if let Some(url) = record.photo_url {
            builder = builder.photo_url(url);
        }
        if let Some(token) = record.registration_token {
            builder = builder.registration_token(token);
        }

        builder
            .build()
            .map_err(|e| DbError::corrupted("User", record.id, e))
    }
}

// =============================================================================
// PubRecord
// =============================================================================

/// Row of the `pubs` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PubRecord {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
}

impl From<&Pub> for PubRecord {
    fn from(venue: &Pub) -> Self {
        PubRecord {
            id: venue.id().to_string(),
            name: venue.name().to_string(),
            address: venue.address().map(str::to_string),
            description: venue.description().map(str::to_string),
            latitude: venue.latitude(),
            longitude: venue.longitude(),
            photo_url: venue.photo_url().map(str::to_string),
            phone: venue.phone().map(str::to_string),
        }
    }
}

impl TryFrom<PubRecord> for Pub {
    type Error = DbError;

    fn try_from(record: PubRecord) -> DbResult<Self> {
        let mut builder = Pub::builder(record.id.as_str(), record.name);

        if let Some(address) = record.address {
            builder = builder.address(address);
        }
        if let Some(description) = record.description {
            builder = builder.description(description);
        }
        // A half-set location is rejected by the builder
        match (record.latitude, record.longitude) {
            (None, None) => {}
            (lat, lon) => {
                builder = builder.location(lat.unwrap_or(f64::NAN), lon.unwrap_or(f64::NAN));
            }
        }
        if let Some(url) = record.photo_url {
            builder = builder.photo_url(url);
        }
        if let Some(phone) = record.phone {
            builder = builder.phone(phone);
        }

        builder
            .build()
            .map_err(|e| DbError::corrupted("Pub", record.id, e))
    }
}

// =============================================================================
// EventRecord
// =============================================================================

/// Row of the `events` table plus its ordered hosting pubs.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub photo_url: Option<String>,
    /// Loaded from `event_pubs`, ordered by position.
    #[sqlx(skip)]
    pub pub_ids: Vec<PubIdRecord>,
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        EventRecord {
            id: event.id().to_string(),
            name: event.name().to_string(),
            description: event.description().map(str::to_string),
            starts_at: event.starts_at(),
            ends_at: event.ends_at(),
            photo_url: event.photo_url().map(str::to_string),
            pub_ids: event.pub_ids().iter().map(PubIdRecord::from).collect(),
        }
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = DbError;

    fn try_from(record: EventRecord) -> DbResult<Self> {
        let mut builder = Event::builder(record.id.as_str(), record.name, record.starts_at)
            .pub_ids(record.pub_ids.into_iter().map(|p| p.id));

        if let Some(description) = record.description {
            builder = builder.description(description);
        }
        if let Some(ends_at) = record.ends_at {
            builder = builder.ends_at(ends_at);
        }
        if let Some(url) = record.photo_url {
            builder = builder.photo_url(url);
        }

        builder
            .build()
            .map_err(|e| DbError::corrupted("Event", record.id, e))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn irene() -> User {
        User::builder("58b2aef6d9f0163f6eee636e")
            .name("Irene")
            .email("irene@gmail.com")
            .photo_url("http://images.com/irene.jpg")
            .favorites(["1111", "2222"])
            .registration_token("fcm-token-irene")
            .build()
            .unwrap()
    }

    #[test]
    fn test_user_round_trip() {
        let user = irene();
        let record = UserRecord::from(&user);

        assert_eq!(record.id, "58b2aef6d9f0163f6eee636e");
        assert_eq!(
            record.favorites,
            vec![PubIdRecord::new("1111"), PubIdRecord::new("2222")]
        );
        assert_eq!(record.registration_token.as_deref(), Some("fcm-token-irene"));

        let back = User::try_from(record.clone()).unwrap();
        assert_eq!(back, user);

        // map(unmap(map(U))) == map(U)
        assert_eq!(UserRecord::from(&back), record);
    }

    #[test]
    fn test_user_record_without_favorites_maps_to_empty_set() {
        let record = UserRecord {
            id: "u1".to_string(),
            name: String::new(),
            email: None,
            photo_url: None,
            registration_token: None,
            favorites: Vec::new(),
        };

        let user = User::try_from(record).unwrap();
        assert!(user.favorites().is_empty());
    }

    #[test]
    fn test_duplicate_favorites_collapse() {
        let mut record = UserRecord::from(&irene());
        record.favorites.push(PubIdRecord::new("1111"));

        let user = User::try_from(record).unwrap();
        assert_eq!(user.favorites().len(), 2);
    }

    #[test]
    fn test_corrupted_user_row() {
        let mut record = UserRecord::from(&irene());
        record.email = Some("broken".to_string());

        let err = User::try_from(record).unwrap_err();
        assert!(matches!(err, DbError::Corrupted { ref entity, .. } if entity == "User"));
    }

    #[test]
    fn test_pub_round_trip() {
        let venue = Pub::builder("1111", "The Crown")
            .address("Calle Mayor 1")
            .description("Craft beer and quiz nights")
            .location(40.4168, -3.7038)
            .photo_url("https://images.com/crown.jpg")
            .phone("+34 600 000 000")
            .build()
            .unwrap();

        let record = PubRecord::from(&venue);
        assert_eq!(Pub::try_from(record).unwrap(), venue);
    }

    #[test]
    fn test_pub_row_with_half_location_is_corrupted() {
        let record = PubRecord {
            id: "1111".to_string(),
            name: "The Crown".to_string(),
            address: None,
            description: None,
            latitude: Some(40.0),
            longitude: None,
            photo_url: None,
            phone: None,
        };

        assert!(matches!(
            Pub::try_from(record),
            Err(DbError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_event_round_trip() {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 20, 0, 0).unwrap();
        let event = Event::builder("e1", "Pub Quiz", start)
            .description("Teams of four")
            .ends_at(start + chrono::Duration::hours(2))
            .pub_ids(["2222", "1111"])
            .build()
            .unwrap();

        let record = EventRecord::from(&event);
        assert_eq!(
            record.pub_ids,
            vec![PubIdRecord::new("1111"), PubIdRecord::new("2222")]
        );
        assert_eq!(Event::try_from(record).unwrap(), event);
    }
}
