//! # Data-Access Manager
//!
//! The storage-agnostic interface the rest of the application talks to.
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Data-Access Surfaces                               │
//! │                                                                         │
//! │  async caller            callback caller           sync caller         │
//! │       │                        │                         │              │
//! │       │                        ▼                         ▼              │
//! │       │                  AsyncManager              BlockingManager     │
//! │       │              (spawn + Listener<T>)     (owned 1-worker runtime) │
//! │       │                        │                         │              │
//! │       ▼                        ▼                         ▼              │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │               Arc<dyn DbManager>  (this module)               │     │
//! │  └───────────────────────────────────────────────────────────────┘     │
//! │                                │                                        │
//! │                                ▼                                        │
//! │            SqliteManager ── Database ── repositories                   │
//! │         (chosen by DbManagerBuilder from the DbType registry)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Semantics
//! - `get_*` returns `Ok(None)` for an unknown id.
//! - `save_*` is an upsert keyed by id; the row and its id list are written
//!   in one transaction.
//! - `remove_*` on an unknown id succeeds without changing anything.
//! - Relationship reads return an empty aggregate when nothing matches.

pub mod builder;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DbError, DbResult};
use pubhub_core::{Event, EventList, Pub, PubList, User};

// =============================================================================
// Backend Tag
// =============================================================================

/// Storage backend tag used to pick a manager implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbType {
    /// Embedded SQLite through sqlx.
    #[default]
    Sqlite,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for DbType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DbType::Sqlite),
            other => Err(DbError::UnsupportedBackend(other.to_string())),
        }
    }
}

// =============================================================================
// Manager Trait
// =============================================================================

/// Data-access operations over users, pubs and events.
///
/// Implementations are shared as `Arc<dyn DbManager>` and must be safe to
/// call from any task.
#[async_trait]
pub trait DbManager: Send + Sync + fmt::Debug {
    /// Backend tag of this implementation.
    fn db_type(&self) -> DbType;

    // -- Users ---------------------------------------------------------------

    async fn get_user(&self, id: &str) -> DbResult<Option<User>>;

    async fn save_user(&self, user: &User) -> DbResult<()>;

    async fn remove_user(&self, id: &str) -> DbResult<()>;

    // -- Pubs ----------------------------------------------------------------

    async fn get_pub(&self, id: &str) -> DbResult<Option<Pub>>;

    async fn save_pub(&self, venue: &Pub) -> DbResult<()>;

    async fn remove_pub(&self, id: &str) -> DbResult<()>;

    // -- Events --------------------------------------------------------------

    async fn get_event(&self, id: &str) -> DbResult<Option<Event>>;

    async fn save_event(&self, event: &Event) -> DbResult<()>;

    async fn remove_event(&self, id: &str) -> DbResult<()>;

    // -- Relationships -------------------------------------------------------

    /// Events hosted at `pub_id`, ordered by start time.
    async fn get_events_from_pub(&self, pub_id: &str) -> DbResult<EventList>;

    /// Stored pubs hosting `event_id`, ordered by name.
    async fn get_pubs_from_event(&self, event_id: &str) -> DbResult<PubList>;

    /// Stored favorite pubs of `user_id`, in favorites order.
    async fn get_favorites_from_user(&self, user_id: &str) -> DbResult<PubList>;

    // -- Lifecycle -----------------------------------------------------------

    /// Returns true if the backend can serve queries.
    async fn health_check(&self) -> bool;

    /// Releases the storage session. Later operations fail.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_type_parsing() {
        assert_eq!("sqlite".parse::<DbType>().unwrap(), DbType::Sqlite);
        assert_eq!(" SQLite3 ".parse::<DbType>().unwrap(), DbType::Sqlite);
        assert!(matches!(
            "realm".parse::<DbType>(),
            Err(DbError::UnsupportedBackend(ref name)) if name == "realm"
        ));
    }

    #[test]
    fn test_db_type_default_and_display() {
        assert_eq!(DbType::default(), DbType::Sqlite);
        assert_eq!(DbType::Sqlite.to_string(), "sqlite");
    }
}
