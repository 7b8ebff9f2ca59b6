//! # SQLite Manager
//!
//! [`DbManager`] implementation over the embedded SQLite [`Database`].

use async_trait::async_trait;
use tracing::debug;

use super::{DbManager, DbType};
use crate::error::DbResult;
use crate::pool::{Database, DbConfig};
use pubhub_core::{Event, EventList, Pub, PubList, User};

/// SQLite-backed data-access manager.
///
/// Owns the [`Database`] handle; there is no process-wide session.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    db: Database,
}

impl SqliteManager {
    /// Wraps an already opened database.
    pub fn new(db: Database) -> Self {
        SqliteManager { db }
    }

    /// Opens the database described by `config` (migrations included).
    pub async fn connect(config: DbConfig) -> DbResult<Self> {
        let db = Database::new(config).await?;
        Ok(SqliteManager { db })
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl DbManager for SqliteManager {
    fn db_type(&self) -> DbType {
        DbType::Sqlite
    }

    async fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        self.db.users().get_by_id(id).await
    }

    async fn save_user(&self, user: &User) -> DbResult<()> {
        self.db.users().upsert(user).await
    }

    async fn remove_user(&self, id: &str) -> DbResult<()> {
        if !self.db.users().delete(id).await? {
            debug!(id = %id, "Remove of unknown user ignored");
        }
        Ok(())
    }

    async fn get_pub(&self, id: &str) -> DbResult<Option<Pub>> {
        self.db.pubs().get_by_id(id).await
    }

    async fn save_pub(&self, venue: &Pub) -> DbResult<()> {
        self.db.pubs().upsert(venue).await
    }

    async fn remove_pub(&self, id: &str) -> DbResult<()> {
        if !self.db.pubs().delete(id).await? {
            debug!(id = %id, "Remove of unknown pub ignored");
        }
        Ok(())
    }

    async fn get_event(&self, id: &str) -> DbResult<Option<Event>> {
        self.db.events().get_by_id(id).await
    }

    async fn save_event(&self, event: &Event) -> DbResult<()> {
        self.db.events().upsert(event).await
    }

    async fn remove_event(&self, id: &str) -> DbResult<()> {
        if !self.db.events().delete(id).await? {
            debug!(id = %id, "Remove of unknown event ignored");
        }
        Ok(())
    }

    async fn get_events_from_pub(&self, pub_id: &str) -> DbResult<EventList> {
        self.db.events().list_by_pub(pub_id).await
    }

    async fn get_pubs_from_event(&self, event_id: &str) -> DbResult<PubList> {
        self.db.pubs().list_by_event(event_id).await
    }

    async fn get_favorites_from_user(&self, user_id: &str) -> DbResult<PubList> {
        self.db.pubs().list_favorites(user_id).await
    }

    async fn health_check(&self) -> bool {
        self.db.health_check().await
    }

    async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_unknown_ids_is_noop() {
        let manager = SqliteManager::connect(DbConfig::in_memory()).await.unwrap();

        manager.remove_user("ghost").await.unwrap();
        manager.remove_pub("ghost").await.unwrap();
        manager.remove_event("ghost").await.unwrap();

        assert!(manager.health_check().await);
        assert_eq!(manager.db_type(), DbType::Sqlite);
    }

    #[tokio::test]
    async fn test_pubs_from_event_ordered_by_name() {
        let manager = SqliteManager::connect(DbConfig::in_memory()).await.unwrap();
        let start = chrono::Utc::now();

        manager
            .save_pub(&Pub::builder("1111", "Zinc Bar").build().unwrap())
            .await
            .unwrap();
        manager
            .save_pub(&Pub::builder("2222", "Anchor").build().unwrap())
            .await
            .unwrap();
        manager
            .save_event(
                &Event::builder("e1", "Live Jazz", start)
                    .pub_ids(["1111", "2222", "3333"])
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let pubs = manager.get_pubs_from_event("e1").await.unwrap();
        assert_eq!(pubs.ids(), vec!["2222", "1111"]);
        assert!(manager.get_pubs_from_event("e9").await.unwrap().is_empty());
    }
}
