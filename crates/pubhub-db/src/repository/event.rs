//! # Event Repository
//!
//! Database operations for events and the pubs that host them.
//!
//! ## Hosting Links
//! ```text
//! events ──< event_pubs >── pub_ids
//!   id         event_id        id
//!              pub_id
//!              position   ← keeps the stored order of Event::pub_ids
//! ```
//!
//! An event may list pub ids whose pub was never saved; links only need the
//! id to exist in `pub_ids`, which upsert guarantees.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{ensure_pub_ids, finish, prune_pub_ids};
use crate::error::DbResult;
use crate::record::{EventRecord, PubIdRecord};
use pubhub_core::{Event, EventList};

/// Repository for event database operations.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    /// Creates a new EventRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EventRepository { pool }
    }

    /// Gets an event by id, hosting pub ids included.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Event>> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT id, name, description, starts_at, ends_at, photo_url
            FROM events
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut record) = record else {
            tx.commit().await?;
            debug!(id = %id, "Event not found");
            return Ok(None);
        };

        record.pub_ids = load_pub_ids(&mut tx, id).await?;
        tx.commit().await?;

        Ok(Some(Event::try_from(record)?))
    }

    /// Inserts or updates an event, replacing its hosting links.
    pub async fn upsert(&self, event: &Event) -> DbResult<()> {
        debug!(id = %event.id(), pubs = event.pub_ids().len(), "Saving event");

        let record = EventRecord::from(event);
        let mut tx = self.pool.begin().await?;
        let result = write_event(&mut tx, &record).await;

        finish(tx, result, "Event", &record.id).await
    }

    /// Deletes an event by id. Hosting links cascade.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting event");

        let mut tx = self.pool.begin().await?;

        let result: Result<bool, sqlx::Error> = async {
            let deleted = sqlx::query("DELETE FROM events WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                > 0;
            prune_pub_ids(&mut tx).await?;
            Ok(deleted)
        }
        .await;

        finish(tx, result, "Event", id).await
    }

    /// Lists the events hosted at a pub, ordered by start time.
    pub async fn list_by_pub(&self, pub_id: &str) -> DbResult<EventList> {
        let mut tx = self.pool.begin().await?;

        let mut records = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT e.id, e.name, e.description, e.starts_at, e.ends_at, e.photo_url
            FROM event_pubs ep
            INNER JOIN events e ON e.id = ep.event_id
            WHERE ep.pub_id = ?1
            ORDER BY e.starts_at, e.id
            "#,
        )
        .bind(pub_id)
        .fetch_all(&mut *tx)
        .await?;

        for record in &mut records {
            record.pub_ids = load_pub_ids(&mut tx, &record.id).await?;
        }
        tx.commit().await?;

        debug!(pub_id = %pub_id, count = records.len(), "Loaded events for pub");
        records.into_iter().map(Event::try_from).collect()
    }

    /// Counts stored events (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn load_pub_ids(
    conn: &mut SqliteConnection,
    event_id: &str,
) -> Result<Vec<PubIdRecord>, sqlx::Error> {
    sqlx::query_as::<_, PubIdRecord>(
        r#"
        SELECT pub_id AS id
        FROM event_pubs
        WHERE event_id = ?1
        ORDER BY position
        "#,
    )
    .bind(event_id)
    .fetch_all(conn)
    .await
}

async fn write_event(conn: &mut SqliteConnection, record: &EventRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO events (id, name, description, starts_at, ends_at, photo_url)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            starts_at = excluded.starts_at,
            ends_at = excluded.ends_at,
            photo_url = excluded.photo_url
        "#,
    )
    .bind(&record.id)
    .bind(&record.name)
    .bind(&record.description)
    .bind(record.starts_at)
    .bind(record.ends_at)
    .bind(&record.photo_url)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM event_pubs WHERE event_id = ?1")
        .bind(&record.id)
        .execute(&mut *conn)
        .await?;

    ensure_pub_ids(conn, &record.pub_ids).await?;

    for (position, pub_id) in record.pub_ids.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO event_pubs (event_id, pub_id, position)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&record.id)
        .bind(&pub_id.id)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    prune_pub_ids(conn).await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone, Utc};

    fn quiz() -> Event {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 20, 0, 0).unwrap();
        Event::builder("e1", "Pub Quiz", start)
            .ends_at(start + Duration::hours(2))
            .pub_ids(["1111", "2222"])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.events();

        repo.upsert(&quiz()).await.unwrap();
        assert_eq!(repo.get_by_id("e1").await.unwrap(), Some(quiz()));
        assert_eq!(repo.get_by_id("e2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_links() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.events();
        repo.upsert(&quiz()).await.unwrap();

        let moved = quiz().to_builder().pub_ids(["3333"]).build().unwrap();
        repo.upsert(&moved).await.unwrap();

        assert!(repo.list_by_pub("1111").await.unwrap().is_empty());
        assert_eq!(repo.list_by_pub("3333").await.unwrap().ids(), vec!["e1"]);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_by_pub_orders_by_start() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.events();

        let late = quiz();
        let early = Event::builder("e0", "Tasting", late.starts_at() - Duration::days(1))
            .hosted_at("1111")
            .build()
            .unwrap();
        repo.upsert(&late).await.unwrap();
        repo.upsert(&early).await.unwrap();

        let events = repo.list_by_pub("1111").await.unwrap();
        assert_eq!(events.ids(), vec!["e0", "e1"]);
        assert_eq!(events.get("e1"), Some(&late));
    }

    #[tokio::test]
    async fn test_delete_cascades_links() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.events();
        repo.upsert(&quiz()).await.unwrap();

        assert!(repo.delete("e1").await.unwrap());
        assert!(repo.list_by_pub("1111").await.unwrap().is_empty());
    }
}
