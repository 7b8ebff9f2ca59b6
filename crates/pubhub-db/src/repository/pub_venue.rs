//! # Pub Repository
//!
//! Database operations for pubs, including the two relationship reads that
//! return pubs: pubs hosting an event and a user's favorite pubs.

use sqlx::SqlitePool;
use tracing::debug;

use super::{ensure_pub_ids, finish, prune_pub_ids};
use crate::error::DbResult;
use crate::record::{PubIdRecord, PubRecord};
use pubhub_core::{Pub, PubList};

const PUB_COLUMNS: &str =
    "p.id, p.name, p.address, p.description, p.latitude, p.longitude, p.photo_url, p.phone";

/// Repository for pub database operations.
#[derive(Debug, Clone)]
pub struct PubRepository {
    pool: SqlitePool,
}

impl PubRepository {
    /// Creates a new PubRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PubRepository { pool }
    }

    /// Gets a pub by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Pub>> {
        let sql = format!("SELECT {PUB_COLUMNS} FROM pubs p WHERE p.id = ?1");

        let record = sqlx::query_as::<_, PubRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match record {
            Some(record) => Ok(Some(Pub::try_from(record)?)),
            None => {
                debug!(id = %id, "Pub not found");
                Ok(None)
            }
        }
    }

    /// Inserts or updates a pub.
    ///
    /// The id is registered in `pub_ids` in the same transaction, so favorites
    /// and event links can reference it.
    pub async fn upsert(&self, venue: &Pub) -> DbResult<()> {
        debug!(id = %venue.id(), name = %venue.name(), "Saving pub");

        let record = PubRecord::from(venue);
        let mut tx = self.pool.begin().await?;

        let result: Result<(), sqlx::Error> = async {
            ensure_pub_ids(&mut tx, &[PubIdRecord::new(record.id.as_str())]).await?;

            sqlx::query(
                r#"
                INSERT INTO pubs (id, name, address, description, latitude, longitude, photo_url, phone)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    address = excluded.address,
                    description = excluded.description,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude,
                    photo_url = excluded.photo_url,
                    phone = excluded.phone
                "#,
            )
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.address)
            .bind(&record.description)
            .bind(record.latitude)
            .bind(record.longitude)
            .bind(&record.photo_url)
            .bind(&record.phone)
            .execute(&mut *tx)
            .await?;

            Ok(())
        }
        .await;

        finish(tx, result, "Pub", &record.id).await
    }

    /// Deletes a pub by id.
    ///
    /// The id stays in `pub_ids` while users hold it as a favorite or events
    /// list it; otherwise it is pruned in the same transaction. Relationship
    /// reads skip pubs that no longer exist.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting pub");

        let mut tx = self.pool.begin().await?;

        let result: Result<bool, sqlx::Error> = async {
            let deleted = sqlx::query("DELETE FROM pubs WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                > 0;
            prune_pub_ids(&mut tx).await?;
            Ok(deleted)
        }
        .await;

        finish(tx, result, "Pub", id).await
    }

    /// Lists the pubs hosting an event, ordered by name.
    pub async fn list_by_event(&self, event_id: &str) -> DbResult<PubList> {
        let sql = format!(
            r#"
            SELECT {PUB_COLUMNS}
            FROM event_pubs ep
            INNER JOIN pubs p ON p.id = ep.pub_id
            WHERE ep.event_id = ?1
            ORDER BY p.name, p.id
            "#
        );

        let records = sqlx::query_as::<_, PubRecord>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(event_id = %event_id, count = records.len(), "Loaded pubs for event");
        records.into_iter().map(Pub::try_from).collect()
    }

    /// Lists a user's favorite pubs in stored favorites order.
    pub async fn list_favorites(&self, user_id: &str) -> DbResult<PubList> {
        let sql = format!(
            r#"
            SELECT {PUB_COLUMNS}
            FROM user_favorites f
            INNER JOIN pubs p ON p.id = f.pub_id
            WHERE f.user_id = ?1
            ORDER BY f.position
            "#
        );

        let records = sqlx::query_as::<_, PubRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(user_id = %user_id, count = records.len(), "Loaded favorite pubs");
        records.into_iter().map(Pub::try_from).collect()
    }

    /// Counts stored pubs (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pubs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
