//! # Repository Module
//!
//! SQLite repositories backing the [`SqliteManager`](crate::manager::sqlite::SqliteManager).
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  DbManager::save_user(&user)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UserRepository                                                        │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── upsert(&self, &user)      ← one transaction: row + favorites      │
//! │  └── delete(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Users and their favorites
//! - [`PubRepository`](pub_venue::PubRepository) - Pubs, pubs by event, favorite pubs
//! - [`EventRepository`](event::EventRepository) - Events and events by pub
//!
//! ## Pub Identifiers
//!
//! Favorites and event links reference the `pub_ids` table rather than
//! `pubs`, so a user can favor a pub that is not stored locally. An id stays
//! in `pub_ids` while a pub, favorite or event link refers to it. Every delete
//! and every list replacement prunes the rest in the same transaction.

pub mod event;
pub mod pub_venue;
pub mod user;

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::warn;

use crate::error::{DbError, DbResult};
use crate::record::PubIdRecord;

/// Commits `tx` if `result` is Ok, otherwise rolls it back before returning
/// the error, so a failed write never leaves partial state behind.
pub(crate) async fn finish<T>(
    tx: Transaction<'_, Sqlite>,
    result: Result<T, sqlx::Error>,
    entity: &str,
    id: &str,
) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(DbError::transaction)?;
            Ok(value)
        }
        Err(err) => {
            warn!(entity, id, error = %err, "Write failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(entity, id, error = %rollback_err, "Rollback failed");
            }
            Err(DbError::transaction(err))
        }
    }
}

/// Registers the ids in the `pub_ids` identifier table.
pub(crate) async fn ensure_pub_ids(
    conn: &mut SqliteConnection,
    ids: &[PubIdRecord],
) -> Result<(), sqlx::Error> {
    for pub_id in ids {
        sqlx::query("INSERT OR IGNORE INTO pub_ids (id) VALUES (?1)")
            .bind(&pub_id.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Drops `pub_ids` rows that no pub, favorite or event link refers to.
pub(crate) async fn prune_pub_ids(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM pub_ids
        WHERE id NOT IN (SELECT id FROM pubs)
          AND id NOT IN (SELECT pub_id FROM user_favorites)
          AND id NOT IN (SELECT pub_id FROM event_pubs)
        "#,
    )
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}
