//! # User Repository
//!
//! Database operations for users and their favorites.
//!
//! ## Upsert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  1. INSERT INTO users ... ON CONFLICT(id) DO UPDATE                    │
//! │  2. DELETE FROM user_favorites WHERE user_id = ?                       │
//! │  3. INSERT OR IGNORE INTO pub_ids (one per favorite)                   │
//! │  4. INSERT INTO user_favorites (user_id, pub_id, position)             │
//! │                                                                         │
//! │  COMMIT ← all or nothing; any failure rolls back before returning      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{ensure_pub_ids, finish, prune_pub_ids};
use crate::error::DbResult;
use crate::record::{PubIdRecord, UserRecord};
use pubhub_core::User;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by id, favorites included.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - User not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        // Row and favorites are read from the same snapshot
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, photo_url, registration_token
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut record) = record else {
            tx.commit().await?;
            debug!(id = %id, "User not found");
            return Ok(None);
        };

        record.favorites = load_favorites(&mut tx, id).await?;
        tx.commit().await?;

        Ok(Some(User::try_from(record)?))
    }

    /// Inserts or updates a user, replacing its favorites.
    pub async fn upsert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id(), favorites = user.favorites().len(), "Saving user");

        let record = UserRecord::from(user);
        let mut tx = self.pool.begin().await?;
        let result = write_user(&mut tx, &record).await;

        finish(tx, result, "User", &record.id).await
    }

    /// Deletes a user by id. Favorites rows cascade.
    ///
    /// ## Returns
    /// `true` if a user was deleted, `false` if the id was unknown.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting user");

        let mut tx = self.pool.begin().await?;

        let result: Result<bool, sqlx::Error> = async {
            let deleted = sqlx::query("DELETE FROM users WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                > 0;
            prune_pub_ids(&mut tx).await?;
            Ok(deleted)
        }
        .await;

        finish(tx, result, "User", id).await
    }

    /// Counts stored users (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn load_favorites(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<PubIdRecord>, sqlx::Error> {
    sqlx::query_as::<_, PubIdRecord>(
        r#"
        SELECT pub_id AS id
        FROM user_favorites
        WHERE user_id = ?1
        ORDER BY position
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}

async fn write_user(conn: &mut SqliteConnection, record: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, photo_url, registration_token)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            email = excluded.email,
            photo_url = excluded.photo_url,
            registration_token = excluded.registration_token
        "#,
    )
    .bind(&record.id)
    .bind(&record.name)
    .bind(&record.email)
    .bind(&record.photo_url)
    .bind(&record.registration_token)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM user_favorites WHERE user_id = ?1")
        .bind(&record.id)
        .execute(&mut *conn)
        .await?;

    ensure_pub_ids(conn, &record.favorites).await?;

    for (position, favorite) in record.favorites.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO user_favorites (user_id, pub_id, position)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&record.id)
        .bind(&favorite.id)
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
