//! # pubhub-db: Data-Access Layer for Pubhub
//!
//! This crate persists users, pubs and events in an embedded SQLite database
//! (sqlx) and exposes them through a storage-agnostic manager interface.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pubhub Data Flow                                 │
//! │                                                                         │
//! │  App code: login, favorites screen, events screen                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pubhub-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │  DbManagerBuilder ──► Arc<dyn DbManager> ◄── AsyncManager       │   │
//! │  │   (registry)              │                  (Listener<T>)      │   │
//! │  │                           │             ◄── BlockingManager     │   │
//! │  │                           ▼                                     │   │
//! │  │   ┌───────────────┐  ┌───────────────┐  ┌──────────────┐       │   │
//! │  │   │   Database    │  │ Repositories  │  │  Migrations  │       │   │
//! │  │   │   (pool.rs)   │◄─│ users / pubs  │  │  (embedded)  │       │   │
//! │  │   │  SqlitePool   │  │ events        │  │ 001_init.sql │       │   │
//! │  │   └───────────────┘  └───────┬───────┘  └──────────────┘       │   │
//! │  │                              │ record.rs: User ⇄ UserRecord     │   │
//! │  └──────────────────────────────┼──────────────────────────────────┘   │
//! │                                 ▼                                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/pubhub.db                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`record`] - Storage records and domain mapping
//! - [`repository`] - SQL for users, pubs and events
//! - [`manager`] - `DbManager` trait, `DbType`, builder and SQLite backend
//! - [`listener`] / [`dispatch`] - Callback surface
//! - [`blocking`] - Synchronous surface
//! - [`config`] - `pubhub.toml` and environment settings
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pubhub_db::{DbConfig, DbManagerBuilder};
//!
//! let manager = DbManagerBuilder::new()
//!     .init(DbConfig::new("path/to/pubhub.db"))
//!     .build()
//!     .await?;
//!
//! manager.save_user(&user).await?;
//! let favorites = manager.get_favorites_from_user(user.id()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod blocking;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod listener;
pub mod manager;
pub mod migrations;
pub mod pool;
pub mod record;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use blocking::BlockingManager;
pub use config::ManagerConfig;
pub use dispatch::AsyncManager;
pub use error::{DbError, DbResult};
pub use listener::{CallbackListener, Listener};
pub use manager::builder::DbManagerBuilder;
pub use manager::sqlite::SqliteManager;
pub use manager::{DbManager, DbType};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::event::EventRepository;
pub use repository::pub_venue::PubRepository;
pub use repository::user::UserRepository;
