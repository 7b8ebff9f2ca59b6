//! # Manager Builder
//!
//! Selects a backend from a registry of factories and produces a ready
//! `Arc<dyn DbManager>`.
//!
//! ## Build Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbManagerBuilder::new()          registry: { Sqlite → SqliteManager } │
//! │       │                                                                 │
//! │       ├── .register(tag, factory)  add or replace a backend            │
//! │       ├── .backend(tag)            pick one (default: Sqlite)          │
//! │       └── .init(DbConfig)          one-time setup parameters           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  .build().await                                                        │
//! │       ├── tag not registered  → Err(UnsupportedBackend)                │
//! │       ├── init() never called → warn!, ManagerConfig::load_or_default  │
//! │       └── factory(config)     → Arc<dyn DbManager>                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

use super::sqlite::SqliteManager;
use super::{DbManager, DbType};
use crate::config::ManagerConfig;
use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

/// Boxed future returned by backend factories.
pub type ManagerFuture = Pin<Box<dyn Future<Output = DbResult<Arc<dyn DbManager>>> + Send>>;

/// Constructor for one backend.
pub type ManagerFactory = Arc<dyn Fn(DbConfig) -> ManagerFuture + Send + Sync>;

/// Builder for data-access managers.
///
/// ## Example
/// ```rust,ignore
/// let manager = DbManagerBuilder::new()
///     .init(DbConfig::new("/data/pubhub.db"))
///     .build()
///     .await?;
/// ```
#[derive(Clone)]
pub struct DbManagerBuilder {
    backend: DbType,
    config: Option<DbConfig>,
    registry: HashMap<DbType, ManagerFactory>,
}

impl DbManagerBuilder {
    /// Creates a builder with the built-in backends registered.
    pub fn new() -> Self {
        Self::empty().register(DbType::Sqlite, connect_sqlite)
    }

    /// Creates a builder with no backends registered.
    pub fn empty() -> Self {
        DbManagerBuilder {
            backend: DbType::default(),
            config: None,
            registry: HashMap::new(),
        }
    }

    /// Builder preconfigured from a [`ManagerConfig`].
    pub fn from_config(config: &ManagerConfig) -> DbResult<Self> {
        Ok(Self::new()
            .backend(config.backend())
            .init(config.to_db_config()?))
    }

    /// Selects the backend to build.
    pub fn backend(mut self, backend: DbType) -> Self {
        self.backend = backend;
        self
    }

    /// Registers (or replaces) the factory for a backend tag.
    pub fn register<F, Fut>(mut self, backend: DbType, factory: F) -> Self
    where
        F: Fn(DbConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DbResult<Arc<dyn DbManager>>> + Send + 'static,
    {
        let factory: ManagerFactory =
            Arc::new(move |config| -> ManagerFuture { Box::pin(factory(config)) });
        self.registry.insert(backend, factory);
        self
    }

    /// Supplies the one-time setup parameters (path, pool, migrations).
    pub fn init(mut self, config: DbConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Returns true once [`init`](Self::init) has been called.
    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Returns true if a factory is registered for `backend`.
    pub fn is_registered(&self, backend: DbType) -> bool {
        self.registry.contains_key(&backend)
    }

    /// Builds the selected manager.
    ///
    /// ## Errors
    /// * `DbError::UnsupportedBackend` - No factory for the selected tag
    /// * Any error from opening the storage session
    pub async fn build(self) -> DbResult<Arc<dyn DbManager>> {
        let factory = self
            .registry
            .get(&self.backend)
            .cloned()
            .ok_or_else(|| DbError::UnsupportedBackend(self.backend.to_string()))?;

        let config = match self.config {
            Some(config) => config,
            None => {
                warn!(
                    backend = %self.backend,
                    "Manager built without init(), using default configuration"
                );
                ManagerConfig::load_or_default(None).to_db_config()?
            }
        };

        info!(backend = %self.backend, path = %config.database_path.display(), "Building data-access manager");
        factory(config).await
    }
}

async fn connect_sqlite(config: DbConfig) -> DbResult<Arc<dyn DbManager>> {
    let manager = SqliteManager::connect(config).await?;
    Ok(Arc::new(manager))
}

impl Default for DbManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DbManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbManagerBuilder")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("registered", &self.registry.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_build_after_init() {
        let manager = DbManagerBuilder::new()
            .init(DbConfig::in_memory())
            .build()
            .await
            .unwrap();

        assert_eq!(manager.db_type(), DbType::Sqlite);
        assert!(manager.health_check().await);
    }

    #[tokio::test]
    async fn test_unregistered_backend() {
        let builder = DbManagerBuilder::empty().init(DbConfig::in_memory());
        assert!(!builder.is_registered(DbType::Sqlite));

        let err = builder.build().await.unwrap_err();
        assert!(matches!(err, DbError::UnsupportedBackend(ref tag) if tag == "sqlite"));
    }

    #[tokio::test]
    async fn test_registered_factory_is_used() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let manager = DbManagerBuilder::empty()
            .register(DbType::Sqlite, move |config| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let manager = SqliteManager::connect(config).await?;
                    Ok::<_, DbError>(Arc::new(manager) as Arc<dyn DbManager>)
                }
            })
            .init(DbConfig::in_memory())
            .build()
            .await
            .unwrap();

        assert!(manager.health_check().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config() {
        let builder = DbManagerBuilder::from_config(&ManagerConfig::in_memory()).unwrap();
        assert!(builder.is_initialized());
        assert!(builder.is_registered(DbType::Sqlite));
        assert!(!DbManagerBuilder::new().is_initialized());
    }
}
