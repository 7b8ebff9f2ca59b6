//! # Blocking Manager
//!
//! Synchronous facade for callers without an async runtime.
//!
//! The manager owns a one-worker tokio runtime (the "main" execution context
//! for storage work). Every operation is spawned onto its `pubhub-db` worker
//! thread while the calling thread blocks on the result.
//!
//! Do not use it from inside an async context. Both `block_on` and dropping
//! the owned runtime panic there, so creating, calling and dropping a
//! `BlockingManager` all belong on plain threads. Use
//! [`BlockingManager::async_manager`] to hand a callback surface over the same
//! runtime to async code instead.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info, warn};

use crate::dispatch::AsyncManager;
use crate::error::{DbError, DbResult};
use crate::manager::builder::DbManagerBuilder;
use crate::manager::DbManager;
use pubhub_core::{Event, EventList, Pub, PubList, User};

const WORKER_THREAD_NAME: &str = "pubhub-db";

/// Blocking data-access manager.
#[derive(Debug)]
pub struct BlockingManager {
    manager: Arc<dyn DbManager>,
    runtime: Runtime,
}

impl BlockingManager {
    /// Starts the runtime and builds the manager on its worker.
    pub fn new(builder: DbManagerBuilder) -> DbResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(WORKER_THREAD_NAME)
            .enable_all()
            .build()
            .map_err(|e| DbError::RuntimeUnavailable(e.to_string()))?;

        let manager = runtime
            .block_on(runtime.spawn(builder.build()))
            .map_err(|e| DbError::TaskFailed(format!("build: {e}")))??;
        info!(backend = %manager.db_type(), "Blocking manager ready");

        Ok(BlockingManager { manager, runtime })
    }

    /// Returns the wrapped manager.
    pub fn manager(&self) -> Arc<dyn DbManager> {
        Arc::clone(&self.manager)
    }

    /// Callback surface dispatching onto this manager's runtime.
    ///
    /// The surface stays usable after this manager is closed or dropped, but
    /// every operation dispatched from then on reports
    /// `DbError::RuntimeUnavailable`.
    pub fn async_manager(&self) -> AsyncManager {
        AsyncManager::new(self.manager(), self.runtime.handle().clone())
    }

    pub fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        let id = id.to_owned();
        self.run("get_user", move |m| async move { m.get_user(&id).await })
    }

    pub fn save_user(&self, user: &User) -> DbResult<()> {
        let user = user.clone();
        self.run("save_user", move |m| async move { m.save_user(&user).await })
    }

    pub fn remove_user(&self, id: &str) -> DbResult<()> {
        let id = id.to_owned();
        self.run("remove_user", move |m| async move { m.remove_user(&id).await })
    }

    pub fn get_pub(&self, id: &str) -> DbResult<Option<Pub>> {
        let id = id.to_owned();
        self.run("get_pub", move |m| async move { m.get_pub(&id).await })
    }

    pub fn save_pub(&self, venue: &Pub) -> DbResult<()> {
        let venue = venue.clone();
        self.run("save_pub", move |m| async move { m.save_pub(&venue).await })
    }

    pub fn remove_pub(&self, id: &str) -> DbResult<()> {
        let id = id.to_owned();
        self.run("remove_pub", move |m| async move { m.remove_pub(&id).await })
    }

    pub fn get_event(&self, id: &str) -> DbResult<Option<Event>> {
        let id = id.to_owned();
        self.run("get_event", move |m| async move { m.get_event(&id).await })
    }

    pub fn save_event(&self, event: &Event) -> DbResult<()> {
        let event = event.clone();
        self.run("save_event", move |m| async move { m.save_event(&event).await })
    }

    pub fn remove_event(&self, id: &str) -> DbResult<()> {
        let id = id.to_owned();
        self.run("remove_event", move |m| async move { m.remove_event(&id).await })
    }

    pub fn get_events_from_pub(&self, pub_id: &str) -> DbResult<EventList> {
        let pub_id = pub_id.to_owned();
        self.run("get_events_from_pub", move |m| async move {
            m.get_events_from_pub(&pub_id).await
        })
    }

    pub fn get_pubs_from_event(&self, event_id: &str) -> DbResult<PubList> {
        let event_id = event_id.to_owned();
        self.run("get_pubs_from_event", move |m| async move {
            m.get_pubs_from_event(&event_id).await
        })
    }

    pub fn get_favorites_from_user(&self, user_id: &str) -> DbResult<PubList> {
        let user_id = user_id.to_owned();
        self.run("get_favorites_from_user", move |m| async move {
            m.get_favorites_from_user(&user_id).await
        })
    }

    /// Returns false when the check itself could not run.
    pub fn health_check(&self) -> bool {
        self.run("health_check", |m| async move { Ok(m.health_check().await) })
            .unwrap_or(false)
    }

    /// Closes the storage session and shuts the runtime down.
    pub fn close(self) {
        if let Err(err) = self.run("close", |m| async move {
            m.close().await;
            Ok(())
        }) {
            warn!(error = %err, "Closing the storage session failed");
        }
        info!("Blocking manager closed");
    }

    /// Runs `op` on the runtime worker and blocks until it finishes.
    fn run<T, F, Fut>(&self, name: &'static str, op: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn DbManager>) -> Fut,
        Fut: Future<Output = DbResult<T>> + Send + 'static,
    {
        let task = self.runtime.spawn(op(self.manager()));
        match self.runtime.block_on(task) {
            Ok(result) => result,
            Err(join_err) => {
                error!(op = name, error = %join_err, "Blocking operation did not complete");
                Err(DbError::TaskFailed(format!("{name}: {join_err}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;

    #[test]
    fn test_health_check_on_worker() {
        let manager = BlockingManager::new(DbManagerBuilder::new().init(DbConfig::in_memory()))
            .unwrap();
        assert!(manager.health_check());
        manager.close();
    }

    #[test]
    #[should_panic]
    fn test_drop_inside_async_context_panics() {
        let manager = BlockingManager::new(DbManagerBuilder::new().init(DbConfig::in_memory()))
            .unwrap();
        let outer = Builder::new_current_thread().build().unwrap();

        outer.block_on(async move { drop(manager) });
    }
}
