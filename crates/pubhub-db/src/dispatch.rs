//! # Callback Dispatch
//!
//! Runs [`DbManager`] operations on a tokio runtime and reports each outcome
//! to a [`Listener`].
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller thread                     runtime workers                      │
//! │                                                                         │
//! │  async_manager.save_user(user, l)                                      │
//! │       │  spawn ───────────────►  op task:  manager.save_user(&user)    │
//! │       │  spawn ───────────────►  report task: awaits op JoinHandle     │
//! │       ▼                                │                                │
//! │  returns JoinHandle<()>                ├── Ok(Ok(v))  → l.on_success(v) │
//! │  (awaiting it is optional)             ├── Ok(Err(e)) → l.on_error(e)   │
//! │                                        └── panicked   → l.on_error(     │
//! │                                                          TaskFailed)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The operation runs in its own task so a panic inside it is caught by the
//! runtime and still reaches the listener. Operations are not cancellable:
//! dropping the returned handle detaches it. If the runtime shuts down first,
//! whether before dispatch or with the operation in flight, the listener
//! receives `DbError::RuntimeUnavailable` on the thread that dropped the task.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{DbError, DbResult};
use crate::listener::Listener;
use crate::manager::DbManager;
use pubhub_core::{Event, EventList, Pub, PubList, User};

/// Callback surface over a shared [`DbManager`].
#[derive(Debug, Clone)]
pub struct AsyncManager {
    manager: Arc<dyn DbManager>,
    handle: Handle,
}

impl AsyncManager {
    /// Dispatches onto the given runtime.
    pub fn new(manager: Arc<dyn DbManager>, handle: Handle) -> Self {
        AsyncManager { manager, handle }
    }

    /// Dispatches onto the runtime the caller is running in.
    ///
    /// ## Errors
    /// `DbError::RuntimeUnavailable` when called outside a tokio runtime.
    pub fn current(manager: Arc<dyn DbManager>) -> DbResult<Self> {
        let handle =
            Handle::try_current().map_err(|e| DbError::RuntimeUnavailable(e.to_string()))?;
        Ok(AsyncManager { manager, handle })
    }

    /// Returns the wrapped manager.
    pub fn manager(&self) -> &Arc<dyn DbManager> {
        &self.manager
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn get_user<L>(&self, id: impl Into<String>, listener: L) -> JoinHandle<()>
    where
        L: Listener<Option<User>>,
    {
        let id = id.into();
        self.dispatch("get_user", listener, move |m| async move { m.get_user(&id).await })
    }

    pub fn save_user<L>(&self, user: User, listener: L) -> JoinHandle<()>
    where
        L: Listener<()>,
    {
        self.dispatch("save_user", listener, move |m| async move { m.save_user(&user).await })
    }

    pub fn remove_user<L>(&self, id: impl Into<String>, listener: L) -> JoinHandle<()>
    where
        L: Listener<()>,
    {
        let id = id.into();
        self.dispatch("remove_user", listener, move |m| async move { m.remove_user(&id).await })
    }

    // =========================================================================
    // Pubs
    // =========================================================================

    pub fn get_pub<L>(&self, id: impl Into<String>, listener: L) -> JoinHandle<()>
    where
        L: Listener<Option<Pub>>,
    {
        let id = id.into();
        self.dispatch("get_pub", listener, move |m| async move { m.get_pub(&id).await })
    }

    pub fn save_pub<L>(&self, venue: Pub, listener: L) -> JoinHandle<()>
    where
        L: Listener<()>,
    {
        self.dispatch("save_pub", listener, move |m| async move { m.save_pub(&venue).await })
    }

    pub fn remove_pub<L>(&self, id: impl Into<String>, listener: L) -> JoinHandle<()>
    where
        L: Listener<()>,
    {
        let id = id.into();
        self.dispatch("remove_pub", listener, move |m| async move { m.remove_pub(&id).await })
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn get_event<L>(&self, id: impl Into<String>, listener: L) -> JoinHandle<()>
    where
        L: Listener<Option<Event>>,
    {
        let id = id.into();
        self.dispatch("get_event", listener, move |m| async move { m.get_event(&id).await })
    }

    pub fn save_event<L>(&self, event: Event, listener: L) -> JoinHandle<()>
    where
        L: Listener<()>,
    {
        self.dispatch("save_event", listener, move |m| async move { m.save_event(&event).await })
    }

    pub fn remove_event<L>(&self, id: impl Into<String>, listener: L) -> JoinHandle<()>
    where
        L: Listener<()>,
    {
        let id = id.into();
        self.dispatch("remove_event", listener, move |m| async move { m.remove_event(&id).await })
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    pub fn get_events_from_pub<L>(&self, pub_id: impl Into<String>, listener: L) -> JoinHandle<()>
    where
        L: Listener<EventList>,
    {
        let pub_id = pub_id.into();
        self.dispatch("get_events_from_pub", listener, move |m| async move {
            m.get_events_from_pub(&pub_id).await
        })
    }

    pub fn get_pubs_from_event<L>(&self, event_id: impl Into<String>, listener: L) -> JoinHandle<()>
    where
        L: Listener<PubList>,
    {
        let event_id = event_id.into();
        self.dispatch("get_pubs_from_event", listener, move |m| async move {
            m.get_pubs_from_event(&event_id).await
        })
    }

    pub fn get_favorites_from_user<L>(
        &self,
        user_id: impl Into<String>,
        listener: L,
    ) -> JoinHandle<()>
    where
        L: Listener<PubList>,
    {
        let user_id = user_id.into();
        self.dispatch("get_favorites_from_user", listener, move |m| async move {
            m.get_favorites_from_user(&user_id).await
        })
    }

    /// Spawns `op` and reports its outcome to `listener` exactly once.
    fn dispatch<T, L, F, Fut>(&self, name: &'static str, listener: L, op: F) -> JoinHandle<()>
    where
        T: Send + 'static,
        L: Listener<T>,
        F: FnOnce(Arc<dyn DbManager>) -> Fut,
        Fut: Future<Output = DbResult<T>> + Send + 'static,
    {
        debug!(op = name, "Dispatching operation");
        let delivery = Delivery::new(name, listener);
        let task = self.handle.spawn(op(Arc::clone(&self.manager)));

        self.handle.spawn(async move {
            match task.await {
                Ok(Ok(value)) => delivery.success(value),
                Ok(Err(err)) => {
                    debug!(op = name, error = %err, "Operation failed");
                    delivery.error(err);
                }
                Err(join_err) if join_err.is_cancelled() => {
                    delivery.error(runtime_gone(name));
                }
                Err(join_err) => {
                    error!(op = name, error = %join_err, "Operation task did not complete");
                    delivery.error(DbError::TaskFailed(format!("{name}: {join_err}")));
                }
            }
        })
    }
}

fn runtime_gone(name: &str) -> DbError {
    DbError::RuntimeUnavailable(format!("{name}: runtime shut down before the operation completed"))
}

/// Owns a listener until one callback has been delivered.
///
/// A report task that never runs (spawned onto a runtime that is shut down,
/// or dropped by one shutting down mid-operation) still drops its `Delivery`,
/// and the drop reports `RuntimeUnavailable`.
struct Delivery<T, L: Listener<T>> {
    op: &'static str,
    listener: Option<L>,
    _value: PhantomData<fn(T)>,
}

impl<T, L: Listener<T>> Delivery<T, L> {
    fn new(op: &'static str, listener: L) -> Self {
        Delivery {
            op,
            listener: Some(listener),
            _value: PhantomData,
        }
    }

    fn success(mut self, value: T) {
        if let Some(listener) = self.listener.take() {
            listener.on_success(value);
        }
    }

    fn error(mut self, err: DbError) {
        if let Some(listener) = self.listener.take() {
            listener.on_error(err);
        }
    }
}

impl<T, L: Listener<T>> Drop for Delivery<T, L> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            warn!(op = self.op, "Operation dropped before completing");
            listener.on_error(runtime_gone(self.op));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::CallbackListener;
    use crate::manager::sqlite::SqliteManager;
    use crate::pool::DbConfig;
    use tokio::sync::oneshot;

    async fn async_manager() -> AsyncManager {
        let manager = SqliteManager::connect(DbConfig::in_memory()).await.unwrap();
        AsyncManager::current(Arc::new(manager)).unwrap()
    }

    #[test]
    fn test_current_outside_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let manager = runtime
            .block_on(SqliteManager::connect(DbConfig::in_memory()))
            .unwrap();

        let result = AsyncManager::current(Arc::new(manager));
        assert!(matches!(result, Err(DbError::RuntimeUnavailable(_))));
    }

    #[tokio::test]
    async fn test_save_then_get_through_listeners() {
        let async_manager = async_manager().await;
        let user = User::builder("u1").name("Irene").build().unwrap();

        let (tx, rx) = oneshot::channel::<DbResult<()>>();
        async_manager.save_user(user.clone(), tx);
        rx.await.unwrap().unwrap();

        let (tx, rx) = oneshot::channel::<DbResult<Option<User>>>();
        async_manager.get_user("u1", tx);
        assert_eq!(rx.await.unwrap().unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_error_reaches_on_error() {
        let async_manager = async_manager().await;
        async_manager.manager().close().await;

        let (tx, rx) = oneshot::channel::<&'static str>();
        async_manager
            .get_pub(
                "1111",
                CallbackListener::new(
                    |_: Option<Pub>| panic!("success must not fire"),
                    move |_: DbError| {
                        let _ = tx.send("error");
                    },
                ),
            )
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap(), "error");
    }

    #[tokio::test]
    async fn test_panicking_operation_reports_task_failed() {
        let async_manager = async_manager().await;

        let (tx, rx) = oneshot::channel::<DbResult<u32>>();
        async_manager
            .dispatch("explode", tx, |_| async move {
                if true {
                    panic!("operation exploded");
                }
                Ok(1)
            })
            .await
            .unwrap();

        match rx.await.unwrap() {
            Err(DbError::TaskFailed(msg)) => assert!(msg.starts_with("explode")),
            other => panic!("expected TaskFailed, got {other:?}"),
        }
    }

    fn worker_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_shut_down_runtime_still_reports() {
        let runtime = worker_runtime();
        let manager = runtime
            .block_on(SqliteManager::connect(DbConfig::in_memory()))
            .unwrap();
        let async_manager = AsyncManager::new(Arc::new(manager), runtime.handle().clone());
        runtime.shutdown_background();

        let (tx, rx) = oneshot::channel::<DbResult<Option<User>>>();
        async_manager.get_user("u1", tx);

        match rx.blocking_recv().unwrap() {
            Err(DbError::RuntimeUnavailable(msg)) => assert!(msg.starts_with("get_user")),
            other => panic!("expected RuntimeUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_operation_in_flight_at_shutdown_reports() {
        let runtime = worker_runtime();
        let manager = runtime
            .block_on(SqliteManager::connect(DbConfig::in_memory()))
            .unwrap();
        let async_manager = AsyncManager::new(Arc::new(manager), runtime.handle().clone());

        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (tx, rx) = oneshot::channel::<DbResult<u32>>();
        async_manager.dispatch("stall", tx, move |_| async move {
            let _ = started_tx.send(());
            std::future::pending::<()>().await;
            Ok(1)
        });

        started_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        drop(runtime);

        match rx.blocking_recv().unwrap() {
            Err(DbError::RuntimeUnavailable(msg)) => assert!(msg.starts_with("stall")),
            other => panic!("expected RuntimeUnavailable, got {other:?}"),
        }
    }
}
