//! # Listener Contract
//!
//! Completion callbacks for operations dispatched through
//! [`AsyncManager`](crate::dispatch::AsyncManager).
//!
//! ```text
//!   operation ──► Ok(value)  ──► listener.on_success(value)
//!             └─► Err(error) ──► listener.on_error(error)
//! ```
//!
//! Both methods take `self` by value: a listener is consumed by the first
//! callback, so it can never be notified twice.

use tokio::sync::oneshot;

use crate::error::{DbError, DbResult};

/// Receives the outcome of one data-access operation.
///
/// Callbacks run on a runtime worker thread, not on the thread that
/// dispatched the operation.
pub trait Listener<T>: Send + 'static {
    /// Called with the operation's result value.
    fn on_success(self, value: T);

    /// Called with the failure (including a panicked operation).
    fn on_error(self, error: DbError);
}

/// Listener built from a pair of closures.
///
/// ## Example
/// ```rust,ignore
/// let listener = CallbackListener::new(
///     |user| println!("loaded {:?}", user),
///     |err| eprintln!("failed: {err}"),
/// );
/// async_manager.get_user("58b2aef6d9f0163f6eee636e", listener);
/// ```
pub struct CallbackListener<S, E> {
    on_success: S,
    on_error: E,
}

impl<S, E> CallbackListener<S, E> {
    pub fn new(on_success: S, on_error: E) -> Self {
        CallbackListener {
            on_success,
            on_error,
        }
    }
}

impl<T, S, E> Listener<T> for CallbackListener<S, E>
where
    S: FnOnce(T) + Send + 'static,
    E: FnOnce(DbError) + Send + 'static,
{
    fn on_success(self, value: T) {
        (self.on_success)(value)
    }

    fn on_error(self, error: DbError) {
        (self.on_error)(error)
    }
}

/// Forwards the outcome to the paired receiver. A dropped receiver is ignored.
impl<T: Send + 'static> Listener<T> for oneshot::Sender<DbResult<T>> {
    fn on_success(self, value: T) {
        let _ = self.send(Ok(value));
    }

    fn on_error(self, error: DbError) {
        let _ = self.send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_callback_listener_routes_outcome() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let ok = Arc::clone(&seen);
        let err = Arc::clone(&seen);
        let listener = CallbackListener::new(
            move |value: u32| ok.lock().unwrap().push(format!("ok {value}")),
            move |error: DbError| err.lock().unwrap().push(format!("err {error}")),
        );
        Listener::<u32>::on_success(listener, 7);

        let err = Arc::clone(&seen);
        let listener = CallbackListener::new(
            |_: u32| panic!("success must not fire"),
            move |error: DbError| err.lock().unwrap().push(format!("err {error}")),
        );
        Listener::<u32>::on_error(listener, DbError::PoolExhausted);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["ok 7".to_string(), "err Connection pool exhausted".to_string()]
        );
    }

    #[test]
    fn test_oneshot_listener() {
        let (tx, mut rx) = oneshot::channel::<DbResult<&'static str>>();
        tx.on_success("done");
        assert_eq!(rx.try_recv().unwrap().unwrap(), "done");

        let (tx, mut rx) = oneshot::channel::<DbResult<()>>();
        tx.on_error(DbError::not_found("User", "u1"));
        assert!(matches!(rx.try_recv().unwrap(), Err(DbError::NotFound { .. })));

        // Receiver gone: delivery is silently dropped
        let (tx, rx) = oneshot::channel::<DbResult<()>>();
        drop(rx);
        tx.on_success(());
    }
}
