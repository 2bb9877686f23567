//! Registry of observers interested in daemon state changes.
//!
//! Listeners receive no arguments: they call back into the coordinator when
//! they need the new state. A listener that fails, whether by returning an
//! error or by panicking, is reported and skipped; the remaining listeners in
//! the round are still notified.

use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use thiserror::Error;

use crate::health::HealthReporter;
use crate::native::panic_message;

/// Fault reported by a listener callback.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ListenerError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-friendly description without the optional source.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Observer notified after every committed state change.
pub trait StateListener: Send + Sync {
    /// Invoked once per transition, after the new state is visible.
    fn state_changed(&self) -> Result<(), ListenerError>;
}

impl<F> StateListener for F
where
    F: Fn() -> Result<(), ListenerError> + Send + Sync,
{
    fn state_changed(&self) -> Result<(), ListenerError> {
        self()
    }
}

/// Set of registered listeners keyed by `Arc` identity.
///
/// Callers serialise `register`, `unregister` and `notify_all` through the
/// coordinator's transition lock; the registry's own lock only guards the
/// vector and is never held while callbacks run.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn StateListener>>>,
    notifier: Mutex<Option<ThreadId>>,
}

impl ListenerRegistry {
    /// Adds `listener`, returning `false` when it was already registered.
    pub(crate) fn register(&self, listener: Arc<dyn StateListener>) -> bool {
        let mut listeners = self.lock();
        if listeners.iter().any(|known| same_listener(known, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Removes `listener`, returning `false` when it was not registered.
    pub(crate) fn unregister(&self, listener: &Arc<dyn StateListener>) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|known| !same_listener(known, listener));
        listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Invokes every listener registered when the round begins.
    ///
    /// The registry lock is released before callbacks run, so listeners may
    /// register or unregister observers; such changes apply from the next
    /// round onwards.
    pub(crate) fn notify_all(&self, reporter: &dyn HealthReporter) {
        let snapshot = self.lock().clone();
        let _round = NotificationRound::enter(self);
        for listener in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.state_changed()));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => reporter.listener_failed(&error),
                Err(payload) => {
                    let error = ListenerError::new(format!(
                        "listener panicked: {}",
                        panic_message(payload.as_ref())
                    ));
                    reporter.listener_failed(&error);
                }
            }
        }
    }

    /// Returns `true` when the calling thread is running this registry's callbacks.
    pub(crate) fn notifying_on_current_thread(&self) -> bool {
        *self.lock_notifier() == Some(thread::current().id())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn StateListener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_notifier(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the current thread as the notifier for the duration of a round.
struct NotificationRound<'a> {
    registry: &'a ListenerRegistry,
    previous: Option<ThreadId>,
}

impl<'a> NotificationRound<'a> {
    fn enter(registry: &'a ListenerRegistry) -> Self {
        let previous = registry
            .lock_notifier()
            .replace(thread::current().id());
        Self { registry, previous }
    }
}

impl Drop for NotificationRound<'_> {
    fn drop(&mut self) {
        *self.registry.lock_notifier() = self.previous;
    }
}

fn same_listener(left: &Arc<dyn StateListener>, right: &Arc<dyn StateListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(left), Arc::as_ptr(right))
}
