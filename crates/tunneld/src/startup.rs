//! Asynchronous startup sequence.
//!
//! The sequence runs once per coordinator on a dedicated thread: load the
//! native libraries, then start the daemon. Either step failing is final for
//! the lifetime of the coordinator; nothing is retried.

use std::io;
use std::sync::Arc;
use std::thread;

use thiserror::Error;
use tracing::info;

use crate::coordinator::{LIFECYCLE_TARGET, LifecycleCoordinator};
use crate::native::{self, NativeCall, NativeError, START_SUCCESS_SENTINEL};
use crate::state::DaemonState;

/// Why the daemon failed to start.
#[derive(Debug, Error)]
pub enum StartupFailure {
    /// The native libraries could not be loaded.
    #[error("failed to load native libraries: {source}")]
    LibraryLoad {
        /// Fault raised by the native layer.
        #[source]
        source: NativeError,
    },
    /// The native start call faulted.
    #[error("native start call failed: {source}")]
    StartCall {
        /// Fault raised by the native layer.
        #[source]
        source: NativeError,
    },
    /// The native start call returned something other than the success sentinel.
    #[error("daemon refused to start: {result}")]
    Rejected {
        /// Result string returned by the start call.
        result: String,
    },
}

/// Errors raised while launching or awaiting the startup thread.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The startup sequence was already launched for this coordinator.
    #[error("startup sequence already launched")]
    AlreadyLaunched,
    /// The startup thread could not be spawned.
    #[error("failed to spawn startup thread: {source}")]
    Spawn {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The startup thread panicked outside the guarded native calls.
    #[error("startup thread panicked")]
    ThreadPanic,
}

/// Handle to the background startup thread.
#[derive(Debug)]
pub struct StartupHandle {
    handle: thread::JoinHandle<()>,
}

impl StartupHandle {
    /// Returns `true` once the sequence has finished, successfully or not.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the startup sequence to finish.
    pub fn join(self) -> Result<(), StartupError> {
        self.handle.join().map_err(|_| StartupError::ThreadPanic)
    }
}

impl LifecycleCoordinator {
    /// Launches the startup sequence on a thread called `thread_name`.
    ///
    /// The sequence runs at most once per coordinator. A second call, or a
    /// call after a failed spawn, returns [`StartupError::AlreadyLaunched`].
    pub fn spawn_startup(self: &Arc<Self>, thread_name: &str) -> Result<StartupHandle, StartupError> {
        if !self.claim_startup() {
            return Err(StartupError::AlreadyLaunched);
        }
        let coordinator = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(thread_name.to_owned())
            .spawn(move || run_sequence(&coordinator))
            .map_err(|source| StartupError::Spawn { source })?;
        Ok(StartupHandle { handle })
    }
}

fn run_sequence(coordinator: &LifecycleCoordinator) {
    info!(target: LIFECYCLE_TARGET, "startup sequence running");

    if let Err(source) = native::guarded(NativeCall::LoadLibraries, || {
        coordinator.native().load_libraries()
    }) {
        let guard = coordinator.lock_transitions();
        coordinator.fail_startup(&guard, StartupFailure::LibraryLoad { source });
        return;
    }
    coordinator.transition(DaemonState::JniLibraryLoaded);

    // Stop commands take this lock before checking the started flag, so the
    // start call, flag and state form one unit from their point of view.
    let guard = coordinator.lock_transitions();
    match native::guarded(NativeCall::StartDaemon, || coordinator.native().start_daemon()) {
        Ok(result) => {
            coordinator.record_start_result(&result);
            if result == START_SUCCESS_SENTINEL {
                coordinator.set_started_okay(true);
                info!(target: LIFECYCLE_TARGET, "daemon started");
                coordinator.commit(&guard, DaemonState::StartedOkay);
            } else {
                coordinator.fail_startup(&guard, StartupFailure::Rejected { result });
            }
        }
        Err(source) => coordinator.fail_startup(&guard, StartupFailure::StartCall { source }),
    }
}
