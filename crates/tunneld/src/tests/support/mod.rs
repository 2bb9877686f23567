//! Test doubles and fixtures shared by the coordinator suites.

mod listener;
mod native_daemon;
mod reporter;
mod world;

use std::sync::Arc;

use crate::LifecycleCoordinator;
use crate::process::{ShutdownError, ShutdownRequest, ShutdownSignal};

pub use listener::{FailingListener, Observation, PanickingListener, RecordingListener};
pub use native_daemon::RecordingNativeDaemon;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};

/// Builds a coordinator over the supplied doubles.
pub fn coordinator_with(
    native: &RecordingNativeDaemon,
    reporter: &Arc<RecordingHealthReporter>,
) -> Arc<LifecycleCoordinator> {
    LifecycleCoordinator::new(Arc::new(native.clone()), reporter.clone())
}

/// Runs the startup sequence to completion.
pub fn complete_startup(coordinator: &Arc<LifecycleCoordinator>) {
    coordinator
        .spawn_startup("tunneld-test-start")
        .expect("spawn startup thread")
        .join()
        .expect("startup thread should not panic");
}

/// Shutdown signal that returns the scripted request without blocking.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedShutdown(pub ShutdownRequest);

impl ShutdownSignal for ScriptedShutdown {
    fn wait(&self) -> Result<ShutdownRequest, ShutdownError> {
        Ok(self.0)
    }
}
