//! Supervises host launch sequencing and shutdown.

use std::sync::Arc;

use tracing::info;

use crate::coordinator::LifecycleCoordinator;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::native::NativeDaemon;
use crate::placeholder_daemon::NoopNativeDaemon;
use crate::status::{StatusFileListener, StatusSnapshot, write_snapshot};
use crate::telemetry;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::loader::{ConfigLoader, SystemConfigLoader};
use super::shutdown::{ShutdownRequest, ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to run the daemon host.
pub struct LaunchPlan<L, S> {
    /// Source of the resolved configuration.
    pub loader: L,
    /// Native daemon binding driven by the coordinator.
    pub native: Arc<dyn NativeDaemon>,
    /// Sink for lifecycle telemetry.
    pub reporter: Arc<dyn HealthReporter>,
    /// Blocks until the host should shut down.
    pub shutdown: S,
}

/// Runs the daemon host using the production collaborators.
pub fn run_daemon() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        loader: SystemConfigLoader,
        native: Arc::new(NoopNativeDaemon),
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
    };
    run_daemon_with(plan).map(|_| ())
}

/// Runs the daemon host with injected collaborators.
///
/// Builds the single coordinator, persists its status on every transition,
/// and starts the daemon. Once shutdown is requested it waits for startup to
/// settle, drains tunnels unless the request was immediate, and stops the
/// daemon. Returns the final status.
pub fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<StatusSnapshot, LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        native,
        reporter,
        shutdown,
    } = plan;

    let config = loader.load()?;
    telemetry::initialise(&config)?;
    info!(
        target: PROCESS_TARGET,
        status_file = %config.status_path(),
        log_format = %config.log_format(),
        "starting daemon host"
    );

    let coordinator = LifecycleCoordinator::new(native, reporter);
    let status = StatusFileListener::new(Arc::downgrade(&coordinator), config.status_path());
    write_snapshot(status.path(), &coordinator.snapshot())?;
    coordinator.add_listener(Arc::new(status));

    let startup = coordinator.spawn_startup(config.startup_thread_name())?;
    let request = shutdown.wait()?;

    // The native start call cannot be cancelled, so let it settle first;
    // otherwise a daemon that finishes starting after the stop would leak.
    startup.join()?;
    if request == ShutdownRequest::Graceful {
        coordinator.stop_accepting_tunnels();
    }
    coordinator.stop_daemon();

    let snapshot = coordinator.snapshot();
    info!(
        target: PROCESS_TARGET,
        state = %snapshot.state,
        start_result = %snapshot.daemon_start_result,
        "shutdown sequence completed"
    );
    Ok(snapshot)
}
