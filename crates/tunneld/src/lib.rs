//! Lifecycle coordination for a natively implemented tunnel daemon.
//!
//! The daemon itself lives behind the [`NativeDaemon`] trait. This crate owns
//! everything around it: the [`DaemonState`] machine, the asynchronous startup
//! sequence, the stop commands, and fan-out of state changes to registered
//! [`StateListener`]s.
//!
//! A host builds exactly one [`LifecycleCoordinator`] per process and launches
//! startup explicitly:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tunneld::{LifecycleCoordinator, NoopNativeDaemon, StructuredHealthReporter};
//!
//! let coordinator = LifecycleCoordinator::new(
//!     Arc::new(NoopNativeDaemon),
//!     Arc::new(StructuredHealthReporter::new()),
//! );
//! let startup = coordinator.spawn_startup("tunneld-daemon-start")?;
//! startup.join()?;
//! coordinator.stop_daemon();
//! # Ok::<(), tunneld::StartupError>(())
//! ```
//!
//! Startup failures never surface as errors to callers. They are visible as
//! [`DaemonState::StartFailed`] together with
//! [`LifecycleCoordinator::last_failure_cause`] and
//! [`LifecycleCoordinator::daemon_start_result`]. There is no retry: a fresh
//! coordinator is needed to try again.

mod coordinator;
mod health;
mod listeners;
mod native;
mod placeholder_daemon;
mod process;
mod startup;
mod state;
mod status;
pub mod telemetry;

pub use coordinator::{CommandOutcome, LifecycleCoordinator, START_RESULT_UNAVAILABLE};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use listeners::{ListenerError, StateListener};
pub use native::{NativeCall, NativeDaemon, NativeError, START_SUCCESS_SENTINEL};
pub use placeholder_daemon::NoopNativeDaemon;
pub use process::{
    ConfigLoader, LaunchError, LaunchPlan, ShutdownError, ShutdownRequest, ShutdownSignal,
    StaticConfigLoader, SystemConfigLoader, SystemShutdownSignal, run_daemon, run_daemon_with,
};
pub use startup::{StartupError, StartupFailure, StartupHandle};
pub use state::DaemonState;
pub use status::{StatusFileListener, StatusSnapshot, StatusWriteError, write_snapshot};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
