//! Process root: owns the single coordinator for the lifetime of the host.

mod errors;
pub(crate) mod launch;
mod loader;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::{LaunchPlan, run_daemon, run_daemon_with};
pub use loader::{ConfigLoader, StaticConfigLoader, SystemConfigLoader};
pub use shutdown::{ShutdownError, ShutdownRequest, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
