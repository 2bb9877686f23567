//! Defines the error surface of the daemon host process.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use crate::startup::StartupError;
use crate::status::StatusWriteError;
use crate::telemetry::TelemetryError;

use super::shutdown::ShutdownError;

/// Errors surfaced while running the daemon host.
///
/// Daemon startup failures are not among them: those are reported through the
/// coordinator's state and diagnostics.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The initial status snapshot could not be written.
    #[error("failed to write initial status snapshot: {source}")]
    Status {
        /// Underlying write error.
        #[source]
        source: StatusWriteError,
    },
    /// The startup thread could not be launched or panicked.
    #[error("daemon startup thread failed: {source}")]
    Startup {
        /// Underlying startup error.
        #[source]
        source: StartupError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<StatusWriteError> for LaunchError {
    fn from(source: StatusWriteError) -> Self {
        Self::Status { source }
    }
}

impl From<StartupError> for LaunchError {
    fn from(source: StartupError) -> Self {
        Self::Startup { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
