//! Termination signals and how the host maps them onto daemon shutdown.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// How the host was asked to wind the daemon down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownRequest {
    /// Refuse new tunnels first, then stop the daemon.
    Graceful,
    /// Stop the daemon straight away.
    Immediate,
}

impl ShutdownRequest {
    /// Maps a received signal number onto a request. `SIGQUIT` skips draining.
    #[must_use]
    pub const fn for_signal(signal: i32) -> Self {
        if signal == SIGQUIT {
            Self::Immediate
        } else {
            Self::Graceful
        }
    }
}

/// Blocks the host until it should shut the daemon down.
pub trait ShutdownSignal: Send + Sync {
    /// Waits for a shutdown request.
    fn wait(&self) -> Result<ShutdownRequest, ShutdownError>;
}

/// Errors reported while waiting for shutdown.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Waits for `SIGTERM`, `SIGINT`, `SIGHUP` or `SIGQUIT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<ShutdownRequest, ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP, SIGQUIT])
            .map_err(|source| ShutdownError::Install { source })?;
        let request = signals
            .forever()
            .next()
            .map_or(ShutdownRequest::Graceful, ShutdownRequest::for_signal);
        info!(
            target: PROCESS_TARGET,
            request = ?request,
            "shutdown requested"
        );
        Ok(request)
    }
}
