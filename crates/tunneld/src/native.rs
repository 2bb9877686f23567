//! Boundary to the native daemon implementation.
//!
//! The coordinator never owns the native daemon; it only sequences calls into
//! whatever binding the host supplies through [`NativeDaemon`].

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

/// Value returned by [`NativeDaemon::start_daemon`] when the daemon started.
pub const START_SUCCESS_SENTINEL: &str = "ok";

/// Calls the coordinator issues against the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCall {
    /// Loading the native libraries.
    LoadLibraries,
    /// Starting the daemon.
    StartDaemon,
    /// Stopping the daemon.
    StopDaemon,
    /// Refusing new tunnels ahead of a stop.
    StopAcceptingTunnels,
}

impl fmt::Display for NativeCall {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LoadLibraries => "load_libraries",
            Self::StartDaemon => "start_daemon",
            Self::StopDaemon => "stop_daemon",
            Self::StopAcceptingTunnels => "stop_accepting_tunnels",
        };
        formatter.write_str(label)
    }
}

/// Fault reported by a native call.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NativeError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl NativeError {
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

    fn panicked(call: NativeCall, payload: &(dyn Any + Send)) -> Self {
        Self::new(format!("{call} panicked: {}", panic_message(payload)))
    }
}

/// Capabilities the host must provide for the daemon being coordinated.
pub trait NativeDaemon: Send + Sync {
    /// Loads the native libraries backing the daemon.
    fn load_libraries(&self) -> Result<(), NativeError>;

    /// Starts the daemon.
    ///
    /// Returns [`START_SUCCESS_SENTINEL`] on success. Any other string is a
    /// failure description that the coordinator surfaces verbatim.
    fn start_daemon(&self) -> Result<String, NativeError>;

    /// Stops the daemon. Best effort.
    fn stop_daemon(&self) -> Result<(), NativeError>;

    /// Stops accepting new tunnels while existing ones drain. Best effort.
    fn stop_accepting_tunnels(&self) -> Result<(), NativeError>;
}

impl fmt::Debug for dyn NativeDaemon {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("NativeDaemon")
    }
}

/// Runs a native call, converting a panic that escapes it into a [`NativeError`].
pub(crate) fn guarded<T>(
    call: NativeCall,
    action: impl FnOnce() -> Result<T, NativeError>,
) -> Result<T, NativeError> {
    panic::catch_unwind(AssertUnwindSafe(action))
        .unwrap_or_else(|payload| Err(NativeError::panicked(call, payload.as_ref())))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
