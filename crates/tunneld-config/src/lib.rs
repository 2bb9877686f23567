//! Layered configuration for the tunnel daemon host.
//!
//! Values resolve in increasing precedence from built-in defaults, an optional
//! configuration file, `TUNNELD_*` environment variables, and finally command
//! line flags. Loading is handled by [`ortho_config`]; this crate only declares
//! the shape of the configuration and its defaults.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_STARTUP_THREAD_NAME, STATUS_FILE_NAME, default_log_filter,
    default_log_format, default_startup_thread_name, default_status_path,
};
pub use logging::LogFormat;

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TUNNELD")]
pub struct Config {
    /// `tracing` filter expression applied to daemon telemetry.
    #[ortho_config(default = defaults::default_log_filter())]
    pub log_filter: String,
    /// Output format for daemon telemetry.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Location of the JSON status snapshot rewritten on every state change.
    #[ortho_config(default = defaults::default_status_path())]
    pub status_path: Utf8PathBuf,
    /// Name of the thread that runs the native startup sequence.
    #[ortho_config(default = defaults::default_startup_thread_name())]
    pub startup_thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_format: default_log_format(),
            status_path: default_status_path(),
            startup_thread_name: default_startup_thread_name(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments, environment and files.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration using the supplied argument list.
    ///
    /// The first item is treated as the binary name, mirroring
    /// [`std::env::args_os`].
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Filter expression for the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for the telemetry subscriber.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Path of the status snapshot file.
    #[must_use]
    pub fn status_path(&self) -> &Utf8Path {
        self.status_path.as_path()
    }

    /// Name used for the startup thread.
    #[must_use]
    pub fn startup_thread_name(&self) -> &str {
        self.startup_thread_name.as_str()
    }
}
