use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::logging::LogFormat;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Name given to the thread that drives the native startup sequence.
pub const DEFAULT_STARTUP_THREAD_NAME: &str = "tunneld-daemon-start";

/// File name of the JSON status snapshot inside the runtime directory.
pub const STATUS_FILE_NAME: &str = "status.json";

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned startup thread name.
#[must_use]
pub fn default_startup_thread_name() -> String {
    DEFAULT_STARTUP_THREAD_NAME.to_owned()
}

/// Computes where the status snapshot is written when not configured.
///
/// Prefers the per-user runtime directory and falls back to the system
/// temporary directory when none is available.
#[must_use]
pub fn default_status_path() -> Utf8PathBuf {
    let mut base = runtime_base_directory().unwrap_or_else(fallback_base_directory);
    base.push("tunneld");
    base.push(STATUS_FILE_NAME);
    base
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(not(unix))]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    None
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
