//! Serialisable status view of the coordinator and a listener persisting it.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::Weak;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::coordinator::{LIFECYCLE_TARGET, LifecycleCoordinator};
use crate::listeners::{ListenerError, StateListener};
use crate::state::DaemonState;

/// Point-in-time view of the daemon lifecycle for UI and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Current lifecycle state.
    pub state: DaemonState,
    /// Label key for the UI layer.
    pub label_key: &'static str,
    /// Whether stop commands currently apply.
    pub started_okay: bool,
    /// Verbatim start result, or `"N/A"`.
    pub daemon_start_result: String,
    /// Description of the startup failure, if any.
    pub last_failure: Option<String>,
    /// Seconds since the Unix epoch when the snapshot was taken.
    pub timestamp: u64,
}

impl StatusSnapshot {
    pub(crate) fn capture(
        state: DaemonState,
        started_okay: bool,
        daemon_start_result: String,
        last_failure: Option<String>,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Self {
            state,
            label_key: state.label_key(),
            started_okay,
            daemon_start_result,
            last_failure,
            timestamp,
        }
    }
}

/// Errors raised while persisting a status snapshot.
#[derive(Debug, Error)]
pub enum StatusWriteError {
    /// The status directory could not be created.
    #[error("failed to create status directory '{path}': {source}")]
    Directory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the status file failed.
    #[error("failed to write status file '{path}': {source}")]
    Write {
        /// Status file path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Serialising the snapshot failed.
    #[error("failed to serialise status snapshot: {source}")]
    Serialise {
        /// Underlying serialisation error.
        #[from]
        source: serde_json::Error,
    },
}

/// Writes `snapshot` as a single JSON line to `path`, replacing its contents.
pub fn write_snapshot(path: &Utf8Path, snapshot: &StatusSnapshot) -> Result<(), StatusWriteError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StatusWriteError::Directory {
            path: parent.to_owned(),
            source,
        })?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let write_error = |source| StatusWriteError::Write {
        path: path.to_owned(),
        source,
    };
    let mut file = options.open(path).map_err(write_error)?;
    serde_json::to_writer(&mut file, snapshot)?;
    file.write_all(b"\n").map_err(write_error)?;
    file.sync_all().map_err(write_error)?;
    Ok(())
}

/// Listener that rewrites the status file after every transition.
///
/// Holds a weak reference so that registering it does not keep the
/// coordinator alive.
#[derive(Debug)]
pub struct StatusFileListener {
    coordinator: Weak<LifecycleCoordinator>,
    path: Utf8PathBuf,
}

impl StatusFileListener {
    /// Builds a listener writing snapshots of `coordinator` to `path`.
    #[must_use]
    pub fn new(coordinator: Weak<LifecycleCoordinator>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            coordinator,
            path: path.into(),
        }
    }

    /// Path the listener writes to.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }
}

impl StateListener for StatusFileListener {
    fn state_changed(&self) -> Result<(), ListenerError> {
        let Some(coordinator) = self.coordinator.upgrade() else {
            return Ok(());
        };
        let snapshot = coordinator.snapshot();
        write_snapshot(&self.path, &snapshot).map_err(|error| {
            ListenerError::with_source("failed to persist status snapshot", error)
        })?;
        debug!(
            target: LIFECYCLE_TARGET,
            state = %snapshot.state,
            file = %self.path,
            "status snapshot updated"
        );
        Ok(())
    }
}
