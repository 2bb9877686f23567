//! Lifecycle stages of the native daemon.

use serde::Serialize;
use strum::{Display, EnumString, FromRepr, IntoStaticStr};

/// Stage of the daemon lifecycle as seen by the coordinator.
///
/// The string form of each variant is the label key handed to the UI layer,
/// which resolves it to a localised description.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Display,
    EnumString,
    FromRepr,
    IntoStaticStr,
)]
#[repr(u8)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum DaemonState {
    /// The coordinator has not been constructed yet.
    Uninitialized = 0,
    /// Construction finished; the startup sequence may be running.
    Starting = 1,
    /// Native libraries were loaded successfully.
    JniLibraryLoaded = 2,
    /// The native start call reported success.
    StartedOkay = 3,
    /// Library loading or the native start call failed.
    StartFailed = 4,
    /// The daemon stopped accepting new tunnels and is draining.
    GracefulShutdownInProgress = 5,
    /// The daemon was stopped.
    Stopped = 6,
}

impl DaemonState {
    /// Opaque key the UI layer resolves to a human-readable label.
    #[must_use]
    pub fn label_key(self) -> &'static str {
        self.into()
    }

    /// Returns `true` for states with no automatic outbound transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::StartFailed | Self::Stopped)
    }

    pub(crate) const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a value previously produced by [`Self::as_u8`].
    ///
    /// # Panics
    ///
    /// Panics when `value` does not name a state; the coordinator only ever
    /// stores encoded states, so any other value is memory corruption.
    pub(crate) fn from_u8(value: u8) -> Self {
        Self::from_repr(value)
            .unwrap_or_else(|| panic!("invalid daemon state encoding: {value}"))
    }
}
