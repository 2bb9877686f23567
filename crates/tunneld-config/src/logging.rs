//! Output formats for daemon telemetry.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How lifecycle telemetry is rendered on stderr.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log collectors.
    #[default]
    Json,
    /// Single-line text for operators watching a terminal.
    Compact,
}

impl LogFormat {
    /// Whether events are emitted as machine-readable records.
    ///
    /// Structured output never carries ANSI colour codes.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}
