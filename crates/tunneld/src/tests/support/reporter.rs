//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use crate::health::HealthReporter;
use crate::listeners::ListenerError;
use crate::native::{NativeCall, NativeError};
use crate::startup::StartupFailure;
use crate::state::DaemonState;

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// A transition committed.
    StateChanged { from: DaemonState, to: DaemonState },
    /// Startup failed with the given description.
    StartupFailed(String),
    /// A listener failed with the given message.
    ListenerFailed(String),
    /// A best-effort native call failed.
    NativeCallFailed { call: NativeCall, message: String },
    /// A command was skipped.
    CommandIgnored { call: NativeCall, state: DaemonState },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Transitions in the order they were committed.
    #[must_use]
    pub fn transitions(&self) -> Vec<(DaemonState, DaemonState)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::StateChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn state_changed(&self, from: DaemonState, to: DaemonState) {
        self.record(HealthEvent::StateChanged { from, to });
    }

    fn startup_failed(&self, failure: &StartupFailure) {
        self.record(HealthEvent::StartupFailed(failure.to_string()));
    }

    fn listener_failed(&self, error: &ListenerError) {
        self.record(HealthEvent::ListenerFailed(error.message().to_owned()));
    }

    fn native_call_failed(&self, call: NativeCall, error: &NativeError) {
        self.record(HealthEvent::NativeCallFailed {
            call,
            message: error.message().to_owned(),
        });
    }

    fn command_ignored(&self, call: NativeCall, state: DaemonState) {
        self.record(HealthEvent::CommandIgnored { call, state });
    }
}
