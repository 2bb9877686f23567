//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use crate::listeners::ListenerError;
use crate::native::{NativeCall, NativeError};
use crate::startup::StartupFailure;
use crate::state::DaemonState;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked after a transition commits, before listeners run.
    fn state_changed(&self, from: DaemonState, to: DaemonState);

    /// Invoked when the startup sequence ends in failure.
    fn startup_failed(&self, failure: &StartupFailure);

    /// Invoked when a listener returns an error or panics.
    fn listener_failed(&self, error: &ListenerError);

    /// Invoked when a best-effort native call fails and the error is swallowed.
    fn native_call_failed(&self, call: NativeCall, error: &NativeError);

    /// Invoked when a command is skipped because the daemon is not running.
    fn command_ignored(&self, call: NativeCall, state: DaemonState);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn state_changed(&self, from: DaemonState, to: DaemonState) {
        (**self).state_changed(from, to);
    }

    fn startup_failed(&self, failure: &StartupFailure) {
        (**self).startup_failed(failure);
    }

    fn listener_failed(&self, error: &ListenerError) {
        (**self).listener_failed(error);
    }

    fn native_call_failed(&self, call: NativeCall, error: &NativeError) {
        (**self).native_call_failed(call, error);
    }

    fn command_ignored(&self, call: NativeCall, state: DaemonState) {
        (**self).command_ignored(call, state);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn state_changed(&self, from: DaemonState, to: DaemonState) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "state_changed",
            from = %from,
            to = %to,
            "daemon state change"
        );
    }

    fn startup_failed(&self, failure: &StartupFailure) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "startup_failed",
            error = %failure,
            detail = ?failure,
            "daemon startup failed"
        );
    }

    fn listener_failed(&self, error: &ListenerError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "listener_failed",
            message = %error.message(),
            error = ?error,
            "exception in listener ignored"
        );
    }

    fn native_call_failed(&self, call: NativeCall, error: &NativeError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "native_call_failed",
            call = %call,
            message = %error.message(),
            error = ?error,
            "native call failed"
        );
    }

    fn command_ignored(&self, call: NativeCall, state: DaemonState) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "command_ignored",
            call = %call,
            state = %state,
            "command ignored while daemon is not running"
        );
    }
}
