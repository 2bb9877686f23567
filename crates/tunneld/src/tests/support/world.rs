//! BDD test world: owns the native double, reporter and coordinator for step functions.

use std::cell::RefCell;
use std::sync::Arc;

use crate::LifecycleCoordinator;
use crate::listeners::StateListener;

use super::listener::{FailingListener, RecordingListener};
use super::native_daemon::RecordingNativeDaemon;
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    pub native: RecordingNativeDaemon,
    pub reporter: Arc<RecordingHealthReporter>,
    coordinator: Option<Arc<LifecycleCoordinator>>,
    pub listener: Option<Arc<RecordingListener>>,
}

impl TestWorld {
    /// Builds a world whose daemon starts successfully.
    #[must_use]
    pub fn new() -> Self {
        Self {
            native: RecordingNativeDaemon::returning("ok"),
            reporter: Arc::new(RecordingHealthReporter::default()),
            coordinator: None,
            listener: None,
        }
    }

    /// Replaces the native double; only valid before the coordinator exists.
    pub fn use_native(&mut self, native: RecordingNativeDaemon) -> Result<(), String> {
        if self.coordinator.is_some() {
            return Err(String::from("native daemon configured after coordinator creation"));
        }
        self.native = native;
        Ok(())
    }

    /// Returns the coordinator, constructing it on first use.
    pub fn coordinator(&mut self) -> Arc<LifecycleCoordinator> {
        let native = &self.native;
        let reporter = &self.reporter;
        Arc::clone(
            self.coordinator
                .get_or_insert_with(|| super::coordinator_with(native, reporter)),
        )
    }

    /// Registers a recording listener and keeps it for assertions.
    pub fn attach_recording_listener(&mut self) {
        let coordinator = self.coordinator();
        let listener = Arc::new(RecordingListener::new(Arc::downgrade(&coordinator)));
        coordinator.add_listener(listener.clone());
        self.listener = Some(listener);
    }

    /// Registers a listener that fails on every notification.
    pub fn attach_failing_listener(&mut self) {
        let listener: Arc<dyn StateListener> = Arc::new(FailingListener);
        self.coordinator().add_listener(listener);
    }

    /// Runs the startup sequence to completion.
    pub fn complete_startup(&mut self) {
        super::complete_startup(&self.coordinator());
    }

    /// Returns the recording listener or an error for step reporting.
    pub fn recording_listener(&self) -> Result<&RecordingListener, String> {
        self.listener
            .as_deref()
            .ok_or_else(|| String::from("no recording listener attached"))
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
