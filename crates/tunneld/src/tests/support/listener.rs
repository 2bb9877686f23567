//! Listener doubles.

use std::sync::{Mutex, PoisonError, Weak};

use crate::LifecycleCoordinator;
use crate::listeners::{ListenerError, StateListener};
use crate::state::DaemonState;

/// What a listener saw when it was notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// State read back from the coordinator.
    pub state: DaemonState,
    /// Started flag read back from the coordinator.
    pub started_okay: bool,
}

/// Listener that reads the coordinator back on every notification.
#[derive(Debug)]
pub struct RecordingListener {
    coordinator: Weak<LifecycleCoordinator>,
    observations: Mutex<Vec<Observation>>,
}

impl RecordingListener {
    /// Builds a listener observing `coordinator`.
    pub fn new(coordinator: Weak<LifecycleCoordinator>) -> Self {
        Self {
            coordinator,
            observations: Mutex::new(Vec::new()),
        }
    }

    /// Everything observed so far.
    pub fn observations(&self) -> Vec<Observation> {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// States observed so far.
    pub fn states(&self) -> Vec<DaemonState> {
        self.observations()
            .into_iter()
            .map(|observation| observation.state)
            .collect()
    }

    /// Number of notification rounds received.
    pub fn rounds(&self) -> usize {
        self.observations().len()
    }
}

impl StateListener for RecordingListener {
    fn state_changed(&self) -> Result<(), ListenerError> {
        let coordinator = self
            .coordinator
            .upgrade()
            .ok_or_else(|| ListenerError::new("coordinator dropped"))?;
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Observation {
                state: coordinator.state(),
                started_okay: coordinator.is_started_okay(),
            });
        Ok(())
    }
}

/// Listener that always reports an error.
#[derive(Debug, Default)]
pub struct FailingListener;

impl StateListener for FailingListener {
    fn state_changed(&self) -> Result<(), ListenerError> {
        Err(ListenerError::new("listener refused update"))
    }
}

/// Listener that always panics.
#[derive(Debug, Default)]
pub struct PanickingListener;

impl StateListener for PanickingListener {
    fn state_changed(&self) -> Result<(), ListenerError> {
        panic!("listener exploded")
    }
}
