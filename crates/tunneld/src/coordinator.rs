//! The process-wide lifecycle coordinator.
//!
//! All transitions are serialised by one exclusive lock and notify listeners
//! while that lock is held, so observers always see the committed state and no
//! two notification rounds interleave. The current state itself lives in an
//! atomic so that [`LifecycleCoordinator::state`] never waits on a transition.
//!
//! The started-okay flag sits behind its own narrow lock. Commands acquire the
//! transition lock before reading it, and the startup sequence sets it before
//! committing [`DaemonState::StartedOkay`], so commands and listeners always
//! see flag and state agree. Lock-free pollers may still observe the flag and
//! the state briefly out of step while a start or stop is in flight.
//!
//! Registering and unregistering listeners also takes the transition lock, so
//! once `remove_listener` returns no round in flight can still reach the
//! removed listener. A listener callback already runs under that lock, so
//! calls made from inside a round skip it. Commands issued from inside a round
//! are checked against the started flag straight away and run once the round
//! completes, before the lock is released.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::health::HealthReporter;
use crate::listeners::{ListenerRegistry, StateListener};
use crate::native::{self, NativeCall, NativeDaemon};
use crate::startup::StartupFailure;
use crate::state::DaemonState;
use crate::status::StatusSnapshot;

pub(crate) const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Placeholder start result reported until a start attempt completes.
pub const START_RESULT_UNAVAILABLE: &str = "N/A";

/// Whether a command acted on the daemon or was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command ran against the daemon.
    Applied,
    /// The daemon was not running, so nothing happened.
    Ignored,
}

#[derive(Debug)]
struct Diagnostics {
    last_failure: Option<Arc<StartupFailure>>,
    start_result: String,
}

/// Proof that the caller holds the transition lock.
pub(crate) struct TransitionGuard<'a> {
    _lock: MutexGuard<'a, ()>,
}

/// Stop command accepted during a notification round and run after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredCommand {
    StopAcceptingTunnels,
    StopDaemon,
}

#[derive(Debug, Default)]
struct DeferredQueue {
    commands: VecDeque<DeferredCommand>,
    draining: bool,
}

impl DeferredCommand {
    const fn call(self) -> NativeCall {
        match self {
            Self::StopAcceptingTunnels => NativeCall::StopAcceptingTunnels,
            Self::StopDaemon => NativeCall::StopDaemon,
        }
    }
}

/// Tracks the daemon lifecycle and fans state changes out to listeners.
///
/// Exactly one coordinator is expected per process. The process root builds
/// it with [`LifecycleCoordinator::new`], launches the startup sequence with
/// [`LifecycleCoordinator::spawn_startup`], and shares the returned `Arc`
/// with every component that needs to observe or control the daemon.
pub struct LifecycleCoordinator {
    native: Arc<dyn NativeDaemon>,
    reporter: Arc<dyn HealthReporter>,
    state: AtomicU8,
    transitions: Mutex<()>,
    started_okay: Mutex<bool>,
    listeners: ListenerRegistry,
    diagnostics: Mutex<Diagnostics>,
    deferred: Mutex<DeferredQueue>,
    startup_launched: AtomicBool,
}

impl LifecycleCoordinator {
    /// Builds a coordinator and moves it from `uninitialized` to `starting`.
    ///
    /// No native call is made here; the startup sequence only begins once
    /// [`Self::spawn_startup`] is invoked.
    #[must_use]
    pub fn new(native: Arc<dyn NativeDaemon>, reporter: Arc<dyn HealthReporter>) -> Arc<Self> {
        let coordinator = Self {
            native,
            reporter,
            state: AtomicU8::new(DaemonState::Uninitialized.as_u8()),
            transitions: Mutex::new(()),
            started_okay: Mutex::new(false),
            listeners: ListenerRegistry::default(),
            diagnostics: Mutex::new(Diagnostics {
                last_failure: None,
                start_result: START_RESULT_UNAVAILABLE.to_owned(),
            }),
            deferred: Mutex::new(DeferredQueue::default()),
            startup_launched: AtomicBool::new(false),
        };
        coordinator.transition(DaemonState::Starting);
        Arc::new(coordinator)
    }

    /// Current lifecycle state. Never blocks.
    #[must_use]
    pub fn state(&self) -> DaemonState {
        DaemonState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether stop commands currently apply to the daemon.
    #[must_use]
    pub fn is_started_okay(&self) -> bool {
        *self
            .started_okay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cause of the failed startup, if startup failed.
    #[must_use]
    pub fn last_failure_cause(&self) -> Option<Arc<StartupFailure>> {
        self.lock_diagnostics().last_failure.clone()
    }

    /// Verbatim string returned by the native start call, or `"N/A"`.
    #[must_use]
    pub fn daemon_start_result(&self) -> String {
        self.lock_diagnostics().start_result.clone()
    }

    /// Captures the state and diagnostics in one serialisable value.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::capture(
            self.state(),
            self.is_started_okay(),
            self.daemon_start_result(),
            self.last_failure_cause().map(|failure| failure.to_string()),
        )
    }

    /// Registers a listener. Returns `false` if it was already registered.
    ///
    /// Waits for any transition in progress. Safe to call from inside a
    /// listener callback; the new listener is notified from the next
    /// transition onwards.
    pub fn add_listener(&self, listener: Arc<dyn StateListener>) -> bool {
        let _held = self.lock_unless_notifying();
        self.listeners.register(listener)
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    ///
    /// Once this returns, the listener receives no further notifications.
    /// Called from inside a callback, the removal applies from the next round.
    pub fn remove_listener(&self, listener: &Arc<dyn StateListener>) -> bool {
        let _held = self.lock_unless_notifying();
        self.listeners.unregister(listener)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stops accepting new tunnels while the daemon is running.
    ///
    /// Moves to `gracefulShutdownInProgress` and then asks the native daemon
    /// to refuse new tunnels. A native failure is reported and swallowed. When
    /// the daemon is not running this does nothing.
    ///
    /// Called from a listener callback, the command is accepted or ignored
    /// immediately and runs as soon as the current round completes.
    pub fn stop_accepting_tunnels(&self) -> CommandOutcome {
        if self.listeners.notifying_on_current_thread() {
            return self.defer(DeferredCommand::StopAcceptingTunnels);
        }
        let guard = self.lock_transitions();
        self.apply_stop_accepting_tunnels(&guard)
    }

    /// Stops the daemon while it is running.
    ///
    /// The native stop call is best effort: a failure is reported and the
    /// coordinator still clears the started flag and moves to `stopped`. When
    /// the daemon is not running this does nothing.
    ///
    /// Called from a listener callback, the command is accepted or ignored
    /// immediately and runs as soon as the current round completes.
    pub fn stop_daemon(&self) -> CommandOutcome {
        if self.listeners.notifying_on_current_thread() {
            return self.defer(DeferredCommand::StopDaemon);
        }
        let guard = self.lock_transitions();
        self.apply_stop_daemon(&guard)
    }

    /// Marks the startup sequence as launched. Returns `false` if it already was.
    pub(crate) fn claim_startup(&self) -> bool {
        !self.startup_launched.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn native(&self) -> &dyn NativeDaemon {
        self.native.as_ref()
    }

    pub(crate) fn lock_transitions(&self) -> TransitionGuard<'_> {
        TransitionGuard {
            _lock: self
                .transitions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Takes the transition lock and commits `next`.
    pub(crate) fn transition(&self, next: DaemonState) -> bool {
        let guard = self.lock_transitions();
        self.commit(&guard, next)
    }

    /// Commits `next`, notifies listeners, then runs any commands they issued.
    /// Returns `false` when `next` equals the current state, in which case
    /// nothing is notified.
    pub(crate) fn commit(&self, held: &TransitionGuard<'_>, next: DaemonState) -> bool {
        let current = self.state();
        if current == next {
            return false;
        }
        self.state.store(next.as_u8(), Ordering::Release);
        self.reporter.state_changed(current, next);
        self.listeners.notify_all(self.reporter.as_ref());
        self.run_deferred(held);
        true
    }

    pub(crate) fn set_started_okay(&self, value: bool) {
        *self
            .started_okay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub(crate) fn record_start_result(&self, result: &str) {
        result.clone_into(&mut self.lock_diagnostics().start_result);
    }

    /// Records `failure` and commits `startFailed`.
    pub(crate) fn fail_startup(&self, held: &TransitionGuard<'_>, failure: StartupFailure) {
        let failure = Arc::new(failure);
        self.lock_diagnostics().last_failure = Some(Arc::clone(&failure));
        self.reporter.startup_failed(&failure);
        self.commit(held, DaemonState::StartFailed);
    }

    fn apply_stop_accepting_tunnels(&self, held: &TransitionGuard<'_>) -> CommandOutcome {
        if !self.is_started_okay() {
            self.reporter
                .command_ignored(NativeCall::StopAcceptingTunnels, self.state());
            return CommandOutcome::Ignored;
        }

        self.commit(held, DaemonState::GracefulShutdownInProgress);
        self.best_effort(NativeCall::StopAcceptingTunnels, || {
            self.native.stop_accepting_tunnels()
        });
        CommandOutcome::Applied
    }

    fn apply_stop_daemon(&self, held: &TransitionGuard<'_>) -> CommandOutcome {
        if !self.is_started_okay() {
            self.reporter
                .command_ignored(NativeCall::StopDaemon, self.state());
            return CommandOutcome::Ignored;
        }

        self.best_effort(NativeCall::StopDaemon, || self.native.stop_daemon());
        self.set_started_okay(false);
        self.commit(held, DaemonState::Stopped);
        CommandOutcome::Applied
    }

    /// Queues `command` for the end of the current round.
    ///
    /// The notifying thread holds the transition lock, so the started flag
    /// cannot change before the queue drains except through a stop that is
    /// already queued.
    fn defer(&self, command: DeferredCommand) -> CommandOutcome {
        let mut deferred = self.lock_deferred();
        if !self.is_started_okay() || deferred.commands.contains(&DeferredCommand::StopDaemon) {
            self.reporter.command_ignored(command.call(), self.state());
            return CommandOutcome::Ignored;
        }
        deferred.commands.push_back(command);
        debug!(
            target: LIFECYCLE_TARGET,
            call = %command.call(),
            state = %self.state(),
            "command from state listener deferred until the round completes"
        );
        CommandOutcome::Applied
    }

    /// Runs queued commands in order. Commits made while draining leave the
    /// queue to the outermost drain so each command finishes before the next.
    fn run_deferred(&self, held: &TransitionGuard<'_>) {
        {
            let mut deferred = self.lock_deferred();
            if deferred.draining || deferred.commands.is_empty() {
                return;
            }
            deferred.draining = true;
        }
        loop {
            let next = {
                let mut deferred = self.lock_deferred();
                let next = deferred.commands.pop_front();
                deferred.draining = next.is_some();
                next
            };
            match next {
                Some(DeferredCommand::StopAcceptingTunnels) => {
                    self.apply_stop_accepting_tunnels(held);
                }
                Some(DeferredCommand::StopDaemon) => {
                    self.apply_stop_daemon(held);
                }
                None => return,
            }
        }
    }

    fn lock_unless_notifying(&self) -> Option<TransitionGuard<'_>> {
        if self.listeners.notifying_on_current_thread() {
            None
        } else {
            Some(self.lock_transitions())
        }
    }

    fn best_effort(
        &self,
        call: NativeCall,
        action: impl FnOnce() -> Result<(), native::NativeError>,
    ) {
        if let Err(error) = native::guarded(call, action) {
            self.reporter.native_call_failed(call, &error);
        }
    }

    fn lock_deferred(&self) -> MutexGuard<'_, DeferredQueue> {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_diagnostics(&self) -> MutexGuard<'_, Diagnostics> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LifecycleCoordinator {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LifecycleCoordinator")
            .field("state", &self.state())
            .field("started_okay", &self.is_started_okay())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}
