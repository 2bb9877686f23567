//! Scriptable native daemon that records every call routed through it.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::native::{NativeCall, NativeDaemon, NativeError};

/// Test double for [`NativeDaemon`].
#[derive(Clone, Default)]
pub struct RecordingNativeDaemon {
    shared: Arc<Mutex<NativeScript>>,
}

#[derive(Default)]
struct NativeScript {
    calls: Vec<NativeCall>,
    startup_thread: Option<String>,
    load_error: Option<String>,
    start_result: Option<String>,
    start_error: Option<String>,
    stop_error: Option<String>,
    stop_accepting_error: Option<String>,
    panic_on: Option<NativeCall>,
    gate: Option<Arc<GateInner>>,
}

struct GateInner {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

/// Controls a start call that blocks until released.
pub struct StartGate {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl StartGate {
    /// Blocks until the native start call has begun.
    pub fn wait_entered(&self) {
        self.entered.recv().expect("start call never began");
    }

    /// Lets the blocked start call return.
    pub fn release(&self) {
        self.release.send(()).expect("start call no longer waiting");
    }
}

impl RecordingNativeDaemon {
    /// Daemon whose start call returns `result`.
    pub fn returning(result: impl Into<String>) -> Self {
        let daemon = Self::default();
        daemon.script().start_result = Some(result.into());
        daemon
    }

    /// Daemon whose library load fails.
    pub fn failing_load(message: impl Into<String>) -> Self {
        let daemon = Self::default();
        daemon.script().load_error = Some(message.into());
        daemon
    }

    /// Daemon whose start call faults.
    pub fn failing_start(message: impl Into<String>) -> Self {
        let daemon = Self::default();
        daemon.script().start_error = Some(message.into());
        daemon
    }

    /// Makes the stop call fault.
    pub fn fail_stop(&self, message: impl Into<String>) {
        self.script().stop_error = Some(message.into());
    }

    /// Makes the stop-accepting call fault.
    pub fn fail_stop_accepting(&self, message: impl Into<String>) {
        self.script().stop_accepting_error = Some(message.into());
    }

    /// Makes `call` panic instead of returning.
    pub fn panic_on(&self, call: NativeCall) {
        self.script().panic_on = Some(call);
    }

    /// Makes the start call block until the returned gate releases it.
    pub fn gate_start(&self) -> StartGate {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.script().gate = Some(Arc::new(GateInner {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        }));
        StartGate {
            entered: entered_rx,
            release: release_tx,
        }
    }

    /// Ordered list of calls observed so far.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.script().calls.clone()
    }

    /// Number of times `call` was observed.
    pub fn count(&self, call: NativeCall) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|observed| **observed == call)
            .count()
    }

    /// Name of the thread that loaded the libraries.
    pub fn startup_thread(&self) -> Option<String> {
        self.script().startup_thread.clone()
    }

    fn script(&self) -> MutexGuard<'_, NativeScript> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: NativeCall) {
        let mut script = self.script();
        script.calls.push(call);
        let should_panic = script.panic_on == Some(call);
        drop(script);
        assert!(!should_panic, "scripted panic in {call}");
    }
}

impl NativeDaemon for RecordingNativeDaemon {
    fn load_libraries(&self) -> Result<(), NativeError> {
        self.record(NativeCall::LoadLibraries);
        let mut script = self.script();
        script.startup_thread = thread::current().name().map(str::to_owned);
        match script.load_error.clone() {
            Some(message) => Err(NativeError::new(message)),
            None => Ok(()),
        }
    }

    fn start_daemon(&self) -> Result<String, NativeError> {
        self.record(NativeCall::StartDaemon);
        let gate = self.script().gate.clone();
        if let Some(gate) = gate {
            gate.entered
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .send(())
                .expect("gate observer dropped");
            gate.release
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv()
                .expect("gate released without signal");
        }
        let script = self.script();
        if let Some(message) = &script.start_error {
            return Err(NativeError::new(message.clone()));
        }
        Ok(script
            .start_result
            .clone()
            .unwrap_or_else(|| String::from("ok")))
    }

    fn stop_daemon(&self) -> Result<(), NativeError> {
        self.record(NativeCall::StopDaemon);
        match self.script().stop_error.clone() {
            Some(message) => Err(NativeError::new(message)),
            None => Ok(()),
        }
    }

    fn stop_accepting_tunnels(&self) -> Result<(), NativeError> {
        self.record(NativeCall::StopAcceptingTunnels);
        match self.script().stop_accepting_error.clone() {
            Some(message) => Err(NativeError::new(message)),
            None => Ok(()),
        }
    }
}
