use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use async_trait::async_trait;
use nix::errno::Errno;

use texpng_config::RuntimePaths;

use crate::health::HealthReporter;
use crate::http::RenderError;
use crate::macros::MacroTable;
use crate::process::{DaemonizeError, Daemonizer, ProcessProbe, ShutdownError, ShutdownSignal};
use crate::typeset::{
    EngineLauncher, TypesetError, TypesetRequest, Typesetter, apply_color,
};

/// Small SVG sized in `ex` units that paints with `currentColor`.
pub fn svg_fixture() -> String {
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="4ex" height="2ex" viewBox="0 0 40 20"><rect width="40" height="20" fill="currentColor"/></svg>"#
        .to_owned()
}

/// Typesetter that records requests and answers with [`svg_fixture`].
#[derive(Default)]
pub struct RecordingTypesetter {
    requests: Mutex<Vec<TypesetRequest>>,
    failure: Option<String>,
}

impl RecordingTypesetter {
    /// Builds a typesetter that rejects every fragment with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failure: Some(message.to_owned()),
        }
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<TypesetRequest> {
        self.requests.lock().expect("typesetter mutex poisoned").clone()
    }
}

#[async_trait]
impl Typesetter for RecordingTypesetter {
    async fn typeset(&self, request: TypesetRequest) -> Result<String, TypesetError> {
        let color = request.color.clone();
        self.requests
            .lock()
            .expect("typesetter mutex poisoned")
            .push(request);
        match &self.failure {
            Some(message) => Err(TypesetError::Engine {
                message: message.clone(),
            }),
            None => Ok(apply_color(&svg_fixture(), &color)),
        }
    }
}

/// Launcher that counts initialisations and can be told to fail.
#[derive(Clone, Default)]
pub struct CountingLauncher {
    launches: Arc<AtomicUsize>,
    fail: Arc<Mutex<bool>>,
}

impl CountingLauncher {
    /// Makes every later launch fail.
    pub fn fail_launches(&self) {
        *self.fail.lock().expect("launcher mutex poisoned") = true;
    }

    /// Number of launches attempted.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineLauncher for CountingLauncher {
    async fn launch(&self, _macros: MacroTable) -> Result<Arc<dyn Typesetter>, TypesetError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().expect("launcher mutex poisoned") {
            return Err(TypesetError::Engine {
                message: "engine refused to start".to_owned(),
            });
        }
        Ok(Arc::new(RecordingTypesetter::default()))
    }
}

/// Structured health events captured during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Engine start initiated.
    EngineStarting,
    /// Engine ready.
    EngineReady,
    /// Engine failed with a description.
    EngineFailed(String),
    /// Listener bound to an address.
    ListenerBound(SocketAddr),
    /// A render completed.
    RenderCompleted(String),
    /// A render failed with a description.
    RenderFailed(String),
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Address reported by the most recent bind.
    pub fn bound_address(&self) -> Option<SocketAddr> {
        self.events().into_iter().rev().find_map(|event| match event {
            HealthEvent::ListenerBound(address) => Some(address),
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn engine_starting(&self) {
        self.record(HealthEvent::EngineStarting);
    }

    fn engine_ready(&self) {
        self.record(HealthEvent::EngineReady);
    }

    fn engine_failed(&self, error: &TypesetError) {
        self.record(HealthEvent::EngineFailed(error.to_string()));
    }

    fn listener_bound(&self, address: SocketAddr) {
        self.record(HealthEvent::ListenerBound(address));
    }

    fn render_completed(&self, file: &str) {
        self.record(HealthEvent::RenderCompleted(file.to_owned()));
    }

    fn render_failed(&self, error: &RenderError) {
        self.record(HealthEvent::RenderFailed(error.to_string()));
    }
}

/// Probe that treats only the listed PIDs as alive.
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    alive: HashSet<u32>,
}

impl ScriptedProbe {
    /// Probe that sees only the test process itself.
    pub fn current_process() -> Self {
        Self {
            alive: HashSet::from([std::process::id()]),
        }
    }
}

impl ProcessProbe for ScriptedProbe {
    fn is_alive(&self, pid: u32) -> Result<bool, Errno> {
        Ok(self.alive.contains(&pid))
    }
}

/// Daemoniser that only counts calls.
#[derive(Clone, Default)]
pub struct TestDaemonizer {
    calls: Arc<AtomicUsize>,
}

impl TestDaemonizer {
    /// Number of daemonisation requests.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Daemonizer for TestDaemonizer {
    fn daemonize(&self, _paths: &RuntimePaths) -> Result<(), DaemonizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Shutdown signal released by [`TestShutdownSignal::trigger`].
#[derive(Clone)]
pub struct TestShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl TestShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        *triggered = true;
        cvar.notify_all();
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        while !*triggered {
            triggered = cvar
                .wait(triggered)
                .expect("shutdown mutex poisoned during wait");
        }
        Ok(())
    }
}
