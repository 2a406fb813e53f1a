//! Shared fakes for render service tests.

mod fakes;

pub use fakes::{
    CountingLauncher, HealthEvent, RecordingHealthReporter, RecordingTypesetter, ScriptedProbe,
    TestDaemonizer, TestShutdownSignal, svg_fixture,
};
