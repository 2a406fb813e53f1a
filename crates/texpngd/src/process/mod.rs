//! Singleton lifecycle of the render service process.
//!
//! A start acquires an exclusive startup lock, optionally detaches into the
//! background, initialises the engine, binds the listener, and only then
//! writes the process record. Both files are removed when the guard drops.
//! A stop reads the record and delivers `SIGTERM`.

use std::time::Duration;

pub(crate) mod daemonizer;
mod errors;
mod files;
mod guard;
pub(crate) mod launch;
pub(crate) mod probe;
pub(crate) mod shutdown;
pub(crate) mod stop;

pub use daemonizer::{DaemonizeError, Daemonizer, SystemDaemonizer};
pub use errors::{LaunchError, StopError};
pub use launch::{LaunchMode, LaunchPlan, ProcessControl, ServiceDeps, run_daemon, run_daemon_with};
pub use probe::{ProcessProbe, SystemProcessProbe};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use stop::{Signaller, StopOutcome, SystemSignaller, stop_daemon, stop_with};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
/// Budget for in-flight requests to finish once shutdown begins.
pub(crate) const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const FOREGROUND_ENV_VAR: &str = "TEXPNG_FOREGROUND";
