//! Waiting for the signal that ends a serving render service.
//!
//! `texpngd stop` sends `SIGTERM`; an operator pressing Ctrl-C in a
//! foreground session sends `SIGINT`. Either one releases the launch plan so
//! the HTTP server drains and the process record is removed.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that end a serving render service.
const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Source of the "stop serving now" notification.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks the calling thread until the service should stop.
    ///
    /// # Errors
    ///
    /// Fails when the notification source cannot be set up.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failure to listen for termination.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering the termination signal handlers failed.
    #[error("failed to listen for termination signals: {source}")]
    Install {
        /// Error from the signal registration.
        #[source]
        source: io::Error,
    },
}

/// Listens for termination signals delivered to this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals =
            Signals::new(TERMINATION_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        let received = signals.forever().next();
        info!(
            target: PROCESS_TARGET,
            signal = received.map_or("none", signal_name),
            "render service stopping"
        );
        Ok(())
    }
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGTERM => "SIGTERM",
        SIGINT => "SIGINT",
        SIGQUIT => "SIGQUIT",
        SIGHUP => "SIGHUP",
        _ => "unknown",
    }
}
