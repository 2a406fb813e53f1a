//! Stops a running render service by signalling the PID in its record.

use std::path::Path;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{info, warn};

use texpng_config::{Config, RuntimePaths, read_process_record, remove_runtime_file};

use super::PROCESS_TARGET;
use super::errors::StopError;

/// Delivers the termination signal to a PID.
pub trait Signaller {
    /// Sends `SIGTERM` to `pid`.
    ///
    /// # Errors
    ///
    /// Returns the OS error; `ESRCH` means the process no longer exists.
    fn terminate(&self, pid: i32) -> Result<(), Errno>;
}

/// Signaller backed by `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSignaller;

impl Signaller for SystemSignaller {
    fn terminate(&self, pid: i32) -> Result<(), Errno> {
        kill(Pid::from_raw(pid), Signal::SIGTERM)
    }
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// `SIGTERM` was delivered to the recorded PID.
    Signalled {
        /// PID that received the signal.
        pid: u32,
    },
    /// No process record exists.
    NotRunning,
    /// The record named a process that no longer exists; it was removed.
    StaleRecord {
        /// PID found in the stale record.
        pid: u32,
    },
}

/// Stops the render service described by `config`.
///
/// # Errors
///
/// See [`stop_with`].
pub fn stop_daemon(config: &Config) -> Result<StopOutcome, StopError> {
    let paths = RuntimePaths::from_config_readonly(config)?;
    stop_with(&paths, &SystemSignaller)
}

/// Stops the render service whose artefacts live at `paths`.
///
/// When no record exists nothing beyond the existence check happens.
///
/// # Errors
///
/// Fails when the record cannot be read, the signal cannot be delivered for
/// a reason other than `ESRCH`, or stale files cannot be removed.
pub fn stop_with<S>(paths: &RuntimePaths, signaller: &S) -> Result<StopOutcome, StopError>
where
    S: Signaller + ?Sized,
{
    if !paths.record_path().exists() {
        info!(target: PROCESS_TARGET, "render service is not running");
        return Ok(StopOutcome::NotRunning);
    }

    let Some(pid) = read_process_record(paths.record_path())? else {
        warn!(target: PROCESS_TARGET, "removing empty process record");
        remove_stale(paths.record_path())?;
        return Ok(StopOutcome::NotRunning);
    };
    let raw = i32::try_from(pid).map_err(|_| StopError::InvalidPid { pid })?;

    match signaller.terminate(raw) {
        Ok(()) => {
            info!(target: PROCESS_TARGET, pid, "sent SIGTERM to render service");
            Ok(StopOutcome::Signalled { pid })
        }
        Err(Errno::ESRCH) => {
            warn!(
                target: PROCESS_TARGET,
                pid,
                "recorded render service is gone; removing stale runtime files"
            );
            remove_stale(paths.record_path())?;
            remove_stale(paths.lock_path())?;
            Ok(StopOutcome::StaleRecord { pid })
        }
        Err(source) => Err(StopError::Signal { pid, source }),
    }
}

fn remove_stale(path: &Path) -> Result<(), StopError> {
    remove_runtime_file(path).map_err(|source| StopError::Cleanup {
        path: path.to_path_buf(),
        source,
    })
}
