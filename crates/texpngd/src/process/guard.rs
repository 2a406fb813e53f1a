use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tracing::{info, warn};

use texpng_config::{RuntimePaths, read_process_record, remove_runtime_file};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::files::{pid_line, write_pid_file};
use super::probe::ProcessProbe;

/// Ownership of the startup lock and, once serving, the process record.
///
/// Dropping the guard removes both files.
#[derive(Debug)]
pub(crate) struct ProcessGuard {
    paths: RuntimePaths,
    _lock: File,
}

impl ProcessGuard {
    /// Takes the startup lock, clearing stale artefacts left by a dead
    /// service at most once.
    pub(crate) fn acquire<P>(paths: RuntimePaths, probe: &P) -> Result<Self, LaunchError>
    where
        P: ProcessProbe + ?Sized,
    {
        let lock = acquire_lock(&paths, probe)?;
        Ok(Self { paths, _lock: lock })
    }

    /// Rewrites the lock with `pid`, used after daemonisation changes the
    /// process identity.
    pub(crate) fn claim(&self, pid: u32) -> Result<(), LaunchError> {
        let path = self.paths.lock_path();
        write_pid_file(path, pid).map_err(|source| LaunchError::LockWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Publishes the process record; call only once the listener is bound.
    pub(crate) fn write_record(&self, pid: u32) -> Result<(), LaunchError> {
        let path = self.paths.record_path();
        write_pid_file(path, pid).map_err(|source| LaunchError::RecordWrite {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            target: PROCESS_TARGET,
            pid,
            file = %path.display(),
            "process record written"
        );
        Ok(())
    }

    pub(crate) fn paths(&self) -> &RuntimePaths {
        &self.paths
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        for (path, label) in [
            (self.paths.record_path(), "process record"),
            (self.paths.lock_path(), "lock file"),
        ] {
            if let Err(error) = remove_runtime_file(path) {
                warn!(
                    target: PROCESS_TARGET,
                    file = %path.display(),
                    error = %error,
                    "failed to remove {label}"
                );
            }
        }
    }
}

fn acquire_lock<P>(paths: &RuntimePaths, probe: &P) -> Result<File, LaunchError>
where
    P: ProcessProbe + ?Sized,
{
    if let Some(lock) = create_lock(paths.lock_path())? {
        return Ok(lock);
    }
    clear_stale_lock(paths, probe)?;
    create_lock(paths.lock_path())?.ok_or_else(|| LaunchError::LockContended {
        path: paths.lock_path().to_path_buf(),
    })
}

fn create_lock(path: &Path) -> Result<Option<File>, LaunchError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = match options.open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => return Ok(None),
        Err(source) => {
            return Err(LaunchError::LockCreate {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    file.write_all(&pid_line(std::process::id()))
        .and_then(|()| file.sync_all())
        .map_err(|source| LaunchError::LockWrite {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        target: PROCESS_TARGET,
        file = %path.display(),
        "acquired startup lock"
    );
    Ok(Some(file))
}

fn clear_stale_lock<P>(paths: &RuntimePaths, probe: &P) -> Result<(), LaunchError>
where
    P: ProcessProbe + ?Sized,
{
    if let Some(pid) = read_pid_leniently(paths.record_path()) {
        if is_alive(probe, pid)? {
            info!(
                target: PROCESS_TARGET,
                pid,
                "refusing to start: render service already running"
            );
            return Err(LaunchError::AlreadyRunning { pid });
        }
        warn!(
            target: PROCESS_TARGET,
            pid,
            "process record names a dead process; cleaning stale files"
        );
    } else if let Some(pid) = read_pid_leniently(paths.lock_path()) {
        if is_alive(probe, pid)? {
            info!(
                target: PROCESS_TARGET,
                pid,
                "refusing to start: another launch is still initialising"
            );
            return Err(LaunchError::StartupInProgress {
                lock: paths.lock_path().to_path_buf(),
                pid,
            });
        }
        warn!(
            target: PROCESS_TARGET,
            pid,
            "startup lock names a dead process; cleaning stale files"
        );
    } else {
        warn!(
            target: PROCESS_TARGET,
            file = %paths.lock_path().display(),
            "startup lock has no owner; cleaning stale files"
        );
    }

    remove_stale(paths.lock_path())?;
    remove_stale(paths.record_path())
}

fn read_pid_leniently(path: &Path) -> Option<u32> {
    read_process_record(path).unwrap_or_else(|error| {
        warn!(
            target: PROCESS_TARGET,
            error = %error,
            "treating unreadable runtime file as stale"
        );
        None
    })
}

fn is_alive<P>(probe: &P, pid: u32) -> Result<bool, LaunchError>
where
    P: ProcessProbe + ?Sized,
{
    probe
        .is_alive(pid)
        .map_err(|source| LaunchError::CheckProcess { pid, source })
}

fn remove_stale(path: &Path) -> Result<(), LaunchError> {
    remove_runtime_file(path).map_err(|source| LaunchError::Cleanup {
        path: path.to_path_buf(),
        source,
    })
}
