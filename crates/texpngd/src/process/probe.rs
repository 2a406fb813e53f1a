//! Liveness probing for PIDs found in runtime artefacts.

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Answers whether a PID names a live process.
pub trait ProcessProbe: Send + Sync {
    /// Returns `Ok(true)` when `pid` is alive.
    ///
    /// # Errors
    ///
    /// Returns the OS error when the probe itself fails.
    fn is_alive(&self, pid: u32) -> Result<bool, Errno>;
}

/// Probe that sends the null signal with `kill(2)`.
///
/// `EPERM` still proves the process exists; `ESRCH` means it is gone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessProbe;

impl ProcessProbe for SystemProcessProbe {
    fn is_alive(&self, pid: u32) -> Result<bool, Errno> {
        let Ok(raw) = i32::try_from(pid) else {
            return Ok(false);
        };
        if raw == 0 {
            return Ok(false);
        }
        match kill(Pid::from_raw(raw), None) {
            Ok(()) | Err(Errno::EPERM) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(errno) => Err(errno),
        }
    }
}
