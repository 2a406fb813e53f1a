//! Error types for service lifecycle operations.

use std::ffi::OsString;
use std::io;

use thiserror::Error;

/// Errors raised while starting or stopping the render service.
#[derive(Debug, Error)]
pub(crate) enum LifecycleError {
    #[error("failed to spawn render service binary {binary:?}: {source}")]
    LaunchService {
        binary: OsString,
        #[source]
        source: io::Error,
    },
    #[error("render service exited before becoming ready (status: {exit_status:?})")]
    StartupFailed { exit_status: Option<i32> },
    #[error("render service did not answer on {address} within {timeout_ms} ms")]
    StartupTimeout { address: String, timeout_ms: u128 },
    #[error("failed to monitor render service launch: {source}")]
    MonitorChild {
        #[source]
        source: io::Error,
    },
    #[error("render service stop command failed (status: {exit_status:?})")]
    StopFailed { exit_status: Option<i32> },
}
