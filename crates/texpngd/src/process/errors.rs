//! Error surfaces for starting and stopping the render service.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use nix::errno::Errno;
use ortho_config::OrthoError;
use thiserror::Error;

use texpng_config::{ProcessRecordError, RuntimePathsError};

use crate::macros::MacroError;
use crate::typeset::TypesetError;

use super::daemonizer::DaemonizeError;
use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the render service.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration could not be loaded.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Runtime artefact paths could not be derived.
    #[error(transparent)]
    RuntimePaths(#[from] RuntimePathsError),
    /// Resolving the output base directory failed.
    #[error("failed to resolve output directory: {source}")]
    OutputDir {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Lock file creation failed.
    #[error("failed to create lock file '{path}': {source}")]
    LockCreate {
        /// Lock file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Another starter re-created the lock after stale cleanup.
    #[error("lock file '{path}' was taken by a concurrent start")]
    LockContended {
        /// Lock file path.
        path: PathBuf,
    },
    /// Writing the launching PID into the lock failed.
    #[error("failed to write lock file '{path}': {source}")]
    LockWrite {
        /// Lock file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A live render service already owns the process record.
    #[error("render service already running with pid {pid}")]
    AlreadyRunning {
        /// PID recorded in the existing process record.
        pid: u32,
    },
    /// Another launch holds the lock and has not written its record yet.
    #[error("render service startup already in progress (lock: '{lock}', pid {pid})")]
    StartupInProgress {
        /// Lock file guarding the active launch.
        lock: PathBuf,
        /// PID of the launching process.
        pid: u32,
    },
    /// Removing a stale runtime artefact failed.
    #[error("failed to remove stale file '{path}': {source}")]
    Cleanup {
        /// Path of the artefact that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the process record failed.
    #[error("failed to write process record '{path}': {source}")]
    RecordWrite {
        /// Record path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Probing an existing PID failed.
    #[error("failed to check existing process {pid}: {source}")]
    CheckProcess {
        /// PID that failed to probe.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// The macro file could not be loaded.
    #[error("failed to load macros: {source}")]
    Macros {
        /// Underlying macro error.
        #[from]
        source: MacroError,
    },
    /// Daemonisation failed.
    #[error("failed to daemonise: {source}")]
    Daemonize {
        /// Underlying daemonisation error.
        #[from]
        source: DaemonizeError,
    },
    /// Building the async runtime failed.
    #[error("failed to build async runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The typesetting engine failed to initialise.
    #[error("failed to initialise typesetting engine: {source}")]
    Engine {
        /// Underlying engine error.
        #[source]
        source: TypesetError,
    },
    /// Binding the HTTP listener failed.
    #[error("failed to bind render service to {address}: {source}")]
    Bind {
        /// Configured `host:port`.
        address: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The HTTP server stopped with an error.
    #[error("render service failed while serving: {source}")]
    Serve {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The HTTP server task panicked or was cancelled.
    #[error("render service task ended abnormally: {message}")]
    ServerTask {
        /// Join failure description.
        message: String,
    },
    /// The shutdown listener thread could not be spawned.
    #[error("failed to spawn shutdown listener: {source}")]
    ShutdownThread {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[from]
        source: ShutdownError,
    },
    /// The shutdown listener exited without reporting.
    #[error("shutdown listener exited unexpectedly")]
    ShutdownListenerLost,
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl LaunchError {
    /// Whether the error means another instance is serving or starting, so
    /// this start had nothing to do.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning { .. } | Self::StartupInProgress { .. }
        )
    }
}

/// Errors surfaced while stopping the render service.
#[derive(Debug, Error)]
pub enum StopError {
    /// Runtime artefact paths could not be derived.
    #[error(transparent)]
    RuntimePaths(#[from] RuntimePathsError),
    /// The process record could not be read.
    #[error(transparent)]
    Record(#[from] ProcessRecordError),
    /// The recorded PID does not fit the platform's PID type.
    #[error("process record holds out-of-range pid {pid}")]
    InvalidPid {
        /// Recorded PID.
        pid: u32,
    },
    /// Delivering `SIGTERM` failed.
    #[error("failed to signal render service pid {pid}: {source}")]
    Signal {
        /// Target PID.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// Removing a stale runtime artefact failed.
    #[error("failed to remove stale file '{path}': {source}")]
    Cleanup {
        /// Path of the artefact that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
