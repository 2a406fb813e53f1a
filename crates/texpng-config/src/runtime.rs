//! Derives runtime artefact paths shared by the CLI and the render service.
//!
//! The runtime directory houses the startup lock and the process record.
//! Both binaries need to agree on the layout so `stop` can find the record
//! written by whichever process is serving.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Config;

/// File name of the startup lock.
pub const LOCK_FILE_NAME: &str = "texpngd.lock";

/// File name of the process record.
pub const RECORD_FILE_NAME: &str = "texpngd.pid";

/// Canonical paths for runtime artefacts written by the render service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    runtime_dir: PathBuf,
    lock_path: PathBuf,
    record_path: PathBuf,
}

impl RuntimePaths {
    /// Derives runtime paths from the configuration, creating the directory.
    ///
    /// # Errors
    ///
    /// Fails when the executable location cannot be resolved or the runtime
    /// directory cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, RuntimePathsError> {
        let paths = Self::from_config_readonly(config)?;
        fs::create_dir_all(&paths.runtime_dir).map_err(|source| {
            RuntimePathsError::RuntimeDirectory {
                path: paths.runtime_dir.clone(),
                source,
            }
        })?;
        Ok(paths)
    }

    /// Derives runtime paths without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Fails when no directory is configured and the executable location
    /// cannot be resolved.
    pub fn from_config_readonly(config: &Config) -> Result<Self, RuntimePathsError> {
        let runtime_dir = match config.runtime_dir() {
            Some(dir) => dir.to_path_buf(),
            None => executable_directory()?,
        };
        Ok(Self::in_dir(runtime_dir))
    }

    /// Lays out runtime paths beneath an explicit directory.
    pub fn in_dir(runtime_dir: impl Into<PathBuf>) -> Self {
        let runtime_dir = runtime_dir.into();
        Self {
            lock_path: runtime_dir.join(LOCK_FILE_NAME),
            record_path: runtime_dir.join(RECORD_FILE_NAME),
            runtime_dir,
        }
    }

    /// Directory holding runtime artefacts.
    pub fn runtime_dir(&self) -> &Path {
        self.runtime_dir.as_path()
    }

    /// Path to the lock file guarding singleton startup.
    pub fn lock_path(&self) -> &Path {
        self.lock_path.as_path()
    }

    /// Path to the process record.
    pub fn record_path(&self) -> &Path {
        self.record_path.as_path()
    }
}

fn executable_directory() -> Result<PathBuf, RuntimePathsError> {
    let executable =
        env::current_exe().map_err(|source| RuntimePathsError::ExecutableLocation { source })?;
    match executable.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Err(RuntimePathsError::MissingExecutableParent { path: executable }),
    }
}

/// Errors raised while deriving runtime paths.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    /// The path of the running executable could not be determined.
    #[error("failed to locate the running executable: {source}")]
    ExecutableLocation {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The executable path lacked a parent directory.
    #[error("executable path '{path}' has no parent directory")]
    MissingExecutableParent {
        /// Executable path reported by the OS.
        path: PathBuf,
    },
    /// Creating the runtime directory failed.
    #[error("failed to prepare runtime directory '{path}': {source}")]
    RuntimeDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors raised while reading a process record.
#[derive(Debug, Error)]
pub enum ProcessRecordError {
    /// Reading the record failed.
    #[error("failed to read process record '{path}': {source}")]
    Read {
        /// Record path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The record did not contain a decimal PID.
    #[error("process record '{path}' holds '{content}', which is not a PID")]
    Parse {
        /// Record path.
        path: PathBuf,
        /// Trimmed record content.
        content: String,
    },
}

/// Reads the PID stored in a process record or lock file.
///
/// Returns `Ok(None)` when the file is missing or empty, or when it holds
/// the placeholder PID `0`.
///
/// # Errors
///
/// Fails when the file cannot be read or does not hold a decimal PID.
pub fn read_process_record(path: &Path) -> Result<Option<u32>, ProcessRecordError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ProcessRecordError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<u32>() {
        Ok(0) => Ok(None),
        Ok(pid) => Ok(Some(pid)),
        Err(_) => Err(ProcessRecordError::Parse {
            path: path.to_path_buf(),
            content: trimmed.to_owned(),
        }),
    }
}

/// Removes a runtime artefact, treating an already-missing file as success.
///
/// # Errors
///
/// Propagates any removal failure other than `NotFound`.
pub fn remove_runtime_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}
