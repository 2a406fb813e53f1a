//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to write usage: {0}")]
    EmitUsage(io::Error),
    #[error("failed to start the async runtime: {0}")]
    Runtime(io::Error),
    #[error("failed to resolve the working directory: {0}")]
    CurrentDir(io::Error),
    #[error("input file not found: {}", path.display())]
    MissingInput { path: PathBuf },
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
