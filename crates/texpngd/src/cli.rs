//! Command grammar of the `texpngd` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line interface of the render service.
#[derive(Debug, Parser)]
#[command(
    name = "texpngd",
    version,
    about = "Local render service turning TeX math into PNG images",
    after_help = "Configuration flags (--host, --port, --runtime-dir, --output-dir, \
                  --font-family, --log-filter, --log-format, --config-path) must \
                  precede the command."
)]
pub(crate) struct ServiceCli {
    #[command(subcommand)]
    pub(crate) command: ServiceCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ServiceCommand {
    /// Start the render service unless one is already running.
    Start {
        /// JSON file of extra TeX macros: `{ "name": ["template", argCount] }`.
        macros: Option<PathBuf>,
    },
    /// Signal the running render service to shut down.
    Stop,
}
