//! Command grammar of the `texpng` binary.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

/// Command-line interface of the texpng client.
#[derive(Debug, Parser)]
#[command(
    name = "texpng",
    version,
    about = "Render TeX math fragments to PNG images",
    after_help = "Configuration flags (--host, --port, --runtime-dir, --output-dir, \
                  --font-family, --log-filter, --log-format, --config-path) must \
                  precede the command and are forwarded to the render service."
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    /// Render the math fragment in INPUT to a PNG image.
    Render(RenderArgs),
    /// Ask the running render service to shut down.
    Stop,
}

/// Positional arguments of `texpng render`.
#[derive(Debug, Clone, PartialEq, clap::Args)]
pub(crate) struct RenderArgs {
    /// File holding the TeX fragment, optionally wrapped in `$`, `$$`,
    /// `\(...\)` or `\[...\]`.
    pub(crate) input: PathBuf,
    /// Destination of the PNG image [default: output.png].
    pub(crate) output: Option<PathBuf>,
    /// Fill colour of the glyphs [default: #008000].
    pub(crate) color: Option<String>,
    /// Base font size in pixels [default: 25].
    pub(crate) font_size: Option<f32>,
    /// JSON macro file passed to a freshly started render service.
    pub(crate) macros: Option<PathBuf>,
}

/// Renders the long help text shown for bare invocations.
pub(crate) fn usage() -> String {
    Cli::command().render_long_help().to_string()
}
