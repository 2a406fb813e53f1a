//! Render service turning TeX math fragments into PNG images.
//!
//! `texpngd` is a small always-on local HTTP service. A render request names
//! a file holding one math fragment; the service strips its delimiters
//! ([`normalize`]), typesets it to SVG with MathJax ([`typeset`]),
//! rasterises the SVG with `resvg` ([`raster`]), and writes the PNG.
//!
//! Only one instance serves per runtime directory. The [`process`] module
//! enforces this with an exclusive startup lock and a process record that is
//! published once the listener is bound, and stops a running instance by
//! signalling the recorded PID.

mod cli;
mod health;
pub mod http;
pub mod macros;
pub mod normalize;
pub mod process;
pub mod raster;
mod telemetry;
pub mod typeset;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ortho_config::OrthoConfig;
use tracing::error;

use texpng_config::{Config, split_config_arguments};

use crate::cli::{ServiceCli, ServiceCommand};
use crate::process::{LaunchError, StopOutcome, run_daemon, stop_daemon};

pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};

const SERVICE_TARGET: &str = env!("CARGO_PKG_NAME");

/// Entry point shared by the binary and tests.
///
/// Leading configuration flags go to the configuration loader; the rest is
/// parsed as `start [macros]` or `stop`.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let command_args = split
        .config_arguments
        .first()
        .cloned()
        .into_iter()
        .chain(args.iter().skip(split.command_start).cloned());

    let cli = match ServiceCli::try_parse_from(command_args) {
        Ok(cli) => cli,
        Err(error) => {
            if error.use_stderr() {
                let _ = write!(stderr, "{error}");
                return ExitCode::FAILURE;
            }
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
    };

    let config = match Config::load_from_iter(split.config_arguments) {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(stderr, "texpngd: {}", LaunchError::from(error));
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = telemetry::initialise(&config) {
        let _ = writeln!(stderr, "texpngd: {error}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        ServiceCommand::Start { macros } => start(config, macros, stdout, stderr),
        ServiceCommand::Stop => stop(&config, stdout, stderr),
    }
}

fn start<W, E>(config: Config, macros: Option<PathBuf>, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    match run_daemon(config, macros) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) if error.is_informational() => {
            let _ = writeln!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(target: SERVICE_TARGET, error = %error, "render service failed");
            let _ = writeln!(stderr, "texpngd: {error}");
            ExitCode::FAILURE
        }
    }
}

fn stop<W, E>(config: &Config, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    match stop_daemon(config) {
        Ok(StopOutcome::Signalled { pid }) => {
            let _ = writeln!(stdout, "sent shutdown signal to render service (pid {pid})");
            ExitCode::SUCCESS
        }
        Ok(StopOutcome::NotRunning) => {
            let _ = writeln!(stdout, "render service is not running");
            ExitCode::SUCCESS
        }
        Ok(StopOutcome::StaleRecord { pid }) => {
            let _ = writeln!(
                stdout,
                "render service is not running (removed stale record for pid {pid})"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "texpngd: {error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
