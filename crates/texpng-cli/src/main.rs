//! CLI entrypoint for the texpng renderer.
//!
//! The binary delegates to [`texpng_cli::run`], which loads configuration,
//! makes sure the render service is up, and performs the HTTP round trip.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    texpng_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
