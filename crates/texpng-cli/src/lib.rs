//! Command-line client for the texpng render service.
//!
//! The client parses `render`/`stop` invocations, loads the shared
//! configuration, starts `texpngd` on demand, and performs the HTTP round
//! trip. `stop` hands over to `texpngd stop`. Configuration loading and the IO streams are injectable so tests
//! can drive the runner without touching the real environment.

use std::env;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use texpng_config::{Config, ConfigArgumentSplit, split_config_arguments};

mod cli;
mod config;
mod errors;
mod lifecycle;
mod render;
mod transport;

use cli::{Cli, CliCommand, RenderArgs, usage};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
use lifecycle::{LifecycleContext, stop_service};
use render::RenderPlan;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    service_binary: Option<&'a OsStr>,
}

impl<'a, W, E, L> CliRunner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(io: &'a mut IoStreams<'a, W, E>, loader: &'a L) -> Self {
        Self {
            io,
            loader,
            service_binary: None,
        }
    }

    #[cfg(test)]
    fn with_service_binary(mut self, service_binary: Option<&'a OsStr>) -> Self {
        self.service_binary = service_binary;
        self
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);

        let cli = match Cli::try_parse_from(prepare_cli_arguments(&args, &split)) {
            Ok(cli) => cli,
            Err(error) if error.use_stderr() => {
                let _ = write!(self.io.stderr, "{error}");
                return ExitCode::FAILURE;
            }
            Err(error) => {
                let _ = write!(self.io.stdout, "{error}");
                return ExitCode::SUCCESS;
            }
        };

        let result = match cli.command {
            None => self.emit_usage(),
            Some(command) => self
                .loader
                .load(&split.config_arguments)
                .and_then(|config| self.dispatch(command, &config, &split)),
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                let _ = writeln!(self.io.stderr, "{error}");
                ExitCode::FAILURE
            }
        }
    }

    fn emit_usage(&mut self) -> Result<(), AppError> {
        writeln!(self.io.stdout, "{}", usage()).map_err(AppError::EmitUsage)
    }

    fn dispatch(
        &mut self,
        command: CliCommand,
        config: &Config,
        split: &ConfigArgumentSplit,
    ) -> Result<(), AppError> {
        let context = LifecycleContext {
            config,
            forwarded_flags: split.forwarded_flags(),
            service_binary: self.service_binary,
        };
        match command {
            CliCommand::Render(args) => self.render(args, context),
            CliCommand::Stop => self.stop(context),
        }
    }

    fn render(&mut self, args: RenderArgs, context: LifecycleContext<'_>) -> Result<(), AppError> {
        let cwd = env::current_dir().map_err(AppError::CurrentDir)?;
        let plan = RenderPlan::resolve(args, &cwd)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AppError::Runtime)?;
        runtime.block_on(render::execute(
            plan,
            context,
            &mut *self.io.stdout,
            &mut *self.io.stderr,
        ))
    }

    fn stop(&mut self, context: LifecycleContext<'_>) -> Result<(), AppError> {
        stop_service(context, &mut *self.io.stdout, &mut *self.io.stderr)?;
        Ok(())
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader).run(args)
}

#[cfg(test)]
pub(crate) fn run_with_service_binary<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    service_binary: Option<&'a OsStr>,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader)
        .with_service_binary(service_binary)
        .run(args)
}

fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    args.first()
        .cloned()
        .into_iter()
        .chain(args.iter().skip(split.command_start).cloned())
        .collect()
}

#[cfg(test)]
mod tests;
