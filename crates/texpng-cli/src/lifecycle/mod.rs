//! Lifecycle management for `texpngd` as seen from the client.
//!
//! - [`error`] captures the error surface exposed to the CLI.
//! - [`spawning`] resolves and spawns the service binary.
//! - [`startup`] polls the service until its status endpoint answers.
//!
//! Stopping is delegated to `texpngd stop`, so the client never has to agree
//! with the service about where the process record lives.

mod error;
mod spawning;
mod startup;

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::Path;

use texpng_config::Config;

use crate::transport::RenderClient;

pub(crate) use error::LifecycleError;

/// Inputs shared by lifecycle operations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LifecycleContext<'a> {
    pub(crate) config: &'a Config,
    /// Configuration flags, without the program name, forwarded to the
    /// spawned service.
    pub(crate) forwarded_flags: &'a [OsString],
    /// Overrides the service binary resolution.
    pub(crate) service_binary: Option<&'a OsStr>,
}

/// Makes sure a render service answers on the configured address, spawning
/// one when the status check fails.
pub(crate) async fn ensure_running<E>(
    context: LifecycleContext<'_>,
    client: &RenderClient,
    macros: Option<&Path>,
    stderr: &mut E,
) -> Result<(), LifecycleError>
where
    E: Write,
{
    if client.is_healthy().await {
        return Ok(());
    }
    let binary = spawning::resolve_service_binary(context.service_binary);
    let _ = writeln!(
        stderr,
        "starting render service on {}",
        context.config.address()
    );
    let mut child = spawning::spawn_service(&binary, context.forwarded_flags, macros)?;
    startup::wait_for_ready(client, &mut child, &context.config.address()).await
}

/// Runs `texpngd [flags] stop` and relays what it prints.
///
/// The service's stdout and stderr are copied to the client's streams
/// unchanged; a non-zero exit becomes [`LifecycleError::StopFailed`].
pub(crate) fn stop_service<W, E>(
    context: LifecycleContext<'_>,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<(), LifecycleError>
where
    W: Write,
    E: Write,
{
    let binary = spawning::resolve_service_binary(context.service_binary);
    let output = spawning::run_stop_command(&binary, context.forwarded_flags)?;
    let _ = stdout.write_all(&output.stdout);
    let _ = stderr.write_all(&output.stderr);
    if output.status.success() {
        Ok(())
    } else {
        Err(LifecycleError::StopFailed {
            exit_status: output.status.code(),
        })
    }
}
