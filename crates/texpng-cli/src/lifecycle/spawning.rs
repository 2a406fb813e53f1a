//! Service binary resolution and spawning.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};

use super::error::LifecycleError;

/// Environment variable naming the service binary explicitly.
pub(crate) const SERVICE_BIN_ENV: &str = "TEXPNGD_BIN";
const SERVICE_BIN_NAME: &str = "texpngd";

/// Picks the service binary: the override, then `TEXPNGD_BIN`, then a
/// `texpngd` next to the running executable, then `texpngd` on `PATH`.
pub(crate) fn resolve_service_binary(binary_override: Option<&OsStr>) -> OsString {
    binary_override
        .map(OsString::from)
        .or_else(|| env::var_os(SERVICE_BIN_ENV))
        .or_else(sibling_binary)
        .unwrap_or_else(|| OsString::from(SERVICE_BIN_NAME))
}

fn sibling_binary() -> Option<OsString> {
    let executable = env::current_exe().ok()?;
    let candidate = executable
        .parent()?
        .join(format!("{SERVICE_BIN_NAME}{}", env::consts::EXE_SUFFIX));
    candidate.is_file().then(|| candidate.into_os_string())
}

/// Spawns `binary [flags] start [macros]` detached from the client's stdio.
pub(super) fn spawn_service(
    binary: &OsStr,
    forwarded_flags: &[OsString],
    macros: Option<&Path>,
) -> Result<Child, LifecycleError> {
    let mut command = Command::new(binary);
    command.args(forwarded_flags).arg("start");
    if let Some(macros) = macros {
        command.arg(macros);
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit());
    command
        .spawn()
        .map_err(|source| LifecycleError::LaunchService {
            binary: binary.to_owned(),
            source,
        })
}

/// Runs `binary [flags] stop` to completion, capturing its output.
pub(super) fn run_stop_command(
    binary: &OsStr,
    forwarded_flags: &[OsString],
) -> Result<Output, LifecycleError> {
    Command::new(binary)
        .args(forwarded_flags)
        .arg("stop")
        .stdin(Stdio::null())
        .output()
        .map_err(|source| LifecycleError::LaunchService {
            binary: binary.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        let resolved = resolve_service_binary(Some(OsStr::new("/opt/texpng/texpngd")));
        assert_eq!(resolved, OsString::from("/opt/texpng/texpngd"));
    }

    #[test]
    fn spawn_reports_the_binary_it_tried() {
        let error = spawn_service(OsStr::new("/nonexistent/texpngd"), &[], None)
            .expect_err("missing binary should fail");
        match error {
            LifecycleError::LaunchService { binary, .. } => {
                assert_eq!(binary, OsString::from("/nonexistent/texpngd"));
            }
            other => panic!("expected LaunchService, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn stop_command_forwards_flags_before_the_subcommand() {
        let output = run_stop_command(
            OsStr::new("echo"),
            &[OsString::from("--port"), OsString::from("4100")],
        )
        .expect("echo should run");
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "--port 4100 stop\n");
    }

    #[test]
    fn stop_command_reports_the_binary_it_tried() {
        let error = run_stop_command(OsStr::new("/nonexistent/texpngd"), &[])
            .expect_err("missing binary should fail");
        assert!(matches!(error, LifecycleError::LaunchService { .. }));
    }
}
