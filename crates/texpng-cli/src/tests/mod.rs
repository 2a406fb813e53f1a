//! Runner tests driven through injected configuration and a stub service.

mod support;

use std::ffi::{OsStr, OsString};
use std::fs;
use std::process::ExitCode;

use tempfile::TempDir;

use texpng_config::Config;

use crate::{IoStreams, run_with_service_binary};

use support::{FixedConfigLoader, StubService, closed_port};

const MISSING_BINARY: &str = "/nonexistent/texpngd";

struct Outcome {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn invoke(config: Config, args: &[&OsStr]) -> Outcome {
    invoke_with_service(config, args, MISSING_BINARY)
}

fn invoke_with_service(config: Config, args: &[&OsStr], service_binary: &str) -> Outcome {
    let loader = FixedConfigLoader(config);
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let argv: Vec<OsString> = std::iter::once(OsStr::new("texpng"))
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let exit = {
        let mut io = IoStreams::new(&mut stdout, &mut stderr);
        run_with_service_binary(argv, &mut io, &loader, Some(OsStr::new(service_binary)))
    };
    Outcome {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

fn config_for_port(port: u16, runtime_dir: &TempDir) -> Config {
    Config {
        port,
        runtime_dir: Some(runtime_dir.path().to_path_buf()),
        ..Config::default()
    }
}

#[test]
fn bare_invocation_prints_usage() {
    let outcome = invoke(Config::default(), &[]);
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("Usage"), "stdout: {}", outcome.stdout);
    assert!(outcome.stderr.is_empty());
}

#[test]
fn help_command_prints_usage() {
    let outcome = invoke(Config::default(), &[OsStr::new("help")]);
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("render"));
}

#[test]
fn unknown_command_fails() {
    let outcome = invoke(Config::default(), &[OsStr::new("paint")]);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(!outcome.stderr.is_empty());
}

#[test]
fn missing_input_fails_before_contacting_the_service() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("absent.tex");
    let outcome = invoke(
        config_for_port(closed_port(), &dir),
        &[OsStr::new("render"), input.as_os_str()],
    );
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(
        outcome.stderr.starts_with("input file not found"),
        "stderr: {}",
        outcome.stderr
    );
    assert!(!outcome.stderr.contains("starting render service"));
}

#[test]
fn healthy_service_renders_without_spawning() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("eq.tex");
    let output = dir.path().join("eq.png");
    fs::write(&input, "$$E=mc^2$$").expect("write input");
    let service = StubService::succeeding();

    let outcome = invoke(
        config_for_port(service.port(), &dir),
        &[
            OsStr::new("render"),
            input.as_os_str(),
            output.as_os_str(),
            OsStr::new("#ff0000"),
            OsStr::new("30"),
        ],
    );

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout.trim(),
        format!("Rendered {}", output.display())
    );
    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let request = requests.first().expect("one request");
    assert_eq!(request.input_file.as_deref(), input.to_str());
    assert_eq!(request.out_file.as_deref(), output.to_str());
    assert_eq!(request.color.as_deref(), Some("#ff0000"));
    assert_eq!(request.font_size, Some(30.0));
}

#[test]
fn structured_service_errors_fail_the_command() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("eq.tex");
    fs::write(&input, "\\frac{").expect("write input");
    let service = StubService::failing("Typesetting failed: missing close brace");

    let outcome = invoke(
        config_for_port(service.port(), &dir),
        &[OsStr::new("render"), input.as_os_str()],
    );

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert_eq!(
        outcome.stderr.trim(),
        "render failed: Typesetting failed: missing close brace"
    );
}

#[test]
fn unreachable_service_is_spawned_and_spawn_failures_surface() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("eq.tex");
    fs::write(&input, "x").expect("write input");

    let outcome = invoke(
        config_for_port(closed_port(), &dir),
        &[OsStr::new("render"), input.as_os_str()],
    );

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("starting render service"));
    assert!(
        outcome.stderr.contains("failed to spawn render service binary"),
        "stderr: {}",
        outcome.stderr
    );
}

#[cfg(unix)]
#[test]
fn stop_runs_the_service_stop_command_with_forwarded_flags() {
    // `echo` stands in for texpngd and prints the arguments it received.
    let outcome = invoke_with_service(
        Config::default(),
        &[
            OsStr::new("--port"),
            OsStr::new("4100"),
            OsStr::new("--runtime-dir=/srv/texpng"),
            OsStr::new("stop"),
        ],
        "echo",
    );
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout.trim(),
        "--port 4100 --runtime-dir=/srv/texpng stop"
    );
}

#[cfg(unix)]
#[test]
fn failing_service_stop_command_fails_the_client() {
    let outcome = invoke_with_service(Config::default(), &[OsStr::new("stop")], "false");
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(
        outcome.stderr.contains("render service stop command failed"),
        "stderr: {}",
        outcome.stderr
    );
}

#[test]
fn stop_reports_a_missing_service_binary() {
    let outcome = invoke(Config::default(), &[OsStr::new("stop")]);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(
        outcome.stderr.contains("failed to spawn render service binary"),
        "stderr: {}",
        outcome.stderr
    );
}
