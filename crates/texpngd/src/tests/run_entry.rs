//! Tests for the `texpngd` entry point.

use std::ffi::OsString;
use std::fs;
use std::process::ExitCode;

use tempfile::TempDir;

use crate::run;

fn invoke(args: &[OsString]) -> (ExitCode, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(args.iter().cloned(), &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8(stdout).expect("stdout utf8"),
        String::from_utf8(stderr).expect("stderr utf8"),
    )
}

fn args(items: &[&str]) -> Vec<OsString> {
    items.iter().map(OsString::from).collect()
}

#[test]
fn stop_without_a_record_reports_not_running() {
    let dir = TempDir::new().expect("temp dir");
    let mut argv = args(&["texpngd", "--runtime-dir"]);
    argv.push(dir.path().as_os_str().to_owned());
    argv.push(OsString::from("stop"));

    let (code, stdout, stderr) = invoke(&argv);

    assert_eq!(code, ExitCode::SUCCESS, "stderr: {stderr}");
    assert_eq!(stdout.trim(), "render service is not running");
    assert!(fs::read_dir(dir.path()).expect("read dir").next().is_none());
}

#[test]
fn missing_command_fails() {
    let (code, stdout, stderr) = invoke(&args(&["texpngd"]));
    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Usage"), "stderr: {stderr}");
}

#[test]
fn help_goes_to_stdout() {
    let (code, stdout, _) = invoke(&args(&["texpngd", "--help"]));
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(stdout.contains("start"));
    assert!(stdout.contains("stop"));
}

#[test]
fn unknown_command_fails() {
    let (code, _, stderr) = invoke(&args(&["texpngd", "restart"]));
    assert_eq!(code, ExitCode::FAILURE);
    assert!(!stderr.is_empty());
}
