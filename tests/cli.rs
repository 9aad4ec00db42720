//! Integration tests for top-level CLI behavior.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_cli(args: &[&str], stdin: &[u8]) -> Output {
    let bin = env!("CARGO_BIN_EXE_markup-command");
    let mut child = Command::new(bin)
        .args(args)
        .env_remove("MARKUP_COMMAND_CONFIG")
        .env_remove("MARKUP_COMMAND_RECORD")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run markup-command binary");
    child.stdin.take().unwrap().write_all(stdin).unwrap();
    child.wait_with_output().unwrap()
}

#[cfg(unix)]
#[test]
fn render_pipes_stdin_through_command() {
    let output = run_cli(&["render", "--", "cat"], b"*hello*\r\n");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"*hello*\n");
}

#[cfg(unix)]
#[test]
fn render_failure_prints_converter_stderr() {
    let output = run_cli(&["render", "--", "sh", "-c", "echo 'bad heading' >&2; exit 1"], b"x");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(stderr.contains("bad heading"));
}

#[cfg(unix)]
#[test]
fn render_records_and_replays_cassette() {
    let dir = tempfile::tempdir().unwrap();
    let cassette = dir.path().join("session.cassette.yaml");
    let cassette = cassette.to_str().unwrap();

    let recorded = run_cli(&["render", "--record", cassette, "--", "tr", "a-z", "A-Z"], b"loud");
    assert!(recorded.status.success());
    assert_eq!(recorded.stdout, b"LOUD");

    let replayed = run_cli(
        &["render", "--replay", cassette, "--", "not-a-real-converter"],
        b"loud",
    );
    assert!(replayed.status.success());
    assert_eq!(replayed.stdout, b"LOUD");
}

#[test]
fn list_prints_configured_converters() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("conv.yaml");
    std::fs::write(&config, "converters:\n  - {name: rst, command: [rst2html.py, --no-raw]}\n")
        .unwrap();

    let output = run_cli(&["list", "--config", config.to_str().unwrap()], b"");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "rst\trst2html.py --no-raw\n");
}

#[test]
fn list_with_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("absent.yaml");
    let output = run_cli(&["list", "--config", config.to_str().unwrap()], b"");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("failed to read config file"));
}

#[test]
fn help_exits_successfully() {
    let output = run_cli(&["render", "--help"], b"");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--converter"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_cli(&["nonsense"], b"");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}
