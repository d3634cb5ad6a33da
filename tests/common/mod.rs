// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::NamedTempFile;

/// Header plus the three-row scenario: A twice (net), B once (disk).
pub const SCENARIO_CSV: &str = "\
number,category,priority,opened_at,resolved_at,closed_at
A,net,2 - High,2024-01-01 00:00,2024-01-01 02:00,
A,net,2 - High,2024-01-01 00:30,,
B,disk,3 - Moderate,2024-01-02 00:00,2024-01-02 01:00,
";

const ENV_OVERRIDES: &[&str] = &[
    "DIGEST_MAX_ROWS",
    "DIGEST_TOP_K",
    "DIGEST_THREADS",
    "DIGEST_LOG",
    "DIGEST_LOG_FORMAT",
    "RUST_LOG",
];

/// Built binary with a scrubbed environment. Config discovery is disabled
/// unless the caller passes its own `--config-file`.
fn digest_command(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_incident-digest"));
    for var in ENV_OVERRIDES {
        cmd.env_remove(var);
    }
    if !args.contains(&"--config-file") && !args.contains(&"--ignore-config") {
        cmd.arg("--ignore-config");
    }
    cmd.args(args);
    cmd
}

fn collect(output: std::process::Output) -> (String, String, i32) {
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// Run incident-digest with given arguments and input via stdin
pub fn run_digest_with_input(args: &[&str], input: &[u8]) -> (String, String, i32) {
    let mut child = digest_command(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start incident-digest");

    if let Some(mut stdin) = child.stdin.take() {
        // A capped scan may stop reading before all input is written
        if let Err(e) = stdin.write_all(input) {
            assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe, "Failed to write to stdin");
        }
    }

    collect(child.wait_with_output().expect("Failed to read output"))
}

/// Run incident-digest on a temporary file holding `file_content`
pub fn run_digest_with_file(args: &[&str], file_content: &str) -> (String, String, i32) {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(file_content.as_bytes())
        .expect("Failed to write to temp file");
    run_digest_on_path(args, temp_file.path())
}

/// Run incident-digest on an existing path
pub fn run_digest_on_path(args: &[&str], path: &Path) -> (String, String, i32) {
    let mut full_args = args.to_vec();
    let path = path.to_str().expect("temp path is valid UTF-8");
    full_args.push(path);

    let output = digest_command(&full_args)
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute incident-digest");
    collect(output)
}

/// Parse the JSON envelope printed on stdout
pub fn parse_envelope(stdout: &str) -> Value {
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout is not a JSON envelope ({}): {}", e, stdout))
}

/// `[[value, count], ...]` view of a top list, for compact assertions
pub fn top_pairs(list: &Value) -> Vec<(String, u64)> {
    list.as_array()
        .expect("top list is an array")
        .iter()
        .map(|entry| {
            (
                entry["value"].as_str().unwrap().to_string(),
                entry["count"].as_u64().unwrap(),
            )
        })
        .collect()
}
