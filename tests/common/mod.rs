//! Shared helpers for walbatch integration tests.
//!
//! Tests build real files in a temporary directory, run a batch (through the
//! library or the binary) and then inspect both the files and the log.

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walbatch::wal::{StepAction, WalRecord, read_records};

/// Creates a temp dir with files `a` and `c` holding distinct contents.
#[allow(unused)]
pub fn create_test_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a"), "contents of a\n").unwrap();
    fs::write(temp.path().join("c"), [0u8, 1, 2, 3, 255, 254]).unwrap();
    temp
}

#[allow(unused)]
pub fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

/// `(action, index)` pairs of every status record in the log.
#[allow(unused)]
pub fn log_statuses(wal: &Path) -> Vec<(StepAction, usize)> {
    read_records(wal)
        .unwrap()
        .iter()
        .filter_map(WalRecord::status)
        .collect()
}

/// Number of `batch_start` records in the log.
#[allow(unused)]
pub fn manifest_count(wal: &Path) -> usize {
    read_records(wal)
        .unwrap()
        .iter()
        .filter(|r| matches!(r, WalRecord::BatchStart { .. }))
        .count()
}

/// Writes a plan file. `steps` are `(name, source, target)` triples.
#[allow(unused)]
pub fn write_plan(dir: &Path, wal: &str, steps: &[(&str, &str, &str)]) -> PathBuf {
    let commands: Vec<_> = steps
        .iter()
        .map(|(name, source, target)| {
            serde_json::json!({"name": name, "source_path": source, "target_path": target})
        })
        .collect();
    let plan = serde_json::json!({"wal_path": wal, "commands": commands});

    let path = dir.join("plan.json");
    fs::write(&path, serde_json::to_string_pretty(&plan).unwrap()).unwrap();
    path
}

/// Runs the binary in `dir` with the given arguments.
#[allow(unused)]
pub fn run_walbatch(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("walbatch");
    cmd.args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("CLICOLOR_FORCE")
        .env("NO_COLOR", "1");

    cmd.assert()
}
