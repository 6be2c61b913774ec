#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use tempfile::TempDir;

pub const FIRST_FILE: &str = "line 1\nline 2\nline 3\nline 4";

/// A directory holding the entries `1`, `2`, `3`, `4`; `1` has four lines.
pub fn listing_dir() -> TempDir {
	let dir = tempfile::tempdir().expect("failed to create temp dir");
	fs::write(dir.path().join("1"), FIRST_FILE).unwrap();
	for name in ["2", "3", "4"] {
		fs::write(dir.path().join(name), "").unwrap();
	}
	dir
}

/// Absolute, symlink-free path of `file` inside a fresh temp dir.
pub fn scratch_file(dir: &TempDir, file: &str) -> PathBuf {
	dir.path().canonicalize().unwrap().join(file)
}

pub fn minish(cwd: &Path) -> Command {
	let mut cmd = Command::cargo_bin("minish").expect("minish binary");
	cmd.current_dir(cwd);
	cmd
}

/// Runs `line` in single-shot mode inside `cwd`.
pub fn execute(cwd: &Path, line: &str) -> Output {
	minish(cwd)
		.arg("-t")
		.write_stdin(format!("{}\n", line))
		.output()
		.expect("failed to run minish")
}

pub fn stdout_of(output: &Output) -> String {
	String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
	String::from_utf8_lossy(&output.stderr).into_owned()
}
