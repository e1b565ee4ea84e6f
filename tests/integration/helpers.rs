//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A temp directory holding a checkrun configuration
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestProject {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Write `checkrun.json`
  pub fn write_config(&self, json: &serde_json::Value) -> Result<()> {
    self.write_file("checkrun.json", &serde_json::to_string_pretty(json)?)
  }

  pub fn write_file(&self, name: &str, content: &str) -> Result<()> {
    std::fs::write(self.path.join(name), content).with_context(|| format!("Failed to write {}", name))
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Run checkrun with `--config` pointing at `config` inside the project
  pub fn run_with(&self, config: &str, args: &[&str]) -> Result<Output> {
    let config = self.path.join(config);
    let mut full = vec!["--config", config.to_str().context("non-UTF-8 temp path")?];
    full.extend_from_slice(args);
    run_checkrun(&self.path, &full)
  }

  /// Run checkrun against `checkrun.json`
  pub fn run(&self, args: &[&str]) -> Result<Output> {
    self.run_with("checkrun.json", args)
  }
}

/// Run the checkrun binary, whatever its exit status
pub fn run_checkrun(cwd: &Path, args: &[&str]) -> Result<Output> {
  let checkrun_bin = env!("CARGO_BIN_EXE_checkrun");

  Command::new(checkrun_bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run checkrun")
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Fail with both streams when the run did not succeed
pub fn assert_success(output: &Output) {
  assert!(
    output.status.success(),
    "checkrun failed\nstdout: {}\nstderr: {}",
    stdout(output),
    stderr(output)
  );
}

/// Fail with both streams unless the run exited with `code`
pub fn assert_exit_code(output: &Output, code: i32) {
  assert_eq!(
    output.status.code(),
    Some(code),
    "unexpected exit status\nstdout: {}\nstderr: {}",
    stdout(output),
    stderr(output)
  );
}
