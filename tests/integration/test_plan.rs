//! Tests for `--dry-run` and `--list-macros`

use crate::helpers::*;
use anyhow::Result;
use serde_json::json;

#[test]
fn test_dry_run_prints_commands_without_running() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "marker",
      "cmd": "sh",
      "check": { "args": ["-c", "touch ran", "$1"] },
      "each": { "cmd": "printf", "args": ["a.go\\nb.go\\n"] }
    }]
  }))?;

  let output = project.run(&["--dry-run"])?;
  assert_success(&output);
  let out = stdout(&output);
  assert!(out.contains("DRY RUN: Would execute:"));
  assert!(out.contains("sh -c touch ran a.go"));
  assert!(out.contains("sh -c touch ran b.go"));
  assert!(!project.file_exists("ran"));
  Ok(())
}

#[test]
fn test_dry_run_shows_fix_command() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "fmt",
      "cmd": "true",
      "check": { "args": ["-l", "$1"] },
      "fix": { "args": ["-w", "$1"] }
    }]
  }))?;

  let output = project.run(&["--dry-run", "--fix"])?;
  assert_success(&output);
  assert!(stdout(&output).contains("true -w ."));
  Ok(())
}

#[test]
fn test_list_builtin_macros() -> Result<()> {
  let project = TestProject::new()?;
  let output = project.run(&["--list-macros"])?;
  assert_success(&output);
  let out = stdout(&output);
  for name in ["goimport", "gofmt", "vet", "golint", "gocyclo", "go-install", "go-cover", "gocoverdir"] {
    assert!(out.contains(name), "missing macro {}", name);
  }
  Ok(())
}

#[test]
fn test_list_includes_user_macros() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "macros": { "house-style": { "cmd": "true", "check": { "args": [] } } }
  }))?;

  let output = project.run(&["--list-macros"])?;
  assert_success(&output);
  assert!(stdout(&output).contains("house-style"));
  Ok(())
}
