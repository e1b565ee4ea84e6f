//! Tests for configuration loading and macro resolution

use crate::helpers::*;
use anyhow::Result;
use serde_json::json;

#[test]
fn test_missing_config_fails() -> Result<()> {
  let project = TestProject::new()?;
  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  assert!(stderr(&output).contains("checkrun.json"));
  Ok(())
}

#[test]
fn test_malformed_config_fails() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file("checkrun.json", "{ \"checks\": [")?;
  assert_exit_code(&project.run(&[])?, 1);
  Ok(())
}

#[test]
fn test_unknown_macro_fails() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{ "name": "mystery", "macro": "no-such-macro" }]
  }))?;

  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  assert!(stderr(&output).contains("no-such-macro"));
  Ok(())
}

#[test]
fn test_check_without_command_fails() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{ "name": "empty", "cmd": "true" }]
  }))?;

  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  assert!(stderr(&output).contains("empty"));
  Ok(())
}

#[test]
fn test_user_macro_fills_missing_fields() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "macros": {
      "touchy": {
        "name": "touch each",
        "cmd": "sh",
        "check": { "args": ["-c", "touch \"seen-$0\"", "$1"] },
        "each": { "cmd": "printf", "args": ["one\\ntwo\\n"] }
      }
    },
    "checks": [{ "macro": "touchy" }]
  }))?;

  let output = project.run(&[])?;
  assert_success(&output);
  assert!(stdout(&output).contains("✅ touch each (2 targets)"));
  assert!(project.file_exists("seen-one"));
  assert!(project.file_exists("seen-two"));
  Ok(())
}

#[test]
fn test_check_overrides_macro_coverage_threshold() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "macros": {
      "cover": {
        "cmd": "printf",
        "check": { "args": ["ok\\tpkg\\t0.01s\\tcoverage: 80.0%% of statements\\n"] },
        "validate": { "type": "cover", "coverage": 100 }
      }
    },
    "checks": [{ "name": "relaxed", "macro": "cover", "validate": { "coverage": 75 } }]
  }))?;

  assert_success(&project.run(&[])?);
  Ok(())
}

#[test]
fn test_toml_config() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file(
    "checkrun.toml",
    r#"simultaneousRuns = 2

[[checks]]
name = "toml check"
cmd = "true"

[checks.check]
args = []
"#,
  )?;

  let output = project.run_with("checkrun.toml", &[])?;
  assert_success(&output);
  assert!(stdout(&output).contains("✅ toml check (1 targets)"));
  Ok(())
}

#[test]
fn test_zero_jobs_rejected() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({ "checks": [] }))?;
  let output = project.run(&["--jobs", "0"])?;
  assert_exit_code(&output, 2);
  Ok(())
}
