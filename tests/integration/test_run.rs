//! Tests for running checks end to end

use crate::helpers::*;
use anyhow::Result;
use serde_json::json;

#[test]
fn test_silent_check_passes() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{ "name": "noop", "cmd": "true", "check": { "args": [] } }]
  }))?;

  let output = project.run(&[])?;
  assert_success(&output);
  assert!(stdout(&output).contains("✅ noop (1 targets)"));
  Ok(())
}

#[test]
fn test_ignored_messages_pass() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "warns",
      "cmd": "printf",
      "check": { "args": ["warning: ok\\n"] },
      "validate": { "ignoreMsg": ["warning"] }
    }]
  }))?;

  assert_success(&project.run(&[])?);
  Ok(())
}

#[test]
fn test_unexpected_output_fails() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{ "name": "chatty", "cmd": "printf", "check": { "args": ["main.go\\n"] } }]
  }))?;

  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  assert!(stdout(&output).contains("main.go"));
  assert!(stdout(&output).contains("❌ chatty: 1 of 1 targets failed"));
  Ok(())
}

#[test]
fn test_stderr_output_fails() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{ "name": "noisy", "cmd": "sh", "check": { "args": ["-c", "echo oops >&2"] } }]
  }))?;

  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  assert!(stdout(&output).contains("oops"));
  Ok(())
}

#[test]
fn test_returncode_validator_ignores_output() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "loud",
      "cmd": "sh",
      "check": { "args": ["-c", "echo lots of output; echo and more >&2"] },
      "validate": { "type": "returncode" }
    }]
  }))?;

  assert_success(&project.run(&[])?);
  Ok(())
}

#[test]
fn test_every_target_fails() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "lint",
      "cmd": "sh",
      "check": { "args": ["-c", "echo \"bad $0\"; exit 1", "$1"] },
      "each": { "cmd": "printf", "args": ["a.go\\nb.go\\n"] }
    }]
  }))?;

  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  let out = stdout(&output);
  assert!(out.contains("bad a.go"));
  assert!(out.contains("bad b.go"));
  assert!(out.contains("❌ lint: 2 of 2 targets failed"));
  Ok(())
}

#[test]
fn test_coverage_threshold() -> Result<()> {
  let project = TestProject::new()?;
  let config = |percent: &str| {
    json!({
      "checks": [{
        "name": "cover",
        "cmd": "printf",
        "check": { "args": [format!("ok\\tpkg\\t0.01s\\tcoverage: {}%% of statements\\n", percent)] },
        "validate": { "type": "cover", "coverage": 100 }
      }]
    })
  };

  project.write_config(&config("100.0"))?;
  assert_success(&project.run(&[])?);

  project.write_config(&config("99.0"))?;
  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  assert!(stderr(&output).contains("coverage 99.0% less than required 100.0%"));
  Ok(())
}

#[test]
fn test_fix_mode_retries_once() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "fixable",
      "cmd": "sh",
      "check": { "args": ["-c", "test -f fixed"] },
      "fix": { "args": ["-c", "if [ -f fixed ]; then exit 0; fi; touch fixed; exit 1"] }
    }]
  }))?;

  assert_exit_code(&project.run(&[])?, 1);
  assert!(!project.file_exists("fixed"));

  let output = project.run(&["--fix"])?;
  assert_success(&output);
  assert!(project.file_exists("fixed"));
  Ok(())
}

#[test]
fn test_global_ignore_dir_filters_targets() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "ignoreDir": ["vendor"],
    "checks": [{
      "name": "record",
      "cmd": "sh",
      "check": { "args": ["-c", "echo \"$0\" >> seen.txt", "$1"] },
      "each": { "cmd": "printf", "args": ["a.go\\nvendor/x/b.go\\nvendorx/c.go\\n"] }
    }]
  }))?;

  assert_success(&project.run(&["--jobs", "1"])?);
  let mut seen: Vec<String> = project.read_file("seen.txt")?.lines().map(String::from).collect();
  seen.sort();
  assert_eq!(seen, vec!["a.go", "vendorx/c.go"]);
  Ok(())
}

#[test]
fn test_failing_check_stops_later_checks() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [
      { "name": "first", "cmd": "false", "check": { "args": [] } },
      { "name": "second", "cmd": "sh", "check": { "args": ["-c", "touch second-ran"] } }
    ]
  }))?;

  assert_exit_code(&project.run(&[])?, 1);
  assert!(!project.file_exists("second-ran"));
  Ok(())
}

#[test]
fn test_lister_failure_fails_check() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "listed",
      "cmd": "true",
      "check": { "args": ["$1"] },
      "each": { "cmd": "sh", "args": ["-c", "echo cannot list; exit 3"] }
    }]
  }))?;

  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  assert!(stderr(&output).contains("cannot list"));
  assert!(!stdout(&output).contains("cannot list"));
  Ok(())
}

#[test]
fn test_commands_run_in_config_directory() -> Result<()> {
  let project = TestProject::new()?;
  std::fs::create_dir(project.path.join("sub"))?;
  std::fs::write(
    project.path.join("sub/checkrun.json"),
    serde_json::to_string(&json!({
      "checks": [{ "name": "where", "cmd": "sh", "check": { "args": ["-c", "touch here"] } }]
    }))?,
  )?;

  assert_success(&project.run_with("sub/checkrun.json", &[])?);
  assert!(project.file_exists("sub/here"));
  assert!(!project.file_exists("here"));
  Ok(())
}

#[test]
fn test_install_failure_shows_its_output() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "needs-tool",
      "cmd": "checkrun-missing-tool",
      "check": { "args": [] },
      "install": { "cmd": "sh", "args": ["-c", "printf '%s-%s\\n' registry unreachable; exit 1"] }
    }]
  }))?;

  let output = project.run(&[])?;
  assert_exit_code(&output, 1);
  assert!(stderr(&output).contains("registry-unreachable"));
  Ok(())
}

#[test]
fn test_verbose_mirrors_child_output() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(&json!({
    "checks": [{
      "name": "loud",
      "cmd": "sh",
      "check": { "args": ["-c", "printf '%s-%s\\n' mirrored out; printf '%s-%s\\n' mirrored err >&2"] },
      "validate": { "type": "returncode" }
    }]
  }))?;

  let quiet = project.run(&[])?;
  assert_success(&quiet);
  assert!(!stdout(&quiet).contains("mirrored-out"));

  let verbose = project.run(&["--verbose"])?;
  assert_success(&verbose);
  assert!(stdout(&verbose).contains("mirrored-out"));
  assert!(stderr(&verbose).contains("mirrored-err"));
  Ok(())
}
