//! Output validators
//!
//! A validator decides whether a command that exited cleanly actually
//! succeeded, by looking at what it printed. The `validate` section of a check
//! is decoded by its `type` tag:
//!
//! - absent or unknown: [`PlainOutput`] (stderr must be empty and every stdout
//!   line must contain an ignorable message)
//! - `"returncode"`: [`ValidatorSpec::ReturnCodeOnly`] (output is not inspected)
//! - `"cover"`: [`Coverage`] (every `go test -cover` line must meet the threshold)

use crate::core::error::OutputError;
use crate::utils;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

/// Marker printed by `go test` for packages without tests; counts as 0%
const NO_TEST_FILES: &str = "[no test files]";

/// Absorbs rounding at the first decimal of the printed percentage
const ROUNDING_SLACK: f64 = 0.009;

static COVERAGE_LINE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"coverage: ([0-9.]+)% of statements").expect("coverage pattern is valid"));

/// Judge of a completed invocation's captured output
pub trait OutputValidator: Send + Sync {
  /// Accept or reject the output of a command that exited successfully
  fn validate(&self, stdout: &str, stderr: &str) -> Result<(), OutputError>;
}

/// Accept only silent runs, or runs whose stdout lines are all expected
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlainOutput {
  /// Substrings that make a stdout line acceptable
  pub ignore_msg: Vec<String>,
}

impl OutputValidator for PlainOutput {
  fn validate(&self, stdout: &str, stderr: &str) -> Result<(), OutputError> {
    if !stderr.is_empty() {
      return Err(OutputError::NonEmptyStderr);
    }
    for line in stdout.lines().filter(|line| !line.is_empty()) {
      if !self.ignore_msg.iter().any(|msg| line.contains(msg.as_str())) {
        return Err(OutputError::UnexpectedOutput { line: line.to_string() });
      }
    }
    Ok(())
  }
}

/// Require every reported package to meet a coverage percentage
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Coverage {
  /// Required percentage
  #[serde(rename = "coverage")]
  pub required: f64,
  /// Packages under these directory names are not judged
  pub ignore_dir: Vec<String>,
}

impl Coverage {
  fn percentage(line: &str) -> Result<f64, OutputError> {
    if line.contains(NO_TEST_FILES) {
      return Ok(0.0);
    }
    COVERAGE_LINE
      .captures(line)
      .and_then(|caps| caps[1].parse::<f64>().ok())
      .ok_or_else(|| OutputError::UnparsableCoverageLine { line: line.to_string() })
  }
}

impl OutputValidator for Coverage {
  fn validate(&self, stdout: &str, _stderr: &str) -> Result<(), OutputError> {
    for line in stdout.lines().filter(|line| !line.is_empty()) {
      // `ok  \tpkg/path\t0.05s\tcoverage: ...`
      if let Some(package) = line.split('\t').nth(1)
        && utils::has_ignored_segment(package, &self.ignore_dir)
      {
        continue;
      }

      let seen = Self::percentage(line)?;
      if seen + ROUNDING_SLACK < self.required {
        return Err(OutputError::CoverageBelowThreshold {
          seen,
          required: self.required,
        });
      }
    }
    Ok(())
  }
}

/// Closed set of validators a check can use
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorSpec {
  PlainOutput(PlainOutput),
  ReturnCodeOnly,
  Coverage(Coverage),
}

impl Default for ValidatorSpec {
  fn default() -> Self {
    ValidatorSpec::PlainOutput(PlainOutput::default())
  }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Tag {
  #[serde(rename = "type")]
  kind: Option<String>,
}

/// Plain validator settings, including the legacy `ignoreOutput` switch
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct PlainSettings {
  ignore_msg: Vec<String>,
  ignore_output: bool,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct CoverageOverrides {
  coverage: Option<f64>,
  ignore_dir: Vec<String>,
}

impl ValidatorSpec {
  /// Decode a `validate` section: read the tag, then the variant's payload
  pub fn decode(raw: Option<&Value>) -> Result<Self, serde_json::Error> {
    let Some(raw) = raw else {
      return Ok(Self::default());
    };

    let tag = Tag::deserialize(raw)?;
    match tag.kind.as_deref() {
      Some("cover") => Ok(ValidatorSpec::Coverage(Coverage::deserialize(raw)?)),
      Some("returncode") => Ok(ValidatorSpec::ReturnCodeOnly),
      _ => {
        let settings = PlainSettings::deserialize(raw)?;
        if settings.ignore_output {
          Ok(ValidatorSpec::ReturnCodeOnly)
        } else {
          Ok(ValidatorSpec::PlainOutput(PlainOutput {
            ignore_msg: settings.ignore_msg,
          }))
        }
      }
    }
  }

  /// Whether a `validate` section names its own validator type
  pub fn declares_type(raw: &Value) -> bool {
    raw.get("type").is_some()
  }

  /// Layer a check's partial settings over this (macro-provided) validator
  ///
  /// Only fields present and non-empty in `overrides` replace the base.
  pub fn layer(self, overrides: &Value) -> Result<Self, serde_json::Error> {
    match self {
      ValidatorSpec::PlainOutput(mut plain) => {
        let settings = PlainSettings::deserialize(overrides)?;
        if !settings.ignore_msg.is_empty() {
          plain.ignore_msg = settings.ignore_msg;
        }
        Ok(ValidatorSpec::PlainOutput(plain))
      }
      ValidatorSpec::ReturnCodeOnly => Ok(ValidatorSpec::ReturnCodeOnly),
      ValidatorSpec::Coverage(mut cover) => {
        let other = CoverageOverrides::deserialize(overrides)?;
        if let Some(required) = other.coverage {
          cover.required = required;
        }
        if !other.ignore_dir.is_empty() {
          cover.ignore_dir = other.ignore_dir;
        }
        Ok(ValidatorSpec::Coverage(cover))
      }
    }
  }

  /// Add run-wide ignored directories to a coverage validator
  pub fn with_ignored_dirs(mut self, dirs: &[String]) -> Self {
    if let ValidatorSpec::Coverage(cover) = &mut self {
      utils::union_into(&mut cover.ignore_dir, dirs);
    }
    self
  }

  /// Short label for plans and logs
  pub fn kind(&self) -> &'static str {
    match self {
      ValidatorSpec::PlainOutput(_) => "plain",
      ValidatorSpec::ReturnCodeOnly => "returncode",
      ValidatorSpec::Coverage(_) => "cover",
    }
  }
}

impl OutputValidator for ValidatorSpec {
  fn validate(&self, stdout: &str, stderr: &str) -> Result<(), OutputError> {
    match self {
      ValidatorSpec::PlainOutput(plain) => plain.validate(stdout, stderr),
      ValidatorSpec::ReturnCodeOnly => Ok(()),
      ValidatorSpec::Coverage(cover) => cover.validate(stdout, stderr),
    }
  }
}
