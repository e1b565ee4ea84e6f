use crate::checks::macros;
use crate::core::error::{ConfigError, ResultExt, RunError, RunResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default config file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "checkrun.json";

/// A command name plus its argument template
///
/// An empty `cmd` means "use the check's own `cmd`".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommandSpec {
  pub cmd: String,
  pub args: Vec<String>,
}

impl CommandSpec {
  /// Program to run, falling back to the check's default command
  pub fn program<'a>(&'a self, default: &'a str) -> &'a str {
    if self.cmd.is_empty() { default } else { &self.cmd }
  }
}

/// External command that prints one target per line
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetLister {
  pub cmd: String,
  pub args: Vec<String>,
  /// Directory names whose contents are never targets
  pub ignore_dir: Vec<String>,
}

/// One configured check (also the shape of a macro template)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CheckSpec {
  pub name: String,
  pub cmd: String,

  pub fix: Option<CommandSpec>,
  pub check: Option<CommandSpec>,
  pub install: Option<CommandSpec>,

  /// Tool plugin that must show up in `go tool` output
  #[serde(rename = "gotool")]
  pub tool_plugin: String,

  /// Route invocations through `godep` when a `Godeps` directory exists
  #[serde(rename = "godep")]
  pub legacy_deps: Option<bool>,

  #[serde(rename = "macro")]
  pub macro_name: String,

  #[serde(rename = "each")]
  pub lister: Option<TargetLister>,

  /// Validator settings, decoded once the macro is merged in
  #[serde(rename = "validate")]
  pub validator: Option<serde_json::Value>,
}

impl CheckSpec {
  /// Name used in reports: the configured name, else the macro, else the command
  pub fn display_name(&self) -> &str {
    [&self.name, &self.macro_name, &self.cmd]
      .into_iter()
      .find(|s| !s.is_empty())
      .map(String::as_str)
      .unwrap_or("<unnamed>")
  }
}

/// Configuration for a checkrun invocation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunConfig {
  /// Checks, run in order
  pub checks: Vec<CheckSpec>,
  /// Named templates checks can inherit from
  pub macros: BTreeMap<String, CheckSpec>,
  /// Directory names excluded for every check
  pub ignore_dir: Vec<String>,
  /// Concurrent invocations per check (0 = default)
  pub simultaneous_runs: usize,
}

/// `2 × available cores + 1`
pub fn default_concurrency() -> usize {
  let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
  cores * 2 + 1
}

impl RunConfig {
  /// Load a config file, merge the built-in macros and settle the concurrency limit
  ///
  /// Files ending in `.toml` are read as TOML, everything else as JSON.
  pub fn load(path: &Path) -> RunResult<Self> {
    if !path.is_file() {
      return Err(RunError::Config(ConfigError::NotFound {
        path: path.to_path_buf(),
      }));
    }

    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed = match path.extension().and_then(|e| e.to_str()) {
      Some("toml") => Self::from_toml_str(&content),
      _ => Self::from_json_str(&content),
    };
    let config = parsed.map_err(|reason| {
      RunError::Config(ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
      })
    })?;

    config.with_builtin_macros()
  }

  fn from_json_str(content: &str) -> Result<Self, String> {
    serde_json::from_str(content).map_err(|e| e.to_string())
  }

  fn from_toml_str(content: &str) -> Result<Self, String> {
    toml_edit::de::from_str(content).map_err(|e| e.to_string())
  }

  /// Add the built-in macro catalog; user macros of the same name win
  pub fn with_builtin_macros(mut self) -> RunResult<Self> {
    for (name, template) in macros::builtin_catalog()? {
      self.macros.entry(name).or_insert(template);
    }
    if self.simultaneous_runs == 0 {
      self.simultaneous_runs = default_concurrency();
    }
    Ok(self)
  }

  /// Replace the concurrency limit (must be at least 1)
  pub fn set_concurrency(&mut self, limit: usize) -> RunResult<()> {
    if limit == 0 {
      return Err(RunError::Config(ConfigError::Invalid {
        field: "simultaneousRuns".to_string(),
        reason: "must be at least 1".to_string(),
      }));
    }
    self.simultaneous_runs = limit;
    Ok(())
  }

  /// Effective concurrency limit
  pub fn concurrency(&self) -> usize {
    if self.simultaneous_runs == 0 {
      default_concurrency()
    } else {
      self.simultaneous_runs
    }
  }
}
