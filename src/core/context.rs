//! Run context - build once, pass everywhere
//!
//! Holds the loaded configuration, the run root and the operator's flags.
//! Built in main.rs and handed by reference to every command, so nothing
//! reads process-wide state while checks execute.

use crate::core::config::RunConfig;
use crate::core::error::RunResult;
use std::path::{Path, PathBuf};

/// Operator flags that shape a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
  /// Run fix commands and re-verify failing targets once
  pub fix: bool,
  /// Mirror tool output to the console
  pub verbose: bool,
  /// Draw a progress bar per check
  pub progress: bool,
}

/// Everything a run needs, immutable once built
#[derive(Debug, Clone)]
pub struct RunContext {
  /// Directory holding the config file (absolute); commands run here
  pub root: PathBuf,

  /// Loaded configuration with built-in macros merged in
  pub config: RunConfig,

  pub options: RunOptions,
}

impl RunContext {
  /// Load the config file and derive the run root from its location
  ///
  /// `jobs` overrides the file's `simultaneousRuns`.
  pub fn build(config_path: &Path, options: RunOptions, jobs: Option<usize>) -> RunResult<Self> {
    let config_path = std::path::absolute(config_path)?;
    let mut config = RunConfig::load(&config_path)?;
    if let Some(limit) = jobs {
      config.set_concurrency(limit)?;
    }

    let root = config_path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));

    Ok(Self { root, config, options })
  }

  /// Get run root as Path reference (convenience)
  pub fn root(&self) -> &Path {
    &self.root
  }
}
