//! Tool installation
//!
//! Before a check runs, its `install` command is executed once if either the
//! check's program is missing from `PATH` or the tool plugin it names is not
//! listed by `go tool`.

use crate::checks::macros::ResolvedCheck;
use crate::checks::runner::{self, CommandRunner, Invocation};
use crate::core::error::{RunError, RunResult};
use crate::utils;
use std::ffi::OsString;
use std::path::Path;

/// Command that lists the available tool plugins, one per line
const TOOL_DISCOVERY: (&str, &[&str]) = ("go", &["tool"]);

/// What [`ToolInstaller::ensure_installed`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
  /// Program and tool plugin were already available
  Present,
  /// Something was missing and the install command ran
  Installed,
  /// Something was missing but the check has no install command
  NoInstaller,
}

pub struct ToolInstaller<'a> {
  runner: &'a dyn CommandRunner,
  root: &'a Path,
  search_path: Option<OsString>,
}

impl<'a> ToolInstaller<'a> {
  /// Installer that resolves programs against this process's `PATH`
  pub fn new(runner: &'a dyn CommandRunner, root: &'a Path) -> Self {
    Self {
      runner,
      root,
      search_path: std::env::var_os("PATH"),
    }
  }

  /// Use a different search path for program lookup
  #[cfg(test)]
  pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
    self.search_path = search_path;
    self
  }

  fn tool_plugin_available(&self, plugin: &str) -> RunResult<bool> {
    let (program, args) = TOOL_DISCOVERY;
    let invocation = Invocation::new(program, args.iter().map(|a| a.to_string()).collect(), self.root);
    let output = runner::execute(self.runner, &invocation).map_err(|failure| RunError::ToolDiscovery {
      command: invocation.to_string(),
      output: failure.output,
      reason: failure.error.to_string(),
    })?;

    Ok(output.combined().lines().any(|line| line.trim() == plugin))
  }

  /// Run the check's install command if its program or tool plugin is missing
  pub fn ensure_installed(&self, check: &ResolvedCheck) -> RunResult<InstallOutcome> {
    let spec = &check.spec;

    let plugin_found = spec.tool_plugin.is_empty() || self.tool_plugin_available(&spec.tool_plugin)?;
    let program_found = utils::find_on_path(&spec.cmd, self.search_path.as_deref()).is_some();
    if plugin_found && program_found {
      return Ok(InstallOutcome::Present);
    }

    let Some(install) = &spec.install else {
      tracing::debug!(check = %check.name(), program_found, plugin_found, "missing tool but no install command");
      return Ok(InstallOutcome::NoInstaller);
    };

    let invocation = Invocation::new(install.program(&spec.cmd), install.args.clone(), self.root);
    tracing::info!(check = %check.name(), command = %invocation, "installing");
    runner::execute(self.runner, &invocation).map_err(|failure| RunError::Install {
      command: invocation.to_string(),
      output: failure.output,
      reason: failure.error.to_string(),
    })?;

    Ok(InstallOutcome::Installed)
  }
}
