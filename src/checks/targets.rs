//! Target enumeration
//!
//! A check with an `each` lister runs once per line the lister prints (minus
//! ignored directories); a check without one runs once, unparameterized.

use crate::checks::macros::ResolvedCheck;
use crate::checks::runner::{self, CommandRunner, Invocation};
use crate::core::error::{RunError, RunResult};
use crate::utils;
use std::fmt;
use std::path::Path;

/// Unit a check runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  /// Implicit single target of a check without a lister
  Whole,
  /// One line of lister output
  Item(String),
}

impl Target {
  /// Value substituted for `$1`
  pub fn as_arg(&self) -> &str {
    match self {
      Target::Whole => ".",
      Target::Item(item) => item,
    }
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Target::Whole => write!(f, "the whole project"),
      Target::Item(item) => write!(f, "{}", item),
    }
  }
}

/// Split lister output into targets, dropping empty lines and ignored directories
pub fn filter_listing(stdout: &str, ignore_dir: &[String]) -> Vec<Target> {
  stdout
    .split('\n')
    .map(|line| line.strip_suffix('\r').unwrap_or(line))
    .filter(|line| !utils::is_excluded_target(line, ignore_dir))
    .map(|line| Target::Item(line.to_string()))
    .collect()
}

/// Enumerate the targets of a resolved check
///
/// The lister runs in `root`. Its failure is a [`RunError::Lister`] carrying
/// whatever it printed.
pub fn enumerate(check: &ResolvedCheck, runner: &dyn CommandRunner, root: &Path) -> RunResult<Vec<Target>> {
  let Some(lister) = &check.spec.lister else {
    return Ok(vec![Target::Whole]);
  };

  let invocation = Invocation::new(lister.cmd.clone(), lister.args.clone(), root);
  let output = runner::execute(runner, &invocation).map_err(|failure| RunError::Lister {
    command: invocation.to_string(),
    output: failure.output,
    reason: failure.error.to_string(),
  })?;

  let targets = filter_listing(&output.stdout, &lister.ignore_dir);
  tracing::debug!(check = %check.name(), count = targets.len(), "enumerated targets");
  Ok(targets)
}
