//! Macro resolution
//!
//! A check that names a macro inherits every field it leaves empty from the
//! macro template. Precedence is "non-empty wins, local overrides template",
//! applied field by field, including inside the `fix`/`check`/`install`
//! commands and the `each` lister. The validator is resolved separately: a
//! check that does not declare a validator type inherits the macro's
//! validator, with the check's partial settings layered on top.

use crate::checks::validator::ValidatorSpec;
use crate::core::config::{CheckSpec, CommandSpec, RunConfig, TargetLister};
use crate::core::error::{ConfigError, ResultExt, RunError, RunResult};
use crate::utils;
use serde::Deserialize;
use std::collections::BTreeMap;

const BUILTIN_MACROS: &str = include_str!("builtin_macros.json");

#[derive(Deserialize)]
struct Catalog {
  macros: BTreeMap<String, CheckSpec>,
}

/// Built-in macro templates shipped with checkrun
pub fn builtin_catalog() -> RunResult<BTreeMap<String, CheckSpec>> {
  let catalog: Catalog = serde_json::from_str(BUILTIN_MACROS).context("built-in macro catalog is malformed")?;
  Ok(catalog.macros)
}

/// A check ready to execute: macro merged, validator decoded, ignore lists unioned
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCheck {
  pub spec: CheckSpec,
  pub validator: ValidatorSpec,
}

impl ResolvedCheck {
  pub fn name(&self) -> &str {
    self.spec.display_name()
  }

  /// Command used for invocations: `fix` in fix mode when present, else `check`
  pub fn command_for(&self, fix: bool) -> RunResult<&CommandSpec> {
    if fix && let Some(fix_cmd) = &self.spec.fix {
      return Ok(fix_cmd);
    }
    self.spec.check.as_ref().ok_or_else(|| RunError::MissingCommand {
      check: self.name().to_string(),
      which: "check",
    })
  }
}

fn non_empty(local: &str, template: &str) -> String {
  let value = if local.is_empty() { template } else { local };
  value.to_string()
}

fn non_empty_vec(local: &[String], template: &[String]) -> Vec<String> {
  let values = if local.is_empty() { template } else { local };
  values.to_vec()
}

fn merge_command(local: Option<&CommandSpec>, template: Option<&CommandSpec>) -> Option<CommandSpec> {
  match (local, template) {
    (Some(l), Some(t)) => Some(CommandSpec {
      cmd: non_empty(&l.cmd, &t.cmd),
      args: non_empty_vec(&l.args, &t.args),
    }),
    (l, t) => l.or(t).cloned(),
  }
}

fn merge_lister(local: Option<&TargetLister>, template: Option<&TargetLister>) -> Option<TargetLister> {
  match (local, template) {
    (Some(l), Some(t)) => Some(TargetLister {
      cmd: non_empty(&l.cmd, &t.cmd),
      args: non_empty_vec(&l.args, &t.args),
      ignore_dir: non_empty_vec(&l.ignore_dir, &t.ignore_dir),
    }),
    (l, t) => l.or(t).cloned(),
  }
}

/// Fill every empty field of `local` from `template`
///
/// The raw `validate` section and the macro reference stay local.
pub fn merge_check(local: &CheckSpec, template: &CheckSpec) -> CheckSpec {
  CheckSpec {
    name: non_empty(&local.name, &template.name),
    cmd: non_empty(&local.cmd, &template.cmd),
    fix: merge_command(local.fix.as_ref(), template.fix.as_ref()),
    check: merge_command(local.check.as_ref(), template.check.as_ref()),
    install: merge_command(local.install.as_ref(), template.install.as_ref()),
    tool_plugin: non_empty(&local.tool_plugin, &template.tool_plugin),
    legacy_deps: local.legacy_deps.or(template.legacy_deps),
    macro_name: local.macro_name.clone(),
    lister: merge_lister(local.lister.as_ref(), template.lister.as_ref()),
    validator: local.validator.clone(),
  }
}

fn resolve_validator(name: &str, local: &CheckSpec, template: Option<&CheckSpec>) -> RunResult<ValidatorSpec> {
  let invalid = |e: serde_json::Error| {
    RunError::Config(ConfigError::Invalid {
      field: format!("{}.validate", name),
      reason: e.to_string(),
    })
  };

  let own = local.validator.as_ref();
  match template {
    Some(template) if !own.is_some_and(ValidatorSpec::declares_type) => {
      let base = ValidatorSpec::decode(template.validator.as_ref()).map_err(invalid)?;
      match own {
        Some(overrides) => base.layer(overrides).map_err(invalid),
        None => Ok(base),
      }
    }
    _ => ValidatorSpec::decode(own).map_err(invalid),
  }
}

/// Produce the effective check: merge its macro, attach the validator and
/// union the run-wide ignored directories into the lister and coverage
/// validator
pub fn resolve_check(spec: &CheckSpec, config: &RunConfig) -> RunResult<ResolvedCheck> {
  let template = if spec.macro_name.is_empty() {
    None
  } else {
    let template = config.macros.get(&spec.macro_name).ok_or_else(|| RunError::UnknownMacro {
      check: spec.display_name().to_string(),
      name: spec.macro_name.clone(),
    })?;
    tracing::debug!(check = %spec.display_name(), macro_name = %spec.macro_name, "loading properties from macro");
    Some(template)
  };

  let mut merged = match template {
    Some(template) => merge_check(spec, template),
    None => spec.clone(),
  };

  let validator = resolve_validator(merged.display_name(), spec, template)?.with_ignored_dirs(&config.ignore_dir);

  if let Some(lister) = merged.lister.as_mut() {
    utils::union_into(&mut lister.ignore_dir, &config.ignore_dir);
  }

  Ok(ResolvedCheck {
    spec: merged,
    validator,
  })
}
