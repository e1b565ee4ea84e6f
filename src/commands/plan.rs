//! `checkrun --dry-run` and `checkrun --list-macros`
//!
//! The dry run resolves every check and enumerates its targets (listers do
//! run), then prints the command line each target would get. No check,
//! install or fix command is executed.

use crate::checks::engine;
use crate::checks::macros::{self, ResolvedCheck};
use crate::checks::runner::CommandRunner;
use crate::checks::targets;
use crate::checks::validator::ValidatorSpec;
use crate::core::config::CheckSpec;
use crate::core::context::RunContext;
use crate::core::error::RunResult;
use std::collections::BTreeMap;

/// Command lines a check would run, one per target
pub fn plan_check(ctx: &RunContext, check: &ResolvedCheck, runner: &dyn CommandRunner) -> RunResult<Vec<String>> {
  let legacy = engine::uses_legacy_wrapper(check, ctx.root());
  targets::enumerate(check, runner, ctx.root())?
    .iter()
    .map(|target| {
      engine::build_invocation(check, target, ctx.options.fix, legacy, ctx.root()).map(|inv| inv.to_string())
    })
    .collect()
}

/// Print the plan for every configured check
pub fn run_plan(ctx: &RunContext, runner: &dyn CommandRunner) -> RunResult<()> {
  println!(
    "🔍 {} checks in {} (concurrency {}{})",
    ctx.config.checks.len(),
    ctx.root().display(),
    ctx.config.concurrency(),
    if ctx.options.fix { ", fix mode" } else { "" }
  );

  for spec in &ctx.config.checks {
    let check = macros::resolve_check(spec, &ctx.config)?;
    let commands = plan_check(ctx, &check, runner)?;

    println!();
    println!("{} [validator: {}]", check.name(), check.validator.kind());
    println!("DRY RUN: Would execute:");
    for command in &commands {
      println!("  {}", command);
    }
  }

  Ok(())
}

/// One line per macro: name, program and validator kind
pub fn describe_macros(macros: &BTreeMap<String, CheckSpec>) -> Vec<String> {
  macros
    .iter()
    .map(|(name, spec)| {
      let kind = ValidatorSpec::decode(spec.validator.as_ref())
        .map(|v| v.kind())
        .unwrap_or("invalid");
      format!("{:<12} {:<12} [validator: {}]", name, spec.cmd, kind)
    })
    .collect()
}

/// Print the macro catalog
pub fn run_list_macros(macros: &BTreeMap<String, CheckSpec>) -> RunResult<()> {
  println!("📋 {} macros:", macros.len());
  for line in describe_macros(macros) {
    println!("  {}", line.trim_end());
  }
  Ok(())
}
