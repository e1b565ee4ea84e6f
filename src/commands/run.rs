//! `checkrun` - Run every configured check
//!
//! Checks run one after another in configuration order. For each check:
//! resolve its macro, install the tool if needed, then hand it to the engine
//! and drain every result before deciding the outcome. The first check that
//! fails stops the run.

use crate::checks::engine::{CheckRun, Engine};
use crate::checks::install::ToolInstaller;
use crate::checks::macros::{self, ResolvedCheck};
use crate::checks::runner::CommandRunner;
use crate::core::context::RunContext;
use crate::core::error::{RunError, RunResult};
use crate::ui::progress::TargetProgress;
use std::sync::Arc;

/// What draining one check's results produced
#[derive(Debug)]
pub struct CheckOutcome {
  pub total: usize,
  pub failed: usize,
  /// Last failure by arrival order
  pub last_error: Option<RunError>,
}

impl CheckOutcome {
  pub fn into_result(self) -> RunResult<()> {
    match self.last_error {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}

/// Run all checks in the context's configuration
pub fn run_checks(ctx: &RunContext, runner: Arc<dyn CommandRunner>) -> RunResult<()> {
  if ctx.config.checks.is_empty() {
    println!("✅ No checks configured");
    return Ok(());
  }

  let engine = Engine::for_context(Arc::clone(&runner), ctx);
  let installer = ToolInstaller::new(runner.as_ref(), ctx.root());

  for spec in &ctx.config.checks {
    let check = Arc::new(macros::resolve_check(spec, &ctx.config)?);
    installer.ensure_installed(&check)?;
    run_check(&engine, check, ctx.options.progress)?;
  }

  Ok(())
}

/// Run one resolved check and report its outcome
pub fn run_check(engine: &Engine, check: Arc<ResolvedCheck>, progress: bool) -> RunResult<()> {
  let name = check.name().to_string();
  let run = engine.run(check)?;
  let outcome = drain(run, &name, progress);

  if outcome.failed == 0 {
    println!("✅ {} ({} targets)", name, outcome.total);
  } else {
    println!("❌ {}: {} of {} targets failed", name, outcome.failed, outcome.total);
  }

  outcome.into_result()
}

/// Consume every result of a check
///
/// The output of each failing target is printed as it arrives; only the last
/// failure is kept as the check's error.
pub fn drain(run: CheckRun, name: &str, progress: bool) -> CheckOutcome {
  let mut bar = TargetProgress::maybe(progress, run.total, name);
  let mut outcome = CheckOutcome {
    total: run.total,
    failed: 0,
    last_error: None,
  };

  for result in run.results {
    if let Some(bar) = bar.as_mut() {
      bar.inc();
    }

    let Some(cause) = result.error else {
      continue;
    };

    outcome.failed += 1;
    let output = result.output.trim();
    if !output.is_empty() {
      println!("{}", output);
    }
    tracing::warn!(
      check = %result.check,
      target = %result.target,
      attempts = result.attempts,
      error = %cause,
      "target failed"
    );

    outcome.last_error = Some(RunError::Failed {
      check: result.check,
      target: result.target.to_string(),
      cause: Box::new(cause),
    });
  }

  outcome
}
