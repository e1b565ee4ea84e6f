//! Execution engine
//!
//! Runs one check against all of its targets with at most `concurrency`
//! invocations active at once.
//!
//! ```text
//! targets ──► TargetQueue ──► worker 1 ──┐
//!              (pop_front)    worker 2 ──┼──► mpsc channel ──► caller
//!                             worker N ──┘
//! ```
//!
//! Workers live on a dedicated rayon pool sized to the concurrency limit.
//! Each one takes the next pending target until the queue is empty, so a
//! target is handled by exactly one worker. The result channel closes once
//! every worker has dropped its sender, which happens only after the queue is
//! drained.
//!
//! Per target: build the command line, run it, validate its output. In fix
//! mode a failed first attempt of a check with a `fix` command is retried
//! exactly once.

use crate::checks::macros::ResolvedCheck;
use crate::checks::runner::{self, CommandRunner, Invocation};
use crate::checks::targets::{self, Target};
use crate::checks::validator::OutputValidator;
use crate::core::context::RunContext;
use crate::core::error::{RunError, RunResult};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

/// Placeholder replaced by the target in argument templates
pub const TARGET_PLACEHOLDER: &str = "$1";

/// Wrapper program for checks that opt into legacy dependency handling
pub const LEGACY_WRAPPER: &str = "godep";

/// Directory whose presence in the run root enables the legacy wrapper
pub const LEGACY_MARKER: &str = "Godeps";

/// Outcome of running a check against one target
#[derive(Debug)]
pub struct InvocationResult {
  /// Display name of the check
  pub check: String,
  pub target: Target,
  /// Captured stdout followed by stderr
  pub output: String,
  /// Why the target failed, if it did
  pub error: Option<RunError>,
  /// Number of times the command ran (1, or 2 after a fix retry)
  pub attempts: u8,
}

impl InvocationResult {
  fn success(check: &str, target: Target, output: String, attempts: u8) -> Self {
    Self {
      check: check.to_string(),
      target,
      output,
      error: None,
      attempts,
    }
  }

  fn failure(check: &str, target: Target, output: String, error: RunError, attempts: u8) -> Self {
    Self {
      check: check.to_string(),
      target,
      output,
      error: Some(error),
      attempts,
    }
  }

  pub fn is_success(&self) -> bool {
    self.error.is_none()
  }
}

/// Results of one check as they complete
pub struct CheckRun {
  /// Number of results the receiver will yield
  pub total: usize,
  pub results: Receiver<InvocationResult>,
}

/// Pending targets shared by the workers of one check
struct TargetQueue {
  pending: Mutex<VecDeque<Target>>,
}

impl TargetQueue {
  fn new(targets: Vec<Target>) -> Self {
    Self {
      pending: Mutex::new(targets.into()),
    }
  }

  /// Take the next target in enumeration order
  fn next(&self) -> Option<Target> {
    self.pending.lock().unwrap_or_else(PoisonError::into_inner).pop_front()
  }
}

/// Build the command line for one target
///
/// Every occurrence of `$1` in the argument template is replaced by the target.
/// With `legacy` set, the program becomes `godep` and the resolved program is
/// prepended to the arguments.
pub fn build_invocation(
  check: &ResolvedCheck,
  target: &Target,
  fix: bool,
  legacy: bool,
  root: &Path,
) -> RunResult<Invocation> {
  let command = check.command_for(fix)?;
  let mut program = command.program(&check.spec.cmd).to_string();
  let mut args: Vec<String> = command
    .args
    .iter()
    .map(|arg| arg.replace(TARGET_PLACEHOLDER, target.as_arg()))
    .collect();

  if legacy {
    args.insert(0, program);
    program = LEGACY_WRAPPER.to_string();
  }

  Ok(Invocation::new(program, args, root))
}

/// Whether the check's invocations go through the legacy wrapper in `root`
pub fn uses_legacy_wrapper(check: &ResolvedCheck, root: &Path) -> bool {
  check.spec.legacy_deps == Some(true) && root.join(LEGACY_MARKER).exists()
}

#[derive(Clone)]
struct Worker {
  runner: Arc<dyn CommandRunner>,
  check: Arc<ResolvedCheck>,
  root: PathBuf,
  fix: bool,
  legacy: bool,
  mirror: bool,
}

impl Worker {
  /// Process targets until the queue is empty or the caller stops listening
  fn drain(&self, queue: &TargetQueue, results: &Sender<InvocationResult>) {
    while let Some(target) = queue.next() {
      if results.send(self.process(target)).is_err() {
        break;
      }
    }
  }

  fn process(&self, target: Target) -> InvocationResult {
    let first = self.attempt(target, 1);
    let retry = self.fix && self.check.spec.fix.is_some() && !first.is_success();
    if !retry {
      return first;
    }

    tracing::debug!(check = %first.check, target = %first.target, "retrying after fix");
    self.attempt(first.target, 2)
  }

  fn attempt(&self, target: Target, attempt: u8) -> InvocationResult {
    let name = self.check.name();
    let invocation = match build_invocation(&self.check, &target, self.fix, self.legacy, &self.root) {
      Ok(invocation) => invocation.mirrored(self.mirror),
      Err(e) => return InvocationResult::failure(name, target, String::new(), e, attempt),
    };

    let output = match runner::execute(self.runner.as_ref(), &invocation) {
      Ok(output) => output,
      Err(failure) => {
        return InvocationResult::failure(name, target, failure.output, failure.error.into(), attempt);
      }
    };

    let combined = output.combined();
    match self.check.validator.validate(&output.stdout, &output.stderr) {
      Ok(()) => InvocationResult::success(name, target, combined, attempt),
      Err(rejection) => InvocationResult::failure(name, target, combined, rejection.into(), attempt),
    }
  }
}

/// Bounded worker pool running checks as child processes
pub struct Engine {
  runner: Arc<dyn CommandRunner>,
  root: PathBuf,
  concurrency: usize,
  fix: bool,
  mirror: bool,
}

impl Engine {
  pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>, concurrency: usize) -> Self {
    Self {
      runner,
      root: root.into(),
      concurrency: concurrency.max(1),
      fix: false,
      mirror: false,
    }
  }

  /// Engine configured from the run context's flags and concurrency limit
  pub fn for_context(runner: Arc<dyn CommandRunner>, ctx: &RunContext) -> Self {
    Self::new(runner, ctx.root(), ctx.config.concurrency())
      .with_fix(ctx.options.fix)
      .with_mirror(ctx.options.verbose)
  }

  pub fn with_fix(mut self, fix: bool) -> Self {
    self.fix = fix;
    self
  }

  pub fn with_mirror(mut self, mirror: bool) -> Self {
    self.mirror = mirror;
    self
  }

  /// Enumerate the check's targets and start running them
  ///
  /// A failing lister yields a single failed result instead of an error. A
  /// check with no usable command fails before anything runs.
  pub fn run(&self, check: Arc<ResolvedCheck>) -> RunResult<CheckRun> {
    check.command_for(self.fix)?;

    match targets::enumerate(&check, self.runner.as_ref(), &self.root) {
      Ok(targets) => self.dispatch(check, targets),
      Err(e) => {
        // Lister output stays in the error
        let (tx, rx) = mpsc::channel();
        // The receiver is still held here, so this send cannot fail
        let _ = tx.send(InvocationResult::failure(check.name(), Target::Whole, String::new(), e, 0));
        Ok(CheckRun { total: 1, results: rx })
      }
    }
  }

  /// Run the check against the given targets
  ///
  /// Results arrive in completion order. The receiver yields exactly one
  /// result per target and then closes.
  pub fn dispatch(&self, check: Arc<ResolvedCheck>, targets: Vec<Target>) -> RunResult<CheckRun> {
    let (tx, rx) = mpsc::channel();
    let total = targets.len();
    if total == 0 {
      return Ok(CheckRun { total, results: rx });
    }

    let legacy = uses_legacy_wrapper(&check, &self.root);
    let workers = self.concurrency.min(targets.len());
    tracing::info!(
      check = %check.name(),
      targets = targets.len(),
      workers,
      fix = self.fix,
      legacy,
      "running check"
    );

    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(workers)
      .thread_name(|i| format!("checkrun-worker-{}", i))
      .build()?;

    let queue = Arc::new(TargetQueue::new(targets));
    let worker = Worker {
      runner: Arc::clone(&self.runner),
      check,
      root: self.root.clone(),
      fix: self.fix,
      legacy,
      mirror: self.mirror,
    };

    for _ in 0..workers {
      let worker = worker.clone();
      let queue = Arc::clone(&queue);
      let tx = tx.clone();
      pool.spawn(move || worker.drain(&queue, &tx));
    }

    // Dropping the pool lets its threads exit once the spawned workers return;
    // the channel closes when the last worker's sender is dropped.
    Ok(CheckRun { total, results: rx })
  }
}
