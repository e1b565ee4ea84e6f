//! Child process execution
//!
//! Every external command (listers, tool discovery, installs and check
//! invocations) goes through the [`CommandRunner`] trait so the pipeline can
//! be exercised without spawning real tools.

use crate::core::error::ProcessError;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  /// Working directory
  pub cwd: PathBuf,
  /// Copy the child's output to our stdout/stderr while capturing it
  pub mirror: bool,
}

impl Invocation {
  pub fn new(program: impl Into<String>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args,
      cwd: cwd.into(),
      mirror: false,
    }
  }

  pub fn mirrored(mut self, mirror: bool) -> Self {
    self.mirror = mirror;
    self
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Captured result of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
  pub stdout: String,
  pub stderr: String,
  /// Exit code, `None` when terminated by a signal
  pub code: Option<i32>,
  pub success: bool,
}

impl ProcessOutput {
  /// Stdout followed by stderr
  pub fn combined(&self) -> String {
    format!("{}{}", self.stdout, self.stderr)
  }
}

/// Something that can run an [`Invocation`] to completion
pub trait CommandRunner: Send + Sync {
  /// Run the command and capture its output
  ///
  /// `Err` means the process could not be started or waited on; an
  /// unsuccessful exit is reported through [`ProcessOutput::success`].
  fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// A command that failed, with whatever it printed
#[derive(Debug)]
pub struct ProcessFailure {
  pub output: String,
  pub error: ProcessError,
}

/// Run an invocation, turning spawn failures and unsuccessful exits into errors
pub fn execute(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<ProcessOutput, ProcessFailure> {
  tracing::debug!(command = %invocation, cwd = %invocation.cwd.display(), "running command");
  match runner.run(invocation) {
    Err(source) => Err(ProcessFailure {
      output: String::new(),
      error: ProcessError::Spawn {
        command: invocation.to_string(),
        source,
      },
    }),
    Ok(output) if !output.success => Err(ProcessFailure {
      output: output.combined(),
      error: ProcessError::Exit {
        command: invocation.to_string(),
        code: output.code,
      },
    }),
    Ok(output) => Ok(output),
  }
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
    let mut child = Command::new(&invocation.program)
      .args(&invocation.args)
      .current_dir(&invocation.cwd)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()?;

    let stdout = child
      .stdout
      .take()
      .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
    let stderr = child
      .stderr
      .take()
      .ok_or_else(|| io::Error::other("child stderr was not captured"))?;

    // Both pipes are drained at once so a chatty stderr cannot block the child
    let mirror = invocation.mirror;
    let (out, err) = thread::scope(|s| {
      let err_reader = s.spawn(move || pump(stderr, mirror.then(io::stderr)));
      let out = pump(stdout, mirror.then(io::stdout));
      let err = err_reader
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));
      (out, err)
    });

    let status = child.wait()?;

    Ok(ProcessOutput {
      stdout: String::from_utf8_lossy(&out?).into_owned(),
      stderr: String::from_utf8_lossy(&err?).into_owned(),
      code: status.code(),
      success: status.success(),
    })
  }
}

/// Read `reader` to the end, copying each chunk to `mirror` as it arrives
fn pump<R: Read, W: Write>(mut reader: R, mut mirror: Option<W>) -> io::Result<Vec<u8>> {
  let mut captured = Vec::new();
  let mut buf = [0u8; 8192];
  loop {
    let n = match reader.read(&mut buf) {
      Ok(0) => break,
      Ok(n) => n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    };
    captured.extend_from_slice(&buf[..n]);
    if let Some(out) = mirror.as_mut() {
      // Console mirroring is best effort; the captured copy is what counts
      let _ = out.write_all(&buf[..n]).and_then(|_| out.flush());
    }
  }
  Ok(captured)
}
