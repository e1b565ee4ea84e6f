//! Error types for checkrun with contextual messages
//!
//! One error type covers the whole run. Configuration and resolution errors
//! abort a check before it starts; process and output errors are recorded per
//! target and only the last one surfaces as the check's outcome.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Process exit code for any failed run
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Main error type for checkrun
#[derive(Debug)]
pub enum RunError {
  /// Configuration could not be loaded
  Config(ConfigError),

  /// A check references a macro that is not defined
  UnknownMacro { check: String, name: String },

  /// After macro resolution the check has nothing to run
  MissingCommand { check: String, which: &'static str },

  /// The tool-plugin introspection command failed
  ToolDiscovery {
    command: String,
    output: String,
    reason: String,
  },

  /// The install command failed
  Install {
    command: String,
    output: String,
    reason: String,
  },

  /// The target lister command failed
  Lister {
    command: String,
    output: String,
    reason: String,
  },

  /// A target invocation could not run or exited unsuccessfully
  Process(ProcessError),

  /// A target invocation ran but its output was rejected
  Output(OutputError),

  /// Last per-target failure of a check
  Failed {
    check: String,
    target: String,
    cause: Box<RunError>,
  },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RunError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RunError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RunError::Message { message, context, help } => RunError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RunError::Config(ConfigError::Parse { path, reason }) => RunError::Config(ConfigError::Parse {
        path,
        reason: format!("{}: {}", ctx_str, reason),
      }),
      RunError::Io(e) => RunError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RunError::Config(e) => e.help_message(),
      RunError::UnknownMacro { .. } => Some("Run `checkrun --list-macros` to see the available macros.".to_string()),
      RunError::MissingCommand { which, .. } => Some(format!(
        "Add a `{}` section with `args` to the check or to the macro it uses.",
        which
      )),
      RunError::ToolDiscovery { command, .. } => Some(format!("Make sure `{}` runs on this machine.", command)),
      RunError::Install { command, .. } => Some(format!("Try running `{}` by hand to see why it fails.", command)),
      RunError::Output(e) => e.help_message(),
      RunError::Failed { cause, .. } => cause.help_message(),
      RunError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

/// Append a failed command's captured output, if it printed anything
fn write_output(f: &mut fmt::Formatter<'_>, output: &str) -> fmt::Result {
  let output = output.trim();
  if output.is_empty() {
    return Ok(());
  }
  write!(f, "\n{}", output)
}

impl fmt::Display for RunError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunError::Config(e) => write!(f, "{}", e),
      RunError::UnknownMacro { check, name } => {
        write!(f, "Check '{}' uses unknown macro '{}'", check, name)
      }
      RunError::MissingCommand { check, which } => {
        write!(f, "Check '{}' has no `{}` command", check, which)
      }
      RunError::ToolDiscovery { command, output, reason } => {
        write!(f, "Unable to list available tools with `{}`: {}", command, reason)?;
        write_output(f, output)
      }
      RunError::Install { command, output, reason } => {
        write!(f, "Install command `{}` failed: {}", command, reason)?;
        write_output(f, output)
      }
      RunError::Lister { command, output, reason } => {
        write!(f, "Target lister `{}` failed: {}", command, reason)?;
        write_output(f, output)
      }
      RunError::Process(e) => write!(f, "{}", e),
      RunError::Output(e) => write!(f, "{}", e),
      RunError::Failed { check, target, cause } => {
        write!(f, "Check '{}' failed on {}: {}", check, target, cause)
      }
      RunError::Io(e) => write!(f, "I/O error: {}", e),
      RunError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RunError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RunError::Io(e) => Some(e),
      RunError::Process(ProcessError::Spawn { source, .. }) => Some(source),
      RunError::Failed { cause, .. } => Some(cause.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for RunError {
  fn from(err: io::Error) -> Self {
    RunError::Io(err)
  }
}

impl From<String> for RunError {
  fn from(msg: String) -> Self {
    RunError::message(msg)
  }
}

impl From<&str> for RunError {
  fn from(msg: &str) -> Self {
    RunError::message(msg)
  }
}

impl From<ConfigError> for RunError {
  fn from(err: ConfigError) -> Self {
    RunError::Config(err)
  }
}

impl From<ProcessError> for RunError {
  fn from(err: ProcessError) -> Self {
    RunError::Process(err)
  }
}

impl From<OutputError> for RunError {
  fn from(err: OutputError) -> Self {
    RunError::Output(err)
  }
}

impl From<serde_json::Error> for RunError {
  fn from(err: serde_json::Error) -> Self {
    RunError::message(format!("JSON error: {}", err))
  }
}

impl From<rayon::ThreadPoolBuildError> for RunError {
  fn from(err: rayon::ThreadPoolBuildError) -> Self {
    RunError::message(format!("Unable to start worker pool: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file does not exist
  NotFound { path: PathBuf },

  /// Config file could not be decoded
  Parse { path: PathBuf, reason: String },

  /// Config decoded but holds an unusable value
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Pass the config file with `--config <path>`.".to_string()),
      ConfigError::Parse { path, .. } => {
        let format = match path.extension().and_then(|e| e.to_str()) {
          Some("toml") => "TOML",
          _ => "JSON",
        };
        Some(format!("The file is read as {} (chosen by its extension).", format))
      }
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "No checkrun configuration found at {}", path.display())
      }
      ConfigError::Parse { path, reason } => {
        write!(f, "Failed to parse config {}: {}", path.display(), reason)
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid config value for `{}`: {}", field, reason)
      }
    }
  }
}

/// A target invocation whose command itself failed
#[derive(Debug)]
pub enum ProcessError {
  /// The program could not be started
  Spawn { command: String, source: io::Error },

  /// The program exited unsuccessfully (`None` when killed by a signal)
  Exit { command: String, code: Option<i32> },
}

impl fmt::Display for ProcessError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProcessError::Spawn { command, source } => write!(f, "Failed to execute `{}`: {}", command, source),
      ProcessError::Exit { command, code: Some(code) } => {
        write!(f, "`{}` failed with exit code {}", command, code)
      }
      ProcessError::Exit { command, code: None } => write!(f, "`{}` was terminated by a signal", command),
    }
  }
}

/// Output rejected by a validator
#[derive(Debug, Clone, PartialEq)]
pub enum OutputError {
  /// Something was written to stderr
  NonEmptyStderr,

  /// A stdout line matched none of the ignorable messages
  UnexpectedOutput { line: String },

  /// A coverage line reported less than the required percentage
  CoverageBelowThreshold { seen: f64, required: f64 },

  /// A stdout line carried no coverage figure
  UnparsableCoverageLine { line: String },
}

impl OutputError {
  fn help_message(&self) -> Option<String> {
    match self {
      OutputError::UnexpectedOutput { .. } => {
        Some("Add the message to `validate.ignoreMsg` if it is expected.".to_string())
      }
      OutputError::CoverageBelowThreshold { .. } => {
        Some("Add tests, or list the package directory in `validate.ignoreDir`.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for OutputError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OutputError::NonEmptyStderr => write!(f, "non empty stderr"),
      OutputError::UnexpectedOutput { line } => write!(f, "unexpected output: {}", line),
      OutputError::CoverageBelowThreshold { seen, required } => {
        write!(f, "coverage {:.1}% less than required {:.1}%", seen, required)
      }
      OutputError::UnparsableCoverageLine { line } => {
        write!(f, "unable to find coverage in line: {}", line)
      }
    }
  }
}

/// Result type alias for checkrun
pub type RunResult<T> = Result<T, RunError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RunResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RunResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RunError>,
{
  fn context(self, ctx: impl Into<String>) -> RunResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RunResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RunError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
