mod checks;
mod commands;
mod core;
mod ui;
mod utils;

use crate::checks::runner::SystemRunner;
use crate::core::config::{DEFAULT_CONFIG_FILE, RunConfig};
use crate::core::context::{RunContext, RunOptions};
use crate::core::error::{FAILURE_EXIT_CODE, RunError, RunResult, print_error};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Run configured checks (formatters, linters, coverage) concurrently per target
#[derive(Parser)]
#[command(name = "checkrun")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Configuration file (.json or .toml); commands run in its directory
  #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
  config: PathBuf,

  /// Run each check's fix command and re-check failures once
  #[arg(long)]
  fix: bool,

  /// Debug logging and live output of every command
  #[arg(short, long)]
  verbose: bool,

  /// Maximum concurrent invocations per check (overrides simultaneousRuns)
  #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
  jobs: Option<u64>,

  /// Resolve checks and list targets, print the commands, run nothing else
  #[arg(long)]
  dry_run: bool,

  /// Print the macro catalog and exit
  #[arg(long)]
  list_macros: bool,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr; `RUST_LOG` wins over the verbosity default
fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn run(cli: Cli) -> RunResult<()> {
  if cli.list_macros {
    // A missing config file still lists the built-in catalog
    let config = if cli.config.exists() {
      RunConfig::load(&cli.config)?
    } else {
      RunConfig::default().with_builtin_macros()?
    };
    return commands::run_list_macros(&config.macros);
  }

  let options = RunOptions {
    fix: cli.fix,
    verbose: cli.verbose,
    progress: std::io::stderr().is_terminal() && !cli.verbose,
  };
  let jobs = cli
    .jobs
    .map(usize::try_from)
    .transpose()
    .map_err(|e| RunError::message(format!("invalid --jobs value: {}", e)))?;

  let ctx = RunContext::build(&cli.config, options, jobs)?;
  tracing::debug!(
    root = %ctx.root().display(),
    checks = ctx.config.checks.len(),
    concurrency = ctx.config.concurrency(),
    "configuration loaded"
  );

  if cli.dry_run {
    return commands::run_plan(&ctx, &SystemRunner);
  }
  commands::run_checks(&ctx, Arc::new(SystemRunner))
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  if let Err(err) = run(cli) {
    handle_error(err);
  }
}

fn handle_error(err: RunError) -> ! {
  print_error(&err);
  std::process::exit(FAILURE_EXIT_CODE);
}
