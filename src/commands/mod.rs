//! CLI commands for checkrun
//!
//! - **run**: run every configured check (default)
//! - **plan**: `--dry-run` plan printer and `--list-macros`
//!
//! Commands take `&RunContext` so the configuration is loaded once in `main`.

pub mod plan;
pub mod run;

pub use plan::{run_list_macros, run_plan};
pub use run::run_checks;
