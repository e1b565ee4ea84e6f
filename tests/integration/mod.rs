//! Integration tests for checkrun
//!
//! Each test writes a configuration into a temp directory and runs the built
//! binary against it. Checks only use POSIX tools (`sh`, `printf`, `true`,
//! `false`).

mod helpers;

mod test_config;
mod test_plan;
mod test_run;
