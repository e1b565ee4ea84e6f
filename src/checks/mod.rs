//! Check resolution and execution
//!
//! A configured check goes through these stages:
//!
//! - **macros**: merge the check with the macro it names, decode its validator
//! - **install**: run the install command if the tool is missing
//! - **targets**: run the `each` lister to get the targets
//! - **engine**: run the check per target on a bounded worker pool
//! - **validator**: accept or reject each invocation's output
//!
//! All child processes go through [`runner::CommandRunner`].

pub mod engine;
pub mod install;
pub mod macros;
pub mod runner;
pub mod targets;
pub mod validator;
