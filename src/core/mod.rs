//! Core building blocks shared by every command
//!
//! - **config**: configuration document (checks, macros, ignore dirs, concurrency)
//! - **context**: run context built once in main.rs
//! - **error**: error taxonomy with contextual help messages

pub mod config;
pub mod context;
pub mod error;
