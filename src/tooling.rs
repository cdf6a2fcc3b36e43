//! Tooling Layer
//!
//! The `prefixfs` command line: argument parsing, command dispatch over a
//! `Session`, and text rendering of trees, listings and outcomes.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
