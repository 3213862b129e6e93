//! Command-line interface components.
//!
//! - [`args`] - clap argument definitions
//! - [`commands`] - command execution and console reporting

pub mod args;
pub mod commands;
