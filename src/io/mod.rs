//! Output handling for the CLI.
//!
//! This module provides:
//! - JSON output to stdout or a file
//! - Consistent exit codes

pub mod exit_code;
pub mod output;

pub use exit_code::ExitCode;
pub use output::{emit_json, write_json};
