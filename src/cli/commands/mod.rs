//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod dump;
pub mod extract;
pub mod init;
