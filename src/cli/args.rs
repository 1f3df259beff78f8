//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::types::Action;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// C++ translation-unit fact extractor
#[derive(Parser, Debug)]
#[command(
    name = "cppfacts",
    version = env!("CARGO_PKG_VERSION"),
    about = "Extract symbols, references, call edges and includes from a C++ file",
    long_about = "Parse one C++ translation unit with clang and print its symbols, \
                  references, call edges and include dependencies as JSON.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  cppfacts extract --file src/widget.cpp -- -Iinclude -std=c++20\n  cppfacts extract --file src/widget.cpp --action extract-refs --compact\n  cppfacts dump --file src/widget.cpp --output widget.ast.json\n  cppfacts extract --file widget.ast.json --snapshot"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract facts from one translation unit
    #[command(about = "Print the facts of one translation unit as JSON")]
    Extract {
        /// Source file to parse (or a snapshot with --snapshot)
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// What to collect: extract-all, extract-symbols or extract-refs
        #[arg(short, long, env = "CPPFACTS_ACTION")]
        action: Option<Action>,

        /// Treat FILE as a tree written by `cppfacts dump`
        #[arg(long)]
        snapshot: bool,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,

        /// Report warning diagnostics too
        #[arg(long)]
        include_warnings: bool,

        /// Compiler flags, after `--`
        #[arg(last = true, value_name = "COMPILER_ARGS")]
        compile_args: Vec<String>,
    },

    /// Parse a file and save the syntax tree for later extraction
    #[command(about = "Write the parsed syntax tree as a JSON snapshot")]
    Dump {
        /// Source file to parse
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,

        /// Compiler flags, after `--`
        #[arg(last = true, value_name = "COMPILER_ARGS")]
        compile_args: Vec<String>,
    },

    /// Initialize project
    #[command(about = "Set up .cppfacts directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,
}
