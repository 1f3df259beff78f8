use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to start '{binary}': not found on PATH (set clang.binary or CPPFACTS_CLANG__BINARY)")]
    ClangUnavailable { binary: String },

    #[error("Failed to run '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse translation unit {}: clang produced no AST ({status}){}", .file.display(), first_error_suffix(.first_error))]
    EmptyDump {
        file: PathBuf,
        status: String,
        first_error: Option<String>,
    },

    #[error("Failed to parse translation unit {}: unreadable AST dump: {reason}", .file.display())]
    InvalidDump { file: PathBuf, reason: String },

    #[error("Invalid snapshot {}: {reason}", .path.display())]
    Snapshot { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// The frontend could not be started at all.
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::ClangUnavailable { .. } | Self::Spawn { .. })
    }
}

fn first_error_suffix(first_error: &Option<String>) -> String {
    first_error
        .as_deref()
        .map(|line| format!(": {line}"))
        .unwrap_or_default()
}

pub type ParseResult<T> = Result<T, ParseError>;
