//! The clang frontend
//!
//! Runs the compiler in syntax-only mode with a JSON AST dump on stdout and the
//! header stack (`-H`) plus diagnostics on stderr, then imports both into a
//! [`SyntaxTree`]. Nothing is cached between runs.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::args::{SystemHeaders, sanitise_compile_args};
use super::dump::import_dump;
use super::error::{ParseError, ParseResult};
use super::stderr::ClangStderr;
use crate::ast::SyntaxTree;
use crate::config::ClangConfig;

const DUMP_FLAGS: &[&str] = &[
    "-fsyntax-only",
    "-x",
    "c++",
    "-H",
    "-Xclang",
    "-ast-dump=json",
];

#[derive(Debug, Clone)]
pub struct ClangFrontend {
    binary: String,
    extra_args: Vec<String>,
    system_prefixes: Vec<String>,
}

impl ClangFrontend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
            system_prefixes: Vec::new(),
        }
    }

    pub fn from_settings(config: &ClangConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            extra_args: config.extra_args.clone(),
            system_prefixes: config.system_prefixes.clone(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Full argument list for one translation unit.
    pub fn command_args(&self, file: &Path, compile_args: &[String]) -> Vec<String> {
        let mut args: Vec<String> = DUMP_FLAGS.iter().map(|flag| flag.to_string()).collect();
        args.extend(self.extra_args.iter().cloned());
        args.extend(sanitise_compile_args(compile_args));
        args.push(file.to_string_lossy().into_owned());
        args
    }

    /// Parse `file` into a tree, or explain why no tree could be produced.
    ///
    /// Compile errors do not fail the parse as long as clang still printed an
    /// AST; they end up in the tree's diagnostics.
    pub fn parse(&self, file: &Path, compile_args: &[String]) -> ParseResult<SyntaxTree> {
        let started = Instant::now();
        let args = self.command_args(file, compile_args);
        trace!("running {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => ParseError::ClangUnavailable {
                    binary: self.binary.clone(),
                },
                _ => ParseError::Spawn {
                    binary: self.binary.clone(),
                    source,
                },
            })?;

        let stderr = ClangStderr::parse(&String::from_utf8_lossy(&output.stderr));
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(ParseError::EmptyDump {
                file: file.to_path_buf(),
                status: output.status.to_string(),
                first_error: stderr.first_error().map(str::to_string),
            });
        }

        let dump = parse_dump_json(&stdout).map_err(|e| ParseError::InvalidDump {
            file: file.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(
            "clang finished {} in {:?} ({}, {} bytes of AST)",
            file.display(),
            started.elapsed(),
            output.status,
            stdout.len()
        );

        let headers = SystemHeaders::for_invocation(&self.system_prefixes, compile_args);
        import_dump(&dump, &file.to_string_lossy(), &headers, &stderr)
    }
}

/// Deeply nested expressions exceed serde_json's default recursion limit.
fn parse_dump_json(text: &str) -> serde_json::Result<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_layout() {
        let frontend = ClangFrontend::from_settings(&ClangConfig {
            binary: "clang++-18".into(),
            extra_args: vec!["-w".into()],
            system_prefixes: Vec::new(),
        });
        let args = frontend.command_args(
            Path::new("src/main.cpp"),
            &["/DNDEBUG".to_string(), "-std=c++20".to_string()],
        );
        assert_eq!(frontend.binary(), "clang++-18");
        assert_eq!(&args[..6], DUMP_FLAGS);
        assert_eq!(&args[6..], ["-w", "-DNDEBUG", "-std=c++20", "src/main.cpp"]);
    }

    #[test]
    fn test_missing_binary_is_reported() {
        let frontend = ClangFrontend::new("cppfacts-no-such-clang");
        let error = frontend
            .parse(Path::new("main.cpp"), &[])
            .unwrap_err();
        assert!(matches!(error, ParseError::ClangUnavailable { .. }));
    }

    #[test]
    fn test_deep_json_is_accepted() {
        let depth = 600;
        let text = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse_dump_json(&text).is_ok());
        assert!(parse_dump_json("{\"kind\": ").is_err());
    }
}
