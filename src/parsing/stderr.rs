//! Recovering the inclusion stack and diagnostics from clang's stderr.
//!
//! With `-H`, clang prints one line per opened header, prefixed by one dot per
//! level of the inclusion stack. Diagnostics use the familiar
//! `file:line:col: severity: message` layout.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Diagnostic, Inclusion, Severity};

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\.+) (.+)$").expect("valid header regex"));

static DIAGNOSTIC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?):(\d+):(\d+): (fatal error|error|warning|note): (.*)$")
        .expect("valid diagnostic regex")
});

static DRIVER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:clang|clang\+\+|clang-cl)(?:-\d+)?(?:\.exe)?: (fatal error|error|warning): (.*)$")
        .expect("valid driver regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClangStderr {
    pub inclusions: Vec<Inclusion>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ClangStderr {
    pub fn parse(stderr: &str) -> Self {
        let mut parsed = Self::default();

        for line in stderr.lines() {
            let line = line.trim_end();
            if let Some(captures) = HEADER_LINE.captures(line) {
                parsed.inclusions.push(Inclusion {
                    path: captures[2].trim().to_string(),
                    depth: captures[1].len() as u32,
                });
            } else if let Some(captures) = DIAGNOSTIC_LINE.captures(line) {
                parsed
                    .diagnostics
                    .push(Diagnostic::new(severity_of(&captures[4]), line));
            } else if let Some(captures) = DRIVER_LINE.captures(line) {
                parsed
                    .diagnostics
                    .push(Diagnostic::new(severity_of(&captures[1]), line));
            }
        }

        parsed
    }

    /// First error-or-worse line, used to explain a failed parse.
    pub fn first_error(&self) -> Option<&str> {
        self.diagnostics
            .iter()
            .find(|diagnostic| diagnostic.severity >= Severity::Error)
            .map(|diagnostic| diagnostic.message.as_str())
    }
}

fn severity_of(label: &str) -> Severity {
    match label {
        "fatal error" => Severity::Fatal,
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "note" => Severity::Note,
        _ => Severity::Ignored,
    }
}
