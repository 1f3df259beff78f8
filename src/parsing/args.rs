//! Compile-argument cleanup and system-header detection.
//!
//! Compile databases produced by MSVC-flavoured build systems carry flags
//! clang's GCC driver rejects. The ones that only affect code generation are
//! dropped; the ones that affect parsing are translated.

use std::path::Path;

use crate::types::normalise_path;

const DROPPED_FLAGS: &[&str] = &[
    "/nologo",
    "/Zi",
    "/Z7",
    "/FS",
    "/Od",
    "/Ob0",
    "/EHsc",
    "/utf-8",
    "/permissive-",
    "/Zc:twoPhase-",
    "-MD",
    "-MDd",
    "-MT",
    "-MTd",
    "/MD",
    "/MDd",
    "/MT",
    "/MTd",
    "/c",
    "-c",
    "-TP",
    "/TP",
];

const DROPPED_PREFIXES: &[&str] = &["/RTC", "/Fo", "/Fd"];

fn should_drop(arg: &str) -> bool {
    DROPPED_FLAGS.contains(&arg) || DROPPED_PREFIXES.iter().any(|prefix| arg.starts_with(prefix))
}

/// Translate a compile-database argument list into flags clang accepts.
pub fn sanitise_compile_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());

    for arg in args {
        if arg.is_empty() || should_drop(arg) {
            continue;
        }

        if let Some(define) = arg.strip_prefix("/D").filter(|rest| !rest.is_empty()) {
            out.push(format!("-D{define}"));
        } else if let Some(forced) = arg.strip_prefix("/FI").filter(|rest| !rest.is_empty()) {
            out.push("-include".to_string());
            out.push(forced.to_string());
        } else if let Some(dir) = arg.strip_prefix("/I").filter(|rest| !rest.is_empty()) {
            out.push(format!("-I{dir}"));
        } else if let Some(standard) = arg.strip_prefix("/std:").filter(|rest| !rest.is_empty()) {
            out.push(format!("-std={standard}"));
        } else {
            out.push(arg.clone());
        }
    }

    out
}

/// Directories passed with `-isystem`, in either joined or split form.
pub fn system_include_dirs(args: &[String]) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-isystem" {
            if let Some(dir) = iter.next() {
                dirs.push(normalise_path(dir));
            }
        } else if let Some(dir) = arg.strip_prefix("-isystem").filter(|rest| !rest.is_empty()) {
            dirs.push(normalise_path(dir));
        }
    }
    dirs
}

/// Decides which files count as library headers.
#[derive(Debug, Clone, Default)]
pub struct SystemHeaders {
    prefixes: Vec<String>,
}

impl SystemHeaders {
    pub fn new(prefixes: impl IntoIterator<Item = String>) -> Self {
        let prefixes = prefixes
            .into_iter()
            .map(|prefix| normalise_path(&prefix))
            .filter(|prefix| !prefix.is_empty())
            .collect();
        Self { prefixes }
    }

    /// Configured prefixes plus the `-isystem` directories of one invocation.
    pub fn for_invocation(configured: &[String], compile_args: &[String]) -> Self {
        Self::new(
            configured
                .iter()
                .cloned()
                .chain(system_include_dirs(compile_args)),
        )
    }

    pub fn is_system(&self, path: &str) -> bool {
        // clang pseudo-files such as <built-in> and <command line>
        if path.starts_with('<') {
            return true;
        }
        let path = normalise_path(path);
        self.prefixes
            .iter()
            .any(|prefix| Path::new(&path).starts_with(prefix))
    }
}
