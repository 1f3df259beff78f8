//! Dump command - save a parsed syntax tree as a snapshot.

use std::path::Path;

use anyhow::Result;

use crate::config::Settings;
use crate::io::{ExitCode, emit_json};
use crate::parsing::{ClangFrontend, write_snapshot};

/// Parse `file` and write its tree to `output`, or to stdout.
pub fn run(
    file: &Path,
    output: Option<&Path>,
    compact: bool,
    compile_args: &[String],
    settings: &Settings,
) -> Result<ExitCode> {
    let pretty = settings.extraction.pretty && !compact;
    let frontend = ClangFrontend::from_settings(&settings.clang);

    let tree = match frontend.parse(file, compile_args) {
        Ok(tree) => tree,
        Err(error) => {
            eprintln!("Error: {error}");
            return Ok(ExitCode::ExtractionFailed);
        }
    };

    match output {
        Some(path) => {
            write_snapshot(&tree, path, pretty)?;
            eprintln!("Wrote {} nodes to {}", tree.len(), path.display());
        }
        None => emit_json(&tree, None, pretty)?,
    }
    Ok(ExitCode::Success)
}
