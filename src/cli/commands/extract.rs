//! Extract command - print the facts of one translation unit.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::ast::SyntaxTree;
use crate::config::Settings;
use crate::extract::{ExtractOptions, ExtractRequest, ExtractionResult, extract_tree, run_extraction};
use crate::io::{ExitCode, emit_json};
use crate::parsing::read_snapshot;
use crate::types::{Action, normalise_path};

/// Command-line choices for one `extract` run.
#[derive(Debug, Clone)]
pub struct ExtractCommand {
    pub file: PathBuf,
    pub action: Option<Action>,
    pub snapshot: bool,
    pub output: Option<PathBuf>,
    pub compact: bool,
    pub include_warnings: bool,
    pub compile_args: Vec<String>,
}

impl ExtractCommand {
    /// Settings with this command's overrides applied.
    fn effective_settings(&self, settings: &Settings) -> Settings {
        let mut settings = settings.clone();
        if let Some(action) = self.action {
            settings.extraction.default_action = action;
        }
        if self.include_warnings {
            settings.extraction.include_warnings = true;
        }
        if self.compact {
            settings.extraction.pretty = false;
        }
        settings
    }
}

/// Run extract command, returning the exit status the result implies.
pub fn run(command: &ExtractCommand, settings: &Settings) -> Result<ExitCode> {
    let settings = command.effective_settings(settings);
    let action = settings.extraction.default_action;

    let result = if command.snapshot {
        extract_snapshot(&command.file, action, settings.extraction.include_warnings)
    } else {
        let request = ExtractRequest::new(&command.file, action)
            .with_args(command.compile_args.iter().cloned());
        run_extraction(&request, &settings)
    };

    debug!(
        "{} facts for {} (success: {})",
        result.fact_count(),
        result.file,
        result.success
    );
    emit_json(
        &result,
        command.output.as_deref(),
        settings.extraction.pretty,
    )?;
    Ok(ExitCode::from_success(result.success))
}

fn extract_snapshot(path: &Path, action: Action, include_warnings: bool) -> ExtractionResult {
    let tree: SyntaxTree = match read_snapshot(path) {
        Ok(tree) => tree,
        Err(error) => {
            warn!("{error}");
            return ExtractionResult::failed(
                normalise_path(&path.to_string_lossy()),
                error.to_string(),
            );
        }
    };

    // Facts are attributed to the file the snapshot was taken from.
    let file = tree
        .main_file()
        .map(|main| main.path.clone())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let options = ExtractOptions {
        action,
        include_warnings,
    };
    extract_tree(&tree, &file, &options)
}
