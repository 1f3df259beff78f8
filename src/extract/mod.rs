//! Fact extraction
//!
//! One run walks one tree exactly once and returns an [`ExtractionResult`]:
//!
//! 1. diagnostics are filtered by severity,
//! 2. the inclusion stack becomes include dependencies,
//! 3. [`VisitorContext`] walks the tree emitting symbols, references and call
//!    edges,
//! 4. each list is sorted and deduplicated independently.
//!
//! [`extract_tree`] works on any [`AstProvider`]; [`run_extraction`] parses a
//! file with clang first.

pub mod calls;
pub mod dedup;
pub mod facts;
pub mod qualified;
pub mod references;
pub mod symbols;
pub mod visitor;

pub use facts::{CallEdgeFact, ExtractionResult, IncludeDep, ReferenceFact, SymbolFact};
pub use qualified::{UNNAMED, qualified_name};
pub use visitor::VisitorContext;

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, warn};

use crate::ast::{AstProvider, Severity};
use crate::config::Settings;
use crate::parsing::ClangFrontend;
use crate::types::{Action, normalise_path};

/// Knobs for a single run over an already-built tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub action: Action,
    /// Keep warning diagnostics as well as errors.
    pub include_warnings: bool,
}

impl ExtractOptions {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            include_warnings: false,
        }
    }

    fn keeps(&self, severity: Severity) -> bool {
        severity >= Severity::Error || (self.include_warnings && severity == Severity::Warning)
    }
}

/// A file to parse and what to collect from it.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub file: PathBuf,
    pub action: Action,
    /// Compiler flags as they appear in a compile database.
    pub compile_args: Vec<String>,
}

impl ExtractRequest {
    pub fn new(file: impl Into<PathBuf>, action: Action) -> Self {
        Self {
            file: file.into(),
            action,
            compile_args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.compile_args.extend(args);
        self
    }
}

/// Extract every fact from `tree`. Never fails: `success` is always set.
pub fn extract_tree<P: AstProvider>(
    tree: &P,
    file: &str,
    options: &ExtractOptions,
) -> ExtractionResult {
    let started = Instant::now();
    let mut result = ExtractionResult {
        file: normalise_path(file),
        success: true,
        ..ExtractionResult::default()
    };

    result.diagnostics = tree
        .diagnostics()
        .iter()
        .filter(|diagnostic| options.keeps(diagnostic.severity))
        .map(|diagnostic| diagnostic.message.clone())
        .collect();

    tree.enumerate_inclusions(&mut |path, depth| {
        let path = normalise_path(path);
        if !path.is_empty() {
            result.include_deps.push(IncludeDep {
                path,
                depth: depth.max(1),
            });
        }
    });

    let collected = VisitorContext::new(tree, options.action).run();
    result.symbols = collected.symbols;
    result.references = collected.references;
    result.call_edges = collected.call_edges;

    dedup::dedup_include_deps(&mut result.include_deps);
    dedup::dedup_references(&mut result.references);
    dedup::dedup_call_edges(&mut result.call_edges);

    debug!(
        "extracted {} from {}: {} symbols, {} references, {} call edges, {} includes in {:?}",
        options.action,
        result.file,
        result.symbols.len(),
        result.references.len(),
        result.call_edges.len(),
        result.include_deps.len(),
        started.elapsed()
    );

    result
}

/// Parse `request.file` with clang and extract from the resulting tree.
///
/// Setup and parse failures come back as a result with `success == false`
/// and a single diagnostic.
pub fn run_extraction(request: &ExtractRequest, settings: &Settings) -> ExtractionResult {
    let file = request.file.to_string_lossy();
    let frontend = ClangFrontend::from_settings(&settings.clang);

    let tree = match frontend.parse(&request.file, &request.compile_args) {
        Ok(tree) => tree,
        Err(error) => {
            warn!("{} could not be parsed: {error}", request.file.display());
            return ExtractionResult::failed(normalise_path(&file), error.to_string());
        }
    };

    let options = ExtractOptions {
        action: request.action,
        include_warnings: settings.extraction.include_warnings,
    };
    extract_tree(&tree, &file, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CursorKind, TreeBuilder};

    #[test]
    fn test_diagnostics_filtered_by_severity() {
        let mut builder = TreeBuilder::new("main.cpp");
        builder
            .diagnostic(Severity::Warning, "main.cpp:1:1: warning: unused")
            .diagnostic(Severity::Error, "main.cpp:2:1: error: unknown type")
            .diagnostic(Severity::Note, "main.cpp:2:1: note: declared here");
        let tree = builder.build();

        let result = extract_tree(&tree, "main.cpp", &ExtractOptions::new(Action::ExtractAll));
        assert!(result.success);
        assert_eq!(result.diagnostics, vec!["main.cpp:2:1: error: unknown type"]);

        let verbose = ExtractOptions {
            action: Action::ExtractAll,
            include_warnings: true,
        };
        let result = extract_tree(&tree, "main.cpp", &verbose);
        assert_eq!(result.diagnostics.len(), 2);
    }

    #[test]
    fn test_paths_are_normalised_and_depth_clamped() {
        let mut builder = TreeBuilder::new(r"C:\work\main.cpp");
        builder
            .include(r"C:\work\inc\a.h", 0)
            .include("", 1)
            .include(r"C:\work\inc\b.h", 2);
        let tree = builder.build();

        let result = extract_tree(
            &tree,
            r"C:\work\main.cpp",
            &ExtractOptions::new(Action::ExtractRefs),
        );
        assert_eq!(result.file, "C:/work/main.cpp");
        assert_eq!(
            result.include_deps,
            vec![
                IncludeDep {
                    path: "C:/work/inc/a.h".into(),
                    depth: 1
                },
                IncludeDep {
                    path: "C:/work/inc/b.h".into(),
                    depth: 2
                },
            ]
        );
    }

    #[test]
    fn test_include_deps_collected_for_every_action() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let function = builder.add(root, CursorKind::FunctionDecl, "run");
        builder.at(function, 1, 6).include("util.h", 1);
        let tree = builder.build();

        for action in [Action::ExtractAll, Action::ExtractSymbols, Action::ExtractRefs] {
            let result = extract_tree(&tree, "main.cpp", &ExtractOptions::new(action));
            assert_eq!(result.include_deps.len(), 1, "{action}");
            assert_eq!(result.symbols.is_empty(), !action.collects_symbols());
        }
    }
}
