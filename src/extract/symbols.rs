//! Symbol classifier: which nodes are definitions worth reporting.

use tracing::trace;

use super::facts::SymbolFact;
use super::qualified::qualified_name;
use crate::ast::{AstProvider, CursorKind};
use crate::types::SymbolKind;

/// Why a symbol-bearing node is not reported. Its children are still walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ForwardDeclaration,
    LocalVariable,
    AnonymousNamespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolVerdict {
    NotSymbol,
    Skip(SkipReason),
    Report(SymbolKind),
}

impl SymbolVerdict {
    pub fn should_report(&self) -> bool {
        matches!(self, Self::Report(_))
    }
}

/// Decide whether `node` is a reportable definition.
pub fn classify_symbol<P: AstProvider>(tree: &P, node: P::Node) -> SymbolVerdict {
    let kind = tree.kind_of(node);
    if !kind.is_symbol_bearing() {
        return SymbolVerdict::NotSymbol;
    }

    if kind.is_aggregate() && !tree.is_definition(node) {
        return SymbolVerdict::Skip(SkipReason::ForwardDeclaration);
    }

    if kind == CursorKind::VarDecl
        && tree
            .semantic_parent_of(node)
            .is_some_and(|parent| tree.kind_of(parent).is_function_like())
    {
        return SymbolVerdict::Skip(SkipReason::LocalVariable);
    }

    if kind == CursorKind::Namespace && tree.spelling_of(node).is_empty() {
        return SymbolVerdict::Skip(SkipReason::AnonymousNamespace);
    }

    SymbolVerdict::Report(kind.symbol_kind())
}

/// Build the fact for a reportable node, or `None` when it has no usable line.
pub fn symbol_fact<P: AstProvider>(tree: &P, node: P::Node, kind: SymbolKind) -> Option<SymbolFact> {
    let location = tree.location_of(node).filter(|location| location.line > 0);
    let Some(location) = location else {
        trace!("dropping {kind} {:?}: no valid location", tree.spelling_of(node));
        return None;
    };

    Some(SymbolFact {
        name: tree.spelling_of(node).to_string(),
        qualified_name: qualified_name(tree, node),
        kind,
        line: location.line,
        col: location.col,
        extent_end_line: tree.extent_end_line(node),
    })
}
