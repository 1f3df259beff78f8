//! Qualified names built from semantic-parent chains.

use crate::ast::{AstProvider, CursorKind};

/// Placeholder for a declaration whose whole scope chain is anonymous.
pub const UNNAMED: &str = "(unnamed)";

/// `::`-joined spellings of `node` and its semantic parents, outermost first.
///
/// The translation unit ends the chain. Empty spellings (anonymous
/// namespaces, unnamed structs) are left out instead of producing `a::::b`.
pub fn qualified_name<P: AstProvider>(tree: &P, node: P::Node) -> String {
    let mut segments = Vec::new();
    let mut current = Some(node);

    while let Some(scope) = current {
        if tree.kind_of(scope) == CursorKind::TranslationUnit {
            break;
        }
        let spelling = tree.spelling_of(scope);
        if !spelling.is_empty() {
            segments.push(spelling);
        }
        current = tree.semantic_parent_of(scope);
    }

    if segments.is_empty() {
        return UNNAMED.to_string();
    }
    segments.reverse();
    segments.join("::")
}
