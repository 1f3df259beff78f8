//! AST provider interface
//!
//! The extractor never parses source itself. It consumes a tree through the
//! [`AstProvider`] trait, which exposes the handful of capabilities a
//! clang-style frontend offers: kinds, locations, spellings, semantic parents,
//! the "declaration this name refers to" relation, redeclaration helpers,
//! raw tokens, the inclusion stack and diagnostics.

pub mod kind;
pub mod tree;

pub use kind::CursorKind;
pub use tree::{Inclusion, NodeData, NodeId, Position, SourceFile, SyntaxTree, TreeBuilder};

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Resolved source location of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub line: u32,
    pub col: u32,
    pub file: &'a str,
    pub in_main_file: bool,
    pub in_system_header: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ignored,
    Note,
    Warning,
    Error,
    Fatal,
}

/// A diagnostic reported by the frontend, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Read-only view over a parsed translation unit.
///
/// Node handles are cheap copies owned by the provider; the extractor only
/// ever borrows the tree.
pub trait AstProvider {
    type Node: Copy + Eq + Hash + Debug;

    /// The translation-unit node.
    fn root(&self) -> Self::Node;

    fn kind_of(&self, node: Self::Node) -> CursorKind;

    /// `None` when the node has no valid location.
    fn location_of(&self, node: Self::Node) -> Option<Location<'_>>;

    /// Last line of the node's source range, 0 when unknown.
    fn extent_end_line(&self, node: Self::Node) -> u32;

    /// Raw identifier text, possibly empty.
    fn spelling_of(&self, node: Self::Node) -> &str;

    fn semantic_parent_of(&self, node: Self::Node) -> Option<Self::Node>;

    fn lexical_parent_of(&self, node: Self::Node) -> Option<Self::Node>;

    fn children_of(&self, node: Self::Node) -> Vec<Self::Node>;

    fn referenced_declaration_of(&self, node: Self::Node) -> Option<Self::Node>;

    fn canonical_form_of(&self, decl: Self::Node) -> Option<Self::Node>;

    fn definition_of(&self, decl: Self::Node) -> Option<Self::Node>;

    /// Whether an aggregate declaration is its defining occurrence.
    fn is_definition(&self, node: Self::Node) -> bool;

    /// Token spellings covering the node's extent, in source order.
    fn tokens_of(&self, node: Self::Node) -> Vec<String>;

    /// Calls `visit(path, depth)` once per inclusion-stack entry.
    fn enumerate_inclusions(&self, visit: &mut dyn FnMut(&str, u32));

    fn diagnostics(&self) -> &[Diagnostic];

    fn is_in_system_header(&self, node: Self::Node) -> bool {
        self.location_of(node)
            .is_some_and(|location| location.in_system_header)
    }
}
