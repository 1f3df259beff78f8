//! Fact extraction for single C++ translation units.
//!
//! A file is parsed by clang into a [`SyntaxTree`](ast::SyntaxTree), walked
//! once, and summarised as an [`ExtractionResult`]: the symbols it defines, the
//! references it makes, its caller/callee edges and its include dependencies.

#![recursion_limit = "256"]

pub mod ast;
pub mod cli;
pub mod config;
pub mod extract;
pub mod io;
pub mod logging;
pub mod parsing;
pub mod types;

pub use ast::{AstProvider, CursorKind, NodeId, SyntaxTree, TreeBuilder};
pub use config::Settings;
pub use extract::{
    CallEdgeFact, ExtractOptions, ExtractRequest, ExtractionResult, IncludeDep, ReferenceFact,
    SymbolFact, extract_tree, run_extraction,
};
pub use parsing::{ClangFrontend, ParseError, ParseResult};
pub use types::{Action, RefKind, SymbolKind};
