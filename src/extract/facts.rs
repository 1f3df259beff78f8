//! Fact records produced by one extraction run.

use serde::{Deserialize, Serialize};

use crate::types::{RefKind, SymbolKind};

/// One reported definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolFact {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub line: u32,
    pub col: u32,
    pub extent_end_line: u32,
}

/// One use-site of a declaration.
///
/// Field order matters: the derived `Ord` is the `(symbol, line, col, kind)`
/// sort key of the dedup pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceFact {
    pub symbol: String,
    pub line: u32,
    pub col: u32,
    pub kind: RefKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallEdgeFact {
    pub caller: String,
    pub callee: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IncludeDep {
    pub path: String,
    pub depth: u32,
}

/// Everything one run learned about one translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub file: String,
    pub symbols: Vec<SymbolFact>,
    pub references: Vec<ReferenceFact>,
    pub call_edges: Vec<CallEdgeFact>,
    pub include_deps: Vec<IncludeDep>,
    /// A tree was obtained. Diagnostics do not clear it.
    pub success: bool,
    pub diagnostics: Vec<String>,
}

impl ExtractionResult {
    /// Result of a run that never reached traversal.
    pub fn failed(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            success: false,
            diagnostics: vec![message.into()],
            ..Self::default()
        }
    }

    pub fn fact_count(&self) -> usize {
        self.symbols.len() + self.references.len() + self.call_edges.len() + self.include_deps.len()
    }
}
