//! Raw token spellings for byte ranges of source files.
//!
//! The JSON dump carries offsets but no tokens, so operator extents, type
//! mentions and qualified names are re-tokenized with tree-sitter-cpp. Each
//! file is parsed at most once.

use std::collections::HashMap;
use std::fs;

use tree_sitter::{Node, Parser, Tree};
use tracing::{trace, warn};

/// One leaf token with its 1-based line and byte column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

struct ParsedSource {
    text: Vec<u8>,
    tree: Tree,
}

pub struct SourceTokens {
    parser: Option<Parser>,
    files: HashMap<String, Option<ParsedSource>>,
}

impl std::fmt::Debug for SourceTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTokens")
            .field("language", &"C++")
            .field("files", &self.files.len())
            .finish()
    }
}

impl Default for SourceTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceTokens {
    /// A tokenizer that degrades to "no tokens" if the grammar cannot load.
    pub fn new() -> Self {
        let mut parser = Parser::new();
        let parser = match parser.set_language(&tree_sitter_cpp::LANGUAGE.into()) {
            Ok(()) => Some(parser),
            Err(e) => {
                warn!("Failed to set C++ language, operator tokens unavailable: {e}");
                None
            }
        };
        Self {
            parser,
            files: HashMap::new(),
        }
    }

    /// Leaf tokens lying entirely inside `start..end` of `path`, comments excluded.
    pub fn tokens(&mut self, path: &str, start: usize, end: usize) -> Vec<String> {
        self.spans(path, start, end)
            .into_iter()
            .map(|token| token.text)
            .collect()
    }

    /// Like [`tokens`](Self::tokens), keeping where each token starts.
    pub fn spans(&mut self, path: &str, start: usize, end: usize) -> Vec<Token> {
        if start >= end {
            return Vec::new();
        }
        let Some(source) = self.source(path) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        collect_leaves(source.tree.root_node(), &source.text, start, end, &mut out);
        out
    }

    fn source(&mut self, path: &str) -> Option<&ParsedSource> {
        if !self.files.contains_key(path) {
            let parsed = self.parse_file(path);
            self.files.insert(path.to_string(), parsed);
        }
        self.files.get(path).and_then(Option::as_ref)
    }

    fn parse_file(&mut self, path: &str) -> Option<ParsedSource> {
        let parser = self.parser.as_mut()?;
        let text = match fs::read(path) {
            Ok(text) => text,
            Err(e) => {
                trace!("cannot read {path} for tokens: {e}");
                return None;
            }
        };
        let tree = parser.parse(&text, None)?;
        Some(ParsedSource { text, tree })
    }
}

fn collect_leaves(node: Node, source: &[u8], start: usize, end: usize, out: &mut Vec<Token>) {
    if node.end_byte() <= start || node.start_byte() >= end {
        return;
    }

    if node.child_count() == 0 {
        let inside = node.start_byte() >= start && node.end_byte() <= end;
        let empty = node.start_byte() == node.end_byte();
        if inside && !empty && node.kind() != "comment" {
            if let Ok(text) = node.utf8_text(source) {
                let position = node.start_position();
                out.push(Token {
                    text: text.to_string(),
                    offset: node.start_byte(),
                    line: position.row as u32 + 1,
                    col: position.column as u32 + 1,
                });
            }
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_leaves(child, source, start, end, out);
    }
}
