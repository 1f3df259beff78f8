//! In-memory syntax tree
//!
//! `SyntaxTree` is an arena of [`NodeData`] addressed by [`NodeId`]. The clang
//! frontend imports its JSON dump into one, tests assemble one with
//! [`TreeBuilder`], and the whole thing serializes as a snapshot so a parsed
//! translation unit can be re-extracted without the compiler.

use serde::{Deserialize, Serialize};

use super::{AstProvider, CursorKind, Diagnostic, Location, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub is_system: bool,
}

/// Line/column inside one entry of the file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub file: u32,
    pub line: u32,
    pub col: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub kind: CursorKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spelling: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default)]
    pub extent_end_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical_parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<NodeId>,
    #[serde(default)]
    pub is_definition: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
}

impl NodeData {
    fn new(kind: CursorKind, spelling: &str) -> Self {
        Self {
            kind,
            spelling: spelling.to_string(),
            position: None,
            extent_end_line: 0,
            lexical_parent: None,
            semantic_parent: None,
            children: Vec::new(),
            referenced: None,
            canonical: None,
            definition: None,
            is_definition: false,
            tokens: Vec::new(),
        }
    }
}

/// One `#include` observed while parsing, with its inclusion-stack depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    pub path: String,
    pub depth: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxTree {
    files: Vec<SourceFile>,
    root: NodeId,
    nodes: Vec<NodeData>,
    #[serde(default)]
    inclusions: Vec<Inclusion>,
    #[serde(default)]
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node in creation order, detached ones included.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn main_file(&self) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.is_main)
    }

    pub fn inclusions(&self) -> &[Inclusion] {
        &self.inclusions
    }

    /// Check that every link points inside the arena, that children form a
    /// tree under the root, and that semantic-parent chains terminate.
    ///
    /// Snapshots come from disk, so this runs before any traversal.
    pub fn validate(&self) -> Result<(), String> {
        let count = self.nodes.len();
        let in_range = |id: NodeId| id.index() < count;

        if !in_range(self.root) {
            return Err(format!("root {} is outside the node table", self.root.0));
        }

        let mut seen_as_child = vec![false; count];
        for (index, node) in self.nodes.iter().enumerate() {
            let links = [
                node.lexical_parent,
                node.semantic_parent,
                node.referenced,
                node.canonical,
                node.definition,
            ];
            if let Some(bad) = links.into_iter().flatten().find(|id| !in_range(*id)) {
                return Err(format!("node {index} links to missing node {}", bad.0));
            }
            if let Some(position) = node.position {
                if position.file as usize >= self.files.len() {
                    return Err(format!(
                        "node {index} refers to missing file {}",
                        position.file
                    ));
                }
            }
            for child in &node.children {
                if !in_range(*child) {
                    return Err(format!("node {index} has missing child {}", child.0));
                }
                if *child == self.root || seen_as_child[child.index()] {
                    return Err(format!("node {} appears twice in the tree", child.0));
                }
                seen_as_child[child.index()] = true;
            }
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let mut current = node.semantic_parent;
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if steps > count {
                    return Err(format!("semantic parents of node {index} form a cycle"));
                }
                current = self.nodes[parent.index()].semantic_parent;
            }
        }

        Ok(())
    }
}

impl AstProvider for SyntaxTree {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn kind_of(&self, node: NodeId) -> CursorKind {
        self.node(node).kind
    }

    fn location_of(&self, node: NodeId) -> Option<Location<'_>> {
        let position = self.node(node).position?;
        let file = self.files.get(position.file as usize)?;
        Some(Location {
            line: position.line,
            col: position.col,
            file: &file.path,
            in_main_file: file.is_main,
            in_system_header: file.is_system,
        })
    }

    fn extent_end_line(&self, node: NodeId) -> u32 {
        self.node(node).extent_end_line
    }

    fn spelling_of(&self, node: NodeId) -> &str {
        &self.node(node).spelling
    }

    fn semantic_parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).semantic_parent
    }

    fn lexical_parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).lexical_parent
    }

    fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn referenced_declaration_of(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).referenced
    }

    fn canonical_form_of(&self, decl: NodeId) -> Option<NodeId> {
        self.node(decl).canonical
    }

    fn definition_of(&self, decl: NodeId) -> Option<NodeId> {
        self.node(decl).definition
    }

    fn is_definition(&self, node: NodeId) -> bool {
        self.node(node).is_definition
    }

    fn tokens_of(&self, node: NodeId) -> Vec<String> {
        self.node(node).tokens.clone()
    }

    fn enumerate_inclusions(&self, visit: &mut dyn FnMut(&str, u32)) {
        for inclusion in &self.inclusions {
            visit(&inclusion.path, inclusion.depth);
        }
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn is_in_system_header(&self, node: NodeId) -> bool {
        self.node(node)
            .position
            .and_then(|position| self.files.get(position.file as usize))
            .is_some_and(|file| file.is_system)
    }
}

/// Incremental constructor for [`SyntaxTree`].
///
/// Attached nodes default their semantic parent to the nearest enclosing
/// declaration (or lambda), which is what a compiler reports for everything
/// that is not an out-of-line definition.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    tree: SyntaxTree,
}

impl TreeBuilder {
    /// Start a tree whose root is the translation unit for `main_file`.
    pub fn new(main_file: &str) -> Self {
        let root = NodeData::new(CursorKind::TranslationUnit, main_file);
        Self {
            tree: SyntaxTree {
                files: vec![SourceFile {
                    path: main_file.to_string(),
                    is_main: true,
                    is_system: false,
                }],
                root: NodeId(0),
                nodes: vec![root],
                inclusions: Vec::new(),
                diagnostics: Vec::new(),
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root
    }

    /// File-table index of the main file.
    pub fn main_file(&self) -> u32 {
        0
    }

    /// Register a file, returning the existing index when already known.
    pub fn add_file(&mut self, path: &str, is_system: bool) -> u32 {
        if let Some(existing) = self.file_id(path) {
            return existing;
        }
        self.tree.files.push(SourceFile {
            path: path.to_string(),
            is_main: false,
            is_system,
        });
        (self.tree.files.len() - 1) as u32
    }

    pub fn file_id(&self, path: &str) -> Option<u32> {
        self.tree
            .files
            .iter()
            .position(|file| file.path == path)
            .map(|index| index as u32)
    }

    pub fn file(&self, id: u32) -> &SourceFile {
        &self.tree.files[id as usize]
    }

    pub fn kind_of(&self, node: NodeId) -> CursorKind {
        self.tree.node(node).kind
    }

    /// Read access to the partially built tree.
    pub fn view(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Add a child of `parent` that traversal will visit.
    pub fn add(&mut self, parent: NodeId, kind: CursorKind, spelling: &str) -> NodeId {
        let scope = self.scope_of(parent);
        let id = self.push(kind, spelling);
        let data = &mut self.tree.nodes[id.index()];
        data.lexical_parent = Some(parent);
        data.semantic_parent = scope;
        self.tree.nodes[parent.index()].children.push(id);
        id
    }

    /// Add a node that is reachable only through references (implicit
    /// declarations, template instantiations, declarations in pruned files).
    pub fn add_detached(
        &mut self,
        semantic_parent: Option<NodeId>,
        kind: CursorKind,
        spelling: &str,
    ) -> NodeId {
        let id = self.push(kind, spelling);
        self.tree.nodes[id.index()].semantic_parent = semantic_parent;
        id
    }

    /// Place `node` in the main file.
    pub fn at(&mut self, node: NodeId, line: u32, col: u32) -> &mut Self {
        let file = self.main_file();
        self.at_in(node, file, line, col)
    }

    pub fn at_in(&mut self, node: NodeId, file: u32, line: u32, col: u32) -> &mut Self {
        self.data(node).position = Some(Position { file, line, col });
        self
    }

    pub fn extent_end(&mut self, node: NodeId, line: u32) -> &mut Self {
        self.data(node).extent_end_line = line;
        self
    }

    pub fn semantic_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> &mut Self {
        self.data(node).semantic_parent = parent;
        self
    }

    pub fn references(&mut self, node: NodeId, decl: NodeId) -> &mut Self {
        self.data(node).referenced = Some(decl);
        self
    }

    pub fn canonical(&mut self, node: NodeId, canonical: NodeId) -> &mut Self {
        self.data(node).canonical = Some(canonical);
        self
    }

    pub fn definition(&mut self, node: NodeId, definition: NodeId) -> &mut Self {
        self.data(node).definition = Some(definition);
        self
    }

    /// Mark `node` as the defining occurrence of its entity.
    pub fn defining(&mut self, node: NodeId) -> &mut Self {
        self.data(node).is_definition = true;
        self
    }

    pub fn tokens<I, S>(&mut self, node: NodeId, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data(node).tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn include(&mut self, path: &str, depth: u32) -> &mut Self {
        self.tree.inclusions.push(Inclusion {
            path: path.to_string(),
            depth,
        });
        self
    }

    pub fn diagnostic(&mut self, severity: Severity, message: impl Into<String>) -> &mut Self {
        self.tree
            .diagnostics
            .push(Diagnostic::new(severity, message));
        self
    }

    pub fn build(self) -> SyntaxTree {
        self.tree
    }

    fn push(&mut self, kind: CursorKind, spelling: &str) -> NodeId {
        self.tree.nodes.push(NodeData::new(kind, spelling));
        NodeId((self.tree.nodes.len() - 1) as u32)
    }

    fn data(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.tree.nodes[node.index()]
    }

    fn scope_of(&self, parent: NodeId) -> Option<NodeId> {
        if self.tree.node(parent).kind.is_semantic_scope() {
            Some(parent)
        } else {
            self.tree.node(parent).semantic_parent
        }
    }
}
