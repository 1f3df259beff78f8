//! Depth-first traversal that turns a tree into raw facts.

use std::collections::HashSet;

use tracing::trace;

use super::calls::{callee_root, resolve_call_target};
use super::facts::{CallEdgeFact, ReferenceFact, SymbolFact};
use super::qualified::qualified_name;
use super::references::{classify_access, is_nonlocal_reference_target, resolve_reference_target};
use super::symbols::{SymbolVerdict, classify_symbol, symbol_fact};
use crate::ast::{AstProvider, CursorKind};
use crate::types::{Action, RefKind, SymbolKind};

/// Semantic-parent hops tried when the ancestor stack has no function.
const MAX_ENCLOSING_DEPTH: usize = 50;

/// Facts gathered by one walk, before dedup.
#[derive(Debug, Default)]
pub struct CollectedFacts {
    pub symbols: Vec<SymbolFact>,
    pub references: Vec<ReferenceFact>,
    pub call_edges: Vec<CallEdgeFact>,
}

/// Per-run traversal state. Nothing here outlives the run.
pub struct VisitorContext<'t, P: AstProvider> {
    tree: &'t P,
    action: Action,
    ancestors: Vec<P::Node>,
    seen_symbols: HashSet<(String, SymbolKind, u32)>,
    facts: CollectedFacts,
}

impl<'t, P: AstProvider> VisitorContext<'t, P> {
    pub fn new(tree: &'t P, action: Action) -> Self {
        Self {
            tree,
            action,
            ancestors: Vec::new(),
            seen_symbols: HashSet::new(),
            facts: CollectedFacts::default(),
        }
    }

    /// Walk the whole tree from its root.
    pub fn run(mut self) -> CollectedFacts {
        let root = self.tree.root();
        self.walk(root);
        self.facts
    }

    pub fn walk(&mut self, node: P::Node) {
        if self.tree.is_in_system_header(node) {
            return;
        }

        if self.action.collects_symbols() {
            self.emit_symbol(node);
        }

        if self.action.collects_references() {
            match self.tree.kind_of(node) {
                CursorKind::CallExpr => self.emit_call(node),
                CursorKind::TypeRef => self.emit_type_reference(node),
                kind if kind.is_name_reference() => self.emit_name_reference(node),
                _ => {}
            }
        }

        self.ancestors.push(node);
        for child in self.tree.children_of(node) {
            self.walk(child);
        }
        self.ancestors.pop();
    }

    fn emit_symbol(&mut self, node: P::Node) {
        let kind = match classify_symbol(self.tree, node) {
            SymbolVerdict::Report(kind) => kind,
            SymbolVerdict::Skip(reason) => {
                trace!("not reporting {:?}: {reason:?}", self.tree.spelling_of(node));
                return;
            }
            SymbolVerdict::NotSymbol => return,
        };

        let Some(fact) = symbol_fact(self.tree, node, kind) else {
            return;
        };
        let key = (fact.qualified_name.clone(), fact.kind, fact.line);
        if self.seen_symbols.insert(key) {
            self.facts.symbols.push(fact);
        }
    }

    fn emit_call(&mut self, node: P::Node) {
        let Some(target) = resolve_call_target(self.tree, node) else {
            return;
        };
        if self.tree.is_in_system_header(target) {
            return;
        }
        let Some(line_col) = self.line_col(node) else {
            return;
        };

        let callee = qualified_name(self.tree, target);
        self.facts.references.push(ReferenceFact {
            symbol: callee.clone(),
            line: line_col.0,
            col: line_col.1,
            kind: RefKind::Call,
        });

        match self.enclosing_function(node) {
            Some(caller) => self.facts.call_edges.push(CallEdgeFact {
                caller: qualified_name(self.tree, caller),
                callee,
                line: line_col.0,
            }),
            None => trace!("call to {callee} at line {} has no caller", line_col.0),
        }
    }

    fn emit_name_reference(&mut self, node: P::Node) {
        if self.is_under_call_callee(node) {
            return;
        }
        let Some(target) = resolve_reference_target(self.tree, node) else {
            return;
        };
        if !is_nonlocal_reference_target(self.tree, target) {
            return;
        }
        let Some((line, col)) = self.line_col(node) else {
            return;
        };

        let kind = classify_access(self.tree, node, &self.ancestors);
        self.facts.references.push(ReferenceFact {
            symbol: qualified_name(self.tree, target),
            line,
            col,
            kind,
        });
    }

    fn emit_type_reference(&mut self, node: P::Node) {
        let Some(target) = self.tree.referenced_declaration_of(node) else {
            return;
        };
        if !is_nonlocal_reference_target(self.tree, target) {
            return;
        }
        let Some((line, col)) = self.line_col(node) else {
            return;
        };

        self.facts.references.push(ReferenceFact {
            symbol: qualified_name(self.tree, target),
            line,
            col,
            kind: RefKind::TypeRef,
        });
    }

    /// Nearest function-like ancestor, falling back to the semantic chain.
    fn enclosing_function(&self, node: P::Node) -> Option<P::Node> {
        if let Some(found) = self
            .ancestors
            .iter()
            .rev()
            .find(|ancestor| self.tree.kind_of(**ancestor).is_function_like())
        {
            return Some(*found);
        }

        let mut parent = self.tree.semantic_parent_of(node);
        for _ in 0..MAX_ENCLOSING_DEPTH {
            let scope = parent?;
            let kind = self.tree.kind_of(scope);
            if kind == CursorKind::TranslationUnit {
                return None;
            }
            if kind.is_function_like() {
                return Some(scope);
            }
            parent = self.tree.semantic_parent_of(scope);
        }
        None
    }

    /// Whether `node` lies in the callee subtree of the nearest enclosing call.
    fn is_under_call_callee(&self, node: P::Node) -> bool {
        let Some(index) = self
            .ancestors
            .iter()
            .rposition(|ancestor| self.tree.kind_of(*ancestor) == CursorKind::CallExpr)
        else {
            return false;
        };

        let on_path = self.ancestors.get(index + 1).copied().unwrap_or(node);
        callee_root(self.tree, self.ancestors[index]) == Some(on_path)
    }

    fn line_col(&self, node: P::Node) -> Option<(u32, u32)> {
        self.tree
            .location_of(node)
            .filter(|location| location.line > 0)
            .map(|location| (location.line, location.col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeBuilder;

    #[test]
    fn test_callee_name_is_not_a_read() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let target = builder.add(root, CursorKind::FunctionDecl, "f");
        let caller = builder.add(root, CursorKind::FunctionDecl, "g");
        let body = builder.add(caller, CursorKind::CompoundStmt, "");
        let call = builder.add(body, CursorKind::CallExpr, "f");
        let callee = builder.add(call, CursorKind::UnexposedExpr, "f");
        let name = builder.add(callee, CursorKind::DeclRefExpr, "f");
        builder
            .at(target, 1, 6)
            .at(caller, 2, 6)
            .at(call, 3, 5)
            .at(callee, 3, 5)
            .at(name, 3, 5)
            .references(name, target);
        let tree = builder.build();

        let facts = VisitorContext::new(&tree, Action::ExtractRefs).run();
        assert!(facts.symbols.is_empty());
        assert_eq!(
            facts.references,
            vec![ReferenceFact {
                symbol: "f".into(),
                line: 3,
                col: 5,
                kind: RefKind::Call,
            }]
        );
        assert_eq!(facts.call_edges[0].caller, "g");
    }

    #[test]
    fn test_argument_of_call_is_classified() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let target = builder.add(root, CursorKind::FunctionDecl, "log");
        let global = builder.add(root, CursorKind::VarDecl, "level");
        let caller = builder.add(root, CursorKind::FunctionDecl, "main");
        let call = builder.add(caller, CursorKind::CallExpr, "log");
        let callee = builder.add(call, CursorKind::DeclRefExpr, "log");
        let arg_wrap = builder.add(call, CursorKind::UnexposedExpr, "level");
        let arg = builder.add(arg_wrap, CursorKind::DeclRefExpr, "level");
        builder
            .at(call, 4, 3)
            .at(callee, 4, 3)
            .at(arg, 4, 7)
            .references(callee, target)
            .references(arg, global);
        let tree = builder.build();

        let facts = VisitorContext::new(&tree, Action::ExtractRefs).run();
        let kinds: Vec<(String, RefKind)> = facts
            .references
            .iter()
            .map(|fact| (fact.symbol.clone(), fact.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![("log".into(), RefKind::Call), ("level".into(), RefKind::Read)]
        );
    }

    #[test]
    fn test_enclosing_function_falls_back_to_semantic_parents() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let target = builder.add(root, CursorKind::FunctionDecl, "init");
        let owner = builder.add(root, CursorKind::FunctionDecl, "setup");
        // A call reached outside its function's lexical subtree.
        let call = builder.add(root, CursorKind::CallExpr, "init");
        builder
            .semantic_parent(call, Some(owner))
            .at(call, 9, 1)
            .references(call, target);
        let tree = builder.build();

        let facts = VisitorContext::new(&tree, Action::ExtractAll).run();
        assert_eq!(facts.call_edges.len(), 1);
        assert_eq!(facts.call_edges[0].caller, "setup");
        assert_eq!(facts.call_edges[0].callee, "init");
    }

    #[test]
    fn test_symbols_only_skips_references() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let function = builder.add(root, CursorKind::FunctionDecl, "run");
        let call = builder.add(function, CursorKind::CallExpr, "run");
        builder.at(function, 1, 6).at(call, 2, 3).references(call, function);
        let tree = builder.build();

        let facts = VisitorContext::new(&tree, Action::ExtractSymbols).run();
        assert_eq!(facts.symbols.len(), 1);
        assert!(facts.references.is_empty());
        assert!(facts.call_edges.is_empty());
    }

    #[test]
    fn test_duplicate_symbol_paths_collapse() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let first = builder.add(root, CursorKind::VarDecl, "version");
        let second = builder.add(root, CursorKind::VarDecl, "version");
        let later = builder.add(root, CursorKind::VarDecl, "version");
        builder.at(first, 5, 12).at(second, 5, 20).at(later, 6, 12);
        let tree = builder.build();

        let facts = VisitorContext::new(&tree, Action::ExtractSymbols).run();
        let lines: Vec<u32> = facts.symbols.iter().map(|fact| fact.line).collect();
        assert_eq!(lines, vec![5, 6]);
        assert_eq!(facts.symbols[0].col, 12);
    }
}
