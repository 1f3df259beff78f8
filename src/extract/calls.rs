//! Call-target resolution
//!
//! A call expression rarely points at its callee directly. Member calls,
//! overload sets and template instantiations bury the name under implicit
//! casts and placeholder nodes, so the resolver scores every callable found
//! below the callee root and keeps the shallowest, most specific one.

use tracing::trace;

use crate::ast::{AstProvider, CursorKind};

/// Best candidate found in a callee subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<N> {
    pub target: N,
    pub score: i32,
}

const DEPTH_PENALTY: i32 = 10;

/// Pick the declaration a reference to `decl` should be reported against.
///
/// Prefers the definition, then the canonical declaration (and its
/// definition), then `decl` itself. Only callable declarations qualify.
pub fn canonical_callable<P: AstProvider>(tree: &P, decl: P::Node) -> Option<P::Node> {
    let callable = |candidate: Option<P::Node>| {
        candidate.filter(|node| tree.kind_of(*node).is_callable_declaration())
    };

    if let Some(definition) = callable(tree.definition_of(decl)) {
        return Some(definition);
    }
    if let Some(canonical) = callable(tree.canonical_form_of(decl)) {
        return callable(tree.definition_of(canonical)).or(Some(canonical));
    }
    callable(Some(decl))
}

/// Fixed priority of a node kind as the carrier of a callee name.
pub fn call_target_score(kind: CursorKind, depth: i32) -> i32 {
    let base = match kind {
        CursorKind::MemberRefExpr | CursorKind::MemberRef => 500,
        CursorKind::DeclRefExpr => 400,
        CursorKind::OverloadedDeclRef => 350,
        CursorKind::CallExpr => 300,
        CursorKind::TypeRef => 250,
        CursorKind::UnexposedExpr => 200,
        _ => 100,
    };
    base - depth * DEPTH_PENALTY
}

/// The child of `call` that encodes the callee; `None` for a childless call.
pub fn callee_root<P: AstProvider>(tree: &P, call: P::Node) -> Option<P::Node> {
    let children = tree.children_of(call);
    children
        .iter()
        .copied()
        .find(|child| tree.kind_of(*child).is_call_target_expression())
        .or_else(|| children.first().copied())
}

/// Highest-scoring callable at or below `node`.
///
/// Ties keep the earlier candidate in pre-order, so only a strictly higher
/// score replaces the current best.
pub fn best_candidate<P: AstProvider>(
    tree: &P,
    node: P::Node,
    depth: i32,
) -> Option<Candidate<P::Node>> {
    let kind = tree.kind_of(node);
    let mut callable = tree
        .referenced_declaration_of(node)
        .and_then(|decl| canonical_callable(tree, decl));
    if callable.is_none() && kind.is_callable_declaration() {
        callable = canonical_callable(tree, node);
    }

    let here = callable.map(|target| Candidate {
        target,
        score: call_target_score(kind, depth),
    });

    tree.children_of(node)
        .into_iter()
        .filter_map(|child| best_candidate(tree, child, depth + 1))
        .fold(here, |best, candidate| match best {
            Some(current) if candidate.score <= current.score => Some(current),
            _ => Some(candidate),
        })
}

/// Resolve the declaration `call` invokes.
pub fn resolve_call_target<P: AstProvider>(tree: &P, call: P::Node) -> Option<P::Node> {
    if let Some(direct) = tree
        .referenced_declaration_of(call)
        .and_then(|decl| canonical_callable(tree, decl))
    {
        return Some(direct);
    }

    let root = callee_root(tree, call)?;
    let best = best_candidate(tree, root, 0);
    if best.is_none() {
        trace!("call {call:?} has no callable below its callee");
    }
    best.map(|candidate| candidate.target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeBuilder;

    #[test]
    fn test_scores_follow_kind_priority() {
        assert_eq!(call_target_score(CursorKind::MemberRefExpr, 0), 500);
        assert_eq!(call_target_score(CursorKind::DeclRefExpr, 2), 380);
        assert!(
            call_target_score(CursorKind::OverloadedDeclRef, 0)
                > call_target_score(CursorKind::CallExpr, 0)
        );
        assert!(
            call_target_score(CursorKind::TypeRef, 0)
                > call_target_score(CursorKind::UnexposedExpr, 0)
        );
        assert_eq!(call_target_score(CursorKind::ParenExpr, 1), 90);
    }

    #[test]
    fn test_canonical_callable_prefers_definition() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let decl = builder.add(root, CursorKind::FunctionDecl, "f");
        let def = builder.add(root, CursorKind::FunctionDecl, "f");
        let redecl = builder.add(root, CursorKind::FunctionDecl, "f");
        let var = builder.add(root, CursorKind::VarDecl, "v");
        builder
            .definition(decl, def)
            .canonical(redecl, decl)
            .canonical(var, var);
        let tree = builder.build();

        assert_eq!(canonical_callable(&tree, decl), Some(def));
        // The canonical form has a definition, so the redeclaration reaches it.
        assert_eq!(canonical_callable(&tree, redecl), Some(def));
        assert_eq!(canonical_callable(&tree, var), None);
    }

    #[test]
    fn test_canonical_without_definition_is_kept() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let first = builder.add(root, CursorKind::FunctionDecl, "g");
        let second = builder.add(root, CursorKind::FunctionDecl, "g");
        builder.canonical(second, first);
        let tree = builder.build();

        assert_eq!(canonical_callable(&tree, second), Some(first));
    }

    #[test]
    fn test_direct_reference_short_circuits() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let ctor = builder.add(root, CursorKind::Constructor, "Point");
        let call = builder.add(root, CursorKind::CallExpr, "Point");
        builder.references(call, ctor);
        let tree = builder.build();

        assert_eq!(resolve_call_target(&tree, call), Some(ctor));
    }

    #[test]
    fn test_member_access_beats_deeper_name() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let method = builder.add(root, CursorKind::CXXMethod, "size");
        let free = builder.add(root, CursorKind::FunctionDecl, "make");
        let call = builder.add(root, CursorKind::CallExpr, "");
        let member = builder.add(call, CursorKind::MemberRefExpr, "size");
        let inner_call = builder.add(member, CursorKind::CallExpr, "");
        let name = builder.add(inner_call, CursorKind::DeclRefExpr, "make");
        builder.references(member, method).references(name, free);
        let tree = builder.build();

        assert_eq!(callee_root(&tree, call), Some(member));
        assert_eq!(resolve_call_target(&tree, call), Some(method));
    }

    #[test]
    fn test_wrapped_callee_is_found_through_unexposed_nodes() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let target = builder.add(root, CursorKind::FunctionDecl, "tick");
        let call = builder.add(root, CursorKind::CallExpr, "");
        let wrapper = builder.add(call, CursorKind::UnexposedExpr, "");
        let paren = builder.add(wrapper, CursorKind::ParenExpr, "");
        let name = builder.add(paren, CursorKind::DeclRefExpr, "tick");
        builder.references(name, target);
        let tree = builder.build();

        let best = best_candidate(&tree, wrapper, 0).unwrap();
        assert_eq!(best.target, target);
        assert_eq!(best.score, 400 - 20);
        assert_eq!(resolve_call_target(&tree, call), Some(target));
    }

    #[test]
    fn test_ties_keep_first_in_preorder() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let left_fn = builder.add(root, CursorKind::FunctionDecl, "left");
        let right_fn = builder.add(root, CursorKind::FunctionDecl, "right");
        let call = builder.add(root, CursorKind::CallExpr, "");
        let wrapper = builder.add(call, CursorKind::UnexposedExpr, "");
        let left = builder.add(wrapper, CursorKind::DeclRefExpr, "left");
        let right = builder.add(wrapper, CursorKind::DeclRefExpr, "right");
        builder.references(left, left_fn).references(right, right_fn);
        let tree = builder.build();

        assert_eq!(resolve_call_target(&tree, call), Some(left_fn));
    }

    #[test]
    fn test_first_child_fallback_and_empty_call() {
        let mut builder = TreeBuilder::new("main.cpp");
        let root = builder.root();
        let target = builder.add(root, CursorKind::FunctionDecl, "run");
        let call = builder.add(root, CursorKind::CallExpr, "");
        let paren = builder.add(call, CursorKind::ParenExpr, "");
        let name = builder.add(paren, CursorKind::DeclRefExpr, "run");
        let empty = builder.add(root, CursorKind::CallExpr, "");
        let unresolved = builder.add(root, CursorKind::CallExpr, "");
        builder.add(unresolved, CursorKind::DeclRefExpr, "fp");
        builder.references(name, target);
        let tree = builder.build();

        assert_eq!(callee_root(&tree, call), Some(paren));
        assert_eq!(resolve_call_target(&tree, call), Some(target));
        assert_eq!(resolve_call_target(&tree, empty), None);
        assert_eq!(resolve_call_target(&tree, unresolved), None);
    }
}
