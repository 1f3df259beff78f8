//! Reference classification: read, write or address-of.
//!
//! The AST says where a name sits; for operators whose node kind does not say
//! which operator it is (`=` vs `==`, `&x` vs `-x`) the raw tokens decide.

use crate::ast::{AstProvider, CursorKind};
use crate::types::RefKind;

use super::calls::canonical_callable;

const ASSIGNMENT_TOKENS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "<<=", ">>=", "&=", "^=", "|=",
];

pub fn is_assignment_token(token: &str) -> bool {
    ASSIGNMENT_TOKENS.contains(&token)
}

/// Whether a reference to `decl` may be reported at all.
///
/// System-header declarations, parameters and locals never are.
pub fn is_nonlocal_reference_target<P: AstProvider>(tree: &P, decl: P::Node) -> bool {
    if tree.is_in_system_header(decl) {
        return false;
    }
    match tree.kind_of(decl) {
        CursorKind::ParmDecl => false,
        CursorKind::VarDecl => !tree
            .semantic_parent_of(decl)
            .is_some_and(|parent| tree.kind_of(parent).is_function_like()),
        _ => true,
    }
}

/// Declaration a name reference should be reported against. Callables are
/// canonicalised the same way call targets are.
pub fn resolve_reference_target<P: AstProvider>(tree: &P, node: P::Node) -> Option<P::Node> {
    let referenced = tree.referenced_declaration_of(node)?;
    canonical_callable(tree, referenced).or(Some(referenced))
}

/// Classify how `node` accesses its target.
///
/// `ancestors` runs from the root down to the parent of `node`. The walk goes
/// outward, looks through transparent wrappers, and stops at the first
/// operator or call. A binary operator ends the walk even when none of its
/// tokens is an assignment.
pub fn classify_access<P: AstProvider>(tree: &P, node: P::Node, ancestors: &[P::Node]) -> RefKind {
    for (index, &ancestor) in ancestors.iter().enumerate().rev() {
        let kind = tree.kind_of(ancestor);
        if kind.is_transparent_wrapper() {
            continue;
        }

        let on_path = ancestors.get(index + 1).copied().unwrap_or(node);
        let in_first_operand = || tree.children_of(ancestor).first() == Some(&on_path);

        match kind {
            CursorKind::CompoundAssignOperator => {
                if in_first_operand() {
                    return RefKind::Write;
                }
                break;
            }
            CursorKind::BinaryOperator => {
                if in_first_operand()
                    && tree
                        .tokens_of(ancestor)
                        .iter()
                        .any(|token| is_assignment_token(token))
                {
                    return RefKind::Write;
                }
                break;
            }
            CursorKind::UnaryOperator => {
                if in_first_operand() {
                    let tokens = tree.tokens_of(ancestor);
                    if tokens.iter().any(|token| token == "++" || token == "--") {
                        return RefKind::Write;
                    }
                    if tokens.iter().any(|token| token == "&") {
                        return RefKind::Addr;
                    }
                }
                break;
            }
            CursorKind::CallExpr => break,
            _ => {}
        }
    }

    RefKind::Read
}
