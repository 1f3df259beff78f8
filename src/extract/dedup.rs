//! Post-walk ordering, dedup and shadowing of fact lists.

use std::collections::HashSet;

use super::facts::{CallEdgeFact, IncludeDep, ReferenceFact};
use crate::types::RefKind;

/// Sort by `(path, depth)` and keep the shallowest entry per path.
pub fn dedup_include_deps(deps: &mut Vec<IncludeDep>) {
    deps.sort();
    deps.dedup_by(|later, earlier| later.path == earlier.path);
}

/// Sort, drop exact duplicates, then drop reads shadowed by a call at the
/// same `(symbol, line, col)`.
pub fn dedup_references(references: &mut Vec<ReferenceFact>) {
    references.sort();
    references.dedup();

    let calls: HashSet<(String, u32, u32)> = references
        .iter()
        .filter(|fact| fact.kind == RefKind::Call)
        .map(|fact| (fact.symbol.clone(), fact.line, fact.col))
        .collect();
    if calls.is_empty() {
        return;
    }

    references.retain(|fact| {
        fact.kind != RefKind::Read || !calls.contains(&(fact.symbol.clone(), fact.line, fact.col))
    });
}

pub fn dedup_call_edges(edges: &mut Vec<CallEdgeFact>) {
    edges.sort();
    edges.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(symbol: &str, line: u32, col: u32, kind: RefKind) -> ReferenceFact {
        ReferenceFact {
            symbol: symbol.to_string(),
            line,
            col,
            kind,
        }
    }

    #[test]
    fn test_include_deps_keep_minimum_depth() {
        let mut deps = vec![
            IncludeDep {
                path: "common.h".into(),
                depth: 3,
            },
            IncludeDep {
                path: "a.h".into(),
                depth: 1,
            },
            IncludeDep {
                path: "common.h".into(),
                depth: 2,
            },
        ];
        dedup_include_deps(&mut deps);
        assert_eq!(
            deps,
            vec![
                IncludeDep {
                    path: "a.h".into(),
                    depth: 1
                },
                IncludeDep {
                    path: "common.h".into(),
                    depth: 2
                },
            ]
        );
    }

    #[test]
    fn test_call_shadows_read_at_same_site() {
        let mut refs = vec![
            reference("f", 3, 5, RefKind::Read),
            reference("f", 3, 5, RefKind::Call),
            reference("f", 3, 5, RefKind::Call),
            reference("f", 4, 5, RefKind::Read),
            reference("g", 3, 5, RefKind::Read),
            reference("f", 3, 5, RefKind::Write),
        ];
        dedup_references(&mut refs);
        assert_eq!(
            refs,
            vec![
                reference("f", 3, 5, RefKind::Call),
                reference("f", 3, 5, RefKind::Write),
                reference("f", 4, 5, RefKind::Read),
                reference("g", 3, 5, RefKind::Read),
            ]
        );
    }

    #[test]
    fn test_call_edges_sorted_and_unique() {
        let edge = |caller: &str, callee: &str, line| CallEdgeFact {
            caller: caller.into(),
            callee: callee.into(),
            line,
        };
        let mut edges = vec![edge("main", "run", 9), edge("main", "init", 4), edge("main", "run", 9)];
        dedup_call_edges(&mut edges);
        assert_eq!(edges, vec![edge("main", "init", 4), edge("main", "run", 9)]);
    }
}
