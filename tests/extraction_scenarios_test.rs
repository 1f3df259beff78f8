//! End-to-end extraction over hand-built trees.
//!
//! Each fixture mirrors what clang produces for the C++ shown above it.

use cppfacts::{
    Action, CallEdgeFact, CursorKind, ExtractOptions, ExtractionResult, IncludeDep, RefKind,
    ReferenceFact, SymbolKind, SyntaxTree, TreeBuilder, extract_tree,
};

fn extract(tree: &SyntaxTree) -> ExtractionResult {
    extract_tree(tree, "main.cpp", &ExtractOptions::new(Action::ExtractAll))
}

fn reference(symbol: &str, line: u32, col: u32, kind: RefKind) -> ReferenceFact {
    ReferenceFact {
        symbol: symbol.to_string(),
        line,
        col,
        kind,
    }
}

#[test]
fn test_compound_assignment_with_call() {
    // 1 int x;
    // 2 int f();
    // 3 void run() {
    // 4     x += f();
    // 5 }
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let x = builder.add(root, CursorKind::VarDecl, "x");
    let f = builder.add(root, CursorKind::FunctionDecl, "f");
    let run = builder.add(root, CursorKind::FunctionDecl, "run");
    let body = builder.add(run, CursorKind::CompoundStmt, "");
    let assign = builder.add(body, CursorKind::CompoundAssignOperator, "");
    let lhs = builder.add(assign, CursorKind::DeclRefExpr, "x");
    let call = builder.add(assign, CursorKind::CallExpr, "");
    let decay = builder.add(call, CursorKind::UnexposedExpr, "");
    let callee = builder.add(decay, CursorKind::DeclRefExpr, "f");
    builder
        .at(x, 1, 5)
        .at(f, 2, 5)
        .at(run, 3, 6)
        .extent_end(run, 5)
        .defining(run)
        .at(assign, 4, 5)
        .tokens(assign, ["x", "+=", "f", "(", ")"])
        .at(lhs, 4, 5)
        .references(lhs, x)
        .at(call, 4, 10)
        .references(call, f)
        .at(decay, 4, 10)
        .at(callee, 4, 10)
        .references(callee, f);
    let result = extract(&builder.build());

    assert_eq!(
        result.references,
        vec![
            reference("f", 4, 10, RefKind::Call),
            reference("x", 4, 5, RefKind::Write),
        ]
    );
    assert_eq!(
        result.call_edges,
        vec![CallEdgeFact {
            caller: "run".into(),
            callee: "f".into(),
            line: 4,
        }]
    );
}

#[test]
fn test_address_of_global() {
    // 1 int global_counter;
    // 2 void peek() {
    // 3     &global_counter;
    // 4 }
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let counter = builder.add(root, CursorKind::VarDecl, "global_counter");
    let peek = builder.add(root, CursorKind::FunctionDecl, "peek");
    let body = builder.add(peek, CursorKind::CompoundStmt, "");
    let unary = builder.add(body, CursorKind::UnaryOperator, "");
    let operand = builder.add(unary, CursorKind::DeclRefExpr, "global_counter");
    builder
        .at(counter, 1, 5)
        .at(peek, 2, 6)
        .at(unary, 3, 5)
        .tokens(unary, ["&", "global_counter"])
        .at(operand, 3, 6)
        .references(operand, counter);
    let result = extract(&builder.build());

    assert_eq!(
        result.references,
        vec![reference("global_counter", 3, 6, RefKind::Addr)]
    );
    assert!(result.call_edges.is_empty());
}

#[test]
fn test_forward_declaration_not_reported() {
    // 1 class Widget;
    // 2
    // 3 class Widget {
    // 4     int size;
    // 5 };
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let forward = builder.add(root, CursorKind::ClassDecl, "Widget");
    let definition = builder.add(root, CursorKind::ClassDecl, "Widget");
    let field = builder.add(definition, CursorKind::FieldDecl, "size");
    builder
        .at(forward, 1, 7)
        .at(definition, 3, 7)
        .extent_end(definition, 5)
        .defining(definition)
        .at(field, 4, 9)
        .canonical(definition, forward)
        .definition(forward, definition);
    let result = extract(&builder.build());

    let classes: Vec<_> = result
        .symbols
        .iter()
        .filter(|symbol| symbol.kind == SymbolKind::Class)
        .collect();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].line, 3);
    assert_eq!(classes[0].extent_end_line, 5);
    assert!(
        result
            .symbols
            .iter()
            .any(|symbol| symbol.qualified_name == "Widget::size")
    );
}

#[test]
fn test_common_header_keeps_shallowest_depth() {
    let mut builder = TreeBuilder::new("main.cpp");
    builder
        .include("include/a.h", 1)
        .include("include/common.h", 2)
        .include("include/b.h", 1)
        .include("include/c.h", 2)
        .include("include/common.h", 3);
    let result = extract(&builder.build());

    let common: Vec<&IncludeDep> = result
        .include_deps
        .iter()
        .filter(|dep| dep.path == "include/common.h")
        .collect();
    assert_eq!(common.len(), 1);
    assert_eq!(common[0].depth, 2);
    assert_eq!(result.include_deps.len(), 4);
}

#[test]
fn test_symbol_dedup_by_name_kind_and_line() {
    // 1 namespace app { extern int limit; int limit = 4; }
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let app = builder.add(root, CursorKind::Namespace, "app");
    let first = builder.add(app, CursorKind::VarDecl, "limit");
    let second = builder.add(app, CursorKind::VarDecl, "limit");
    builder.at(app, 1, 11).at(first, 1, 29).at(second, 1, 40);
    let result = extract(&builder.build());

    let limits: Vec<_> = result
        .symbols
        .iter()
        .filter(|symbol| symbol.qualified_name == "app::limit")
        .collect();
    assert_eq!(limits.len(), 1);
    assert_eq!(limits[0].col, 29);
}

#[test]
fn test_system_header_targets_are_never_referenced() {
    // /usr/include/cstdlib declares abs(); main.cpp calls it and reads errno_value.
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let header = builder.add_file("/usr/include/cstdlib", true);
    let abs = builder.add(root, CursorKind::FunctionDecl, "abs");
    let errno_value = builder.add(root, CursorKind::VarDecl, "errno_value");
    let run = builder.add(root, CursorKind::FunctionDecl, "run");
    let body = builder.add(run, CursorKind::CompoundStmt, "");
    let call = builder.add(body, CursorKind::CallExpr, "");
    let callee = builder.add(call, CursorKind::DeclRefExpr, "abs");
    let read = builder.add(call, CursorKind::DeclRefExpr, "errno_value");
    builder
        .at_in(abs, header, 80, 12)
        .at_in(errno_value, header, 90, 12)
        .at(run, 1, 6)
        .at(call, 2, 5)
        .at(callee, 2, 5)
        .references(callee, abs)
        .at(read, 2, 9)
        .references(read, errno_value);
    let result = extract(&builder.build());

    assert!(result.references.is_empty());
    assert!(result.call_edges.is_empty());
    assert!(
        result
            .symbols
            .iter()
            .all(|symbol| symbol.qualified_name == "run")
    );
}

#[test]
fn test_type_references_are_tagged_and_filtered() {
    // /usr/include/string declares `string`.
    // 1 class Widget {};
    // 2 struct Label {
    // 3     Widget owner;
    // 4     string text;
    // 5 };
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let header = builder.add_file("/usr/include/string", true);
    let string = builder.add(root, CursorKind::ClassDecl, "string");
    let widget = builder.add(root, CursorKind::ClassDecl, "Widget");
    let label = builder.add(root, CursorKind::StructDecl, "Label");
    let owner = builder.add(label, CursorKind::FieldDecl, "owner");
    let owner_type = builder.add(owner, CursorKind::TypeRef, "class Widget");
    let text = builder.add(label, CursorKind::FieldDecl, "text");
    let text_type = builder.add(text, CursorKind::TypeRef, "class string");
    builder
        .at_in(string, header, 40, 7)
        .defining(string)
        .at(widget, 1, 7)
        .defining(widget)
        .at(label, 2, 8)
        .defining(label)
        .at(owner, 3, 12)
        .at(owner_type, 3, 5)
        .references(owner_type, widget)
        .at(text, 4, 12)
        .at(text_type, 4, 5)
        .references(text_type, string);
    let result = extract(&builder.build());

    assert_eq!(
        result.references,
        vec![reference("Widget", 3, 5, RefKind::TypeRef)]
    );
    assert!(result.call_edges.is_empty());
}

#[test]
fn test_call_shadows_read_at_same_location() {
    // A callee name also visited outside the call subtree.
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let tick = builder.add(root, CursorKind::FunctionDecl, "tick");
    let run = builder.add(root, CursorKind::FunctionDecl, "run");
    let body = builder.add(run, CursorKind::CompoundStmt, "");
    let call = builder.add(body, CursorKind::CallExpr, "");
    let callee = builder.add(call, CursorKind::DeclRefExpr, "tick");
    let stray = builder.add(body, CursorKind::DeclRefExpr, "tick");
    builder
        .at(tick, 1, 6)
        .at(run, 2, 6)
        .at(call, 3, 5)
        .at(callee, 3, 5)
        .references(callee, tick)
        .at(stray, 3, 5)
        .references(stray, tick);
    let result = extract(&builder.build());

    assert_eq!(result.references, vec![reference("tick", 3, 5, RefKind::Call)]);
}

#[test]
fn test_top_level_call_has_no_edge() {
    // 1 int seed();
    // 2 int initial = seed();
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let seed = builder.add(root, CursorKind::FunctionDecl, "seed");
    let initial = builder.add(root, CursorKind::VarDecl, "initial");
    let call = builder.add(initial, CursorKind::CallExpr, "");
    let callee = builder.add(call, CursorKind::DeclRefExpr, "seed");
    builder
        .at(seed, 1, 5)
        .at(initial, 2, 5)
        .at(call, 2, 15)
        .at(callee, 2, 15)
        .references(callee, seed);
    let result = extract(&builder.build());

    assert_eq!(result.references, vec![reference("seed", 2, 15, RefKind::Call)]);
    assert!(result.call_edges.is_empty());
}

#[test]
fn test_member_call_resolves_to_method_definition() {
    // 1 namespace ui {
    // 2 struct Button { void press(); };
    // 3 }
    // 4 void ui::Button::press() {}
    // 5 void click(ui::Button& b) { b.press(); }
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let ui = builder.add(root, CursorKind::Namespace, "ui");
    let button = builder.add(ui, CursorKind::StructDecl, "Button");
    let declared = builder.add(button, CursorKind::CXXMethod, "press");
    let defined = builder.add(root, CursorKind::CXXMethod, "press");
    let click = builder.add(root, CursorKind::FunctionDecl, "click");
    let param = builder.add(click, CursorKind::ParmDecl, "b");
    let body = builder.add(click, CursorKind::CompoundStmt, "");
    let call = builder.add(body, CursorKind::CallExpr, "");
    let member = builder.add(call, CursorKind::MemberRefExpr, "press");
    let object = builder.add(member, CursorKind::DeclRefExpr, "b");
    builder
        .at(ui, 1, 11)
        .at(button, 2, 8)
        .defining(button)
        .at(declared, 2, 22)
        .at(defined, 4, 18)
        .semantic_parent(defined, Some(button))
        .defining(defined)
        .canonical(defined, declared)
        .definition(declared, defined)
        .at(click, 5, 6)
        .at(param, 5, 24)
        .at(call, 5, 29)
        .at(member, 5, 31)
        .references(member, declared)
        .at(object, 5, 29)
        .references(object, param);
    let result = extract(&builder.build());

    assert_eq!(
        result.references,
        vec![reference("ui::Button::press", 5, 29, RefKind::Call)]
    );
    assert_eq!(
        result.call_edges,
        vec![CallEdgeFact {
            caller: "click".into(),
            callee: "ui::Button::press".into(),
            line: 5,
        }]
    );

    let methods: Vec<u32> = result
        .symbols
        .iter()
        .filter(|symbol| symbol.kind == SymbolKind::Method)
        .map(|symbol| symbol.line)
        .collect();
    assert_eq!(methods, vec![2, 4]);
}

#[test]
fn test_actions_select_fact_families() {
    let mut builder = TreeBuilder::new("main.cpp");
    let root = builder.root();
    let value = builder.add(root, CursorKind::VarDecl, "value");
    let read_it = builder.add(root, CursorKind::FunctionDecl, "read_it");
    let body = builder.add(read_it, CursorKind::CompoundStmt, "");
    let use_site = builder.add(body, CursorKind::DeclRefExpr, "value");
    builder
        .at(value, 1, 5)
        .at(read_it, 2, 5)
        .at(use_site, 2, 24)
        .references(use_site, value)
        .include("config.h", 1);
    let tree = builder.build();

    let symbols = extract_tree(&tree, "main.cpp", &ExtractOptions::new(Action::ExtractSymbols));
    assert_eq!(symbols.symbols.len(), 2);
    assert!(symbols.references.is_empty());
    assert_eq!(symbols.include_deps.len(), 1);

    let refs = extract_tree(&tree, "main.cpp", &ExtractOptions::new(Action::ExtractRefs));
    assert!(refs.symbols.is_empty());
    assert_eq!(refs.references, vec![reference("value", 2, 24, RefKind::Read)]);
    assert_eq!(refs.include_deps.len(), 1);
}
