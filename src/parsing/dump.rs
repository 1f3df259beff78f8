//! Importing clang's JSON AST dump into a [`SyntaxTree`]
//!
//! `clang -Xclang -ast-dump=json` prints every node with its class name, a
//! source range and the attributes the JSON dumper knows about. Locations are
//! delta-encoded: `file` and `line` are only written when they change, so the
//! dump has to be read strictly in document order (`loc`, then `range.begin`,
//! then `range.end`, then `inner`), including subtrees that are not kept.
//!
//! Node classes are folded onto [`CursorKind`] the way libclang exposes them:
//! implicit casts and other sugar become `UnexposedExpr`, member and operator
//! calls become `CallExpr`, and a template's pattern declaration is merged into
//! its `FunctionTemplate`/`ClassTemplate` node.
//!
//! The dump has no type-reference nodes. Declarations keep their written type
//! in `qualType`; every name in it that resolves to an imported type
//! declaration becomes a `TypeRef` child, placed on the matching identifier in
//! the declaration's source text.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::args::SystemHeaders;
use super::error::{ParseError, ParseResult};
use super::stderr::ClangStderr;
use super::tokens::{SourceTokens, Token};
use crate::ast::{AstProvider, CursorKind, NodeId, SyntaxTree, TreeBuilder};
use crate::extract::qualified_name;
use crate::types::normalise_path;

type Object = Map<String, Value>;

/// One half of a clang location: where the characters are, or where the
/// macro using them was expanded.
#[derive(Debug, Clone)]
struct BareLoc {
    file: String,
    line: u32,
    col: u32,
    offset: Option<usize>,
    tok_len: usize,
}

#[derive(Debug, Clone)]
struct SourceLoc {
    spelling: BareLoc,
    expansion: BareLoc,
}

/// Decoder state for clang's delta-encoded locations.
#[derive(Debug, Default)]
struct LocState {
    file: String,
    line: u32,
}

impl LocState {
    fn bare(&mut self, object: &Object) -> Option<BareLoc> {
        if object.is_empty() {
            return None;
        }
        if let Some(file) = object.get("file").and_then(Value::as_str) {
            self.file = file.to_string();
        }
        if let Some(line) = object.get("line").and_then(Value::as_u64) {
            self.line = line as u32;
        }
        let col = object.get("col").and_then(Value::as_u64)? as u32;
        Some(BareLoc {
            file: self.file.clone(),
            line: self.line,
            col,
            offset: object
                .get("offset")
                .and_then(Value::as_u64)
                .map(|offset| offset as usize),
            tok_len: object.get("tokLen").and_then(Value::as_u64).unwrap_or(0) as usize,
        })
    }

    fn read(&mut self, value: Option<&Value>) -> Option<SourceLoc> {
        let object = value?.as_object()?;
        if object.contains_key("spellingLoc") || object.contains_key("expansionLoc") {
            let spelling = object
                .get("spellingLoc")
                .and_then(Value::as_object)
                .and_then(|loc| self.bare(loc));
            let expansion = object
                .get("expansionLoc")
                .and_then(Value::as_object)
                .and_then(|loc| self.bare(loc));
            return match (spelling, expansion) {
                (Some(spelling), Some(expansion)) => Some(SourceLoc {
                    spelling,
                    expansion,
                }),
                (Some(only), None) | (None, Some(only)) => Some(SourceLoc {
                    spelling: only.clone(),
                    expansion: only,
                }),
                (None, None) => None,
            };
        }
        let bare = self.bare(object)?;
        Some(SourceLoc {
            spelling: bare.clone(),
            expansion: bare,
        })
    }

    fn range(&mut self, object: &Object) -> (Option<SourceLoc>, Option<SourceLoc>) {
        let range = object.get("range").and_then(Value::as_object);
        let begin = self.read(range.and_then(|range| range.get("begin")));
        let end = self.read(range.and_then(|range| range.get("end")));
        (begin, end)
    }
}

/// What to do with one JSON node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Skim,
    CtorInitializer,
    Template { kind: CursorKind, merge_pattern: bool },
    Decl(CursorKind),
    Expr(CursorKind),
    Stmt(CursorKind),
}

fn plan_for(class: &str, object: &Object) -> Plan {
    match class {
        "" | "TemplateArgument" => return Plan::Skim,
        "CXXCtorInitializer" => return Plan::CtorInitializer,
        "FunctionTemplateDecl" => {
            return Plan::Template {
                kind: CursorKind::FunctionTemplate,
                merge_pattern: true,
            };
        }
        "ClassTemplateDecl" => {
            return Plan::Template {
                kind: CursorKind::ClassTemplate,
                merge_pattern: true,
            };
        }
        "TypeAliasTemplateDecl" => {
            return Plan::Template {
                kind: CursorKind::TypeAliasTemplateDecl,
                merge_pattern: false,
            };
        }
        "VarTemplateDecl" => {
            return Plan::Template {
                kind: CursorKind::UnexposedDecl,
                merge_pattern: false,
            };
        }
        _ => {}
    }
    if class.ends_with("Attr") || class.ends_with("Comment") {
        return Plan::Skim;
    }
    if let Some(kind) = decl_kind(class, object) {
        return Plan::Decl(kind);
    }
    if let Some(kind) = expr_kind(class) {
        return Plan::Expr(kind);
    }
    if let Some(kind) = stmt_kind(class) {
        return Plan::Stmt(kind);
    }
    Plan::Skim
}

fn record_kind(object: &Object) -> CursorKind {
    match object.get("tagUsed").and_then(Value::as_str) {
        Some("class") => CursorKind::ClassDecl,
        Some("union") => CursorKind::UnionDecl,
        _ => CursorKind::StructDecl,
    }
}

fn decl_kind(class: &str, object: &Object) -> Option<CursorKind> {
    let kind = match class {
        "NamespaceDecl" => CursorKind::Namespace,
        "NamespaceAliasDecl" => CursorKind::NamespaceAlias,
        "LinkageSpecDecl" => CursorKind::LinkageSpec,
        "UsingDirectiveDecl" => CursorKind::UsingDirective,
        "UsingDecl" => CursorKind::UsingDeclaration,
        "CXXRecordDecl" | "RecordDecl" | "ClassTemplateSpecializationDecl" => record_kind(object),
        "ClassTemplatePartialSpecializationDecl" => CursorKind::ClassTemplatePartialSpecialization,
        "EnumDecl" => CursorKind::EnumDecl,
        "EnumConstantDecl" => CursorKind::EnumConstantDecl,
        "FunctionDecl" => CursorKind::FunctionDecl,
        "CXXMethodDecl" => CursorKind::CXXMethod,
        "CXXConstructorDecl" => CursorKind::Constructor,
        "CXXDestructorDecl" => CursorKind::Destructor,
        "CXXConversionDecl" => CursorKind::ConversionFunction,
        "VarDecl" => CursorKind::VarDecl,
        "FieldDecl" => CursorKind::FieldDecl,
        "ParmVarDecl" => CursorKind::ParmDecl,
        "TypedefDecl" => CursorKind::TypedefDecl,
        "TypeAliasDecl" => CursorKind::TypeAliasDecl,
        "TemplateTypeParmDecl" => CursorKind::TemplateTypeParameter,
        "NonTypeTemplateParmDecl" => CursorKind::NonTypeTemplateParameter,
        "TemplateTemplateParmDecl" => CursorKind::TemplateTemplateParameter,
        "AccessSpecDecl" => CursorKind::AccessSpecifier,
        "FriendDecl" => CursorKind::FriendDecl,
        "StaticAssertDecl" => CursorKind::StaticAssert,
        other if other.ends_with("Decl") => CursorKind::UnexposedDecl,
        _ => return None,
    };
    Some(kind)
}

fn expr_kind(class: &str) -> Option<CursorKind> {
    let kind = match class {
        "CallExpr"
        | "CXXMemberCallExpr"
        | "CXXOperatorCallExpr"
        | "CXXConstructExpr"
        | "CXXTemporaryObjectExpr"
        | "CXXUnresolvedConstructExpr"
        | "UserDefinedLiteral" => CursorKind::CallExpr,
        "DeclRefExpr" | "DependentScopeDeclRefExpr" => CursorKind::DeclRefExpr,
        "MemberExpr" | "CXXDependentScopeMemberExpr" => CursorKind::MemberRefExpr,
        "UnresolvedLookupExpr" | "UnresolvedMemberExpr" => CursorKind::OverloadedDeclRef,
        "ParenExpr" => CursorKind::ParenExpr,
        "BinaryOperator" => CursorKind::BinaryOperator,
        "CompoundAssignOperator" => CursorKind::CompoundAssignOperator,
        "UnaryOperator" => CursorKind::UnaryOperator,
        "ConditionalOperator" => CursorKind::ConditionalOperator,
        "ArraySubscriptExpr" => CursorKind::ArraySubscriptExpr,
        "CStyleCastExpr" => CursorKind::CStyleCastExpr,
        "CXXStaticCastExpr" | "CXXDynamicCastExpr" | "CXXReinterpretCastExpr"
        | "CXXConstCastExpr" => CursorKind::CXXNamedCastExpr,
        "LambdaExpr" => CursorKind::LambdaExpr,
        "InitListExpr" => CursorKind::InitListExpr,
        "CXXThisExpr" => CursorKind::CXXThisExpr,
        "CXXNewExpr" => CursorKind::CXXNewExpr,
        "CXXDeleteExpr" => CursorKind::CXXDeleteExpr,
        "IntegerLiteral" => CursorKind::IntegerLiteral,
        "FloatingLiteral" => CursorKind::FloatingLiteral,
        "StringLiteral" => CursorKind::StringLiteral,
        "CharacterLiteral" => CursorKind::CharacterLiteral,
        "CXXBoolLiteralExpr" => CursorKind::CXXBoolLiteralExpr,
        "CXXNullPtrLiteralExpr" => CursorKind::CXXNullPtrLiteralExpr,
        other
            if other.ends_with("Expr")
                || other.ends_with("Operator")
                || other.ends_with("Literal") =>
        {
            CursorKind::UnexposedExpr
        }
        _ => return None,
    };
    Some(kind)
}

fn stmt_kind(class: &str) -> Option<CursorKind> {
    let kind = match class {
        "CompoundStmt" => CursorKind::CompoundStmt,
        "DeclStmt" => CursorKind::DeclStmt,
        "ReturnStmt" => CursorKind::ReturnStmt,
        "IfStmt" => CursorKind::IfStmt,
        "ForStmt" => CursorKind::ForStmt,
        "CXXForRangeStmt" => CursorKind::CXXForRangeStmt,
        "WhileStmt" => CursorKind::WhileStmt,
        "DoStmt" => CursorKind::DoStmt,
        "SwitchStmt" => CursorKind::SwitchStmt,
        "CaseStmt" => CursorKind::CaseStmt,
        "DefaultStmt" => CursorKind::DefaultStmt,
        "BreakStmt" => CursorKind::BreakStmt,
        "ContinueStmt" => CursorKind::ContinueStmt,
        "NullStmt" => CursorKind::NullStmt,
        "CXXTryStmt" => CursorKind::CXXTryStmt,
        "CXXCatchStmt" => CursorKind::CXXCatchStmt,
        other if other.ends_with("Stmt") => CursorKind::UnexposedStmt,
        _ => return None,
    };
    Some(kind)
}

/// Kinds whose contents get them as semantic parent.
fn opens_scope(kind: CursorKind) -> bool {
    kind.is_callable_declaration()
        || matches!(
            kind,
            CursorKind::TranslationUnit
                | CursorKind::Namespace
                | CursorKind::LinkageSpec
                | CursorKind::ClassDecl
                | CursorKind::StructDecl
                | CursorKind::UnionDecl
                | CursorKind::EnumDecl
                | CursorKind::ClassTemplate
                | CursorKind::ClassTemplatePartialSpecialization
                | CursorKind::LambdaExpr
        )
}

fn is_template_pattern(template: CursorKind, class: &str) -> bool {
    match template {
        CursorKind::FunctionTemplate => matches!(
            class,
            "FunctionDecl"
                | "CXXMethodDecl"
                | "CXXConstructorDecl"
                | "CXXDestructorDecl"
                | "CXXConversionDecl"
                | "CXXDeductionGuideDecl"
        ),
        CursorKind::ClassTemplate => class == "CXXRecordDecl",
        CursorKind::TypeAliasTemplateDecl => class == "TypeAliasDecl",
        CursorKind::UnexposedDecl => class == "VarDecl",
        _ => false,
    }
}

fn is_defining(kind: CursorKind, object: &Object) -> bool {
    let has_child = |wanted: &[&str]| {
        inner(object).iter().any(|child| {
            child
                .get("kind")
                .and_then(Value::as_str)
                .is_some_and(|class| wanted.contains(&class))
        })
    };

    match kind {
        // Empty bodies are found from the source, see `Importer::closes_body`.
        CursorKind::EnumDecl => has_child(&["EnumConstantDecl"]),
        kind if kind.is_aggregate() || kind == CursorKind::ClassTemplate => {
            flag(object, "completeDefinition")
        }
        kind if kind.is_callable_declaration() || kind == CursorKind::FunctionTemplate => {
            has_child(&["CompoundStmt", "CXXTryStmt"])
                || object.contains_key("explicitlyDefaulted")
                || flag(object, "explicitlyDeleted")
        }
        _ => false,
    }
}

fn inner(object: &Object) -> &[Value] {
    object
        .get("inner")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn flag(object: &Object, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn str_attr<'v>(object: &'v Object, key: &str) -> Option<&'v str> {
    object.get(key).and_then(Value::as_str)
}

/// Declarations the dumper only names (`{id, kind, name}`) carry no range.
fn is_bare_reference(object: &Object) -> bool {
    !object.contains_key("loc") && !object.contains_key("range")
}

/// Record names a construct expression's type may refer to, most specific first.
fn constructed_record_names(object: &Object) -> Vec<String> {
    let Some(ty) = object.get("type").and_then(Value::as_object) else {
        return Vec::new();
    };
    ["desugaredQualType", "qualType"]
        .iter()
        .filter_map(|key| str_attr(ty, key))
        .map(record_name_of_type)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Names written in a type: `const ns::Box<Item> &` gives `ns::Box`, `Item`.
fn type_names(ty: &str) -> Vec<String> {
    let cleaned = ty.replace("(anonymous namespace)::", "");
    let mut names: Vec<String> = Vec::new();
    for word in cleaned.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':')) {
        let word = word.trim_matches(':');
        if word.is_empty()
            || word.starts_with(|c: char| c.is_ascii_digit())
            || names.iter().any(|name| name == word)
        {
            continue;
        }
        names.push(word.to_string());
    }
    names
}

fn is_type_declaration(kind: CursorKind) -> bool {
    kind.is_aggregate()
        || matches!(
            kind,
            CursorKind::ClassTemplate | CursorKind::TypedefDecl | CursorKind::TypeAliasDecl
        )
}

/// Exact qualified name first, then a unique `::name` suffix.
fn resolve_type_name(types: &HashMap<String, NodeId>, name: &str) -> Option<NodeId> {
    if let Some(&node) = types.get(name) {
        return Some(node);
    }
    let suffix = format!("::{name}");
    let mut matches = types
        .iter()
        .filter(|(qualified, _)| qualified.ends_with(&suffix))
        .map(|(_, &node)| node);
    let first = matches.next()?;
    matches.next().is_none().then_some(first)
}

fn record_name_of_type(ty: &str) -> String {
    let mut name = ty.trim();
    for prefix in ["const ", "volatile ", "struct ", "class ", "union ", "::"] {
        name = name.strip_prefix(prefix).unwrap_or(name);
    }
    let name = name.split('<').next().unwrap_or(name).trim();
    name.replace("(anonymous namespace)::", "")
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Lexical parent new attached nodes hang off.
    parent: NodeId,
    /// Semantic parent for new nodes.
    scope: NodeId,
    /// Declarations are only reachable through references, bodies are skipped.
    detached: bool,
}

/// Source span of a declaration's written type, resolved once all types are known.
struct TypeMention {
    owner: NodeId,
    file: String,
    start: usize,
    end: usize,
    names: Vec<String>,
}

struct ConstructCall {
    node: NodeId,
    records: Vec<String>,
    ctor_type: String,
}

struct Importer<'h> {
    builder: TreeBuilder,
    headers: &'h SystemHeaders,
    tokens: SourceTokens,
    locs: LocState,
    main_file: String,
    ids: HashMap<String, NodeId>,
    references: Vec<(NodeId, String)>,
    previous: Vec<(NodeId, String)>,
    decl_contexts: Vec<(NodeId, String)>,
    ctor_types: Vec<(NodeId, String)>,
    constructs: Vec<ConstructCall>,
    type_mentions: Vec<TypeMention>,
}

impl<'h> Importer<'h> {
    fn new(main_file: &str, headers: &'h SystemHeaders) -> Self {
        Self {
            builder: TreeBuilder::new(main_file),
            headers,
            tokens: SourceTokens::new(),
            locs: LocState::default(),
            main_file: normalise_path(main_file),
            ids: HashMap::new(),
            references: Vec::new(),
            previous: Vec::new(),
            decl_contexts: Vec::new(),
            ctor_types: Vec::new(),
            constructs: Vec::new(),
            type_mentions: Vec::new(),
        }
    }

    fn import_root(&mut self, object: &Object) {
        let root = self.builder.root();
        self.locs.read(object.get("loc"));
        self.locs.range(object);
        self.register(object, root);

        let frame = Frame {
            parent: root,
            scope: root,
            detached: false,
        };
        for child in inner(object) {
            self.node(child, frame);
        }
    }

    fn node(&mut self, value: &Value, frame: Frame) {
        let Some(object) = value.as_object() else {
            return;
        };
        let class = str_attr(object, "kind").unwrap_or_default();

        match plan_for(class, object) {
            Plan::Skim => self.skim(object),
            Plan::CtorInitializer => {
                self.locs.read(object.get("loc"));
                self.locs.range(object);
                for child in inner(object) {
                    self.node(child, frame);
                }
            }
            Plan::Template {
                kind,
                merge_pattern,
            } => self.template(object, kind, merge_pattern, frame),
            Plan::Decl(kind) => self.declaration(object, class, kind, frame),
            Plan::Expr(kind) | Plan::Stmt(kind) => self.statement(object, class, kind, frame),
        }
    }

    /// Consume the locations of a subtree without building anything.
    fn skim(&mut self, object: &Object) {
        self.locs.read(object.get("loc"));
        self.locs.range(object);
        self.skim_inner(object);
    }

    fn skim_inner(&mut self, object: &Object) {
        for child in inner(object) {
            if let Some(child) = child.as_object() {
                self.skim(child);
            }
        }
    }

    fn declaration(&mut self, object: &Object, class: &str, kind: CursorKind, frame: Frame) {
        if is_bare_reference(object) {
            return;
        }
        let loc = self.locs.read(object.get("loc"));
        let (begin, end) = self.locs.range(object);

        let lambda_class =
            class == "CXXRecordDecl" && self.builder.kind_of(frame.parent) == CursorKind::LambdaExpr;
        let detached = frame.detached || flag(object, "isImplicit") || lambda_class;

        let name = str_attr(object, "name").unwrap_or_default();
        let id = self.create(frame, detached, kind, name);
        self.register(object, id);
        self.place(id, loc.as_ref(), end.as_ref());
        self.record_links(object, id);
        let defining = is_defining(kind, object)
            || (kind == CursorKind::EnumDecl && self.closes_body(end.as_ref()));
        if defining {
            self.builder.defining(id);
        }
        if !detached {
            self.note_type_mention(object, kind, id, [begin.as_ref(), loc.as_ref(), end.as_ref()]);
        }
        if kind == CursorKind::Constructor {
            if let Some(ty) = object
                .get("type")
                .and_then(Value::as_object)
                .and_then(|ty| str_attr(ty, "qualType"))
            {
                self.ctor_types.push((id, ty.to_string()));
            }
        }

        let child_frame = Frame {
            parent: id,
            scope: if opens_scope(kind) { id } else { frame.scope },
            detached,
        };
        for child in inner(object) {
            self.node(child, child_frame);
        }
    }

    fn template(&mut self, object: &Object, kind: CursorKind, merge_pattern: bool, frame: Frame) {
        if is_bare_reference(object) {
            return;
        }
        let loc = self.locs.read(object.get("loc"));
        let (_, end) = self.locs.range(object);

        let detached = frame.detached || flag(object, "isImplicit");
        let name = str_attr(object, "name").unwrap_or_default();
        let id = self.create(frame, detached, kind, name);
        self.register(object, id);
        self.place(id, loc.as_ref(), end.as_ref());
        self.record_links(object, id);

        let child_frame = Frame {
            parent: id,
            scope: if merge_pattern { id } else { frame.scope },
            detached,
        };
        // Instantiations and explicit specializations listed after the pattern.
        let specialization_frame = Frame {
            detached: true,
            ..frame
        };

        let mut pattern_seen = false;
        for child in inner(object) {
            let Some(child_object) = child.as_object() else {
                continue;
            };
            let class = str_attr(child_object, "kind").unwrap_or_default();
            if !pattern_seen && is_template_pattern(kind, class) {
                pattern_seen = true;
                if merge_pattern {
                    self.merge_pattern(child_object, id, child_frame);
                } else {
                    self.node(child, child_frame);
                }
            } else if pattern_seen {
                self.node(child, specialization_frame);
            } else {
                self.node(child, child_frame);
            }
        }
    }

    /// Fold a template's pattern declaration into the template node itself.
    fn merge_pattern(&mut self, object: &Object, template: NodeId, frame: Frame) {
        if is_bare_reference(object) {
            return;
        }
        self.locs.read(object.get("loc"));
        let (_, end) = self.locs.range(object);

        self.register(object, template);
        if let Some(end) = end {
            self.builder.extent_end(template, end.spelling.line);
        }
        self.record_links(object, template);
        if is_defining(self.builder.kind_of(template), object) {
            self.builder.defining(template);
        }

        for child in inner(object) {
            self.node(child, frame);
        }
    }

    fn statement(&mut self, object: &Object, class: &str, kind: CursorKind, frame: Frame) {
        let (begin, end) = self.locs.range(object);

        let in_system_file = begin
            .as_ref()
            .is_some_and(|begin| self.is_system_file(&begin.expansion.file));
        if frame.detached || in_system_file {
            self.skim_inner(object);
            return;
        }

        let spelling = match kind {
            CursorKind::DeclRefExpr => object
                .get("referencedDecl")
                .and_then(Value::as_object)
                .and_then(|decl| str_attr(decl, "name"))
                .unwrap_or_default(),
            CursorKind::MemberRefExpr => str_attr(object, "name").unwrap_or_default(),
            _ => "",
        };
        let id = self.create(frame, false, kind, spelling);
        self.register(object, id);

        // libclang reports member accesses and qualified names at the name.
        let position = match kind {
            CursorKind::MemberRefExpr => end.clone(),
            CursorKind::DeclRefExpr => self.name_position(spelling, begin.as_ref(), end.as_ref()),
            _ => begin.clone(),
        };
        self.place(id, position.as_ref(), end.as_ref());

        match class {
            "DeclRefExpr" => {
                if let Some(target) = object
                    .get("referencedDecl")
                    .and_then(Value::as_object)
                    .and_then(|decl| str_attr(decl, "id"))
                {
                    self.references.push((id, target.to_string()));
                }
            }
            "MemberExpr" => {
                if let Some(target) = str_attr(object, "referencedMemberDecl") {
                    self.references.push((id, target.to_string()));
                }
            }
            "UnresolvedLookupExpr" | "UnresolvedMemberExpr" => {
                if let Some(target) = object
                    .get("lookups")
                    .and_then(Value::as_array)
                    .and_then(|lookups| lookups.first())
                    .and_then(Value::as_object)
                    .and_then(|decl| str_attr(decl, "id"))
                {
                    self.references.push((id, target.to_string()));
                }
            }
            "CXXConstructExpr" | "CXXTemporaryObjectExpr" => {
                if let Some(ctor_type) = object
                    .get("ctorType")
                    .and_then(Value::as_object)
                    .and_then(|ty| str_attr(ty, "qualType"))
                {
                    self.constructs.push(ConstructCall {
                        node: id,
                        records: constructed_record_names(object),
                        ctor_type: ctor_type.to_string(),
                    });
                }
            }
            _ => {}
        }

        if matches!(
            kind,
            CursorKind::BinaryOperator | CursorKind::CompoundAssignOperator | CursorKind::UnaryOperator
        ) {
            let tokens = self.operator_tokens(object, begin.as_ref(), end.as_ref());
            self.builder.tokens(id, tokens);
        }

        let child_frame = Frame {
            parent: id,
            scope: if kind == CursorKind::LambdaExpr { id } else { frame.scope },
            detached: false,
        };
        for child in inner(object) {
            self.node(child, child_frame);
        }
    }

    fn create(&mut self, frame: Frame, detached: bool, kind: CursorKind, spelling: &str) -> NodeId {
        let id = if detached {
            self.builder.add_detached(Some(frame.scope), kind, spelling)
        } else {
            self.builder.add(frame.parent, kind, spelling)
        };
        self.builder.semantic_parent(id, Some(frame.scope));
        id
    }

    fn register(&mut self, object: &Object, node: NodeId) {
        if let Some(id) = str_attr(object, "id") {
            self.ids.insert(id.to_string(), node);
        }
    }

    fn record_links(&mut self, object: &Object, node: NodeId) {
        if let Some(previous) = str_attr(object, "previousDecl") {
            self.previous.push((node, previous.to_string()));
        }
        if let Some(context) = str_attr(object, "parentDeclContextId") {
            self.decl_contexts.push((node, context.to_string()));
        }
    }

    fn place(&mut self, node: NodeId, at: Option<&SourceLoc>, end: Option<&SourceLoc>) {
        if let Some(at) = at {
            let file = self.file_index(&at.expansion.file);
            self.builder
                .at_in(node, file, at.spelling.line, at.spelling.col);
        }
        if let Some(end) = end {
            self.builder.extent_end(node, end.spelling.line);
        }
    }

    fn is_main_file(&self, path: &str) -> bool {
        normalise_path(path) == self.main_file
    }

    fn is_system_file(&self, path: &str) -> bool {
        !self.is_main_file(path) && self.headers.is_system(path)
    }

    fn file_index(&mut self, path: &str) -> u32 {
        if self.is_main_file(path) {
            return self.builder.main_file();
        }
        if let Some(existing) = self.builder.file_id(path) {
            return existing;
        }
        let is_system = self.headers.is_system(path);
        self.builder.add_file(path, is_system)
    }

    /// Last token spelled `name` in a reference's range, else the range end.
    ///
    /// `ns::value` and `make<int>` begin at the qualifier or end at `>`.
    fn name_position(
        &mut self,
        name: &str,
        begin: Option<&SourceLoc>,
        end: Option<&SourceLoc>,
    ) -> Option<SourceLoc> {
        let end = end?;
        let found = match (begin, name.is_empty()) {
            (Some(begin), false) if begin.spelling.file == end.spelling.file => {
                match (begin.spelling.offset, end.spelling.offset) {
                    (Some(start), Some(last)) if start < last => self
                        .tokens
                        .spans(&begin.spelling.file, start, last + end.spelling.tok_len)
                        .into_iter()
                        .rfind(|token| token.text == name),
                    _ => None,
                }
            }
            _ => None,
        };

        let mut position = end.clone();
        if let Some(token) = found {
            position.spelling.line = token.line;
            position.spelling.col = token.col;
            position.spelling.offset = Some(token.offset);
            position.spelling.tok_len = token.text.len();
        }
        Some(position)
    }

    /// Whether the token at `end` is the `}` closing a body.
    fn closes_body(&mut self, end: Option<&SourceLoc>) -> bool {
        let Some(end) = end else {
            return false;
        };
        let Some(offset) = end.spelling.offset else {
            return false;
        };
        self.tokens
            .tokens(&end.spelling.file, offset, offset + end.spelling.tok_len.max(1))
            == ["}"]
    }

    /// Remember where a declaration spells its type, for [`Self::resolve_type_mentions`].
    fn note_type_mention(
        &mut self,
        object: &Object,
        kind: CursorKind,
        owner: NodeId,
        [begin, loc, end]: [Option<&SourceLoc>; 3],
    ) {
        let declared = object
            .get("type")
            .and_then(Value::as_object)
            .and_then(|ty| str_attr(ty, "qualType"));
        let written = match kind {
            CursorKind::VarDecl
            | CursorKind::FieldDecl
            | CursorKind::ParmDecl
            | CursorKind::TypedefDecl
            | CursorKind::TypeAliasDecl => declared,
            // Only the return type; parameters carry their own.
            CursorKind::FunctionDecl | CursorKind::CXXMethod => {
                declared.and_then(|ty| ty.split_once('(')).map(|(ret, _)| ret)
            }
            _ => None,
        };
        let names = written.map(type_names).unwrap_or_default();
        if names.is_empty() {
            return;
        }

        let (Some(begin), Some(loc), Some(end)) = (begin, loc, end) else {
            return;
        };
        let file = &begin.spelling.file;
        // Macro-expanded declarations are not re-tokenized.
        if *file != begin.expansion.file
            || *file != loc.spelling.file
            || *file != end.spelling.file
            || self.is_system_file(file)
        {
            return;
        }
        let (Some(begin_offset), Some(name_offset), Some(end_offset)) =
            (begin.spelling.offset, loc.spelling.offset, end.spelling.offset)
        else {
            return;
        };

        let unnamed = str_attr(object, "name").unwrap_or_default().is_empty();
        let (start, stop) = match kind {
            // `using Alias = Type;` spells the type after the name.
            CursorKind::TypeAliasDecl => (
                name_offset + loc.spelling.tok_len,
                end_offset + end.spelling.tok_len,
            ),
            _ if unnamed => (begin_offset, end_offset + end.spelling.tok_len),
            _ => (begin_offset, name_offset),
        };
        if start >= stop {
            return;
        }

        self.type_mentions.push(TypeMention {
            owner,
            file: file.clone(),
            start,
            end: stop,
            names,
        });
    }

    /// Source tokens of an operator, or its opcode when the source is unavailable.
    fn operator_tokens(
        &mut self,
        object: &Object,
        begin: Option<&SourceLoc>,
        end: Option<&SourceLoc>,
    ) -> Vec<String> {
        let from_source = match (begin, end) {
            (Some(begin), Some(end)) if begin.spelling.file == end.spelling.file => {
                match (begin.spelling.offset, end.spelling.offset) {
                    (Some(start), Some(last)) => {
                        self.tokens
                            .tokens(&begin.spelling.file, start, last + end.spelling.tok_len)
                    }
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        };
        if !from_source.is_empty() {
            return from_source;
        }
        str_attr(object, "opcode")
            .map(|opcode| vec![opcode.to_string()])
            .unwrap_or_default()
    }

    fn resolve_links(&mut self) {
        self.resolve_decl_contexts();
        self.resolve_redeclarations();

        for (node, target) in std::mem::take(&mut self.references) {
            match self.ids.get(&target) {
                Some(&decl) => {
                    self.builder.references(node, decl);
                }
                None => trace!("reference {target} not present in dump"),
            }
        }

        self.resolve_constructors();
        self.resolve_type_mentions();
    }

    fn resolve_decl_contexts(&mut self) {
        for (node, context) in std::mem::take(&mut self.decl_contexts) {
            let Some(&scope) = self.ids.get(&context) else {
                continue;
            };
            if scope == node || self.is_semantic_ancestor(node, scope) {
                continue;
            }
            self.builder.semantic_parent(node, Some(scope));
        }
    }

    /// Whether `node` already appears on `scope`'s semantic chain.
    fn is_semantic_ancestor(&self, node: NodeId, scope: NodeId) -> bool {
        let tree = self.builder.view();
        let mut current = Some(scope);
        let mut steps = 0;
        while let Some(step) = current {
            if step == node || steps > tree.len() {
                return true;
            }
            steps += 1;
            current = tree.semantic_parent_of(step);
        }
        false
    }

    /// Link every redeclaration to the first declaration and to the definition.
    fn resolve_redeclarations(&mut self) {
        let previous: HashMap<NodeId, NodeId> = std::mem::take(&mut self.previous)
            .into_iter()
            .filter_map(|(node, target)| {
                let target = *self.ids.get(&target)?;
                (target != node).then_some((node, target))
            })
            .collect();

        let mut groups: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut members: HashSet<NodeId> = HashSet::new();
        for (&node, &first_previous) in &previous {
            let mut first = first_previous;
            let mut steps = 0;
            while let Some(&earlier) = previous.get(&first) {
                if steps > previous.len() || earlier == node {
                    break;
                }
                first = earlier;
                steps += 1;
            }
            let group = groups.entry(first).or_default();
            if members.insert(first) {
                group.push(first);
            }
            if members.insert(node) {
                group.push(node);
            }
        }

        for (first, group) in groups {
            let definition = group
                .iter()
                .copied()
                .find(|member| self.builder.view().is_definition(*member));
            for member in group {
                self.builder.canonical(member, first);
                if let Some(definition) = definition {
                    self.builder.definition(member, definition);
                }
            }
        }
    }

    /// Point construct expressions at the constructor with the matching signature.
    fn resolve_constructors(&mut self) {
        let constructs = std::mem::take(&mut self.constructs);
        if constructs.is_empty() {
            return;
        }

        let tree = self.builder.view();
        let mut by_signature: HashMap<(String, String), NodeId> = HashMap::new();
        for (ctor, ctor_type) in &self.ctor_types {
            let Some(record) = tree.semantic_parent_of(*ctor) else {
                continue;
            };
            by_signature
                .entry((qualified_name(tree, record), ctor_type.clone()))
                .or_insert(*ctor);
        }

        let resolved: Vec<(NodeId, NodeId)> = constructs
            .into_iter()
            .filter_map(|construct| {
                construct.records.iter().find_map(|record| {
                    by_signature
                        .get(&(record.clone(), construct.ctor_type.clone()))
                        .map(|ctor| (construct.node, *ctor))
                })
            })
            .collect();

        for (node, ctor) in resolved {
            self.builder.references(node, ctor);
        }
    }

    /// Add a `TypeRef` child for every resolvable name a declaration spells.
    fn resolve_type_mentions(&mut self) {
        let mentions = std::mem::take(&mut self.type_mentions);
        if mentions.is_empty() {
            return;
        }

        let tree = self.builder.view();
        let mut types: HashMap<String, NodeId> = HashMap::new();
        for node in tree.node_ids() {
            if is_type_declaration(tree.kind_of(node)) && tree.lexical_parent_of(node).is_some() {
                types.entry(qualified_name(tree, node)).or_insert(node);
            }
        }

        let mut placed: Vec<(NodeId, NodeId, String, Token)> = Vec::new();
        let mut seen: HashSet<(NodeId, usize)> = HashSet::new();
        for mention in &mentions {
            let spans = self.tokens.spans(&mention.file, mention.start, mention.end);
            for name in &mention.names {
                let Some(target) = resolve_type_name(&types, name) else {
                    continue;
                };
                let short = name.rsplit("::").next().unwrap_or(name);
                for token in spans.iter().filter(|token| token.text == short) {
                    if seen.insert((mention.owner, token.offset)) {
                        placed.push((mention.owner, target, mention.file.clone(), token.clone()));
                    }
                }
            }
        }

        let count = placed.len();
        for (owner, target, file, token) in placed {
            let file = self.file_index(&file);
            let spelling = self.builder.view().spelling_of(target).to_string();
            let id = self.builder.add(owner, CursorKind::TypeRef, &spelling);
            self.builder
                .at_in(id, file, token.line, token.col)
                .references(id, target);
        }
        trace!("{count} type references from {} declarations", mentions.len());
    }
}

/// Build a [`SyntaxTree`] from a parsed `-ast-dump=json` document.
///
/// `stderr` supplies the inclusion stack and diagnostics of the same run.
pub fn import_dump(
    dump: &Value,
    main_file: &str,
    headers: &SystemHeaders,
    stderr: &ClangStderr,
) -> ParseResult<SyntaxTree> {
    let root = dump
        .as_object()
        .filter(|object| str_attr(object, "kind") == Some("TranslationUnitDecl"))
        .ok_or_else(|| ParseError::InvalidDump {
            file: main_file.into(),
            reason: "top-level node is not a TranslationUnitDecl".to_string(),
        })?;

    let mut importer = Importer::new(main_file, headers);
    importer.import_root(root);
    importer.resolve_links();

    for inclusion in &stderr.inclusions {
        importer.builder.include(&inclusion.path, inclusion.depth);
    }
    for diagnostic in &stderr.diagnostics {
        importer
            .builder
            .diagnostic(diagnostic.severity, diagnostic.message.clone());
    }

    let tree = importer.builder.build();
    debug!(
        "imported {} nodes across {} files from {main_file}",
        tree.len(),
        tree.files().len()
    );
    Ok(tree)
}
