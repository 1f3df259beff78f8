//! Closed set of node kinds and the predicate groups the extractor dispatches on.
//!
//! Names follow libclang's cursor kinds so trees produced by different
//! frontends (clang JSON dumps, snapshots, hand-built fixtures) agree.

use serde::{Deserialize, Serialize};

use crate::types::SymbolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorKind {
    TranslationUnit,

    // Declarations
    Namespace,
    NamespaceAlias,
    LinkageSpec,
    UsingDirective,
    UsingDeclaration,
    ClassDecl,
    StructDecl,
    UnionDecl,
    EnumDecl,
    EnumConstantDecl,
    ClassTemplate,
    ClassTemplatePartialSpecialization,
    TypeAliasTemplateDecl,
    FunctionDecl,
    CXXMethod,
    Constructor,
    Destructor,
    ConversionFunction,
    FunctionTemplate,
    VarDecl,
    FieldDecl,
    ParmDecl,
    TypedefDecl,
    TypeAliasDecl,
    TemplateTypeParameter,
    NonTypeTemplateParameter,
    TemplateTemplateParameter,
    AccessSpecifier,
    FriendDecl,
    StaticAssert,
    UnexposedDecl,

    // References
    TypeRef,
    TemplateRef,
    NamespaceRef,
    MemberRef,
    OverloadedDeclRef,

    // Expressions
    CallExpr,
    DeclRefExpr,
    MemberRefExpr,
    UnexposedExpr,
    ParenExpr,
    BinaryOperator,
    CompoundAssignOperator,
    UnaryOperator,
    ConditionalOperator,
    ArraySubscriptExpr,
    CStyleCastExpr,
    CXXNamedCastExpr,
    LambdaExpr,
    InitListExpr,
    CXXThisExpr,
    CXXNewExpr,
    CXXDeleteExpr,
    IntegerLiteral,
    FloatingLiteral,
    StringLiteral,
    CharacterLiteral,
    CXXBoolLiteralExpr,
    CXXNullPtrLiteralExpr,

    // Statements
    CompoundStmt,
    DeclStmt,
    ReturnStmt,
    IfStmt,
    ForStmt,
    CXXForRangeStmt,
    WhileStmt,
    DoStmt,
    SwitchStmt,
    CaseStmt,
    DefaultStmt,
    BreakStmt,
    ContinueStmt,
    NullStmt,
    CXXTryStmt,
    CXXCatchStmt,
    UnexposedStmt,
}

impl CursorKind {
    /// Kinds that can produce a symbol definition fact.
    pub fn is_symbol_bearing(self) -> bool {
        matches!(
            self,
            Self::FunctionDecl
                | Self::CXXMethod
                | Self::Constructor
                | Self::Destructor
                | Self::FunctionTemplate
                | Self::ClassTemplate
                | Self::ClassDecl
                | Self::StructDecl
                | Self::UnionDecl
                | Self::EnumDecl
                | Self::EnumConstantDecl
                | Self::VarDecl
                | Self::FieldDecl
                | Self::TypedefDecl
                | Self::TypeAliasDecl
                | Self::Namespace
        )
    }

    /// Kinds that own a body and can therefore be the caller of a call edge.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            Self::FunctionDecl
                | Self::CXXMethod
                | Self::Constructor
                | Self::Destructor
                | Self::FunctionTemplate
                | Self::LambdaExpr
        )
    }

    /// Declarations a call expression can resolve to.
    pub fn is_callable_declaration(self) -> bool {
        matches!(
            self,
            Self::FunctionDecl
                | Self::CXXMethod
                | Self::Constructor
                | Self::Destructor
                | Self::FunctionTemplate
                | Self::ConversionFunction
        )
    }

    /// Children of a call expression that may carry the callee.
    pub fn is_call_target_expression(self) -> bool {
        matches!(
            self,
            Self::MemberRefExpr
                | Self::MemberRef
                | Self::DeclRefExpr
                | Self::OverloadedDeclRef
                | Self::UnexposedExpr
                | Self::CallExpr
                | Self::TypeRef
        )
    }

    /// Class, struct, union and enum declarations.
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            Self::ClassDecl | Self::StructDecl | Self::UnionDecl | Self::EnumDecl
        )
    }

    /// Name references that are classified as read/write/addr.
    pub fn is_name_reference(self) -> bool {
        matches!(self, Self::DeclRefExpr | Self::MemberRefExpr | Self::MemberRef)
    }

    /// Ancestors the access classifier looks through.
    pub fn is_transparent_wrapper(self) -> bool {
        matches!(
            self,
            Self::UnexposedExpr
                | Self::ParenExpr
                | Self::MemberRefExpr
                | Self::MemberRef
                | Self::DeclRefExpr
        )
    }

    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::TranslationUnit
                | Self::Namespace
                | Self::NamespaceAlias
                | Self::LinkageSpec
                | Self::UsingDirective
                | Self::UsingDeclaration
                | Self::ClassDecl
                | Self::StructDecl
                | Self::UnionDecl
                | Self::EnumDecl
                | Self::EnumConstantDecl
                | Self::ClassTemplate
                | Self::ClassTemplatePartialSpecialization
                | Self::TypeAliasTemplateDecl
                | Self::FunctionDecl
                | Self::CXXMethod
                | Self::Constructor
                | Self::Destructor
                | Self::ConversionFunction
                | Self::FunctionTemplate
                | Self::VarDecl
                | Self::FieldDecl
                | Self::ParmDecl
                | Self::TypedefDecl
                | Self::TypeAliasDecl
                | Self::TemplateTypeParameter
                | Self::NonTypeTemplateParameter
                | Self::TemplateTemplateParameter
                | Self::AccessSpecifier
                | Self::FriendDecl
                | Self::StaticAssert
                | Self::UnexposedDecl
        )
    }

    /// Nodes that become the semantic parent of whatever is nested inside them.
    pub fn is_semantic_scope(self) -> bool {
        self.is_declaration() || self == Self::LambdaExpr
    }

    /// Report category for a symbol-bearing kind; anything else is `Unknown`.
    pub fn symbol_kind(self) -> SymbolKind {
        match self {
            Self::FunctionDecl => SymbolKind::Function,
            Self::CXXMethod => SymbolKind::Method,
            Self::Constructor => SymbolKind::Constructor,
            Self::Destructor => SymbolKind::Destructor,
            Self::FunctionTemplate => SymbolKind::FunctionTemplate,
            Self::ClassTemplate => SymbolKind::ClassTemplate,
            Self::ClassDecl => SymbolKind::Class,
            Self::StructDecl | Self::UnionDecl => SymbolKind::Struct,
            Self::EnumDecl => SymbolKind::Enum,
            Self::EnumConstantDecl => SymbolKind::EnumConstant,
            Self::VarDecl => SymbolKind::Variable,
            Self::FieldDecl => SymbolKind::Field,
            Self::TypedefDecl => SymbolKind::Typedef,
            Self::TypeAliasDecl => SymbolKind::TypeAlias,
            Self::Namespace => SymbolKind::Namespace,
            _ => SymbolKind::Unknown,
        }
    }
}
