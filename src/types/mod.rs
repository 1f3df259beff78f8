//! Wire-level enums shared by the extractor, the CLI and downstream consumers.
//!
//! The serialized spellings are part of the output contract: indexers read
//! `"kind": "CXXMethod"` or `"kind": "write"` straight out of the JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical category of a reported symbol definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    #[serde(rename = "CXXMethod")]
    Method,
    Constructor,
    Destructor,
    FunctionTemplate,
    ClassTemplate,
    #[serde(rename = "ClassDecl")]
    Class,
    /// Structs and unions share one category.
    #[serde(rename = "StructDecl")]
    Struct,
    #[serde(rename = "EnumDecl")]
    Enum,
    EnumConstant,
    #[serde(rename = "VarDecl")]
    Variable,
    #[serde(rename = "FieldDecl")]
    Field,
    Typedef,
    TypeAlias,
    Namespace,
    Unknown,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Method => "CXXMethod",
            Self::Constructor => "Constructor",
            Self::Destructor => "Destructor",
            Self::FunctionTemplate => "FunctionTemplate",
            Self::ClassTemplate => "ClassTemplate",
            Self::Class => "ClassDecl",
            Self::Struct => "StructDecl",
            Self::Enum => "EnumDecl",
            Self::EnumConstant => "EnumConstant",
            Self::Variable => "VarDecl",
            Self::Field => "FieldDecl",
            Self::Typedef => "Typedef",
            Self::TypeAlias => "TypeAlias",
            Self::Namespace => "Namespace",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a use-site touches the symbol it names.
///
/// Variants are declared in the order of their wire spelling, so the derived
/// `Ord` sorts `call` before `read` before `type_ref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Addr,
    Call,
    Read,
    TypeRef,
    Write,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Addr => "addr",
            Self::Call => "call",
            Self::Read => "read",
            Self::TypeRef => "type_ref",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which fact families an extraction run collects.
///
/// Include dependencies are gathered for every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Symbols, references, call edges and include dependencies
    #[default]
    ExtractAll,
    /// Symbol definitions only
    ExtractSymbols,
    /// References and call edges only
    ExtractRefs,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractAll => "extract-all",
            Self::ExtractSymbols => "extract-symbols",
            Self::ExtractRefs => "extract-refs",
        }
    }

    pub fn collects_symbols(&self) -> bool {
        matches!(self, Self::ExtractAll | Self::ExtractSymbols)
    }

    pub fn collects_references(&self) -> bool {
        matches!(self, Self::ExtractAll | Self::ExtractRefs)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract-all" => Ok(Self::ExtractAll),
            "extract-symbols" => Ok(Self::ExtractSymbols),
            "extract-refs" => Ok(Self::ExtractRefs),
            other => Err(format!(
                "unknown action '{other}' (expected extract-all, extract-symbols or extract-refs)"
            )),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace backslashes with forward slashes so paths compare equal across platforms.
pub fn normalise_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_kind_wire_names() {
        let json = serde_json::to_string(&SymbolKind::Method).unwrap();
        assert_eq!(json, "\"CXXMethod\"");
        let json = serde_json::to_string(&SymbolKind::Struct).unwrap();
        assert_eq!(json, "\"StructDecl\"");
        assert_eq!(SymbolKind::Variable.to_string(), "VarDecl");
    }

    #[test]
    fn test_ref_kind_order_follows_spelling() {
        let mut kinds = vec![
            RefKind::Write,
            RefKind::TypeRef,
            RefKind::Read,
            RefKind::Call,
            RefKind::Addr,
        ];
        kinds.sort();
        let spelled: Vec<&str> = kinds.iter().map(RefKind::as_str).collect();
        let mut expected = spelled.clone();
        expected.sort();
        assert_eq!(spelled, expected);
        assert!(RefKind::Call < RefKind::Read);
        assert!(RefKind::Read < RefKind::TypeRef);
    }

    #[test]
    fn test_ref_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RefKind::TypeRef).unwrap(),
            "\"type_ref\""
        );
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("extract-all".parse::<Action>(), Ok(Action::ExtractAll));
        assert_eq!("extract-refs".parse::<Action>(), Ok(Action::ExtractRefs));
        assert!("extract-everything".parse::<Action>().is_err());

        assert!(Action::ExtractSymbols.collects_symbols());
        assert!(!Action::ExtractSymbols.collects_references());
        assert!(Action::ExtractRefs.collects_references());
        assert!(!Action::ExtractRefs.collects_symbols());
    }

    #[test]
    fn test_normalise_path() {
        assert_eq!(normalise_path(r"C:\src\demo\main.cpp"), "C:/src/demo/main.cpp");
        assert_eq!(normalise_path("/already/fine.h"), "/already/fine.h");
    }
}
