//! Turning a C++ file into a [`SyntaxTree`](crate::ast::SyntaxTree)
//!
//! [`ClangFrontend`] runs the compiler and imports its JSON AST dump;
//! [`read_snapshot`] loads a tree saved earlier by `cppfacts dump`.

pub mod args;
pub mod clang;
pub mod dump;
pub mod error;
pub mod snapshot;
pub mod stderr;
pub mod tokens;

pub use args::{SystemHeaders, sanitise_compile_args};
pub use clang::ClangFrontend;
pub use dump::import_dump;
pub use error::{ParseError, ParseResult};
pub use snapshot::{read_snapshot, write_snapshot};
pub use stderr::ClangStderr;
