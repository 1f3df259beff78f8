//! Saved syntax trees
//!
//! A snapshot is the JSON form of a [`SyntaxTree`]. `cppfacts dump` writes one
//! so a translation unit can be re-extracted later without a compiler.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::error::{ParseError, ParseResult};
use crate::ast::SyntaxTree;

/// Load and validate a snapshot.
pub fn read_snapshot(path: &Path) -> ParseResult<SyntaxTree> {
    let file = File::open(path)?;
    let tree: SyntaxTree =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| ParseError::Snapshot {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    tree.validate().map_err(|reason| ParseError::Snapshot {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(tree)
}

pub fn write_snapshot(tree: &SyntaxTree, path: &Path, pretty: bool) -> ParseResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let written = if pretty {
        serde_json::to_writer_pretty(&mut writer, tree)
    } else {
        serde_json::to_writer(&mut writer, tree)
    };
    written.map_err(|e| ParseError::Snapshot {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    writer.flush()?;
    Ok(())
}
