//! Writing results as JSON to stdout or a file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Serialize `value` followed by a newline.
pub fn write_json<T, W>(writer: &mut W, value: &T, pretty: bool) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    } else {
        serde_json::to_writer(&mut *writer, value)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write to `path`, or to stdout when no path is given.
pub fn emit_json<T>(value: &T, output: Option<&Path>, pretty: bool) -> Result<()>
where
    T: Serialize + ?Sized,
{
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_json(&mut BufWriter::new(file), value, pretty)
                .with_context(|| format!("Failed to write {}", path.display()))
        }
        None => write_json(&mut io::stdout().lock(), value, pretty),
    }
}
