//! Export command writing every entity to one CSV file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use att_core::{ExportDocument, Store, Tracker};

/// Quotes a field when it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes the document as RFC 4180 CSV with CRLF line endings.
pub fn write_csv<W: Write>(writer: &mut W, document: &ExportDocument) -> io::Result<()> {
    for row in document.rows() {
        let line: Vec<String> = row.iter().map(|field| escape(field)).collect();
        write!(writer, "{}\r\n", line.join(","))?;
    }
    Ok(())
}

pub fn run<W: Write, S: Store>(writer: &mut W, tracker: &Tracker<S>, path: &Path) -> Result<()> {
    let document = tracker.export()?;
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_csv(&mut out, &document)
        .and_then(|()| out.flush())
        .with_context(|| format!("failed to write {}", path.display()))?;

    let rows: usize = document.sections.iter().map(|s| s.rows.len()).sum();
    tracing::info!(path = %path.display(), rows, "export written");
    writeln!(writer, "Exported {rows} rows to {}", path.display())?;
    Ok(())
}
