//! Table export: SQLite tables into one XLSX workbook

use std::path::Path;

use sheetport_sqlite::{fetch_table, list_tables, open};
use sheetport_xlsx::{ExportReport, XlsxWriter};

use crate::Result;

/// Export tables from a SQLite database into one XLSX workbook.
///
/// An empty `tables` slice exports every user table. Sheet names are the
/// sanitized table names; colliding names get " (n)" suffixes in table
/// order. Oversized cell text is clipped, never rejected - the report says
/// how often and where first.
pub fn export_tables<P: AsRef<Path>, Q: AsRef<Path>>(
    db: P,
    output: Q,
    tables: &[String],
) -> Result<ExportReport> {
    let conn = open(db)?;

    let names: Vec<String> = if tables.is_empty() {
        list_tables(&conn)?
    } else {
        tables.to_vec()
    };

    let mut fetched = Vec::with_capacity(names.len());
    for name in &names {
        fetched.push(fetch_table(&conn, name)?);
    }

    Ok(XlsxWriter::write_file(&fetched, output)?)
}
