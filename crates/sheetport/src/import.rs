//! Workbook import: XLSX sheets into SQLite tables

use std::path::Path;

use log::warn;

use sheetport_sqlite::{create_table, open};
use sheetport_xlsx::{SheetSelection, XlsxReader};

use crate::Result;

/// Outcome of [`import_workbook`].
///
/// Sheets import independently, so a malformed sheet shows up in `skipped`
/// instead of failing the call.
#[derive(Debug, Default, Clone)]
pub struct ImportSummary {
    /// Tables created (one per successfully imported sheet)
    pub tables_created: usize,
    /// Total data rows inserted
    pub rows_inserted: u64,
    /// (sheet name, failure description) for sheets that did not import
    pub skipped: Vec<(String, String)>,
}

/// Import sheets from an XLSX workbook into a SQLite database.
///
/// One table per selected sheet; the sheet's first row supplies the column
/// names. The database file is created if it does not exist.
pub fn import_workbook<P: AsRef<Path>, Q: AsRef<Path>>(
    db: P,
    input: Q,
    selection: &SheetSelection,
) -> Result<ImportSummary> {
    let mut conn = open(db)?;
    let workbook = XlsxReader::read_file_selected(input, selection)?;

    let mut summary = ImportSummary::default();
    for sheet in workbook.skipped {
        summary.skipped.push((sheet.name, sheet.error.to_string()));
    }

    for table in &workbook.tables {
        match create_table(&mut conn, table) {
            Ok(()) => {
                summary.tables_created += 1;
                summary.rows_inserted += table.row_count() as u64;
            }
            Err(e) => {
                warn!("failed to import sheet '{}': {}", table.name(), e);
                summary.skipped.push((table.name().to_string(), e.to_string()));
            }
        }
    }

    Ok(summary)
}
