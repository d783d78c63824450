//! # sheetport
//!
//! Convert SQLite tables to and from XLSX workbooks.
//!
//! Each exported table becomes one worksheet with a bold, autofiltered
//! header row; each imported sheet becomes one table whose column names
//! come from the sheet's first row. Sheets are processed independently on
//! import, so one malformed sheet never takes the rest of the workbook
//! down with it.
//!
//! ## Example
//!
//! ```no_run
//! use sheetport::{export_tables, import_workbook, SheetSelection};
//!
//! // Every table in the database, one sheet per table
//! let report = export_tables("data.db", "out.xlsx", &[])?;
//! println!("wrote {} sheet(s)", report.sheets_written);
//!
//! // Back again, into a fresh database
//! let summary = import_workbook("copy.db", "out.xlsx", &SheetSelection::All)?;
//! println!("created {} table(s)", summary.tables_created);
//! # Ok::<(), sheetport::Error>(())
//! ```

mod export;
mod import;
pub mod prelude;

pub use export::export_tables;
pub use import::{import_workbook, ImportSummary};

// Re-export the types that appear in this crate's API
pub use sheetport_core::{Table, Value, MAX_CELL_TEXT_LEN, MAX_SHEET_NAME_LEN};
pub use sheetport_sqlite::StoreError;
pub use sheetport_xlsx::{
    ExportReport, SheetEntry, SheetSelection, TruncationSite, XlsxError, XlsxReader, XlsxWriter,
};

use thiserror::Error;

/// Result type for conversion entry points
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the conversion entry points
#[derive(Debug, Error)]
pub enum Error {
    /// Codec-side failure
    #[error(transparent)]
    Xlsx(#[from] sheetport_xlsx::XlsxError),

    /// Store-side failure
    #[error(transparent)]
    Store(#[from] sheetport_sqlite::StoreError),
}

/// Version string for hosts embedding these entry points
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
