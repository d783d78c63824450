//! # sheetport-xlsx
//!
//! XLSX (Office Open XML) encoder and decoder for sheetport.
//!
//! Only the structural slice of the format needed to round-trip tabular
//! data is modeled: a single bold header style, shared and inline strings,
//! numeric cells, autofilter ranges and sparse rows. Formulas, merged
//! cells, comments and the wider style system are out of scope.

pub mod error;
pub mod escape;
pub mod reader;
pub mod shared_strings;
pub mod sheet_name;
pub mod writer;

// Re-exports for convenience
pub use error::{XlsxError, XlsxResult};
pub use escape::escape_xml;
pub use reader::{ImportedWorkbook, SheetEntry, SheetSelection, SkippedSheet, XlsxReader};
pub use shared_strings::SharedStrings;
pub use sheet_name::SheetNamer;
pub use writer::{ExportReport, TruncationSite, XlsxWriter};
