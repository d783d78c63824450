//! Commonly used types, importable with a single `use sheetport::prelude::*`

pub use crate::{
    export_tables, import_workbook, version, Error, ExportReport, ImportSummary, Result,
    SheetEntry, SheetSelection, Table, TruncationSite, Value, XlsxReader, XlsxWriter,
    MAX_CELL_TEXT_LEN,
};
