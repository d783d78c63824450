//! # sheetport-core
//!
//! Core data structures for the sheetport conversion tools.
//!
//! This crate provides the types shared by the XLSX codec and the SQLite
//! store layer:
//! - [`Value`] - A typed relational value (null, integer, float, text, blob)
//! - [`Table`] - A named table: ordered column names plus rows of values
//! - [`CellRef`] - A spreadsheet cell reference ("C67") with column-letter
//!   arithmetic
//!
//! ## Example
//!
//! ```rust
//! use sheetport_core::{Table, Value};
//!
//! let mut table = Table::new("people", vec!["id".into(), "name".into()]);
//! table.push_row(vec![Value::Int(1), Value::text("ada")]);
//! table.push_row(vec![Value::Int(2)]); // short row: trailing cells are null
//!
//! assert_eq!(table.value_at(1, 1), &Value::Null);
//! ```

pub mod cell;
pub mod error;
pub mod table;
pub mod value;

// Re-exports for convenience
pub use cell::{column_to_letters, letters_to_column, CellRef};
pub use error::{Error, Result};
pub use table::Table;
pub use value::Value;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Maximum number of characters in one cell's text (Excel limit)
pub const MAX_CELL_TEXT_LEN: usize = 32_767;
