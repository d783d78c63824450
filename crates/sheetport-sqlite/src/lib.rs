//! # sheetport-sqlite
//!
//! SQLite table reader/writer for sheetport.
//!
//! This crate is the relational side of the conversion: it supplies column
//! names and typed rows for export, and creates/populates tables from
//! decoded sheets on import. All store-specific syntax (identifier quoting,
//! CREATE/INSERT statements) lives here and nowhere else.

mod error;
mod ident;
mod read;
mod write;

pub use error::{StoreError, StoreResult};
pub use ident::quote_ident;
pub use read::{fetch_table, list_tables};
pub use write::create_table;

// Callers manage their own connections; re-exported so they don't need a
// direct rusqlite dependency for the common paths.
pub use rusqlite::Connection;

use std::path::Path;

/// Open (or create) a database file
pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Connection> {
    Ok(Connection::open(path)?)
}
