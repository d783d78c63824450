//! Creating and populating tables from decoded sheets

use log::debug;
use rusqlite::Connection;

use sheetport_core::{Table, Value};

use crate::error::{StoreError, StoreResult};
use crate::ident::quote_ident;

/// Create (if needed) and populate a table.
///
/// Columns are left untyped: SQLite's dynamic typing keeps whatever
/// affinity each imported cell carries, so a column can legitimately mix
/// integers and text the way a decoded sheet can. All rows go in a single
/// transaction. Ragged rows bind null for their missing trailing cells.
pub fn create_table(conn: &mut Connection, table: &Table) -> StoreResult<()> {
    if table.column_count() == 0 {
        return Err(StoreError::NoColumns(table.name().to_string()));
    }

    let column_list = table
        .columns()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let create_sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table.name()),
        column_list
    );

    let placeholders = vec!["?"; table.column_count()].join(", ");
    let insert_sql = format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(table.name()),
        placeholders
    );

    let tx = conn.transaction()?;
    tx.execute(&create_sql, [])?;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for r in 0..table.row_count() {
            let params =
                (0..table.column_count()).map(|c| to_sql_value(table.value_at(r, c)));
            stmt.execute(rusqlite::params_from_iter(params))?;
        }
    }
    tx.commit()?;

    debug!(
        "created table {} with {} row(s)",
        quote_ident(table.name()),
        table.row_count()
    );
    Ok(())
}

fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Int(i) => rusqlite::types::Value::Integer(*i),
        Value::Float(f) => rusqlite::types::Value::Real(*f),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}
