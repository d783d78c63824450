//! Reading tables out of a database

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use sheetport_core::{Table, Value};

use crate::error::{StoreError, StoreResult};
use crate::ident::quote_ident;

/// List user tables, excluding SQLite internals, in name order
pub fn list_tables(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Fetch a whole table: column names from the statement, one typed row per
/// stored row
pub fn fetch_table(conn: &Connection, name: &str) -> StoreResult<Table> {
    if !table_exists(conn, name)? {
        return Err(StoreError::TableNotFound(name.to_string()));
    }

    let sql = format!("SELECT * FROM {}", quote_ident(name));
    let mut stmt = conn.prepare(&sql)?;

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = columns.len();

    let mut table = Table::new(name, columns);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(from_sql_value(row.get_ref(i)?));
        }
        table.push_row(values);
    }

    Ok(table)
}

fn table_exists(conn: &Connection, name: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
    )?;
    Ok(stmt.exists([name])?)
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE people (id, name, score);
             INSERT INTO people VALUES (1, 'ada', 9.5);
             INSERT INTO people VALUES (2, NULL, 7.25);
             CREATE TABLE empty (only_col);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_list_tables() {
        let conn = test_db();
        assert_eq!(list_tables(&conn).unwrap(), vec!["empty", "people"]);
    }

    #[test]
    fn test_fetch_table() {
        let conn = test_db();
        let table = fetch_table(&conn, "people").unwrap();

        assert_eq!(table.name(), "people");
        assert_eq!(table.columns(), ["id", "name", "score"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value_at(0, 0), &Value::Int(1));
        assert_eq!(table.value_at(0, 1), &Value::text("ada"));
        assert_eq!(table.value_at(0, 2), &Value::Float(9.5));
        assert_eq!(table.value_at(1, 1), &Value::Null);
    }

    #[test]
    fn test_fetch_missing_table() {
        let conn = test_db();
        assert!(matches!(
            fetch_table(&conn, "nope"),
            Err(StoreError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_fetch_blob() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE bin (data);
             INSERT INTO bin VALUES (x'DEADBEEF');",
        )
        .unwrap();

        let table = fetch_table(&conn, "bin").unwrap();
        assert_eq!(table.value_at(0, 0), &Value::Blob(vec![0xDE, 0xAD, 0xBE, 0xEF]));
    }
}
