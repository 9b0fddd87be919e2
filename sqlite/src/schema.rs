//! Catalog introspection.
//!
//! Lists user tables from `sqlite_master` and reads per-table column
//! metadata with `PRAGMA table_xinfo`. Table names come from the database
//! itself, so they are quoted rather than validated before being spliced
//! into SQL.

use rusqlite::Connection;
use table_snapshot_core::{ColumnInfo, safe_value};

use crate::convert::value_from_sql;
use crate::error::{Result, SnapshotError};

/// `hidden` value `PRAGMA table_xinfo` reports for hidden columns of virtual
/// tables. `SELECT *` never returns these.
const HIDDEN_VIRTUAL_TABLE_COLUMN: i64 = 1;

/// Quotes an identifier for SQLite, doubling embedded double quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Names of every catalog entry classified as a table, in catalog order.
///
/// Indexes, views, and triggers are excluded. Internal tables such as
/// `sqlite_sequence` are included since the catalog lists them as tables.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Reads column metadata for `table`.
///
/// Generated columns (virtual or stored) are included, since `SELECT *`
/// returns them; hidden columns of virtual tables are not.
///
/// # Errors
///
/// Returns [`SnapshotError::Schema`] if the pragma fails or reports no
/// columns, which is what SQLite does for a table that no longer exists.
pub fn table_info(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let schema_err = |reason: String| SnapshotError::Schema {
        table: table.to_string(),
        reason,
    };

    let sql = format!("PRAGMA table_xinfo({})", quote_identifier(table));
    let mut stmt = conn.prepare(&sql).map_err(|e| schema_err(e.to_string()))?;
    let columns: Vec<ColumnInfo> = stmt
        .query_map([], |row| {
            let column = ColumnInfo {
                cid: row.get(0)?,
                name: row.get(1)?,
                decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                notnull: row.get(3)?,
                default: safe_value(value_from_sql(row.get_ref(4)?)),
                pk: row.get(5)?,
            };
            let hidden: i64 = row.get(6)?;
            Ok((column, hidden))
        })
        .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
        .map_err(|e| schema_err(e.to_string()))?
        .into_iter()
        .filter(|(_, hidden)| *hidden != HIDDEN_VIRTUAL_TABLE_COLUMN)
        .map(|(column, _)| column)
        .collect();

    if columns.is_empty() {
        return Err(schema_err("table not found or has no columns".to_string()));
    }
    Ok(columns)
}
