//! Capturing a whole database into a [`Snapshot`].
//!
//! [`Snapshotter`] owns a read-only connection for the duration of the scan.
//! The connection is released when the snapshotter is dropped, on success
//! and on every error path alike.
//!
//! # Example
//!
//! ```no_run
//! use table_snapshot_sqlite::{Snapshotter, write_snapshot};
//!
//! let mut snapshotter = Snapshotter::open("app.db").unwrap();
//! let snapshot = snapshotter.capture(Some(100)).unwrap();
//! drop(snapshotter);
//!
//! write_snapshot(&snapshot, "app_snapshot.json").unwrap();
//! println!("{} tables, {} rows", snapshot.len(), snapshot.row_count());
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rusqlite::{Connection, OpenFlags, TransactionBehavior, params};
use table_snapshot_core::{Snapshot, SnapshotConfig, TableSnapshot};
use tracing::{debug, info};

use crate::convert::row_record;
use crate::error::{Result, SnapshotError};
use crate::schema::{list_tables, quote_identifier, table_info};

/// Reads every table of a SQLite database into a [`Snapshot`].
pub struct Snapshotter {
    conn: Connection,
}

impl Snapshotter {
    /// Opens `path` read-only.
    ///
    /// The file is never created. Its header is read right away so that a
    /// file that is not a SQLite database fails here rather than mid-scan.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Connection`] if the file does not exist, is
    /// not readable, or is not a SQLite database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection_err = |source: rusqlite::Error| SnapshotError::Connection {
            path: path.to_path_buf(),
            source,
        };

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(connection_err)?;
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(connection_err)?;

        debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    /// Wraps an existing connection, e.g. an in-memory database.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Captures schema and rows of every table.
    ///
    /// Tables appear in catalog order. With `row_limit = Some(n)` at most the
    /// first `n` rows of each table (storage order) are captured; `Some(0)`
    /// captures schemas only and `None` captures everything.
    ///
    /// The scan runs inside a single read transaction, so every table is
    /// observed at the same point in time.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Schema`] if a table vanishes or cannot be
    /// read, or [`SnapshotError::Database`] if the catalog query fails.
    pub fn capture(&mut self, row_limit: Option<u64>) -> Result<Snapshot> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)?;

        let tables = list_tables(&tx)?;
        debug!(count = tables.len(), "enumerated tables");

        let mut snapshot = Snapshot::new();
        for name in tables {
            let table = capture_table(&tx, &name, row_limit)?;
            debug!(
                table = %name,
                columns = table.schema.len(),
                rows = table.rows.len(),
                "captured table"
            );
            snapshot.insert(name, table);
        }

        tx.commit()?;
        info!(
            tables = snapshot.len(),
            rows = snapshot.row_count(),
            "snapshot captured"
        );
        Ok(snapshot)
    }
}

/// Reads one table's column metadata and rows.
fn capture_table(
    conn: &Connection,
    table: &str,
    row_limit: Option<u64>,
) -> Result<TableSnapshot> {
    let schema = table_info(conn, table)?;
    let schema_err = |e: rusqlite::Error| SnapshotError::Schema {
        table: table.to_string(),
        reason: e.to_string(),
    };

    let mut sql = format!("SELECT * FROM {}", quote_identifier(table));
    if row_limit.is_some() {
        sql.push_str(" LIMIT ?1");
    }
    let mut stmt = conn.prepare(&sql).map_err(schema_err)?;
    let column_names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = match row_limit {
        Some(limit) => stmt.query(params![i64::try_from(limit).unwrap_or(i64::MAX)]),
        None => stmt.query([]),
    }
    .map_err(schema_err)?;

    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(schema_err)? {
        records.push(row_record(row, &column_names).map_err(schema_err)?);
    }

    Ok(TableSnapshot {
        schema,
        rows: records,
    })
}

/// Writes `snapshot` to `path` as two-space indented JSON, replacing any
/// existing file.
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] if the file cannot be created or written.
pub fn write_snapshot(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source: std::io::Error| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    snapshot.to_writer(&mut writer).map_err(|e| {
        if e.is_io() {
            io_err(e.into())
        } else {
            SnapshotError::Json(e)
        }
    })?;
    writer.flush().map_err(io_err)?;

    info!(path = %path.display(), "snapshot written");
    Ok(())
}

/// Runs a complete snapshot: open, capture, close, write.
///
/// The output file is only touched after the capture has succeeded, so a
/// connection or schema failure leaves any existing output as it was.
///
/// Returns the snapshot that was written.
pub fn snapshot(config: &SnapshotConfig) -> Result<Snapshot> {
    let snapshot = {
        let mut snapshotter = Snapshotter::open(&config.database)?;
        snapshotter.capture(config.row_limit)?
    };
    write_snapshot(&snapshot, &config.output)?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory_snapshotter(sql: &str) -> Snapshotter {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(sql).unwrap();
        Snapshotter::from_connection(conn)
    }

    #[test]
    fn test_capture_scenario_table() {
        let mut snapshotter = memory_snapshotter(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, blob BLOB);
             INSERT INTO t VALUES (1, 'a', X'DEADBEEF');",
        );
        let snapshot = snapshotter.capture(None).unwrap();
        let table = snapshot.get("t").unwrap();

        let pks: Vec<_> = table.schema.iter().map(|c| c.pk).collect();
        assert_eq!(pks, vec![1, 0, 0]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            serde_json::Value::Object(table.rows[0].clone()),
            json!({"id": 1, "name": "a", "blob": {"__bytes__": "3q2+7w=="}})
        );
    }

    #[test]
    fn test_empty_table_has_schema_and_no_rows() {
        let mut snapshotter = memory_snapshotter("CREATE TABLE empty (a TEXT, b INTEGER);");
        let snapshot = snapshotter.capture(None).unwrap();
        let table = snapshot.get("empty").unwrap();
        assert_eq!(table.schema.len(), 2);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_row_limit_truncates_in_storage_order() {
        let mut snapshotter = memory_snapshotter(
            "CREATE TABLE n (v INTEGER);
             INSERT INTO n VALUES (10), (20), (30), (40), (50);",
        );
        let snapshot = snapshotter.capture(Some(3)).unwrap();
        let values: Vec<_> = snapshot
            .get("n")
            .unwrap()
            .rows
            .iter()
            .map(|r| r["v"].clone())
            .collect();
        assert_eq!(values, vec![json!(10), json!(20), json!(30)]);
    }

    #[test]
    fn test_zero_row_limit_captures_schema_only() {
        let mut snapshotter = memory_snapshotter(
            "CREATE TABLE n (v INTEGER);
             INSERT INTO n VALUES (1), (2);",
        );
        let snapshot = snapshotter.capture(Some(0)).unwrap();
        let table = snapshot.get("n").unwrap();
        assert_eq!(table.schema.len(), 1);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_huge_row_limit_captures_everything() {
        let mut snapshotter = memory_snapshotter(
            "CREATE TABLE n (v INTEGER);
             INSERT INTO n VALUES (1), (2);",
        );
        let snapshot = snapshotter.capture(Some(u64::MAX)).unwrap();
        assert_eq!(snapshot.get("n").unwrap().rows.len(), 2);
    }

    #[test]
    fn test_tables_follow_catalog_order() {
        let mut snapshotter = memory_snapshotter(
            "CREATE TABLE zebra (x);
             CREATE TABLE apple (x);
             CREATE TABLE mango (x);",
        );
        let snapshot = snapshotter.capture(None).unwrap();
        assert_eq!(
            snapshot.table_names().collect::<Vec<_>>(),
            ["zebra", "apple", "mango"]
        );
    }

    #[test]
    fn test_awkward_table_names() {
        let mut snapshotter = memory_snapshotter(
            "CREATE TABLE \"order\" (\"select\" TEXT);
             INSERT INTO \"order\" VALUES ('x');
             CREATE TABLE \"with space\" (v);
             INSERT INTO \"with space\" VALUES (1);",
        );
        let snapshot = snapshotter.capture(None).unwrap();
        assert_eq!(snapshot.get("order").unwrap().rows[0]["select"], json!("x"));
        assert_eq!(snapshot.get("with space").unwrap().rows[0]["v"], json!(1));
    }

    #[test]
    fn test_open_missing_file_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        let err = Snapshotter::open(&path).err().unwrap();
        assert!(matches!(err, SnapshotError::Connection { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_non_database_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        std::fs::write(&path, "this is plainly not a sqlite database file, just text").unwrap();
        let err = Snapshotter::open(&path).err().unwrap();
        assert!(matches!(err, SnapshotError::Connection { .. }));
    }

    #[test]
    fn test_write_snapshot_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("dir.json");
        let err = write_snapshot(&Snapshot::new(), &path).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
