//! Core types for point-in-time table snapshots.
//!
//! This crate defines the snapshot document and the value conversion shared
//! by every storage backend:
//!
//! - [`Snapshot`] — every table of a database, in catalog order.
//! - [`TableSnapshot`] — one table's column metadata and rows.
//! - [`ColumnInfo`] — a column as reported by schema introspection.
//! - [`RowRecord`] — one row, column name to JSON-safe value.
//! - [`Value`] and [`safe_value`] — the tagged database value and its
//!   conversion to JSON, with binary content wrapped as
//!   `{"__bytes__": "<base64>"}` ([`decode_bytes`] reverses it).
//! - [`SnapshotConfig`] — database path, output path, and row limit.
//!
//! # Example
//!
//! ```
//! use table_snapshot_core::*;
//!
//! let mut row = RowRecord::new();
//! row.insert("id".into(), safe_value(Value::Integer(1)));
//! row.insert("blob".into(), safe_value(Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF])));
//!
//! let mut snapshot = Snapshot::new();
//! snapshot.insert("t", TableSnapshot { schema: Vec::new(), rows: vec![row] });
//!
//! let blob = &snapshot.get("t").unwrap().rows[0]["blob"];
//! assert_eq!(decode_bytes(blob), Some(vec![0xDE, 0xAD, 0xBE, 0xEF]));
//! ```

mod config;
mod error;
mod types;
mod value;

pub use config::{
    DEFAULT_DATABASE_RELATIVE, DEFAULT_OUTPUT_FILE, DEFAULT_ROW_LIMIT, SnapshotConfig,
    default_database_path,
};
pub use error::{CoreError, Result};
pub use types::{ColumnInfo, RowRecord, Snapshot, TableSnapshot};
pub use value::{BYTES_TAG, Value, decode_bytes, safe_value};
