//! SQLite snapshots.
//!
//! This crate reads a SQLite database through its catalog and produces a
//! [`Snapshot`](table_snapshot_core::Snapshot): every table's column
//! metadata and rows, with values converted to a JSON-safe form.
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - **`schema`** — catalog introspection (`sqlite_master`, `PRAGMA table_xinfo`)
//! - **`convert`** — SQLite cell and row to snapshot value conversion
//! - **`snapshotter`** — the read-only scan and the JSON file writer
//!
//! # Quick start
//!
//! ```no_run
//! use table_snapshot_core::SnapshotConfig;
//!
//! let config = SnapshotConfig::new("app.db", "app_snapshot.json", Some(100));
//! let snapshot = table_snapshot_sqlite::snapshot(&config).unwrap();
//! println!("Tables: {}", snapshot.len());
//! ```
//!
//! # Consistency
//!
//! The database is opened read-only and the whole scan runs in one read
//! transaction. Writers in other processes are not blocked beyond what
//! SQLite's own locking imposes.

mod convert;
mod error;
mod schema;
mod snapshotter;

pub use error::{Result, SnapshotError};
pub use schema::{list_tables, table_info};
pub use snapshotter::{Snapshotter, snapshot, write_snapshot};
