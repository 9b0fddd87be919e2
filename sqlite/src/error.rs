//! Error types for snapshot runs.
//!
//! Every variant is fatal to the run: nothing is retried and no partial
//! snapshot is written.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while capturing or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The source database is missing, unreadable, or not a SQLite file.
    #[error("cannot open database '{}': {source}", path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A table vanished or its metadata could not be read during the scan.
    #[error("schema error on table '{table}': {reason}")]
    Schema { table: String, reason: String },

    /// A catalog or row query failed outside per-table introspection.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The output file could not be created or written.
    #[error("cannot write snapshot to '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`SnapshotError`].
pub type Result<T> = std::result::Result<T, SnapshotError>;
