//! Snapshot run configuration.
//!
//! A [`SnapshotConfig`] names the source database, the output file, and the
//! optional per-table row cap. It can be built in code, loaded from YAML, or
//! left at its defaults. Every YAML key is optional.
//!
//! # Example YAML
//!
//! ```yaml
//! database: /var/lib/app/app.db
//! output: app_snapshot.json
//! row_limit: 250   # null for every row, 0 for schema only
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Rows captured per table unless told otherwise.
pub const DEFAULT_ROW_LIMIT: u64 = 100;

/// Output file written when no path is given.
pub const DEFAULT_OUTPUT_FILE: &str = "compass_snapshot.json";

/// Source database path, relative to the home directory.
pub const DEFAULT_DATABASE_RELATIVE: &str = ".compass/compass.db";

/// Inputs of one snapshot run.
///
/// `row_limit` semantics:
///
/// - `None` captures every row.
/// - `Some(0)` captures no rows, only the schema.
/// - `Some(n)` captures the first `n` rows of each table in storage order.
///
/// # Examples
///
/// ```
/// use table_snapshot_core::SnapshotConfig;
///
/// let config: SnapshotConfig = serde_yaml::from_str("output: out.json").unwrap();
/// assert_eq!(config.output.to_str(), Some("out.json"));
/// assert_eq!(config.row_limit, Some(100));
///
/// let unlimited: SnapshotConfig = serde_yaml::from_str("row_limit: null").unwrap();
/// assert_eq!(unlimited.row_limit, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Database file to read.
    pub database: PathBuf,
    /// JSON file to write; replaced if it exists.
    pub output: PathBuf,
    /// Maximum rows captured per table.
    pub row_limit: Option<u64>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            row_limit: Some(DEFAULT_ROW_LIMIT),
        }
    }
}

impl SnapshotConfig {
    /// Creates a configuration with explicit paths and a row limit.
    pub fn new(
        database: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        row_limit: Option<u64>,
    ) -> Self {
        Self {
            database: database.into(),
            output: output.into(),
            row_limit,
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`](crate::CoreError::Io) if the file cannot be
    /// read, or [`CoreError::Yaml`](crate::CoreError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_yaml::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`](crate::CoreError::Io) if the file cannot be
    /// written, or [`CoreError::Yaml`](crate::CoreError::Yaml) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_yaml::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }
}

/// `~/.compass/compass.db`, or the same path relative to the working
/// directory when no home directory is known.
pub fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DATABASE_RELATIVE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_RELATIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SnapshotConfig::default();
        assert_eq!(config.output, PathBuf::from("compass_snapshot.json"));
        assert_eq!(config.row_limit, Some(DEFAULT_ROW_LIMIT));
        assert!(config.database.ends_with(".compass/compass.db"));
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let config: SnapshotConfig = serde_yaml::from_str("database: /tmp/x.db\n").unwrap();
        assert_eq!(config.database, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT_FILE));
        assert_eq!(config.row_limit, Some(DEFAULT_ROW_LIMIT));
    }

    #[test]
    fn test_zero_row_limit_is_kept() {
        let config: SnapshotConfig = serde_yaml::from_str("row_limit: 0\n").unwrap();
        assert_eq!(config.row_limit, Some(0));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.yml");

        let config = SnapshotConfig::new("/data/app.db", "out.json", None);
        config.save(&path).unwrap();

        let loaded = SnapshotConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = SnapshotConfig::load("/nonexistent/snapshot.yml").unwrap_err();
        assert!(matches!(err, crate::CoreError::Io(_)));
    }
}
