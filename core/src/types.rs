//! Snapshot document types.
//!
//! A [`Snapshot`] is the point-in-time capture of a whole database: one
//! [`TableSnapshot`] per table, each holding the column metadata
//! ([`ColumnInfo`]) and the rows ([`RowRecord`]). Table and column order are
//! kept exactly as the database reported them, both in memory and in the
//! serialized JSON.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;

/// One row: column name to JSON-safe value, in result-set column order.
pub type RowRecord = serde_json::Map<String, serde_json::Value>;

/// Column metadata as reported by schema introspection.
///
/// Field names mirror SQLite's `PRAGMA table_xinfo` output so the JSON keys
/// read `cid`, `name`, `type`, `notnull`, `default` and `pk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Zero-based ordinal position.
    pub cid: i64,
    /// Column name.
    pub name: String,
    /// Declared type; empty when the column was declared without one.
    #[serde(rename = "type")]
    pub decl_type: String,
    /// `1` when the column carries a `NOT NULL` constraint, `0` otherwise.
    pub notnull: i64,
    /// Declared default expression, `null` when there is none.
    pub default: serde_json::Value,
    /// `0` when not part of the primary key, otherwise the 1-based position
    /// within it.
    pub pk: i64,
}

impl ColumnInfo {
    /// Returns `true` if the column belongs to the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.pk > 0
    }
}

/// Structure and contents of a single table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Columns in ordinal order.
    pub schema: Vec<ColumnInfo>,
    /// Rows in storage order.
    pub rows: Vec<RowRecord>,
}

impl TableSnapshot {
    /// Column names in ordinal order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.schema.iter().map(|c| c.name.as_str())
    }
}

/// The complete capture of a database.
///
/// Tables are kept in insertion order, which the snapshotter makes equal to
/// catalog enumeration order.
///
/// # Examples
///
/// ```
/// use table_snapshot_core::{Snapshot, TableSnapshot};
///
/// let mut snapshot = Snapshot::new();
/// snapshot.insert("users", TableSnapshot::default());
/// snapshot.insert("orders", TableSnapshot::default());
///
/// let names: Vec<_> = snapshot.table_names().collect();
/// assert_eq!(names, ["users", "orders"]);
///
/// let json = snapshot.to_json_string().unwrap();
/// assert!(json.starts_with("{\n  \"tables\": {\n    \"users\""));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(with = "ordered_tables")]
    tables: Vec<(String, TableSnapshot)>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, replacing an earlier entry with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, table: TableSnapshot) {
        let name = name.into();
        match self.tables.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = table,
            None => self.tables.push((name, table)),
        }
    }

    /// Looks up a table by name.
    pub fn get(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, table)| table)
    }

    /// Iterates over `(name, table)` pairs in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableSnapshot)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// Iterates over table names in insertion order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(name, _)| name.as_str())
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if no tables were captured.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|(_, table)| table.rows.len()).sum()
    }

    /// Serializes the snapshot as JSON indented with two spaces.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the snapshot as JSON indented with two spaces.
    pub fn to_writer<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }

    /// Reads a snapshot previously written with [`to_writer`](Self::to_writer).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`](crate::CoreError::Io) if the file cannot be
    /// opened, or [`CoreError::Json`](crate::CoreError::Json) if it is not a
    /// snapshot document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let snapshot = serde_json::from_reader(BufReader::new(file))?;
        Ok(snapshot)
    }
}

/// Serializes `Vec<(String, TableSnapshot)>` as a JSON object keyed by table
/// name, keeping vector order.
mod ordered_tables {
    use super::*;

    pub fn serialize<S>(
        tables: &[(String, TableSnapshot)],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(tables.len()))?;
        for (name, table) in tables {
            map.serialize_entry(name, table)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> std::result::Result<Vec<(String, TableSnapshot)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TablesVisitor)
    }

    struct TablesVisitor;

    impl<'de> Visitor<'de> for TablesVisitor {
        type Value = Vec<(String, TableSnapshot)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of table name to table snapshot")
        }

        fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut tables = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, table)) = access.next_entry::<String, TableSnapshot>()? {
                tables.push((name, table));
            }
            Ok(tables)
        }
    }
}
