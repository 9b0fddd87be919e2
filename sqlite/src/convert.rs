//! Conversion from SQLite cells and rows to snapshot values.
//!
//! SQLite has five storage classes; each maps onto one [`Value`] variant and
//! is then made JSON-safe with [`safe_value`]. Conversion never consults the
//! declared column type, only the storage class of the cell itself.

use rusqlite::Row;
use rusqlite::types::ValueRef;
use table_snapshot_core::{RowRecord, Value, safe_value};

/// Maps a SQLite cell onto a [`Value`].
///
/// `TEXT` that is not valid UTF-8 is decoded lossily rather than failing
/// the whole snapshot.
pub(crate) fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

/// Builds a [`RowRecord`] pairing each result column name with its
/// converted cell, in result-set column order.
pub(crate) fn row_record(row: &Row<'_>, column_names: &[String]) -> rusqlite::Result<RowRecord> {
    let mut record = RowRecord::with_capacity(column_names.len());
    for (idx, name) in column_names.iter().enumerate() {
        let value = value_from_sql(row.get_ref(idx)?);
        record.insert(name.clone(), safe_value(value));
    }
    Ok(record)
}
