//! Per-table schema storage and the record pack/unpack codec.
//!
//! A table's existence is tracked purely by whether `{name}.meta` and
//! `{name}.db` exist under the data directory; there is no separate
//! catalog-wide index file. [`Catalog`] is an in-memory cache of
//! already-opened [`TableMeta`] that falls back to reading a table's
//! `.meta` file on first reference.
//!
//! Packing a row into record bytes and reading it back is owned here,
//! not by `storage`, since it's the schema (column order, types,
//! nullability) that decides where each column's bytes live within a
//! slot.

use common::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use types::{SqlType, Value};

type Map<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// One column's declaration: name, type, and whether `NULL` is allowed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: SqlType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: SqlType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable,
        }
    }
}

/// A table's column list plus the derived record layout: the live-mark
/// and null-bitmap header width, and each column's byte offset within a
/// slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<Column>,
    offsets: Vec<u16>,
    header_bytes: u16,
    record_size: u16,
}

impl TableSchema {
    /// Validate column names are unique and non-empty, then compute the
    /// record layout.
    pub fn try_new(columns: Vec<Column>) -> DbResult<Self> {
        if columns.is_empty() {
            return Err(DbError::ParseError(
                "a table needs at least one column".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DbError::ParseError(format!(
                    "duplicate column name: {}",
                    col.name
                )));
            }
        }

        let header_bytes = storage::record_header_bytes(columns.len()) as u16;
        let mut offsets = Vec::with_capacity(columns.len());
        let mut cursor = header_bytes;
        for col in &columns {
            offsets.push(cursor);
            cursor += col.ty.aligned_width();
        }

        Ok(Self {
            columns,
            offsets,
            header_bytes,
            record_size: cursor,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn record_size(&self) -> usize {
        self.record_size as usize
    }

    pub fn header_bytes(&self) -> usize {
        self.header_bytes as usize
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    /// Bit `index` within the live-mark/null-bitmap header: index 0 is the
    /// live mark (bit 7 of byte 0), index `i` (`i >= 1`) is column `i - 1`'s
    /// null flag. Bits are assigned MSB-first, byte 0 first.
    fn set_bit(buf: &mut [u8], bit_index: usize) {
        let byte = bit_index / 8;
        let bit = 7 - (bit_index % 8);
        buf[byte] |= 1 << bit;
    }

    fn test_bit(buf: &[u8], bit_index: usize) -> bool {
        let byte = bit_index / 8;
        let bit = 7 - (bit_index % 8);
        buf[byte] & (1 << bit) != 0
    }

    /// Pack a row's values into a fresh, live-marked record buffer. Values
    /// must line up positionally with `columns()`.
    pub fn pack(&self, values: &[Value]) -> DbResult<Vec<u8>> {
        if values.len() != self.columns.len() {
            return Err(DbError::Unsupported(format!(
                "expected {} values, got {}",
                self.columns.len(),
                values.len()
            )));
        }

        let mut buf = vec![0u8; self.record_size as usize];
        Self::set_bit(&mut buf, 0); // live mark

        for (i, (col, value)) in self.columns.iter().zip(values).enumerate() {
            if value.is_null() {
                if !col.nullable {
                    return Err(DbError::NotNullable(col.name.clone()));
                }
                Self::set_bit(&mut buf, i + 1);
                continue;
            }

            let off = self.offsets[i] as usize;
            match (col.ty, value) {
                (SqlType::Int, Value::Int(v)) => {
                    let v16 = i16::try_from(*v).map_err(|_| DbError::OutOfRange(*v as u64))?;
                    buf[off..off + 2].copy_from_slice(&v16.to_be_bytes());
                }
                (SqlType::Double, Value::Double(v)) => {
                    buf[off..off + 8].copy_from_slice(&v.to_be_bytes());
                }
                (SqlType::String(k), Value::Text(s)) => {
                    if s.len() > k as usize {
                        return Err(DbError::TooLong {
                            col: col.name.clone(),
                            max: k as usize,
                            got: s.len(),
                        });
                    }
                    buf[off..off + s.len()].copy_from_slice(s.as_bytes());
                }
                _ => {
                    return Err(DbError::WrongType {
                        col: col.name.clone(),
                        expected: col.ty.name().into(),
                        got: value.sql_type().map(|t| t.name()).unwrap_or("NULL").into(),
                    });
                }
            }
        }

        Ok(buf)
    }

    /// Read a record buffer back into values, honoring the null bitmap.
    /// Does not look at the live mark; callers check `Page::is_live` first.
    pub fn unpack(&self, bytes: &[u8]) -> Vec<Value> {
        let mut values = Vec::with_capacity(self.columns.len());
        for (i, col) in self.columns.iter().enumerate() {
            if Self::test_bit(bytes, i + 1) {
                values.push(Value::Null);
                continue;
            }
            let off = self.offsets[i] as usize;
            let value = match col.ty {
                SqlType::Int => Value::Int(i16::from_be_bytes([bytes[off], bytes[off + 1]]) as i64),
                SqlType::Double => {
                    Value::Double(f64::from_be_bytes(bytes[off..off + 8].try_into().unwrap()))
                }
                SqlType::String(k) => {
                    let raw = &bytes[off..off + k as usize];
                    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                    Value::Text(String::from_utf8_lossy(&raw[..end]).into_owned())
                }
            };
            values.push(value);
        }
        values
    }
}

/// A table's persisted identity: its name and schema. Serialized verbatim
/// as `{name}.meta`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableMeta {
    pub name: String,
    pub schema: TableSchema,
}

/// Schema registry backed by one `.meta` file per table, plus the
/// process-wide registry of each table's open [`executor::DataManager`].
/// Opened tables are cached in memory; nothing is loaded eagerly at startup.
pub struct Catalog {
    data_dir: PathBuf,
    cache_limit: usize,
    open: Map<String, TableMeta>,
    managers: Map<String, executor::DataManager>,
}

impl Catalog {
    pub fn new(data_dir: impl Into<PathBuf>, cache_limit: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache_limit,
            open: Map::default(),
            managers: Map::default(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn meta_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.meta"))
    }

    /// Path to a table's data file; used by callers that need to open a
    /// `buffer::PageCache` over it.
    pub fn data_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.db"))
    }

    /// Create a new table's metadata file and an empty data file.
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> DbResult<&TableMeta> {
        if self.open.contains_key(name) || self.meta_path(name).exists() {
            return Err(DbError::TableExists(name.to_string()));
        }
        std::fs::create_dir_all(&self.data_dir)?;

        let schema = TableSchema::try_new(columns)?;
        let meta = TableMeta {
            name: name.to_string(),
            schema,
        };
        let json =
            serde_json::to_string_pretty(&meta).map_err(|e| DbError::Io(std::io::Error::other(e)))?;
        std::fs::write(self.meta_path(name), json)?;
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.data_path(name))?;

        self.open.insert(name.to_string(), meta);
        Ok(self.open.get(name).unwrap())
    }

    /// Fetch a table's metadata, loading it from disk on first reference.
    pub fn table(&mut self, name: &str) -> DbResult<&TableMeta> {
        if !self.open.contains_key(name) {
            let json = std::fs::read_to_string(self.meta_path(name))
                .map_err(|_| DbError::NoSuchTable(name.to_string()))?;
            let meta: TableMeta =
                serde_json::from_str(&json).map_err(|e| DbError::Io(std::io::Error::other(e)))?;
            self.open.insert(name.to_string(), meta);
        }
        Ok(self.open.get(name).unwrap())
    }

    /// True if a table's metadata file exists, without loading it.
    pub fn table_exists(&self, name: &str) -> bool {
        self.open.contains_key(name) || self.meta_path(name).exists()
    }

    /// Fetch the table's open `DataManager`, opening its data file on first
    /// reference. Fails `NoSuchTable` if the table has no metadata.
    pub fn manager(&mut self, name: &str) -> DbResult<&mut executor::DataManager> {
        let record_size = self.table(name)?.schema.record_size();
        if !self.managers.contains_key(name) {
            let dm = executor::DataManager::open(self.data_path(name), record_size, self.cache_limit)?;
            self.managers.insert(name.to_string(), dm);
        }
        Ok(self.managers.get_mut(name).unwrap())
    }

    /// Remove a table's metadata and data files, evicting it from the
    /// in-memory cache. Fails `NoSuchTable` if it never existed.
    pub fn drop_table(&mut self, name: &str) -> DbResult<()> {
        self.table(name)?;
        self.open.remove(name);
        match self.managers.remove(name) {
            Some(dm) => dm.boom()?,
            None => {
                std::fs::remove_file(self.meta_path(name))?;
                let _ = std::fs::remove_file(self.data_path(name));
                return Ok(());
            }
        }
        std::fs::remove_file(self.meta_path(name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_columns() -> Vec<Column> {
        vec![
            Column::new("id", SqlType::Int, false),
            Column::new("name", SqlType::String(16), true),
            Column::new("score", SqlType::Double, false),
        ]
    }

    #[test]
    fn schema_rejects_empty_and_duplicate_columns() {
        assert!(TableSchema::try_new(vec![]).is_err());
        let dup = vec![
            Column::new("a", SqlType::Int, false),
            Column::new("a", SqlType::Int, false),
        ];
        assert!(TableSchema::try_new(dup).is_err());
    }

    #[test]
    fn pack_unpack_round_trips_non_null_values() {
        let schema = TableSchema::try_new(sample_columns()).unwrap();
        let values = vec![
            Value::Int(42),
            Value::Text("Ada".into()),
            Value::Double(3.5),
        ];
        let packed = schema.pack(&values).unwrap();
        assert_eq!(packed.len(), schema.record_size());
        assert_eq!(schema.unpack(&packed), values);
    }

    #[test]
    fn pack_sets_null_bit_and_unpack_reads_it_back() {
        let schema = TableSchema::try_new(sample_columns()).unwrap();
        let values = vec![Value::Int(1), Value::Null, Value::Double(0.0)];
        let packed = schema.pack(&values).unwrap();
        assert_eq!(schema.unpack(&packed), values);
    }

    #[test]
    fn pack_rejects_null_for_non_nullable_column() {
        let schema = TableSchema::try_new(sample_columns()).unwrap();
        let values = vec![Value::Null, Value::Null, Value::Double(0.0)];
        assert!(matches!(
            schema.pack(&values),
            Err(DbError::NotNullable(_))
        ));
    }

    #[test]
    fn pack_rejects_string_over_declared_width() {
        let schema = TableSchema::try_new(sample_columns()).unwrap();
        let values = vec![
            Value::Int(1),
            Value::Text("this name is much too long".into()),
            Value::Double(0.0),
        ];
        assert!(matches!(schema.pack(&values), Err(DbError::TooLong { .. })));
    }

    #[test]
    fn pack_rejects_int_out_of_i16_range() {
        let schema = TableSchema::try_new(sample_columns()).unwrap();
        let values = vec![Value::Int(100_000), Value::Null, Value::Double(0.0)];
        assert!(matches!(
            schema.pack(&values),
            Err(DbError::OutOfRange(_))
        ));
    }

    #[test]
    fn pack_rejects_mismatched_type() {
        let schema = TableSchema::try_new(sample_columns()).unwrap();
        let values = vec![
            Value::Text("not an int".into()),
            Value::Null,
            Value::Double(0.0),
        ];
        assert!(matches!(schema.pack(&values), Err(DbError::WrongType { .. })));
    }

    #[test]
    fn create_then_reopen_loads_schema_from_disk() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new(dir.path(), 50);
        catalog.create_table("t", sample_columns()).unwrap();
        assert!(catalog.data_path("t").exists());

        let mut reopened = Catalog::new(dir.path(), 50);
        let meta = reopened.table("t").unwrap();
        assert_eq!(meta.name, "t");
        assert_eq!(meta.schema.columns().len(), 3);
    }

    #[test]
    fn create_table_twice_fails() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new(dir.path(), 50);
        catalog.create_table("t", sample_columns()).unwrap();
        assert!(matches!(
            catalog.create_table("t", sample_columns()),
            Err(DbError::TableExists(_))
        ));
    }

    #[test]
    fn table_missing_on_disk_fails() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new(dir.path(), 50);
        assert!(matches!(
            catalog.table("ghost"),
            Err(DbError::NoSuchTable(_))
        ));
    }

    #[test]
    fn drop_table_removes_both_files() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new(dir.path(), 50);
        catalog.create_table("t", sample_columns()).unwrap();
        catalog.drop_table("t").unwrap();
        assert!(!catalog.meta_path("t").exists());
        assert!(!catalog.data_path("t").exists());
        assert!(matches!(catalog.table("t"), Err(DbError::NoSuchTable(_))));
    }

    #[test]
    fn manager_opens_lazily_and_persists_records_across_catalogs() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new(dir.path(), 50);
        let meta = catalog.create_table("t", sample_columns()).unwrap();
        let schema = meta.schema.clone();
        let packed = schema
            .pack(&[Value::Int(1), Value::Text("Ada".into()), Value::Double(2.5)])
            .unwrap();
        let pos = catalog.manager("t").unwrap().insert(&packed).unwrap();

        let mut reopened = Catalog::new(dir.path(), 50);
        let bytes = reopened.manager("t").unwrap().retrieve(pos).unwrap();
        assert_eq!(schema.unpack(&bytes)[1], Value::Text("Ada".into()));
    }

    #[test]
    fn manager_on_unknown_table_fails_no_such_table() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new(dir.path(), 50);
        assert!(matches!(
            catalog.manager("ghost"),
            Err(DbError::NoSuchTable(_))
        ));
    }

    #[test]
    fn drop_table_boom_removes_open_managers_data_file() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new(dir.path(), 50);
        catalog.create_table("t", sample_columns()).unwrap();
        catalog.manager("t").unwrap();
        catalog.drop_table("t").unwrap();
        assert!(!catalog.data_path("t").exists());
        assert!(!catalog.meta_path("t").exists());
    }
}
