
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, io, net::IpAddr, path::PathBuf};
use thiserror::Error;
use types::Value;

/// Identifier for a column's position within a table schema.
pub type ColumnId = u16;

/// Logical identifier for a page within a table's data file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub u32);

/// Logical identifier for a table registered in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub u64);

/// Global record address: `page * max_records_per_page + slot`.
///
/// Always resolved back to `(page, slot)` via `max_records_per_page`, never
/// via record size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniPos(pub u64);

impl UniPos {
    pub fn new(page: u32, slot: u16, max_records_per_page: u32) -> Self {
        UniPos(page as u64 * max_records_per_page as u64 + slot as u64)
    }

    pub fn page(&self, max_records_per_page: u32) -> u32 {
        (self.0 / max_records_per_page as u64) as u32
    }

    pub fn slot(&self, max_records_per_page: u32) -> u16 {
        (self.0 % max_records_per_page as u64) as u16
    }
}

/// Positional row representation backed by `types::Value`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
    #[serde(skip)]
    #[serde(default)]
    rid: Option<UniPos>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, rid: None }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(values)
    }

    pub fn with_rid(mut self, rid: UniPos) -> Self {
        self.rid = Some(rid);
        self
    }

    pub fn set_rid(&mut self, rid: Option<UniPos>) {
        self.rid = rid;
    }

    pub fn rid(&self) -> Option<UniPos> {
        self.rid
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Named projection of a row keyed by column name.
pub type RowMap = HashMap<String, Value>;

/// Rectangular result set carrying column labels and rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Canonical error type shared across database subsystems, matching the
/// taxonomy a client can see at the wire boundary.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("no such table: {0}")]
    NoSuchTable(String),
    #[error("table already exists: {0}")]
    TableExists(String),
    #[error("no such column: {0}")]
    NoSuchCol(String),
    #[error("wrong type for column {col}: expected {expected}, got {got}")]
    WrongType {
        col: String,
        expected: String,
        got: String,
    },
    #[error("value too long for column {col}: max {max}, got {got}")]
    TooLong { col: String, max: usize, got: usize },
    #[error("column {0} is not nullable")]
    NotNullable(String),
    #[error("record position out of range: {0}")]
    OutOfRange(u64),
    #[error("record {0} has been deleted")]
    Deleted(u64),
    #[error("record {0} has already been deleted")]
    AlreadyDeleted(u64),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Runtime configuration for the database process.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./db_data"))
///     .cache_limit(50)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Directory where each table's `.db`/`.meta` files live.
    #[builder(default = PathBuf::from("./db_data"))]
    pub data_dir: PathBuf,
    /// Number of pages the buffer pool keeps resident per table.
    #[builder(default = 50)]
    pub cache_limit: usize,
    /// Address the server binds to.
    #[builder(default = "127.0.0.1".parse().unwrap())]
    pub bind_addr: IpAddr,
    /// Port the server binds to.
    #[builder(default = 2000)]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db_data"),
            cache_limit: 50,
            bind_addr: "127.0.0.1".parse().unwrap(),
            port: 2000,
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, DbError, DbResult, RecordBatch, Row, RowMap, UniPos};
    pub use types::{SqlType, Value};
}
