//! Process-wide façade over the catalog: the one entry point the server
//! (and anything else driving SQL) calls.
//!
//! Per §5, the catalog and every table's page cache are process-global and
//! guarded by a single mutex — there is no finer locking granularity here.
//! A statement holds the lock for its entire evaluation, which is fine
//! given §5's scheduling model (one statement evaluated synchronously at a
//! time; no statement suspends except on blocking pager/socket I/O).

use catalog::Catalog;
use common::{Config, DbResult};
use std::sync::{Arc, Mutex};

/// Owns the shared [`Catalog`] behind a single process-wide mutex.
///
/// Cheap to clone: clones share the same catalog via `Arc`.
#[derive(Clone)]
pub struct Database {
    catalog: Arc<Mutex<Catalog>>,
}

impl Database {
    /// Build a database rooted at `config.data_dir`, with `config.cache_limit`
    /// pages cached per table. Does not touch disk until a statement is run.
    pub fn new(config: &Config) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(Catalog::new(
                config.data_dir.clone(),
                config.cache_limit,
            ))),
        }
    }

    /// Parse and execute one SQL statement, returning the textual response
    /// a client sees on the wire (per §4.7's projection format, or `"OK"`
    /// for DDL/DML).
    pub fn execute(&self, sql: &str) -> DbResult<String> {
        let mut catalog = self.catalog.lock().expect("catalog mutex poisoned");
        planner::execute(&mut catalog, sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path) -> Config {
        Config::builder().data_dir(dir.to_path_buf()).cache_limit(4).build()
    }

    #[test]
    fn create_insert_select_round_trips() {
        let dir = tempdir().unwrap();
        let db = Database::new(&config(dir.path()));

        db.execute("CREATE t { a INT, b STRING 8 }").unwrap();
        db.execute("INSERT INTO t VALUES (7, \"hi\")").unwrap();
        let out = db.execute("SELECT * FROM t").unwrap();
        assert!(out.starts_with("{ ["));
        assert!(out.contains('7'));
        assert!(out.contains("hi"));
        assert!(out.ends_with("] }"));
    }

    #[test]
    fn clones_share_the_same_catalog() {
        let dir = tempdir().unwrap();
        let db = Database::new(&config(dir.path()));
        let other = db.clone();

        db.execute("CREATE t { a INT }").unwrap();
        other.execute("INSERT INTO t VALUES (1)").unwrap();
        let out = db.execute("SELECT * FROM t").unwrap();
        assert!(out.contains('1'));
    }

    #[test]
    fn unknown_table_surfaces_no_such_table() {
        let dir = tempdir().unwrap();
        let db = Database::new(&config(dir.path()));
        let err = db.execute("SELECT * FROM ghost").unwrap_err();
        assert!(matches!(err, common::DbError::NoSuchTable(_)));
    }
}
