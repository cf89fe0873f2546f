//! In-process test harness: a temporary data directory plus a catalog ready
//! to run statements through, with no TCP involved.

use catalog::Catalog;
use common::{Config, DbResult};
use std::path::Path;
use tempfile::TempDir;

/// Owns a [`TempDir`] and the [`Catalog`] rooted there; dropping it cleans
/// up the data directory.
pub struct TestContext {
    _temp_dir: TempDir,
    catalog: Catalog,
}

impl TestContext {
    /// Build a fresh context with the default cache limit.
    pub fn new() -> DbResult<Self> {
        Self::with_cache_limit(50)
    }

    /// Build a fresh context with a specific per-table page cache size —
    /// useful for exercising eviction with a small limit.
    pub fn with_cache_limit(cache_limit: usize) -> DbResult<Self> {
        let temp_dir = tempfile::tempdir()?;
        let catalog = Catalog::new(temp_dir.path().to_path_buf(), cache_limit);
        Ok(Self {
            _temp_dir: temp_dir,
            catalog,
        })
    }

    /// Parse and run one statement, returning the same text a client would
    /// see on the wire.
    pub fn execute(&mut self, sql: &str) -> DbResult<String> {
        planner::execute(&mut self.catalog, sql)
    }

    pub fn data_dir(&self) -> &Path {
        self.catalog.data_dir()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }
}

/// Build a [`Config`] pointed at `dir` for tests that need to hand a config
/// to [`database::Database`] directly instead of driving a bare `Catalog`.
pub fn config_for(dir: &Path, cache_limit: usize) -> Config {
    Config::builder()
        .data_dir(dir.to_path_buf())
        .cache_limit(cache_limit)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_runs_statements() {
        let mut ctx = TestContext::new().unwrap();
        ctx.execute("CREATE t { a INT }").unwrap();
        ctx.execute("INSERT INTO t VALUES (1)").unwrap();
        let out = ctx.execute("SELECT * FROM t").unwrap();
        assert!(out.contains('1'));
    }

    #[test]
    fn data_dir_is_the_temp_dir() {
        let ctx = TestContext::new().unwrap();
        assert!(ctx.data_dir().exists());
    }
}
