//! Per-column index handle, kept at interface level only.
//!
//! No real B-tree (or any other) storage backs an index in this crate: the
//! insert/lookup paths are deliberately absent, matching the index manager's
//! role as an external collaborator whose design is out of scope. What's
//! here is enough for a future implementation to slot in without reshaping
//! the planner/catalog boundary around it.

use common::DbResult;
use std::path::{Path, PathBuf};

const SUFFIX: &str = ".index";

/// A named index over one column of one table. Holds only the marker file
/// path; no on-disk index content is ever written through this handle.
pub struct IndexHandle {
    marker_path: PathBuf,
}

impl IndexHandle {
    fn marker_path(data_dir: &Path, table: &str, column: &str) -> PathBuf {
        data_dir.join(format!("{table}_{column}{SUFFIX}"))
    }

    /// Create a new index's marker file. Fails if one already exists for
    /// this (table, column) pair.
    pub fn create(data_dir: &Path, table: &str, column: &str) -> DbResult<Self> {
        let marker_path = Self::marker_path(data_dir, table, column);
        std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&marker_path)?;
        Ok(Self { marker_path })
    }

    /// Attach to an existing index's marker file.
    pub fn open(data_dir: &Path, table: &str, column: &str) -> DbResult<Self> {
        let marker_path = Self::marker_path(data_dir, table, column);
        if !marker_path.exists() {
            return Err(common::DbError::Unsupported(format!(
                "no index marker at {}",
                marker_path.display()
            )));
        }
        Ok(Self { marker_path })
    }

    /// Destroy the index. There is no real index content to reclaim, only
    /// the marker file.
    pub fn boom(self) -> DbResult<()> {
        std::fs::remove_file(&self.marker_path)?;
        Ok(())
    }

    // No `get_positions`/`insert_value` here: a real index would resolve a
    // key to one or more `UniPos` values and keep itself updated on every
    // DataManager mutation, but that storage design isn't part of this
    // crate. The planner never calls into an IndexHandle during Insert,
    // Select, Update, or Delete in v1.
}
