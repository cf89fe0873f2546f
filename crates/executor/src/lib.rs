//! The `DataManager`: a per-table CRUD façade above the page cache.
//!
//! Everything here operates on raw `record_size`-byte buffers addressed by
//! [`UniPos`] — this crate has no notion of columns or types. Packing a row
//! into bytes (and deciding which bytes satisfy a predicate) is the `catalog`
//! crate's job; this crate only knows how to get bytes in and out of pages.


use buffer::{FilePager, PageCache, Pager};
use common::{DbError, DbResult, UniPos};
use std::path::{Path, PathBuf};
use storage::max_records_per_page;

/// Per-table CRUD over a [`PageCache`], keyed by [`UniPos`].
pub struct DataManager<P: Pager = FilePager> {
    cache: PageCache<P>,
    record_size: usize,
    max_records_per_page: u32,
    data_path: Option<PathBuf>,
}

impl DataManager<FilePager> {
    /// Open (or create) a table's data file on disk.
    pub fn open(path: impl AsRef<Path>, record_size: usize, cache_limit: usize) -> DbResult<Self> {
        let pager = FilePager::open(path.as_ref())?;
        let mut dm = Self::from_pager(pager, record_size, cache_limit);
        dm.data_path = Some(path.as_ref().to_path_buf());
        Ok(dm)
    }
}

impl<P: Pager> DataManager<P> {
    pub fn from_pager(pager: P, record_size: usize, cache_limit: usize) -> Self {
        Self {
            cache: PageCache::new(pager, record_size, cache_limit),
            record_size,
            max_records_per_page: max_records_per_page(record_size) as u32,
            data_path: None,
        }
    }

    fn resolve(&self, pos: UniPos) -> (u32, u16) {
        (
            pos.page(self.max_records_per_page),
            pos.slot(self.max_records_per_page),
        )
    }

    fn check_width(&self, data: &[u8]) -> DbResult<()> {
        if data.len() != self.record_size {
            return Err(DbError::Unsupported(format!(
                "record has wrong width: expected {}, got {}",
                self.record_size,
                data.len()
            )));
        }
        Ok(())
    }

    /// Allocate a slot on the best-fit insertable page, write `data`, and
    /// flush. Returns the new record's global id.
    pub fn insert(&mut self, data: &[u8]) -> DbResult<UniPos> {
        self.check_width(data)?;
        let page = self.cache.get_insertable_page()?;
        let slot = page
            .allocate()
            .expect("get_insertable_page always returns a page with a free slot");
        page.write_slot(slot, data);
        let index = page.index();
        self.cache.flush_page(index)?;
        Ok(UniPos::new(index, slot, self.max_records_per_page))
    }

    /// Overwrite the record at `pos`. Fails `Deleted` if the slot is
    /// currently free.
    pub fn update(&mut self, data: &[u8], pos: UniPos) -> DbResult<()> {
        self.check_width(data)?;
        let (page_idx, slot) = self.resolve(pos);
        let page = self.cache.get_page(page_idx)?;
        if page.is_free(slot) {
            return Err(DbError::Deleted(pos.0));
        }
        page.write_slot(slot, data);
        self.cache.flush_page(page_idx)?;
        Ok(())
    }

    /// Clear the live mark and return the slot to the free list. Fails
    /// `AlreadyDeleted` if the slot is already free.
    pub fn delete(&mut self, pos: UniPos) -> DbResult<()> {
        let (page_idx, slot) = self.resolve(pos);
        let page = self.cache.get_page(page_idx)?;
        if page.is_free(slot) {
            return Err(DbError::AlreadyDeleted(pos.0));
        }
        page.mark_dead(slot);
        page.free(slot);
        self.cache.flush_page(page_idx)?;
        Ok(())
    }

    /// Read the record at `pos` back. Fails `Deleted` if the slot is free.
    pub fn retrieve(&mut self, pos: UniPos) -> DbResult<Vec<u8>> {
        let (page_idx, slot) = self.resolve(pos);
        let page = self.cache.get_page(page_idx)?;
        if page.is_free(slot) {
            return Err(DbError::Deleted(pos.0));
        }
        Ok(page.read_slot(slot).to_vec())
    }

    /// Every live record in the table, in page-then-slot order.
    ///
    /// Iterates pages `0..num_pages`; within a page, slots `0..=max_allocated_slot`
    /// using a cursor local to that inner loop, so nothing here ever reuses or
    /// mutates the outer page-index variable.
    pub fn scan_all(&mut self) -> DbResult<Vec<(UniPos, Vec<u8>)>> {
        let mut out = Vec::new();
        for page_idx in 0..self.cache.num_pages() {
            let page = self.cache.get_page(page_idx)?;
            let Some(max_slot) = page.max_allocated_slot() else {
                continue;
            };
            for slot in 0..=max_slot {
                if page.is_free(slot) {
                    continue;
                }
                out.push((
                    UniPos::new(page_idx, slot, self.max_records_per_page),
                    page.read_slot(slot).to_vec(),
                ));
            }
        }
        Ok(out)
    }

    /// Every live record whose bytes satisfy `pred`.
    pub fn retrieve_by(
        &mut self,
        mut pred: impl FnMut(&[u8]) -> bool,
    ) -> DbResult<Vec<(UniPos, Vec<u8>)>> {
        Ok(self
            .scan_all()?
            .into_iter()
            .filter(|(_, bytes)| pred(bytes))
            .collect())
    }

    /// Delete every live record whose bytes satisfy `pred`. Returns the
    /// number of records deleted.
    pub fn delete_by(&mut self, mut pred: impl FnMut(&[u8]) -> bool) -> DbResult<usize> {
        let matches: Vec<UniPos> = self
            .scan_all()?
            .into_iter()
            .filter(|(_, bytes)| pred(bytes))
            .map(|(pos, _)| pos)
            .collect();
        let count = matches.len();
        for pos in matches {
            self.delete(pos)?;
        }
        Ok(count)
    }

    /// Rewrite every live record whose bytes satisfy `pred` through
    /// `mutate`. Returns the number of records updated.
    pub fn update_by(
        &mut self,
        mut pred: impl FnMut(&[u8]) -> bool,
        mut mutate: impl FnMut(&mut Vec<u8>),
    ) -> DbResult<usize> {
        let matches: Vec<(UniPos, Vec<u8>)> = self
            .scan_all()?
            .into_iter()
            .filter(|(_, bytes)| pred(bytes))
            .collect();
        let count = matches.len();
        for (pos, mut bytes) in matches {
            mutate(&mut bytes);
            self.update(&bytes, pos)?;
        }
        Ok(count)
    }

    /// Destroy the table's data file. The `DataManager` is not usable
    /// afterwards.
    pub fn boom(self) -> DbResult<()> {
        if let Some(path) = self.data_path {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
