//! Per-table buffer pool: bounded LRU page cache over a single data file.
//!
//! Each table gets its own [`PageCache`] over its own [`Pager`]. The cache
//! owns every resident page by value in a map keyed by page index, plus a
//! plain recency list of indices — pages hold no back-reference to the
//! cache, which would otherwise form an ownership cycle between page and
//! cache.
//!
//! # Example
//!
//! ```no_run
//! use buffer::{FilePager, PageCache};
//!
//! let pager = FilePager::open("/tmp/t.db").unwrap();
//! let mut cache = PageCache::new(pager, 16, 50);
//! let page = cache.get_insertable_page().unwrap();
//! let slot = page.allocate().unwrap();
//! ```

#[cfg(test)]
mod tests;

use common::{DbError, DbResult};
use std::{
    collections::VecDeque,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};
use storage::{PAGE_SIZE, Page};

/// Owns one table's data file: raw 4 KiB page reads/writes with a
/// durable flush after every write, and knows how many pages exist.
pub trait Pager {
    fn read_page(&mut self, index: u32, buf: &mut [u8; PAGE_SIZE]) -> std::io::Result<()>;
    fn write_page(&mut self, index: u32, buf: &[u8]) -> std::io::Result<()>;
    fn num_pages(&self) -> u32;
    /// Extend the file by one zeroed page and return its index.
    fn allocate_page(&mut self) -> std::io::Result<u32>;
}

/// File-backed pager for a single table's `.db` file.
#[derive(Debug)]
pub struct FilePager {
    file: File,
    num_pages: u32,
}

impl FilePager {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();
        let num_pages = (len / PAGE_SIZE as u64) as u32;
        Ok(Self { file, num_pages })
    }
}

impl Pager for FilePager {
    fn read_page(&mut self, index: u32, buf: &mut [u8; PAGE_SIZE]) -> std::io::Result<()> {
        self.file
            .seek(SeekFrom::Start(index as u64 * PAGE_SIZE as u64))?;
        self.file.read_exact(buf)
    }

    fn write_page(&mut self, index: u32, buf: &[u8]) -> std::io::Result<()> {
        self.file
            .seek(SeekFrom::Start(index as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(buf)?;
        self.file.sync_data()
    }

    fn num_pages(&self) -> u32 {
        self.num_pages
    }

    fn allocate_page(&mut self) -> std::io::Result<u32> {
        let index = self.num_pages;
        self.write_page(index, &[0u8; PAGE_SIZE])?;
        self.num_pages += 1;
        Ok(index)
    }
}

/// A bounded LRU page cache for one table.
pub struct PageCache<P: Pager> {
    pager: P,
    record_size: usize,
    cache_limit: usize,
    pages: hashbrown::HashMap<u32, Page>,
    recency: VecDeque<u32>,
}

impl<P: Pager> PageCache<P> {
    pub fn new(pager: P, record_size: usize, cache_limit: usize) -> Self {
        assert!(cache_limit > 0, "cache_limit must be > 0");
        Self {
            pager,
            record_size,
            cache_limit,
            pages: hashbrown::HashMap::new(),
            recency: VecDeque::new(),
        }
    }

    pub fn num_pages(&self) -> u32 {
        self.pager.num_pages()
    }

    fn touch(&mut self, index: u32) {
        self.recency.retain(|&i| i != index);
        self.recency.push_back(index);
    }

    fn evict_if_needed(&mut self) -> DbResult<()> {
        while self.pages.len() >= self.cache_limit {
            let Some(victim) = self.recency.pop_front() else {
                break;
            };
            if let Some(page) = self.pages.remove(&victim) {
                self.pager.write_page(victim, page.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Explicit fetch by page index; fails `OutOfRange` past `num_pages()`.
    pub fn get_page(&mut self, index: u32) -> DbResult<&mut Page> {
        if index >= self.pager.num_pages() {
            return Err(DbError::OutOfRange(index as u64));
        }
        if !self.pages.contains_key(&index) {
            let mut buf = [0u8; PAGE_SIZE];
            self.pager.read_page(index, &mut buf)?;
            let page = Page::decode(index, &buf, self.record_size);
            self.evict_if_needed()?;
            self.pages.insert(index, page);
        }
        self.touch(index);
        Ok(self.pages.get_mut(&index).unwrap())
    }

    /// Insertion fast path: the resident page with the most free slots
    /// (best-fit, ties broken by lowest page index); failing that, populate
    /// the cache from page 0 and retry; failing that, allocate a new page.
    pub fn get_insertable_page(&mut self) -> DbResult<&mut Page> {
        if let Some(best) = self.best_fit_resident() {
            self.touch(best);
            return Ok(self.pages.get_mut(&best).unwrap());
        }

        let target = self.pager.num_pages().min(self.cache_limit as u32);
        for i in 0..target {
            if !self.pages.contains_key(&i) {
                self.get_page(i)?;
            }
        }

        if let Some(best) = self.best_fit_resident() {
            self.touch(best);
            return Ok(self.pages.get_mut(&best).unwrap());
        }

        let new_index = self.pager.allocate_page()?;
        let page = Page::new_empty(new_index, self.record_size);
        self.evict_if_needed()?;
        self.pages.insert(new_index, page);
        self.touch(new_index);
        Ok(self.pages.get_mut(&new_index).unwrap())
    }

    fn best_fit_resident(&self) -> Option<u32> {
        self.pages
            .iter()
            .filter(|(_, p)| p.free_count() > 0)
            .max_by_key(|(idx, p)| (p.free_count(), std::cmp::Reverse(**idx)))
            .map(|(idx, _)| *idx)
    }

    /// Flush one resident page through the pager without evicting it.
    pub fn flush_page(&mut self, index: u32) -> DbResult<()> {
        if let Some(page) = self.pages.get(&index) {
            self.pager.write_page(index, page.as_bytes())?;
        }
        Ok(())
    }

    /// Flush every resident page; used when a table is closed.
    pub fn flush_all(&mut self) -> DbResult<()> {
        for (&index, page) in self.pages.iter() {
            self.pager.write_page(index, page.as_bytes())?;
        }
        Ok(())
    }
}
