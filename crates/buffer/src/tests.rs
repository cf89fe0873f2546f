use super::*;
use std::path::Path;
use tempfile::tempdir;

fn cache(dir: &Path, record_size: usize, cache_limit: usize) -> PageCache<FilePager> {
    let pager = FilePager::open(dir.join("t.db")).unwrap();
    PageCache::new(pager, record_size, cache_limit)
}

#[test]
fn empty_file_allocates_one_page_on_first_insertable_request() {
    let dir = tempdir().unwrap();
    let mut cache = cache(dir.path(), 8, 50);
    assert_eq!(cache.num_pages(), 0);
    let page = cache.get_insertable_page().unwrap();
    assert_eq!(page.index(), 0);
    assert_eq!(cache.num_pages(), 1);
}

#[test]
fn best_fit_prefers_largest_free_count_then_lowest_index() {
    let dir = tempdir().unwrap();
    let mut cache = cache(dir.path(), 8, 50);

    // Page 0: allocate every slot away so its free_count drops to 0.
    {
        let p0 = cache.get_insertable_page().unwrap();
        while p0.allocate().is_some() {}
    }
    // Forces a brand new page 1 with a full free list.
    let p1_index = cache.get_insertable_page().unwrap().index();
    assert_eq!(p1_index, 1);

    // Page 1 still has the most free slots, so it's picked again.
    let best = cache.get_insertable_page().unwrap();
    assert_eq!(best.index(), 1);
}

#[test]
fn get_page_out_of_range_fails() {
    let dir = tempdir().unwrap();
    let mut cache = cache(dir.path(), 8, 50);
    assert!(matches!(cache.get_page(0), Err(DbError::OutOfRange(_))));
}

#[test]
fn cache_equivalence_across_limits() {
    for limit in [1usize, 2, 50, 1000] {
        let dir = tempdir().unwrap();
        let mut cache = cache(dir.path(), 8, limit);
        let mut positions = Vec::new();
        for i in 0..20u8 {
            let page = cache.get_insertable_page().unwrap();
            let slot = page.allocate().unwrap();
            let mut rec = vec![0u8; 8];
            rec[0] = 0x80;
            rec[1] = i;
            page.write_slot(slot, &rec);
            positions.push((page.index(), slot));
        }
        cache.flush_all().unwrap();

        let mut reopened = cache_reopen(dir.path(), limit);
        for (i, (page_idx, slot)) in positions.into_iter().enumerate() {
            let page = reopened.get_page(page_idx).unwrap();
            assert_eq!(page.read_slot(slot)[1], i as u8);
        }
    }
}

fn cache_reopen(dir: &Path, limit: usize) -> PageCache<FilePager> {
    cache(dir, 8, limit)
}

#[test]
fn eviction_at_cache_limit_one_still_flushes_every_page() {
    let dir = tempdir().unwrap();
    let record_size = 16;
    let (page_a, slot_a, page_b, slot_b);
    {
        let mut cache = cache(dir.path(), record_size, 1);

        let page = cache.get_insertable_page().unwrap();
        page_a = page.index();
        slot_a = page.allocate().unwrap();
        let mut rec = vec![0u8; record_size];
        rec[0] = 0x80;
        rec[1] = 11;
        page.write_slot(slot_a, &rec);

        // Keep allocating on the same page until it's forced to roll over
        // to a second page, which evicts page_a from a 1-page cache.
        loop {
            let page = cache.get_insertable_page().unwrap();
            if page.index() != page_a {
                page_b = page.index();
                slot_b = page.allocate().unwrap();
                let mut rec = vec![0u8; record_size];
                rec[0] = 0x80;
                rec[1] = 22;
                page.write_slot(slot_b, &rec);
                break;
            }
            if page.allocate().is_none() {
                continue;
            }
        }
    }

    let mut reopened = cache(dir.path(), record_size, 50);
    assert_eq!(reopened.get_page(page_a).unwrap().read_slot(slot_a)[1], 11);
    assert_eq!(reopened.get_page(page_b).unwrap().read_slot(slot_b)[1], 22);
}
