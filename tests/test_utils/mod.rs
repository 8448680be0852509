use std::path::PathBuf;

use index_core::support::relation_scan::write_fixed_relation;

/// Scratch directory for one test run; callers should pick a unique
/// `name` so parallel tests don't collide on the same index/relation
/// files, all written straight to `std::env::temp_dir()`.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("index_core_test_{}", name));
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Writes an empty relation file so `BTreeIndex::open_or_create`'s bulk
/// build has nothing to do; tests drive the tree purely through
/// `insert_entry` afterwards for exact control over the rids produced.
pub fn write_empty_relation(path: &PathBuf, record_len: usize) {
    write_fixed_relation(path, index_core::index::DEFAULT_PAGE_SIZE, record_len, &[]).unwrap();
}
