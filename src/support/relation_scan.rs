//! The relation scanner: iterates fixed-layout
//! records of the base relation being indexed, for bulk build.
//!
//! Scan termination is an `EndOfFile` error rather than a sentinel return,
//! so the bulk-build loop reads uniformly through `?` until the relation
//! is exhausted instead of branching on a special last-record value.
//!
//! Page layout: `[count: u32][record 0][record 1]...[record
//! records_per_page - 1]`. `count <= records_per_page` lets the last page
//! of a relation be partially filled; there is no slot bitmap because the
//! relation, unlike the index's own nodes, is append-only and never has
//! interior holes.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{IndexError, IndexResult};
use crate::rid::Rid;

pub struct FileScan {
    file: File,
    page_size: usize,
    record_len: usize,
    records_per_page: usize,
    num_pages: u32,
    cur_page: u32,
    cur_slot: usize,
    cur_page_count: usize,
}

impl FileScan {
    pub fn open(path: &Path, page_size: usize, record_len: usize) -> IndexResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        let len = file.metadata()?.len();
        let num_pages = (len / page_size as u64) as u32;
        let records_per_page = (page_size - 4) / record_len;
        Ok(FileScan {
            file,
            page_size,
            record_len,
            records_per_page,
            num_pages,
            cur_page: 0,
            cur_slot: 0,
            cur_page_count: 0,
        })
    }

    fn load_page_count(&mut self, page: u32) -> IndexResult<usize> {
        self.file.seek(SeekFrom::Start(page as u64 * self.page_size as u64))?;
        let mut count_buf = [0u8; 4];
        self.file.read_exact(&mut count_buf)?;
        Ok(u32::from_ne_bytes(count_buf) as usize)
    }

    /// Advances to and returns the rid of the next record, or
    /// `Err(EndOfFile)` once the relation is exhausted.
    pub fn scan_next(&mut self) -> IndexResult<Rid> {
        loop {
            if self.cur_page >= self.num_pages {
                return Err(IndexError::EndOfFile);
            }
            if self.cur_slot == 0 {
                self.cur_page_count = self.load_page_count(self.cur_page)?;
            }
            if self.cur_slot >= self.cur_page_count {
                self.cur_page += 1;
                self.cur_slot = 0;
                continue;
            }
            let rid = Rid::new(self.cur_page + 1, self.cur_slot as u32);
            self.cur_slot += 1;
            return Ok(rid);
        }
    }

    /// Reads the full record for the rid most recently returned by
    /// [`Self::scan_next`].
    pub fn get_record(&mut self, rid: Rid) -> IndexResult<Vec<u8>> {
        let page = rid.page_number - 1;
        let slot = rid.slot_number as usize;
        let offset = page as u64 * self.page_size as u64
            + 4
            + (slot * self.record_len) as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.record_len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Test/fixture helper: writes `records` (each exactly `record_len` bytes)
/// to `path` in the paginated layout [`FileScan`] expects.
pub fn write_fixed_relation(
    path: &Path,
    page_size: usize,
    record_len: usize,
    records: &[Vec<u8>],
) -> IndexResult<()> {
    let records_per_page = (page_size - 4) / record_len;
    let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
    for chunk in records.chunks(records_per_page) {
        let mut page = vec![0u8; page_size];
        page[0..4].copy_from_slice(&(chunk.len() as u32).to_ne_bytes());
        for (i, record) in chunk.iter().enumerate() {
            debug_assert_eq!(record.len(), record_len);
            let off = 4 + i * record_len;
            page[off..off + record_len].copy_from_slice(record);
        }
        file.write_all(&page)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn scans_records_across_page_boundaries() {
        let path = env::temp_dir().join("index_core_relation_scan_test.rel");
        let record_len = 8;
        let page_size = 64;
        let records: Vec<Vec<u8>> = (0..20)
            .map(|i: i32| i.to_ne_bytes().iter().chain([0u8; 4].iter()).copied().collect())
            .collect();
        write_fixed_relation(&path, page_size, record_len, &records).unwrap();

        let mut scan = FileScan::open(&path, page_size, record_len).unwrap();
        let mut seen = 0;
        loop {
            match scan.scan_next() {
                Ok(rid) => {
                    let rec = scan.get_record(rid).unwrap();
                    assert_eq!(rec.len(), record_len);
                    seen += 1;
                }
                Err(IndexError::EndOfFile) => break,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(seen, 20);
        let _ = std::fs::remove_file(&path);
    }
}
