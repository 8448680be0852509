//! The underlying page store: an append-only file of fixed-size pages with
//! stable page ids, addressed by a flat page-id space.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{IndexError, IndexResult};
use crate::page_id::PageId;

pub struct BlobFile {
    file: File,
    page_size: usize,
    num_pages: u32,
}

impl BlobFile {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Opens `path` if it exists; otherwise creates it (when
    /// `create_if_absent`) as an empty, zero-page file.
    pub fn open(path: &Path, create_if_absent: bool, page_size: usize) -> IndexResult<Self> {
        let existed = path.exists();
        if !existed && !create_if_absent {
            return Err(IndexError::Io(format!("no such file: {}", path.display())));
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(create_if_absent)
            .open(path)?;
        let len = file.metadata()?.len();
        let num_pages = (len / page_size as u64) as u32;
        Ok(BlobFile { file, page_size, num_pages })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// The first page of a non-empty file is always the meta page.
    pub fn get_first_page_no(&self) -> PageId {
        crate::page_id::HEADER_PAGE_NUM
    }

    pub fn read_page(&mut self, pid: PageId) -> IndexResult<Vec<u8>> {
        let mut buf = vec![0u8; self.page_size];
        let offset = (pid as u64 - 1) * self.page_size as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn write_page(&mut self, pid: PageId, data: &[u8]) -> IndexResult<()> {
        debug_assert_eq!(data.len(), self.page_size);
        let offset = (pid as u64 - 1) * self.page_size as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Appends a fresh zeroed page and returns its id.
    pub fn allocate_page(&mut self) -> IndexResult<PageId> {
        self.num_pages += 1;
        let pid = self.num_pages;
        self.write_page(pid, &vec![0u8; self.page_size])?;
        Ok(pid)
    }

    pub fn flush(&mut self) -> IndexResult<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}
