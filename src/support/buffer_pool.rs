//! Page-granular buffer manager.
//!
//! A pin-counted frame cache with a load-or-fetch-from-disk path and no
//! transaction/2PL/WAL machinery -- concurrent access and crash
//! recovery are out of scope here. The eviction policy is intentionally
//! absent: every pinned-or-not page stays cached for the process
//! lifetime and is write-through on unpin, which keeps the pin/dirty
//! protocol simple without needing a replacement algorithm.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{IndexError, IndexResult};
use crate::page_id::PageId;
use crate::support::blob_file::BlobFile;

struct Frame {
    data: Vec<u8>,
    pin_count: u32,
    dirty: bool,
}

pub struct BufMgr {
    file: BlobFile,
    frames: HashMap<PageId, Frame>,
}

impl BufMgr {
    pub fn new(file: BlobFile) -> Self {
        BufMgr { file, frames: HashMap::new() }
    }

    pub fn page_size(&self) -> usize {
        self.file.page_size()
    }

    pub fn get_first_page_no(&self) -> PageId {
        self.file.get_first_page_no()
    }

    /// `readPage`: loads (if not already cached) and pins `pid`.
    pub fn read_page(&mut self, pid: PageId) -> IndexResult<()> {
        if let Some(frame) = self.frames.get_mut(&pid) {
            frame.pin_count += 1;
            return Ok(());
        }
        let data = self.file.read_page(pid)?;
        self.frames.insert(pid, Frame { data, pin_count: 1, dirty: false });
        Ok(())
    }

    /// `allocPage`: grows the underlying file by one page and pins it.
    pub fn alloc_page(&mut self) -> IndexResult<PageId> {
        let pid = self.file.allocate_page()?;
        let data = vec![0u8; self.file.page_size()];
        self.frames.insert(pid, Frame { data, pin_count: 1, dirty: true });
        Ok(pid)
    }

    pub fn frame_bytes(&self, pid: PageId) -> IndexResult<&[u8]> {
        self.frames
            .get(&pid)
            .map(|f| f.data.as_slice())
            .ok_or(IndexError::HashNotFound)
    }

    pub fn frame_bytes_mut(&mut self, pid: PageId) -> IndexResult<&mut [u8]> {
        self.frames
            .get_mut(&pid)
            .map(|f| f.data.as_mut_slice())
            .ok_or(IndexError::HashNotFound)
    }

    /// `unPinPage(pid, dirty)`. Fails with `HashNotFound` if `pid` was
    /// never cached, or `PageNotPinned` if its pin count is already zero;
    /// `endScan` is expected to tolerate both.
    pub fn unpin_page(&mut self, pid: PageId, dirty: bool) -> IndexResult<()> {
        let frame = self.frames.get_mut(&pid).ok_or(IndexError::HashNotFound)?;
        if frame.pin_count == 0 {
            return Err(IndexError::PageNotPinned);
        }
        frame.pin_count -= 1;
        if dirty {
            frame.dirty = true;
        }
        if frame.dirty {
            // write-through: no eviction policy means frames never get
            // flushed implicitly, so persist now rather than risk losing
            // an update if the process dies before an explicit flush.
            let data = frame.data.clone();
            self.file.write_page(pid, &data)?;
            self.frames.get_mut(&pid).unwrap().dirty = false;
        }
        Ok(())
    }

    /// `flushFile`: writes all dirty frames, unpins none.
    pub fn flush_file(&mut self) -> IndexResult<()> {
        for (pid, frame) in self.frames.iter_mut() {
            if frame.dirty {
                self.file.write_page(*pid, &frame.data)?;
                frame.dirty = false;
            }
        }
        self.file.flush()?;
        debug!("flushed buffer pool");
        Ok(())
    }

    /// Total outstanding pins across all cached frames; used by pin-balance
    /// assertions and by tests.
    pub fn total_pins(&self) -> u32 {
        self.frames.values().map(|f| f.pin_count).sum()
    }

    pub fn pin_count(&self, pid: PageId) -> u32 {
        self.frames.get(&pid).map(|f| f.pin_count).unwrap_or(0)
    }
}

impl Drop for BufMgr {
    fn drop(&mut self) {
        if let Err(e) = self.flush_file() {
            warn!("buffer pool flush on drop failed: {}", e);
        }
    }
}
