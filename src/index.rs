//! Index Lifecycle: open-or-create, meta-page management,
//! bulk build from a relation scan, teardown/flush.
//!
//! Opening branches on whether the backing file already exists: a fresh
//! file gets an initialized meta page and an empty sentinel root before
//! the bulk-build loop runs; an existing file just reads its meta page
//! back. Bulk build drives the relation scan to `EndOfFile` and feeds
//! every record through the same `insert_entry` path a later live insert
//! would use.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::info;

use crate::cursor::{Operator, ScanCursor};
use crate::error::{IndexError, IndexResult};
use crate::key::Key;
use crate::node::{InternalNode, MetaPage};
use crate::page_handle::PageHandle;
use crate::page_id::{PageId, HEADER_PAGE_NUM};
use crate::rid::Rid;
use crate::support::blob_file::BlobFile;
use crate::support::buffer_pool::BufMgr;
use crate::support::relation_scan::FileScan;
use crate::tree::{SharedBufMgr, TreeEngine};

/// Default page size for both the index file and any relation file it
/// bulk-builds from.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

pub struct BTreeIndex<K: Key> {
    buf_mgr: SharedBufMgr,
    root_pid: PageId,
    relation_name: String,
    attr_byte_offset: u32,
    index_name: String,
    page_size: usize,
    tree: TreeEngine<K>,
    cursor: ScanCursor<K>,
}

impl<K: Key> BTreeIndex<K> {
    /// Index name is derived deterministically:
    /// `"<relationName>.<attrByteOffset>"`.
    pub fn index_file_name(relation_name: &str, attr_byte_offset: u32) -> String {
        format!("{}.{}", relation_name, attr_byte_offset)
    }

    /// Opens an existing index under `dir`, or creates one and bulk-builds
    /// it from `relation_path` (a fixed-record relation file laid out per
    /// [`crate::support::relation_scan::FileScan`]).
    pub fn open_or_create(
        dir: &Path,
        relation_name: &str,
        attr_byte_offset: u32,
        relation_path: &Path,
        relation_record_len: usize,
    ) -> IndexResult<Self> {
        let index_name = Self::index_file_name(relation_name, attr_byte_offset);
        let index_path: PathBuf = dir.join(&index_name);
        let page_size = DEFAULT_PAGE_SIZE;

        if BlobFile::exists(&index_path) {
            Self::open(&index_path, relation_name, attr_byte_offset, index_name, page_size)
        } else {
            Self::create(
                &index_path,
                relation_name,
                attr_byte_offset,
                index_name,
                page_size,
                relation_path,
                relation_record_len,
            )
        }
    }

    fn open(
        index_path: &Path,
        relation_name: &str,
        attr_byte_offset: u32,
        index_name: String,
        page_size: usize,
    ) -> IndexResult<Self> {
        let blob = BlobFile::open(index_path, false, page_size)?;
        let buf_mgr: SharedBufMgr = Rc::new(RefCell::new(BufMgr::new(blob)));
        let first = buf_mgr.borrow().get_first_page_no();

        let mut meta_handle = PageHandle::read(&buf_mgr, first)?;
        let (root_pid, datatype_ok) = meta_handle.with_meta(|m| {
            (m.root_page_no(), m.attr_type() == Some(K::DATATYPE))
        })?;
        meta_handle.release();

        if !datatype_ok {
            return Err(IndexError::BadIndexInfo);
        }

        info!("opened index {} at root page {}", index_name, root_pid);
        let tree = TreeEngine::new(buf_mgr.clone());
        let cursor = ScanCursor::new(buf_mgr.clone(), root_pid);
        Ok(BTreeIndex {
            buf_mgr,
            root_pid,
            relation_name: relation_name.to_string(),
            attr_byte_offset,
            index_name,
            page_size,
            tree,
            cursor,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        index_path: &Path,
        relation_name: &str,
        attr_byte_offset: u32,
        index_name: String,
        page_size: usize,
        relation_path: &Path,
        relation_record_len: usize,
    ) -> IndexResult<Self> {
        let blob = BlobFile::open(index_path, true, page_size)?;
        let buf_mgr: SharedBufMgr = Rc::new(RefCell::new(BufMgr::new(blob)));

        let meta_handle = PageHandle::alloc(&buf_mgr)?;
        debug_assert_eq!(meta_handle.pid(), HEADER_PAGE_NUM);
        meta_handle.release();

        let mut root_handle = PageHandle::alloc(&buf_mgr)?;
        root_handle.with_bytes_mut(|buf| {
            InternalNode::<K>::init_empty(buf, 1);
        })?;
        let root_pid = root_handle.pid();
        root_handle.release();

        let tree = TreeEngine::new(buf_mgr.clone());
        let cursor = ScanCursor::new(buf_mgr.clone(), root_pid);
        let mut index = BTreeIndex {
            buf_mgr,
            root_pid,
            relation_name: relation_name.to_string(),
            attr_byte_offset,
            index_name,
            page_size,
            tree,
            cursor,
        };

        index.bulk_build(relation_path, relation_record_len)?;
        index.write_meta()?;
        info!("created index {} at root page {}", index.index_name, index.root_pid);
        Ok(index)
    }

    fn write_meta(&mut self) -> IndexResult<()> {
        let relation_name = self.relation_name.clone();
        let attr_byte_offset = self.attr_byte_offset;
        let root_pid = self.root_pid;
        let mut meta_handle = PageHandle::read(&self.buf_mgr, HEADER_PAGE_NUM)?;
        meta_handle.with_bytes_mut(|buf| {
            MetaPage::init(buf, &relation_name, attr_byte_offset, K::DATATYPE, root_pid);
        })?;
        Ok(())
    }

    /// Iterates the external relation scanner, extracting the key at
    /// `attrByteOffset` from each record and calling `insertEntry`.
    /// Termination is signaled by `EndOfFile`, caught here to end the
    /// build cleanly.
    fn bulk_build(&mut self, relation_path: &Path, record_len: usize) -> IndexResult<()> {
        let mut scan = FileScan::open(relation_path, self.page_size, record_len)?;
        loop {
            let rid = match scan.scan_next() {
                Ok(rid) => rid,
                Err(IndexError::EndOfFile) => break,
                Err(e) => return Err(e),
            };
            let record = scan.get_record(rid)?;
            let offset = self.attr_byte_offset as usize;
            let key = K::read_from(&record[offset..offset + K::ENCODED_LEN]);
            self.insert_entry(key, rid)?;
        }
        Ok(())
    }

    /// `insertEntry(key, rid)` (public contract, exposed here
    /// at the lifecycle level since the meta page's `rootPageNo` must stay
    /// in sync with any root split the Tree Engine performs).
    pub fn insert_entry(&mut self, key: K, rid: Rid) -> IndexResult<()> {
        let old_root = self.root_pid;
        self.tree.insert_entry(&mut self.root_pid, key, rid)?;
        if self.root_pid != old_root {
            self.write_meta()?;
        }
        Ok(())
    }

    /// `startScan(lowVal, lowOp, highVal, highOp)`.
    pub fn start_scan(
        &mut self,
        low_val: K,
        low_op: Operator,
        high_val: K,
        high_op: Operator,
    ) -> IndexResult<()> {
        // Fresh cursor each call: picks up the current root in case a
        // root split happened since the last scan.
        self.cursor = ScanCursor::new(self.buf_mgr.clone(), self.root_pid);
        self.cursor.start_scan(low_val, low_op, high_val, high_op)
    }

    pub fn scan_next(&mut self) -> IndexResult<Rid> {
        self.cursor.scan_next()
    }

    pub fn end_scan(&mut self) -> IndexResult<()> {
        self.cursor.end_scan()
    }

    pub fn scan_iter(&mut self) -> impl Iterator<Item = Rid> + '_ {
        self.cursor.iter()
    }

    pub fn root_page_no(&self) -> PageId {
        self.root_pid
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Total pins outstanding across the buffer manager; zero at every
    /// public-call boundary other than mid-scan.
    pub fn outstanding_pins(&self) -> u32 {
        self.buf_mgr.borrow().total_pins()
    }

    /// Flushes all dirty pages and releases the file handle. No error
    /// from this point may propagate out of a destructor;
    /// callers that need to observe flush failures should call this
    /// explicitly rather than rely on `Drop`.
    pub fn close(self) -> IndexResult<()> {
        self.buf_mgr.borrow_mut().flush_file()
    }
}
