//! Page Handle.
//!
//! A scoped acquisition of a pinned frame: `PageHandle::read`/`::alloc`
//! pin; `Drop` unpins exactly once, passing along whatever `dirty` bit
//! accumulated from mutating accessors. A manual `read`/`unpin` pairing at
//! every call site is easy to get wrong under early returns and error
//! propagation; a scoped guard makes the release statically evident
//! instead of relying on every call site remembering it.
//!
//! Byte access goes through short-lived closures rather than a borrowed
//! slice tied to the handle's own lifetime: the frame lives behind the
//! shared `Rc<RefCell<BufMgr>>`, and the single-threaded, single-owner
//! model means no two such borrows are ever alive at once.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::error::IndexResult;
use crate::key::Key;
use crate::node::{InternalNode, LeafNode, MetaPage};
use crate::page_id::PageId;
use crate::support::buffer_pool::BufMgr;

pub struct PageHandle {
    buf_mgr: Rc<RefCell<BufMgr>>,
    pid: PageId,
    dirty: bool,
    released: bool,
}

impl PageHandle {
    pub fn read(buf_mgr: &Rc<RefCell<BufMgr>>, pid: PageId) -> IndexResult<Self> {
        buf_mgr.borrow_mut().read_page(pid)?;
        Ok(PageHandle { buf_mgr: buf_mgr.clone(), pid, dirty: false, released: false })
    }

    /// Allocates a fresh page. Freshly allocated pages are born dirty:
    /// they must be written at least once before eviction for the zeroed
    /// image on disk to mean anything.
    pub fn alloc(buf_mgr: &Rc<RefCell<BufMgr>>) -> IndexResult<Self> {
        let pid = buf_mgr.borrow_mut().alloc_page()?;
        Ok(PageHandle { buf_mgr: buf_mgr.clone(), pid, dirty: true, released: false })
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> IndexResult<R> {
        let mgr = self.buf_mgr.borrow();
        let bytes = mgr.frame_bytes(self.pid)?;
        Ok(f(bytes))
    }

    pub fn with_bytes_mut<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> IndexResult<R> {
        self.dirty = true;
        let mut mgr = self.buf_mgr.borrow_mut();
        let bytes = mgr.frame_bytes_mut(self.pid)?;
        Ok(f(bytes))
    }

    pub fn with_internal<K: Key, R>(&self, f: impl FnOnce(&InternalNode<K>) -> R) -> IndexResult<R> {
        let mgr = self.buf_mgr.borrow();
        let bytes = mgr.frame_bytes(self.pid)?;
        let mut owned = bytes.to_vec();
        let node = InternalNode::<K>::from_page(&mut owned);
        Ok(f(&node))
    }

    pub fn with_internal_mut<K: Key, R>(
        &mut self,
        f: impl FnOnce(&mut InternalNode<K>) -> R,
    ) -> IndexResult<R> {
        self.dirty = true;
        let mut mgr = self.buf_mgr.borrow_mut();
        let bytes = mgr.frame_bytes_mut(self.pid)?;
        let mut node = InternalNode::<K>::from_page(bytes);
        Ok(f(&mut node))
    }

    pub fn with_leaf<K: Key, R>(&self, f: impl FnOnce(&LeafNode<K>) -> R) -> IndexResult<R> {
        let mgr = self.buf_mgr.borrow();
        let bytes = mgr.frame_bytes(self.pid)?;
        let mut owned = bytes.to_vec();
        let node = LeafNode::<K>::from_page(&mut owned);
        Ok(f(&node))
    }

    pub fn with_leaf_mut<K: Key, R>(
        &mut self,
        f: impl FnOnce(&mut LeafNode<K>) -> R,
    ) -> IndexResult<R> {
        self.dirty = true;
        let mut mgr = self.buf_mgr.borrow_mut();
        let bytes = mgr.frame_bytes_mut(self.pid)?;
        let mut node = LeafNode::<K>::from_page(bytes);
        Ok(f(&mut node))
    }

    pub fn with_meta_mut<R>(&mut self, f: impl FnOnce(&mut MetaPage) -> R) -> IndexResult<R> {
        self.dirty = true;
        let mut mgr = self.buf_mgr.borrow_mut();
        let bytes = mgr.frame_bytes_mut(self.pid)?;
        let mut meta = MetaPage::from_page(bytes);
        Ok(f(&mut meta))
    }

    pub fn with_meta<R>(&self, f: impl FnOnce(&MetaPage) -> R) -> IndexResult<R> {
        let mgr = self.buf_mgr.borrow();
        let bytes = mgr.frame_bytes(self.pid)?;
        let mut owned = bytes.to_vec();
        let meta = MetaPage::from_page(&mut owned);
        Ok(f(&meta))
    }

    /// Releases the pin early instead of waiting for `Drop`. Used on the
    /// insert-descent path, where a parent must be unpinned before its
    /// child is read so the pinned-page count stays `O(height)` rather
    /// than `O(height^2)`.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.buf_mgr.borrow_mut().unpin_page(self.pid, self.dirty) {
            // endScan tolerates NotPinned/HashNotFound explicitly; every
            // other call path only reaches here on a logic error, which we
            // surface as a log line rather than panicking in a destructor.
            warn!("unpin({}) on release: {}", self.pid, e);
        }
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}
