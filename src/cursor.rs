//! Scan Cursor: bounded range iteration over the leaf
//! sibling chain. `Idle -> Executing -> Idle` state machine, tracked
//! explicitly as [`CursorState`] rather than a bare executing flag.
//!
//! Descent to the starting leaf mirrors insert descent but follows the
//! lower bound instead of an exact key; streaming then advances entry by
//! entry within a leaf and hops to `rightSibPageNo` at the end of each
//! leaf, checking the predicate against every key along the way.
//! [`CursorIter`] layers a standard `Iterator` adapter on top of the
//! polled `scan_next` contract for idiomatic consumption.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::error::{IndexError, IndexResult};
use crate::key::Key;
use crate::page_handle::PageHandle;
use crate::page_id::{PageId, NULL_PAGE_ID};
use crate::rid::Rid;
use crate::support::buffer_pool::BufMgr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Lte,
    Gte,
    Gt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Idle,
    Executing,
}

struct ScanRange<K: Key> {
    low_val: K,
    low_op: Operator,
    high_val: K,
    high_op: Operator,
}

impl<K: Key> ScanRange<K> {
    fn satisfies_lower(&self, key: &K) -> bool {
        match self.low_op {
            Operator::Gt => key.gt(&self.low_val),
            Operator::Gte => key.ge(&self.low_val),
            _ => unreachable!("validated at startScan"),
        }
    }

    fn satisfies_upper(&self, key: &K) -> bool {
        match self.high_op {
            Operator::Lt => key.lt(&self.high_val),
            Operator::Lte => key.le(&self.high_val),
            _ => unreachable!("validated at startScan"),
        }
    }
}

/// Bounded range scan cursor over one index's leaf chain. Not `Send`/
/// `Sync`: single-threaded, single-owner
pub struct ScanCursor<K: Key> {
    buf_mgr: Rc<RefCell<BufMgr>>,
    root_pid: PageId,
    state: CursorState,
    range: Option<ScanRange<K>>,
    current_leaf: Option<PageHandle>,
    next_entry: usize,
}

impl<K: Key> ScanCursor<K> {
    pub fn new(buf_mgr: Rc<RefCell<BufMgr>>, root_pid: PageId) -> Self {
        ScanCursor {
            buf_mgr,
            root_pid,
            state: CursorState::Idle,
            range: None,
            current_leaf: None,
            next_entry: 0,
        }
    }

    /// `startScan(lowVal, lowOp, highVal, highOp)`.
    ///
    /// A second call without an intervening `endScan` re-initializes the
    /// cursor rather than failing: the previous position is simply
    /// abandoned, and its pinned leaf (if any) is released first so no
    /// pin leaks.
    pub fn start_scan(
        &mut self,
        low_val: K,
        low_op: Operator,
        high_val: K,
        high_op: Operator,
    ) -> IndexResult<()> {
        if !matches!(low_op, Operator::Gt | Operator::Gte) {
            return Err(IndexError::BadOpcodes);
        }
        if !matches!(high_op, Operator::Lt | Operator::Lte) {
            return Err(IndexError::BadOpcodes);
        }
        if low_val.gt(&high_val) {
            return Err(IndexError::BadScanRange);
        }

        if let Some(leaf) = self.current_leaf.take() {
            leaf.release();
        }

        let range = ScanRange { low_val, low_op, high_val, high_op };
        let leaf_pid = self.descend_to_start_leaf(&range.low_val)?;
        self.current_leaf = match leaf_pid {
            Some(pid) => Some(PageHandle::read(&self.buf_mgr, pid)?),
            // canonical empty-tree root (k==0, no leaves allocated yet):
            // nothing to scan, so leave current_leaf unset and let
            // scan_next report completion immediately.
            None => None,
        };
        self.range = Some(range);
        self.next_entry = 0;
        self.state = CursorState::Executing;
        Ok(())
    }

    /// Descent mirrors insert descent but uses the lower-bound rule:
    /// smallest `pos` with `lowVal <= keyArray[pos]`. Returns `None` if
    /// the root is still the empty sentinel (`k==0`, no leaves exist).
    fn descend_to_start_leaf(&self, low_val: &K) -> IndexResult<Option<PageId>> {
        let mut node = PageHandle::read(&self.buf_mgr, self.root_pid)?;
        let root_k = node.with_internal::<K, _>(|n| n.k())?;
        if root_k == 0 {
            node.release();
            return Ok(None);
        }
        loop {
            let level = node.with_internal::<K, _>(|n| n.level())?;
            let pos = node.with_internal::<K, _>(|n| n.lower_bound_pos(low_val))?;
            let child_pid = node.with_internal::<K, _>(|n| n.child(pos))?;
            if level == 1 {
                return Ok(Some(child_pid));
            }
            node = PageHandle::read(&self.buf_mgr, child_pid)?;
        }
    }

    /// `scanNext(out rid)`.
    pub fn scan_next(&mut self) -> IndexResult<Rid> {
        if self.state != CursorState::Executing {
            return Err(IndexError::ScanNotInitialized);
        }
        if self.current_leaf.is_none() {
            // started against the empty-tree sentinel root: no leaf was
            // ever pinned, so the scan is exhausted on its first call.
            self.end_scan_after_completion();
            return Err(IndexError::IndexScanCompleted);
        }
        let range = self.range.as_ref().expect("range set whenever Executing");

        loop {
            let leaf = self.current_leaf.as_mut().expect("leaf set whenever Executing");
            let k = leaf.with_leaf::<K, _>(|n| n.k())?;

            if self.next_entry >= k as usize {
                let right_sib = leaf.with_leaf::<K, _>(|n| n.right_sib())?;
                if right_sib == NULL_PAGE_ID {
                    self.end_scan_after_completion();
                    return Err(IndexError::IndexScanCompleted);
                }
                self.current_leaf = Some(PageHandle::read(&self.buf_mgr, right_sib)?);
                self.next_entry = 0;
                continue;
            }

            let (key, rid) = leaf.with_leaf::<K, _>(|n| (n.key(self.next_entry), n.rid(self.next_entry)))?;
            if rid.is_empty_slot() {
                // defensive: a dense, deletion-free node never actually
                // produces this, but an empty slot can't be trusted as a
                // qualifying entry either way.
                self.next_entry += 1;
                continue;
            }

            if !range.satisfies_lower(&key) {
                self.next_entry += 1;
                continue;
            }
            if !range.satisfies_upper(&key) {
                self.end_scan_after_completion();
                return Err(IndexError::IndexScanCompleted);
            }

            self.next_entry += 1;
            return Ok(rid);
        }
    }

    /// `endScan()`: releases the pinned leaf, tolerating
    /// `PageNotPinned`/`HashNotFound`, and transitions to `Idle`.
    ///
    /// Idempotent after a scan has already run to completion: calling it
    /// again is `Ok(())`, not `ScanNotInitialized`.
    pub fn end_scan(&mut self) -> IndexResult<()> {
        if self.state == CursorState::Idle && self.current_leaf.is_none() {
            return Ok(());
        }
        if let Some(leaf) = self.current_leaf.take() {
            // `release` tolerates PageNotPinned/HashNotFound internally
            // (logs, does not propagate) -- exactly the endScan contract.
            leaf.release();
        }
        self.state = CursorState::Idle;
        self.range = None;
        debug!("scan ended");
        Ok(())
    }

    fn end_scan_after_completion(&mut self) {
        if let Some(leaf) = self.current_leaf.take() {
            leaf.release();
        }
        self.state = CursorState::Idle;
        self.range = None;
    }

    /// Idiomatic `Iterator` adapter over the polled `scan_next` contract.
    /// Stops at the first error, silently swallowing `IndexScanCompleted`
    /// as the natural end of iteration.
    pub fn iter(&mut self) -> CursorIter<'_, K> {
        CursorIter { cursor: self }
    }
}

impl<K: Key> Drop for ScanCursor<K> {
    fn drop(&mut self) {
        let _ = self.end_scan();
    }
}

pub struct CursorIter<'a, K: Key> {
    cursor: &'a mut ScanCursor<K>,
}

impl<'a, K: Key> Iterator for CursorIter<'a, K> {
    type Item = Rid;

    fn next(&mut self) -> Option<Rid> {
        match self.cursor.scan_next() {
            Ok(rid) => Some(rid),
            Err(_) => None,
        }
    }
}
