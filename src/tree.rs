//! Tree Engine: search descent, preemptive top-down split,
//! insertion. No post-insert rebalancing pass -- deletion/rebalancing are
//! non-goals.
//!
//! Mirrors a classic top-down preemptive-split B+-tree: on the way down,
//! any full child is split before the descent steps into it, so the
//! insert itself never needs to walk back up to fix an overfull node.
//! Each descent step holds exactly one page handle at a time (short-lived,
//! `?`-propagated), dropping it before recursing into the chosen child.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::error::IndexResult;
use crate::key::Key;
use crate::node::{max_internal_keys, max_leaf_entries, InternalNode, LeafNode};
use crate::page_handle::PageHandle;
use crate::page_id::PageId;
use crate::rid::Rid;
use crate::support::buffer_pool::BufMgr;

pub type SharedBufMgr = Rc<RefCell<BufMgr>>;

pub struct TreeEngine<K: Key> {
    buf_mgr: SharedBufMgr,
    _marker: std::marker::PhantomData<K>,
}

impl<K: Key> TreeEngine<K> {
    pub fn new(buf_mgr: SharedBufMgr) -> Self {
        TreeEngine { buf_mgr, _marker: std::marker::PhantomData }
    }

    fn page_size(&self) -> usize {
        self.buf_mgr.borrow().page_size()
    }

    /// `insertEntry(key, rid)`. `root_pid` is the caller's
    /// (the Index Lifecycle's) cached root pointer; updated in place when
    /// a root split grows the tree's height.
    pub fn insert_entry(&self, root_pid: &mut PageId, key: K, rid: Rid) -> IndexResult<()> {
        let root = PageHandle::read(&self.buf_mgr, *root_pid)?;
        let root_k = root.with_internal::<K, _>(|n| n.k())?;

        if root_k == 0 {
            self.insert_into_empty_sentinel(root, key, rid)?;
            return Ok(());
        }

        let max_keys = max_internal_keys::<K>(self.page_size());
        if root_k as usize == max_keys {
            let level = root.with_internal::<K, _>(|n| n.level())?;
            let old_root_pid = *root_pid;
            root.release();

            let mut new_root = PageHandle::alloc(&self.buf_mgr)?;
            new_root.with_bytes_mut(|buf| {
                InternalNode::<K>::init_empty(buf, level + 1);
            })?;
            new_root.with_internal_mut::<K, _>(|n| n.set_child(0, old_root_pid))?;
            self.split_child(&mut new_root, 0)?;
            *root_pid = new_root.pid();
            debug!("root split: new root page {}", new_root.pid());
            return self.descend_insert(new_root, key, rid);
        }

        self.descend_insert(root, key, rid)
    }

    fn insert_into_empty_sentinel(
        &self,
        mut root: PageHandle,
        key: K,
        rid: Rid,
    ) -> IndexResult<()> {
        let mut l0 = PageHandle::alloc(&self.buf_mgr)?;
        let mut l1 = PageHandle::alloc(&self.buf_mgr)?;

        l0.with_bytes_mut(|buf| {
            LeafNode::<K>::init_empty(buf);
        })?;
        l1.with_bytes_mut(|buf| {
            let mut leaf = LeafNode::<K>::init_empty(buf);
            leaf.insert_at(-1, key, rid);
        })?;
        l0.with_leaf_mut::<K, _>(|n| n.set_right_sib(l1.pid()))?;

        root.with_internal_mut::<K, _>(|n| {
            n.set_k(1);
            n.set_key(0, key);
            n.set_child(0, l0.pid());
            n.set_child(1, l1.pid());
        })?;
        debug!("initialized tree from empty sentinel root");
        Ok(())
    }

    /// Iterative form of `insertNonFull`: each loop turn
    /// holds exactly one internal node's pin, dropping it (via move/Drop)
    /// as the loop descends, so the pinned set stays `O(height)`
    ///.
    fn descend_insert(&self, mut node: PageHandle, key: K, rid: Rid) -> IndexResult<()> {
        loop {
            let level = node.with_internal::<K, _>(|n| n.level())?;
            let mut pos = node.with_internal::<K, _>(|n| n.descent_pos(&key))?;
            let child_pid = node.with_internal::<K, _>(|n| n.child(pos))?;

            if level == 1 {
                let child_full = {
                    let child = PageHandle::read(&self.buf_mgr, child_pid)?;
                    let full = child.with_leaf::<K, _>(|n| n.is_full())?;
                    child.release();
                    full
                };
                if child_full {
                    self.split_child(&mut node, pos)?;
                    let sep = node.with_internal::<K, _>(|n| n.key(pos))?;
                    // the promoted leaf separator is a retained copy still
                    // present at the end of the left half, so a key equal
                    // to it must also route right.
                    if key.ge(&sep) {
                        pos += 1;
                    }
                }
                let leaf_pid = node.with_internal::<K, _>(|n| n.child(pos))?;
                let mut leaf = PageHandle::read(&self.buf_mgr, leaf_pid)?;
                let insert_after = leaf.with_leaf::<K, _>(|n| n.last_le_pos(&key))?;
                leaf.with_leaf_mut::<K, _>(|n| n.insert_at(insert_after, key, rid))?;
                return Ok(());
            }

            let child_full = {
                let child = PageHandle::read(&self.buf_mgr, child_pid)?;
                let full = child.with_internal::<K, _>(|n| n.is_full())?;
                child.release();
                full
            };
            if child_full {
                self.split_child(&mut node, pos)?;
                let sep = node.with_internal::<K, _>(|n| n.key(pos))?;
                if key.gt(&sep) {
                    pos += 1;
                }
            }
            let next_pid = node.with_internal::<K, _>(|n| n.child(pos))?;
            node = PageHandle::read(&self.buf_mgr, next_pid)?;
        }
    }

    /// `splitChild(parent, c)`. `parent.child(c)` (P_L)
    /// gives up its upper half to a freshly allocated `P_R`; the promoted
    /// separator is written into `parent` at slot `c`.
    fn split_child(&self, parent: &mut PageHandle, c: usize) -> IndexResult<()> {
        let child_pid = parent.with_internal::<K, _>(|n| n.child(c))?;
        let parent_level = parent.with_internal::<K, _>(|n| n.level())?;

        let mut p_l = PageHandle::read(&self.buf_mgr, child_pid)?;
        let mut p_r = PageHandle::alloc(&self.buf_mgr)?;
        let page_size = self.page_size();

        let separator = if parent_level != 1 {
            self.split_internal(&mut p_l, &mut p_r, page_size)?
        } else {
            self.split_leaf(&mut p_l, &mut p_r, page_size)?
        };

        let p_r_pid = p_r.pid();
        parent.with_internal_mut::<K, _>(|n| {
            insert_child_and_separator(n, c, separator, p_r_pid);
        })?;
        debug!("split page {} into {} / {}", child_pid, child_pid, p_r_pid);
        Ok(())
    }

    fn split_internal(
        &self,
        p_l: &mut PageHandle,
        p_r: &mut PageHandle,
        page_size: usize,
    ) -> IndexResult<K> {
        let max_keys = max_internal_keys::<K>(page_size);
        let r_k = max_keys / 2;
        let l_new_k = (max_keys - 1) / 2;
        let start = (max_keys + 1) / 2;

        let (separator, r_keys, r_children, level) = p_l.with_internal::<K, _>(|l| {
            let mut r_keys = Vec::with_capacity(r_k);
            for i in 0..r_k {
                r_keys.push(l.key(start + i));
            }
            let mut r_children = Vec::with_capacity(r_k + 1);
            for i in 0..=r_k {
                r_children.push(l.child(start + i));
            }
            (l.key(l_new_k), r_keys, r_children, l.level())
        })?;

        p_r.with_bytes_mut(|buf| {
            InternalNode::<K>::init_empty(buf, level);
        })?;
        p_r.with_internal_mut::<K, _>(|r| {
            r.set_k(r_k as u32);
            for (i, k) in r_keys.into_iter().enumerate() {
                r.set_key(i, k);
            }
            for (i, c) in r_children.into_iter().enumerate() {
                r.set_child(i, c);
            }
        })?;
        p_l.with_internal_mut::<K, _>(|l| l.set_k(l_new_k as u32))?;

        Ok(separator)
    }

    fn split_leaf(
        &self,
        p_l: &mut PageHandle,
        p_r: &mut PageHandle,
        page_size: usize,
    ) -> IndexResult<K> {
        let max_entries = max_leaf_entries::<K>(page_size);
        let r_k = max_entries / 2;
        let l_new_k = (max_entries + 1) / 2;
        let start = (max_entries + 1) / 2;

        let (separator, r_entries, old_right_sib) = p_l.with_leaf::<K, _>(|l| {
            let mut r_entries = Vec::with_capacity(r_k);
            for i in 0..r_k {
                r_entries.push((l.key(start + i), l.rid(start + i)));
            }
            // leaf splits promote a COPY of the last key remaining on the
            // left side; it is not removed from P_L.
            (l.key(l_new_k - 1), r_entries, l.right_sib())
        })?;

        p_r.with_bytes_mut(|buf| {
            LeafNode::<K>::init_empty(buf);
        })?;
        p_r.with_leaf_mut::<K, _>(|r| {
            r.set_k(r_k as u32);
            for (i, (k, rid)) in r_entries.into_iter().enumerate() {
                r.set_key(i, k);
                r.set_rid(i, rid);
            }
            r.set_right_sib(old_right_sib);
        })?;
        p_l.with_leaf_mut::<K, _>(|l| {
            l.set_k(l_new_k as u32);
            l.set_right_sib(p_r.pid());
        })?;

        Ok(separator)
    }
}

fn insert_child_and_separator<K: Key>(
    n: &mut InternalNode<K>,
    c: usize,
    separator: K,
    new_child: PageId,
) {
    let k = n.k() as usize;
    for j in (c + 1..=k).rev() {
        let v = n.child(j);
        n.set_child(j + 1, v);
    }
    n.set_child(c + 1, new_child);
    for j in (c..k).rev() {
        let v = n.key(j);
        n.set_key(j + 1, v);
    }
    n.set_key(c, separator);
    n.set_k((k + 1) as u32);
}
