// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use alloc::vec::Vec;
use core::{fmt, mem};
use core::sync::atomic::{AtomicUsize, Ordering};

use slot_pool::{AllocError, FreeListPool, RawRegion};

use crate::compare::{Compare, Natural};
use crate::iter::{Cursor, Iter, Position};
use crate::node::{Link, Links, Node, NodeRef, Side};
use crate::thread::{self, LinkStore};

/// A pool that serves the nodes of [`ThreadedTree`]s with keys of type `T`.
pub type NodePool<'buf, T> = FreeListPool<'buf, Node<T>>;

/// Returns a stamp that no tree has used before.
///
/// Every tree carries a stamp that is replaced whenever its nodes are freed,
/// so [`Position`]s taken before that point are recognized as stale.
fn next_stamp() -> usize {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// An unbalanced, threaded binary search tree whose nodes live in a
/// [`NodePool`].
///
/// Missing children are replaced by *threads* to the node's inorder
/// predecessor and successor. This lets cursors and iterators walk the tree
/// in both directions without recursion, a stack or parent pointers.
///
/// The tree does not own its nodes' memory. It holds a handle to a pool that
/// may be shared with other trees, and every insertion takes a slot from that
/// pool. Running out of slots is an expected condition: [`insert`] reports it
/// through its return value instead of panicking.
///
/// Keys are unique with respect to the comparator `C` and are never mutated
/// or removed individually, only [`clear`] releases nodes.
///
/// The tree is deliberately not rebalanced, inserting keys in sorted order
/// degenerates it into a list.
///
/// [`insert`]: ThreadedTree::insert
/// [`clear`]: ThreadedTree::clear
pub struct ThreadedTree<'buf, T, C = Natural> {
    pool: NodePool<'buf, T>,
    /// Links of the sentinel. The sentinel has no key and is not part of the
    /// pool.
    head: Links,
    len: usize,
    stamp: usize,
    comp: C,
}

impl<'buf, T> ThreadedTree<'buf, T> {
    /// Creates an empty tree that allocates its nodes from `pool`.
    pub fn new_in(pool: &NodePool<'buf, T>) -> Self {
        Self::with_comparator_in(pool, Natural)
    }

    /// Creates a tree from the keys of `iter`, allocating from `pool`.
    ///
    /// Duplicate keys are skipped. Once the pool is exhausted the remaining
    /// keys are dropped as well, check [`len`](Self::len) if that matters.
    pub fn from_iter_in<I>(iter: I, pool: &NodePool<'buf, T>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Ord,
    {
        let mut tree = Self::new_in(pool);
        for key in iter {
            tree.insert(key);
        }
        tree
    }

    /// Creates an empty tree together with a pool laid out over `region`.
    ///
    /// Use [`ThreadedTree::pool`] to share the pool with other trees.
    pub fn from_region(region: RawRegion<'buf>) -> Self {
        Self::new_in(&region.rebind())
    }
}

impl<'buf, T, C> ThreadedTree<'buf, T, C> {
    /// Creates an empty tree ordered by `comp` that allocates its nodes from
    /// `pool`.
    pub fn with_comparator_in(pool: &NodePool<'buf, T>, comp: C) -> Self {
        Self {
            pool: pool.clone(),
            head: Links::EMPTY_HEAD,
            len: 0,
            stamp: next_stamp(),
            comp,
        }
    }

    /// Returns the pool this tree allocates from.
    #[inline]
    pub fn pool(&self) -> &NodePool<'buf, T> {
        &self.pool
    }

    /// Returns the comparator ordering this tree.
    #[inline]
    pub fn comparator(&self) -> &C {
        &self.comp
    }

    /// Returns the number of keys in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree contains no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        debug_assert_eq!(self.head.left.child().is_none(), self.len == 0);
        self.len == 0
    }

    /// Returns a cursor pointing at the smallest key, or at the end if the
    /// tree is empty.
    #[inline]
    pub fn begin(&self) -> Cursor<'_, 'buf, T, C> {
        Cursor {
            current: thread::inorder_successor(self, NodeRef::HEAD),
            tree: self,
        }
    }

    /// Returns a cursor pointing at the end, one past the largest key.
    ///
    /// Moving the end cursor forward wraps around to the smallest key, moving
    /// it backward lands on the largest key.
    #[inline]
    pub fn end(&self) -> Cursor<'_, 'buf, T, C> {
        Cursor {
            current: NodeRef::HEAD,
            tree: self,
        }
    }

    /// Returns an iterator over the keys in ascending order.
    ///
    /// The iterator is double ended, use [`Iterator::rev`] for descending
    /// order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, 'buf, T, C> {
        Iter {
            front: thread::inorder_successor(self, NodeRef::HEAD),
            back: thread::inorder_predecessor(self, NodeRef::HEAD),
            remaining: self.len,
            tree: self,
        }
    }

    /// Returns the smallest key.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.begin().get()
    }

    /// Returns the largest key.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.end().peek_prev()
    }

    /// Returns the key at `pos`.
    ///
    /// Returns `None` for the end position, for [`Position::INVALID`], and
    /// for positions that were taken from another tree or before the last
    /// [`clear`](Self::clear).
    pub fn get(&self, pos: Position) -> Option<&T> {
        self.cursor_at(pos)?.get()
    }

    /// Returns a cursor pointing at `pos`, or `None` if `pos` does not belong
    /// to this tree (see [`get`](Self::get)).
    pub fn cursor_at(&self, pos: Position) -> Option<Cursor<'_, 'buf, T, C>> {
        if pos.stamp != self.stamp || !pos.is_valid() {
            return None;
        }

        Some(Cursor {
            current: pos.node,
            tree: self,
        })
    }

    /// Removes every key, returning all nodes to the pool.
    ///
    /// Invalidates every [`Position`] taken from this tree. If the destructor
    /// of a key panics, the remaining nodes are still freed and the tree is
    /// left empty.
    pub fn clear(&mut self) {
        let freed = self.len;
        let first = thread::inorder_successor(self, NodeRef::HEAD);

        // Unlink everything before any key is dropped, so an unwinding key
        // destructor can't leave the tree pointing at dropped keys.
        self.head = Links::EMPTY_HEAD;
        self.len = 0;
        self.stamp = next_stamp();

        let mut detached = Detached {
            tree: self,
            next: first,
        };
        while let Some(node) = detached.pop() {
            let guard = DropGuard(&mut detached);
            // SAFETY: `node` was part of this tree, and `pop` hands out every
            // detached node exactly once.
            unsafe {
                guard.0.tree.free_node(node);
            }
            mem::forget(guard);
        }

        if freed > 0 {
            tracing::trace!(freed, "cleared tree");
        }
    }

    /// Replaces the contents of `other` with a copy of this tree.
    ///
    /// `other` is cleared first and then switched over to this tree's pool
    /// and comparator. The copy has the same shape as this tree and is built
    /// in a single preorder pass, no comparisons are made.
    ///
    /// The copy is all-or-nothing: if the pool runs out of slots halfway
    /// through, the nodes copied so far are released again and `other` is
    /// left empty.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if the pool cannot hold a full copy.
    pub fn copy_into(&self, other: &mut Self) -> Result<(), AllocError>
    where
        T: Clone,
        C: Clone,
    {
        other.clear();
        other.pool = self.pool.clone();
        other.comp = self.comp.clone();

        // Walk both trees in lock-step preorder. Every node of `other` is
        // attached while visiting its parent, so by the time the walk reaches
        // a node its counterpart already exists.
        let mut src = NodeRef::HEAD;
        let mut dst = NodeRef::HEAD;
        loop {
            if let Link::Child(left) = self.links(src).left {
                other.copy_child(self, left, dst, Side::Left)?;
            }

            src = thread::preorder_successor(self, src);
            dst = thread::preorder_successor(&*other, dst);
            if src.is_head() {
                break;
            }

            if let Link::Child(right) = self.links(src).right {
                other.copy_child(self, right, dst, Side::Right)?;
            }
        }

        debug_assert_eq!(other.len, self.len);
        tracing::trace!(len = other.len, "copied tree");
        Ok(())
    }

    /// Returns a copy of this tree that shares its pool.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if the pool cannot hold a full copy.
    pub fn try_clone(&self) -> Result<Self, AllocError>
    where
        T: Clone,
        C: Clone,
    {
        let mut out = Self::with_comparator_in(&self.pool, self.comp.clone());
        self.copy_into(&mut out)?;
        Ok(out)
    }

    /// Clones the key of `source_node` into a new node attached to `parent`.
    /// Rolls the whole tree back if the pool is exhausted.
    fn copy_child(
        &mut self,
        source: &Self,
        source_node: NodeRef,
        parent: NodeRef,
        side: Side,
    ) -> Result<(), AllocError>
    where
        T: Clone,
    {
        // SAFETY: `source_node` is a child of a node of `source`.
        let key = unsafe { source.node(source_node) }.key.clone();

        match self.alloc_node(key) {
            Ok(child) => {
                self.link_new(parent, child, side);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(
                    copied = self.len,
                    total = source.len,
                    "pool exhausted while copying, rolling back"
                );
                self.clear();
                Err(err)
            }
        }
    }

    /// Links the freshly allocated `child` below `parent`.
    fn link_new(&mut self, parent: NodeRef, child: NodeRef, side: Side) {
        match side {
            Side::Left => thread::attach_left(self, parent, child),
            Side::Right => thread::attach_right(self, parent, child),
        }
        self.len += 1;
    }

    /// Returns the position of `node`.
    #[inline]
    pub(crate) fn position(&self, node: NodeRef) -> Position {
        Position {
            node,
            stamp: self.stamp,
        }
    }

    /// Returns the node behind `node`.
    ///
    /// # Safety
    ///
    /// `node` must not be the sentinel and must be reachable from this tree,
    /// either directly or through a thread.
    #[inline]
    pub(crate) unsafe fn node(&self, node: NodeRef) -> &Node<T> {
        debug_assert!(!node.is_head());

        // SAFETY: reachable nodes live in slots of `self.pool` and were
        // initialized by `alloc_node`.
        unsafe { self.pool.as_ptr_unchecked(node.offset()).as_ref() }
    }

    /// Moves `key` into a fresh, detached node.
    fn alloc_node(&self, key: T) -> Result<NodeRef, AllocError> {
        let slot = self.pool.allocate()?;

        // SAFETY: the slot was just allocated from this pool and is sized and
        // aligned for a `Node<T>`.
        unsafe {
            self.pool.as_ptr_unchecked(slot.offset()).write(Node {
                links: Links::DETACHED,
                key,
            });
        }

        Ok(NodeRef::from_offset(slot.into_offset()))
    }

    /// Returns the slot of `node` to the pool and drops its key.
    ///
    /// # Safety
    ///
    /// `node` must be a live node of this tree that is never accessed again.
    unsafe fn free_node(&self, node: NodeRef) {
        // SAFETY: ensured by caller, the node's slot is allocated and no other
        // handle to it exists.
        let slot = unsafe { self.pool.slot_at(node.offset()) };
        // SAFETY: the slot holds the node written by `alloc_node`.
        let node = unsafe { self.pool.destroy(&slot) };

        // Return the slot before the key's destructor runs, a panicking
        // destructor must not leak it.
        let res = self.pool.deallocate(slot);
        debug_assert!(res.is_ok(), "node slot rejected by its own pool: {res:?}");

        drop(node);
    }

    /// Checks the structure of the tree, panicking if it is corrupted.
    ///
    /// The threads of every node are compared against a reference inorder
    /// traversal that only follows child links, keys are checked to be
    /// strictly ascending, and the threaded walks in both directions must
    /// visit exactly the nodes of the reference traversal.
    ///
    /// # Panics
    ///
    /// Panics if any of the above does not hold.
    pub fn assert_valid(&self)
    where
        C: Compare<T>,
    {
        assert_eq!(
            self.head.right,
            Link::Child(NodeRef::HEAD),
            "sentinel must close the thread ring"
        );

        let mut inorder = Vec::with_capacity(self.len);
        if let Link::Thread(target) = self.head.left {
            assert!(target.is_head(), "empty tree threads to {target:?}");
        }
        self.collect_inorder(&mut inorder);
        assert_eq!(inorder.len(), self.len, "tree length is out of sync");

        for (i, &node) in inorder.iter().enumerate() {
            let links = self.links(node);
            let prev = if i == 0 { NodeRef::HEAD } else { inorder[i - 1] };
            let next = inorder.get(i + 1).copied().unwrap_or(NodeRef::HEAD);

            if links.left.is_thread() {
                assert_eq!(
                    links.left.target(),
                    prev,
                    "left thread of {node:?} must point to its predecessor"
                );
            }
            if links.right.is_thread() {
                assert_eq!(
                    links.right.target(),
                    next,
                    "right thread of {node:?} must point to its successor"
                );
            }

            if !prev.is_head() {
                // SAFETY: both nodes were reached through child links.
                let (a, b) = unsafe { (&self.node(prev).key, &self.node(node).key) };
                assert!(self.comp.less(a, b), "keys of {prev:?} and {node:?} out of order");
            }
        }

        let mut forward = Vec::with_capacity(self.len);
        let mut curr = thread::inorder_successor(self, NodeRef::HEAD);
        while !curr.is_head() {
            assert!(forward.len() < self.len, "forward walk does not terminate");
            forward.push(curr);
            curr = thread::inorder_successor(self, curr);
        }
        assert_eq!(forward, inorder, "forward walk disagrees with the tree shape");

        let mut backward = Vec::with_capacity(self.len);
        let mut curr = thread::inorder_predecessor(self, NodeRef::HEAD);
        while !curr.is_head() {
            assert!(backward.len() < self.len, "backward walk does not terminate");
            backward.push(curr);
            curr = thread::inorder_predecessor(self, curr);
        }
        backward.reverse();
        assert_eq!(backward, inorder, "backward walk disagrees with the tree shape");
    }

    /// Collects the nodes in inorder by following child links only.
    ///
    /// Uses an explicit stack, the tree is unbalanced and may be as deep as it
    /// is long.
    fn collect_inorder(&self, out: &mut Vec<NodeRef>) {
        let mut stack = Vec::new();
        let mut curr = self.head.left.child();
        loop {
            while let Some(node) = curr {
                stack.push(node);
                curr = self.links(node).left.child();
            }

            let Some(node) = stack.pop() else {
                break;
            };
            out.push(node);
            curr = self.links(node).right.child();
        }
    }
}

/// The nodes `clear` has unlinked from the sentinel but not freed yet.
///
/// The nodes keep their links, so they are still walked in order through
/// their threads. The walk ends at the thread of the last node, which points
/// to the sentinel.
struct Detached<'t, 'buf, T, C> {
    tree: &'t ThreadedTree<'buf, T, C>,
    next: NodeRef,
}

impl<T, C> Detached<'_, '_, T, C> {
    fn pop(&mut self) -> Option<NodeRef> {
        if self.next.is_head() {
            return None;
        }

        let node = self.next;
        // The successor has to be found before the node is gone.
        self.next = thread::inorder_successor(self.tree, node);
        Some(node)
    }
}

/// Keeps freeing detached nodes while a key destructor unwinds.
struct DropGuard<'a, 't, 'buf, T, C>(&'a mut Detached<'t, 'buf, T, C>);

impl<T, C> Drop for DropGuard<'_, '_, '_, T, C> {
    fn drop(&mut self) {
        while let Some(node) = self.0.pop() {
            // SAFETY: see `ThreadedTree::clear`.
            unsafe {
                self.0.tree.free_node(node);
            }
        }
    }
}

impl<'buf, T, C: Compare<T>> ThreadedTree<'buf, T, C> {
    /// Inserts `key`, returning its position and whether it was inserted.
    ///
    /// - If an equal key is already present, its position is returned along
    ///   with `false` and nothing is allocated.
    /// - If the pool is exhausted, [`Position::INVALID`] is returned along
    ///   with `false` and `key` is dropped.
    /// - Otherwise the key is placed in a new leaf and its position is
    ///   returned along with `true`.
    ///
    /// Positions of other keys stay valid.
    pub fn insert(&mut self, key: T) -> (Position, bool) {
        let mut parent = NodeRef::HEAD;
        let mut side = Side::Left;

        if let Link::Child(root) = self.head.left {
            let mut curr = root;
            loop {
                // SAFETY: `curr` was reached through child links.
                let node = unsafe { self.node(curr) };

                let dir = if self.comp.less(&key, &node.key) {
                    Side::Left
                } else if self.comp.less(&node.key, &key) {
                    Side::Right
                } else {
                    return (self.position(curr), false);
                };

                match node.links.get(dir) {
                    Link::Child(next) => curr = next,
                    Link::Thread(_) => {
                        parent = curr;
                        side = dir;
                        break;
                    }
                }
            }
        }

        let Ok(child) = self.alloc_node(key) else {
            tracing::trace!(len = self.len, "insert failed, pool exhausted");
            return (Position::INVALID, false);
        };

        tracing::trace!(?parent, %side, ?child, "attaching new node");
        self.link_new(parent, child, side);

        (self.position(child), true)
    }

    /// Returns the position of the key equal to `key`.
    pub fn find(&self, key: &T) -> Option<Position> {
        let mut curr = self.head.left.child()?;
        loop {
            // SAFETY: `curr` was reached through child links.
            let node = unsafe { self.node(curr) };

            let link = if self.comp.less(key, &node.key) {
                node.links.left
            } else if self.comp.less(&node.key, key) {
                node.links.right
            } else {
                return Some(self.position(curr));
            };

            curr = link.child()?;
        }
    }

    /// Returns `true` if the tree contains a key equal to `key`.
    #[inline]
    pub fn contains(&self, key: &T) -> bool {
        self.find(key).is_some()
    }
}

impl<T, C> LinkStore for ThreadedTree<'_, T, C> {
    #[inline]
    fn links(&self, node: NodeRef) -> Links {
        if node.is_head() {
            return self.head;
        }

        // SAFETY: links only ever refer to the sentinel or to live nodes of
        // this tree.
        unsafe { self.node(node).links }
    }

    #[inline]
    fn set_links(&mut self, node: NodeRef, links: Links) {
        if node.is_head() {
            self.head = links;
            return;
        }

        // SAFETY: as above. `&mut self` guarantees that no reference into the
        // node is alive, and only the links field is written.
        unsafe {
            let ptr = self.pool.as_ptr_unchecked(node.offset()).as_ptr();
            (*ptr).links = links;
        }
    }
}

impl<T, C> Drop for ThreadedTree<'_, T, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: fmt::Debug, C> fmt::Debug for ThreadedTree<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C> PartialEq for ThreadedTree<'_, T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C> Eq for ThreadedTree<'_, T, C> {}

impl<'a, 'buf, T, C> IntoIterator for &'a ThreadedTree<'buf, T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, 'buf, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reverse;

    fn buffer(slots: usize) -> Vec<u8> {
        vec![0u8; NodePool::<u32>::required_bytes(slots)]
    }

    #[test]
    fn empty_tree() {
        let mut buf = buffer(1);
        let tree = ThreadedTree::<u32>::from_region(RawRegion::new(&mut buf));

        assert!(tree.is_empty());
        assert_eq!(tree.begin(), tree.end());
        assert_eq!(tree.first(), None);
        assert_eq!(tree.last(), None);
        assert_eq!(tree.head, Links::EMPTY_HEAD);
        tree.assert_valid();
    }

    #[test]
    fn root_links() {
        let mut buf = buffer(1);
        let mut tree = ThreadedTree::<u32>::from_region(RawRegion::new(&mut buf));

        let (pos, inserted) = tree.insert(7);
        assert!(inserted);

        let root = tree.head.left.child().unwrap();
        assert_eq!(root, pos.node);
        assert_eq!(tree.links(root).left, Link::Thread(NodeRef::HEAD));
        assert_eq!(tree.links(root).right, Link::Thread(NodeRef::HEAD));
        tree.assert_valid();
    }

    #[test]
    fn duplicate_does_not_allocate() {
        let mut buf = buffer(4);
        let mut tree = ThreadedTree::<u32>::from_region(RawRegion::new(&mut buf));

        let (first, _) = tree.insert(1);
        let free = tree.pool().free_slots();

        let (again, inserted) = tree.insert(1);
        assert!(!inserted);
        assert_eq!(first, again);
        assert_eq!(tree.pool().free_slots(), free);
    }

    #[test]
    fn custom_comparator() {
        let mut buf = buffer(8);
        let pool: NodePool<'_, u32> = RawRegion::new(&mut buf).rebind();
        let mut tree = ThreadedTree::with_comparator_in(&pool, Reverse);

        for key in [3, 1, 4, 5, 9, 2, 6] {
            tree.insert(key);
        }

        tree.assert_valid();
        assert!(tree.iter().copied().eq([9, 6, 5, 4, 3, 2, 1]));
    }

    #[test]
    fn closure_comparator() {
        let mut buf = buffer(8);
        let pool: NodePool<'_, u32> = RawRegion::new(&mut buf).rebind();
        // Keys are equal if they share the same last digit.
        let mut tree = ThreadedTree::with_comparator_in(&pool, |a: &u32, b: &u32| a % 10 < b % 10);

        assert!(tree.insert(13).1);
        assert!(tree.insert(21).1);
        assert!(!tree.insert(33).1);

        tree.assert_valid();
        assert!(tree.iter().copied().eq([21, 13]));
    }

    #[test]
    fn stale_positions_resolve_to_none() {
        let mut buf = buffer(4);
        let mut tree = ThreadedTree::<u32>::from_region(RawRegion::new(&mut buf));

        let (pos, _) = tree.insert(1);
        assert_eq!(tree.get(pos), Some(&1));

        tree.clear();
        tree.insert(2);
        assert_eq!(tree.get(pos), None);
        assert_eq!(tree.get(Position::INVALID), None);
    }

    #[test]
    fn positions_of_other_trees_are_rejected() {
        let mut buf = buffer(4);
        let pool: NodePool<'_, u32> = RawRegion::new(&mut buf).rebind();
        let mut a = ThreadedTree::new_in(&pool);
        let mut b = ThreadedTree::new_in(&pool);

        let (pos, _) = a.insert(1);
        b.insert(1);
        assert_eq!(a.get(pos), Some(&1));
        assert_eq!(b.get(pos), None);
    }

    fn preorder<C>(tree: &ThreadedTree<'_, u32, C>) -> Vec<u32> {
        let mut out = Vec::new();
        let mut curr = thread::preorder_successor(tree, NodeRef::HEAD);
        while !curr.is_head() {
            // SAFETY: reached by walking the tree.
            out.push(unsafe { tree.node(curr) }.key);
            curr = thread::preorder_successor(tree, curr);
        }
        out
    }

    #[test]
    fn copy_keeps_shape() {
        let mut buf = buffer(12);
        let pool: NodePool<'_, u32> = RawRegion::new(&mut buf).rebind();
        let src = ThreadedTree::from_iter_in([5, 3, 8, 1, 4, 9], &pool);

        let copy = src.try_clone().unwrap();
        copy.assert_valid();
        assert_eq!(preorder(&src), [5, 3, 1, 4, 8, 9]);
        assert_eq!(preorder(&copy), preorder(&src));
    }

    #[test]
    fn failed_copy_rolls_back() {
        let mut buf = buffer(5);
        let pool: NodePool<'_, u32> = RawRegion::new(&mut buf).rebind();
        let mut src = ThreadedTree::new_in(&pool);
        for key in [3, 1, 5] {
            src.insert(key);
        }

        // Only two slots are left, the copy needs three.
        let mut dst = ThreadedTree::new_in(&pool);
        assert_eq!(src.copy_into(&mut dst), Err(AllocError));

        assert!(dst.is_empty());
        dst.assert_valid();
        assert_eq!(pool.free_slots(), 2);
    }
}
