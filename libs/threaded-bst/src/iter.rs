// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::fmt;
use core::iter::FusedIterator;
use core::ptr;

use crate::compare::Natural;
use crate::node::NodeRef;
use crate::thread;
use crate::tree::ThreadedTree;

/// The location of a key inside a [`ThreadedTree`].
///
/// Positions are plain values that do not borrow the tree. They stay valid
/// until the tree is cleared, after which [`ThreadedTree::get`] no longer
/// resolves them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub(crate) node: NodeRef,
    pub(crate) stamp: usize,
}

impl Position {
    /// The position returned when an insertion fails. It never resolves to a
    /// key.
    pub const INVALID: Self = Self {
        node: NodeRef::HEAD,
        stamp: usize::MAX,
    };

    /// Returns `true` if this position refers to a key rather than the end of
    /// a tree or a failed insertion.
    #[inline]
    pub fn is_valid(self) -> bool {
        !self.node.is_head()
    }
}

/// A cursor over the keys of a [`ThreadedTree`].
///
/// Cursors walk the keys in order and can point at any key or at the end.
/// The end sits between the largest and the smallest key, moving past it
/// wraps around.
pub struct Cursor<'a, 'buf, T, C = Natural> {
    pub(crate) current: NodeRef,
    pub(crate) tree: &'a ThreadedTree<'buf, T, C>,
}

impl<'a, 'buf, T, C> Cursor<'a, 'buf, T, C> {
    /// Returns the key the cursor points at, or `None` at the end.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        if self.current.is_head() {
            return None;
        }

        let tree = self.tree;
        // SAFETY: the cursor only moves along the threads of `tree`, and the
        // shared borrow keeps the tree from being cleared.
        Some(unsafe { &tree.node(self.current).key })
    }

    /// Returns `true` if the cursor points at the end.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_head()
    }

    /// Returns the position the cursor points at.
    ///
    /// The end yields a position that is not [valid](Position::is_valid).
    #[inline]
    pub fn position(&self) -> Position {
        self.tree.position(self.current)
    }

    /// Moves to the next larger key, or to the end from the largest key.
    #[inline]
    pub fn move_next(&mut self) {
        self.current = thread::inorder_successor(self.tree, self.current);
    }

    /// Moves to the next smaller key, or to the end from the smallest key.
    #[inline]
    pub fn move_prev(&mut self) {
        self.current = thread::inorder_predecessor(self.tree, self.current);
    }

    /// Returns the key [`move_next`](Self::move_next) would move to.
    #[inline]
    pub fn peek_next(&self) -> Option<&'a T> {
        let mut next = *self;
        next.move_next();
        next.get()
    }

    /// Returns the key [`move_prev`](Self::move_prev) would move to.
    #[inline]
    pub fn peek_prev(&self) -> Option<&'a T> {
        let mut prev = *self;
        prev.move_prev();
        prev.get()
    }
}

impl<T, C> Clone for Cursor<'_, '_, T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C> Copy for Cursor<'_, '_, T, C> {}

impl<T, C> PartialEq for Cursor<'_, '_, T, C> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.current == other.current
    }
}

impl<T, C> Eq for Cursor<'_, '_, T, C> {}

impl<T: fmt::Debug, C> fmt::Debug for Cursor<'_, '_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("node", &self.current)
            .field("key", &self.get())
            .finish_non_exhaustive()
    }
}

/// An iterator over the keys of a [`ThreadedTree`] in ascending order.
///
/// Created by [`ThreadedTree::iter`].
pub struct Iter<'a, 'buf, T, C = Natural> {
    pub(crate) front: NodeRef,
    pub(crate) back: NodeRef,
    pub(crate) remaining: usize,
    pub(crate) tree: &'a ThreadedTree<'buf, T, C>,
}

impl<'a, T, C> Iterator for Iter<'a, '_, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.front;
        self.front = thread::inorder_successor(self.tree, node);
        self.remaining -= 1;

        let tree = self.tree;
        // SAFETY: `remaining` keeps the walk between the first and the last
        // node, so `node` is never the sentinel.
        Some(unsafe { &tree.node(node).key })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    #[inline]
    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<T, C> DoubleEndedIterator for Iter<'_, '_, T, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.back;
        self.back = thread::inorder_predecessor(self.tree, node);
        self.remaining -= 1;

        let tree = self.tree;
        // SAFETY: see `next`.
        Some(unsafe { &tree.node(node).key })
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, '_, T, C> {}
impl<T, C> FusedIterator for Iter<'_, '_, T, C> {}

impl<T, C> Clone for Iter<'_, '_, T, C> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            tree: self.tree,
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Iter<'_, '_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
