// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::fmt;

/// A reference to a node of a tree.
///
/// This is either the tree's sentinel ([`NodeRef::HEAD`]) or the byte offset
/// of a slot in the tree's pool. It doesn't have a lifetime, but is logically
/// bound to the tree it was taken from.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeRef(u32);

impl NodeRef {
    /// The sentinel. Slot offsets are multiples of the word size, so they can
    /// never collide with `u32::MAX`.
    pub(crate) const HEAD: Self = Self(u32::MAX);

    #[inline]
    pub(crate) const fn from_offset(offset: u32) -> Self {
        debug_assert!(offset != u32::MAX);
        Self(offset)
    }

    #[inline]
    pub(crate) const fn offset(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn is_head(self) -> bool {
        self.0 == Self::HEAD.0
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_head() {
            f.write_str("HEAD")
        } else {
            write!(f, "@{:#x}", self.0)
        }
    }
}

/// One of the two links of a node.
///
/// A `Child` link points to a real subtree. A `Thread` takes the place of a
/// missing child and points to the node's inorder predecessor (left side) or
/// successor (right side) instead.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Link {
    Child(NodeRef),
    Thread(NodeRef),
}

impl Link {
    #[inline]
    pub(crate) fn target(self) -> NodeRef {
        match self {
            Link::Child(node) | Link::Thread(node) => node,
        }
    }

    #[inline]
    pub(crate) fn child(self) -> Option<NodeRef> {
        match self {
            Link::Child(node) => Some(node),
            Link::Thread(_) => None,
        }
    }

    #[inline]
    pub(crate) fn is_thread(self) -> bool {
        matches!(self, Link::Thread(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// The two links of a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Links {
    pub(crate) left: Link,
    pub(crate) right: Link,
}

impl Links {
    /// Links of the sentinel of an empty tree: no root on the left, and the
    /// right link closing the thread ring onto itself.
    pub(crate) const EMPTY_HEAD: Self = Self {
        left: Link::Thread(NodeRef::HEAD),
        right: Link::Child(NodeRef::HEAD),
    };

    /// Links of a node that has been allocated but not attached yet.
    pub(crate) const DETACHED: Self = Self {
        left: Link::Thread(NodeRef::HEAD),
        right: Link::Thread(NodeRef::HEAD),
    };

    #[inline]
    pub(crate) fn get(self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn set(&mut self, side: Side, link: Link) {
        match side {
            Side::Left => self.left = link,
            Side::Right => self.right = link,
        }
    }
}

/// A tree node as stored in a pool slot.
///
/// Nodes are always at least as large as a pointer, so a pool of nodes is
/// always of the free-list shape.
pub struct Node<T> {
    pub(crate) links: Links,
    pub(crate) key: T,
}

static_assertions::const_assert!(size_of::<Node<()>>() >= size_of::<usize>());

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("left", &self.links.left)
            .field("right", &self.links.right)
            .finish()
    }
}
