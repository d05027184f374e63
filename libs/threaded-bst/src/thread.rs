// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Traversal and link repair for threaded binary trees.
//!
//! These are the only functions that interpret links. Everything else (the
//! tree, cursors and iterators) moves around the tree through them.
//!
//! The sentinel takes part like any other node: its left link holds the root
//! (or a thread to itself when the tree is empty) and its right link is a
//! child link to itself. With that, the inorder successor of the sentinel is
//! the first node, the successor of the last node is the sentinel, and all
//! walks terminate without null checks.

use crate::node::{Link, Links, NodeRef, Side};

/// Storage that maps node references to their links.
pub(crate) trait LinkStore {
    fn links(&self, node: NodeRef) -> Links;
    fn set_links(&mut self, node: NodeRef, links: Links);
}

/// Returns the node that follows `node` in inorder.
pub(crate) fn inorder_successor<S: LinkStore + ?Sized>(store: &S, node: NodeRef) -> NodeRef {
    match store.links(node).right {
        Link::Thread(next) => next,
        Link::Child(mut next) => {
            while let Link::Child(left) = store.links(next).left {
                next = left;
            }
            next
        }
    }
}

/// Returns the node that precedes `node` in inorder.
pub(crate) fn inorder_predecessor<S: LinkStore + ?Sized>(store: &S, node: NodeRef) -> NodeRef {
    match store.links(node).left {
        Link::Thread(prev) => prev,
        Link::Child(mut prev) => {
            while let Link::Child(right) = store.links(prev).right {
                prev = right;
            }
            prev
        }
    }
}

/// Returns the node that follows `node` in preorder.
///
/// The left child comes first. Without one, the right threads lead up to the
/// closest ancestor (or `node` itself) that has a right subtree, and that
/// subtree is next.
pub(crate) fn preorder_successor<S: LinkStore + ?Sized>(store: &S, node: NodeRef) -> NodeRef {
    if let Link::Child(left) = store.links(node).left {
        return left;
    }

    let mut curr = node;
    loop {
        match store.links(curr).right {
            Link::Thread(next) => curr = next,
            Link::Child(right) => return right,
        }
    }
}

/// Attaches the detached node `child` as the `side` child of `parent`.
///
/// This is the only place where links are rewired. `child` takes over the
/// link `parent` had on that side and gets a thread back to `parent` on the
/// other side. If `parent` already had a subtree on that side, the subtree is
/// pushed down below `child` and the thread that pointed back to `parent`
/// from inside it is redirected to `child`.
fn attach<S: LinkStore + ?Sized>(store: &mut S, parent: NodeRef, child: NodeRef, side: Side) {
    debug_assert!(!child.is_head());

    let inner = side.opposite();
    let mut parent_links = store.links(parent);
    let inherited = parent_links.get(side);

    let mut child_links = Links::DETACHED;
    child_links.set(side, inherited);
    child_links.set(inner, Link::Thread(parent));
    parent_links.set(side, Link::Child(child));

    store.set_links(child, child_links);
    store.set_links(parent, parent_links);

    if inherited.child().is_some() {
        let neighbour = match side {
            Side::Left => inorder_predecessor(store, child),
            Side::Right => inorder_successor(store, child),
        };
        let mut links = store.links(neighbour);
        debug_assert_eq!(links.get(inner), Link::Thread(parent));
        links.set(inner, Link::Thread(child));
        store.set_links(neighbour, links);
    }
}

/// Attaches `child` as the left child of `parent`, see [`attach`].
#[inline]
pub(crate) fn attach_left<S: LinkStore + ?Sized>(store: &mut S, parent: NodeRef, child: NodeRef) {
    attach(store, parent, child, Side::Left);
}

/// Attaches `child` as the right child of `parent`, see [`attach`].
#[inline]
pub(crate) fn attach_right<S: LinkStore + ?Sized>(store: &mut S, parent: NodeRef, child: NodeRef) {
    attach(store, parent, child, Side::Right);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bare link storage, node `i` lives at offset `8 * i`.
    struct Arena {
        head: Links,
        nodes: Vec<Links>,
    }

    impl Arena {
        fn new(nodes: usize) -> Self {
            Self {
                head: Links::EMPTY_HEAD,
                nodes: vec![Links::DETACHED; nodes],
            }
        }
    }

    fn n(index: u32) -> NodeRef {
        NodeRef::from_offset(index * 8)
    }

    impl LinkStore for Arena {
        fn links(&self, node: NodeRef) -> Links {
            if node.is_head() {
                self.head
            } else {
                self.nodes[node.offset() as usize / 8]
            }
        }

        fn set_links(&mut self, node: NodeRef, links: Links) {
            if node.is_head() {
                self.head = links;
            } else {
                self.nodes[node.offset() as usize / 8] = links;
            }
        }
    }

    fn walk(store: &Arena, step: fn(&Arena, NodeRef) -> NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut curr = step(store, NodeRef::HEAD);
        while !curr.is_head() {
            out.push(curr);
            curr = step(store, curr);
        }
        out
    }

    //       0
    //      / \
    //     1   2
    //      \
    //       3
    fn sample() -> Arena {
        let mut arena = Arena::new(5);
        attach_left(&mut arena, NodeRef::HEAD, n(0));
        attach_left(&mut arena, n(0), n(1));
        attach_right(&mut arena, n(0), n(2));
        attach_right(&mut arena, n(1), n(3));
        arena
    }

    #[test]
    fn empty() {
        let arena = Arena::new(0);
        assert_eq!(inorder_successor(&arena, NodeRef::HEAD), NodeRef::HEAD);
        assert_eq!(inorder_predecessor(&arena, NodeRef::HEAD), NodeRef::HEAD);
        assert_eq!(preorder_successor(&arena, NodeRef::HEAD), NodeRef::HEAD);
    }

    #[test]
    fn first_node_threads_to_head() {
        let mut arena = Arena::new(1);
        attach_left(&mut arena, NodeRef::HEAD, n(0));

        assert_eq!(arena.head.left, Link::Child(n(0)));
        assert_eq!(arena.head.right, Link::Child(NodeRef::HEAD));
        assert_eq!(arena.nodes[0].left, Link::Thread(NodeRef::HEAD));
        assert_eq!(arena.nodes[0].right, Link::Thread(NodeRef::HEAD));
    }

    #[test]
    fn inorder() {
        let arena = sample();
        assert_eq!(walk(&arena, inorder_successor), [n(1), n(3), n(0), n(2)]);
        assert_eq!(walk(&arena, inorder_predecessor), [n(2), n(0), n(3), n(1)]);
    }

    #[test]
    fn preorder() {
        let arena = sample();
        assert_eq!(walk(&arena, preorder_successor), [n(0), n(1), n(3), n(2)]);
    }

    #[test]
    fn threads_point_to_inorder_neighbours() {
        let arena = sample();
        assert_eq!(arena.nodes[1].left, Link::Thread(NodeRef::HEAD));
        assert_eq!(arena.nodes[3].left, Link::Thread(n(1)));
        assert_eq!(arena.nodes[3].right, Link::Thread(n(0)));
        assert_eq!(arena.nodes[2].left, Link::Thread(n(0)));
        assert_eq!(arena.nodes[2].right, Link::Thread(NodeRef::HEAD));
    }

    #[test]
    fn attach_above_existing_subtree() {
        let mut arena = sample();

        // Splice 4 in between 0 and its right subtree.
        attach_right(&mut arena, n(0), n(4));

        assert_eq!(arena.nodes[0].right, Link::Child(n(4)));
        assert_eq!(arena.nodes[4].right, Link::Child(n(2)));
        assert_eq!(arena.nodes[4].left, Link::Thread(n(0)));
        assert_eq!(arena.nodes[2].left, Link::Thread(n(4)));
        assert_eq!(walk(&arena, inorder_successor), [n(1), n(3), n(0), n(4), n(2)]);
        assert_eq!(walk(&arena, inorder_predecessor), [n(2), n(4), n(0), n(3), n(1)]);
    }
}
