// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A threaded binary search tree backed by a fixed-capacity node pool.
//!
//! [`ThreadedTree`] keeps unique keys in the order of a [`Compare`]
//! implementation. Its nodes live in a [`NodePool`] laid out over a buffer the
//! caller provides, so the tree never touches the global allocator and
//! several trees can draw from the same memory.
//!
//! ```
//! use threaded_bst::{NodePool, RawRegion, ThreadedTree};
//!
//! let mut buf = vec![0u8; NodePool::<u32>::required_bytes(5)];
//! let mut tree = ThreadedTree::<u32>::from_region(RawRegion::new(&mut buf));
//!
//! for key in [5, 3, 8, 1, 4] {
//!     assert!(tree.insert(key).1);
//! }
//!
//! // Duplicates are found, not inserted.
//! let (pos, inserted) = tree.insert(3);
//! assert!(!inserted);
//! assert_eq!(tree.get(pos), Some(&3));
//!
//! // The pool is full.
//! let (pos, inserted) = tree.insert(9);
//! assert!(!inserted && !pos.is_valid());
//!
//! assert!(tree.iter().copied().eq([1, 3, 4, 5, 8]));
//! assert!(tree.iter().rev().copied().eq([8, 5, 4, 3, 1]));
//! ```
//!
//! Trees sharing a pool are created with [`ThreadedTree::new_in`] and a
//! reference to that pool, and [`ThreadedTree::copy_into`] duplicates a tree
//! without comparing any keys.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod compare;
mod iter;
mod node;
mod thread;
mod tree;

pub use compare::{Compare, Natural, Reverse};
pub use iter::{Cursor, Iter, Position};
pub use node::Node;
pub use slot_pool::{self, AllocError, RawRegion};
pub use tree::{NodePool, ThreadedTree};
