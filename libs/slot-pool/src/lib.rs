// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A fixed-capacity slot allocator over a caller-provided buffer.
//!
//! The allocator comes in two shapes:
//!
//! - [`RawRegion`] is a word-aligned view of the buffer. It cannot allocate,
//!   it only remembers where usable memory starts and how much there is.
//! - [`FreeListPool`] divides that memory into equally sized slots and keeps
//!   the free ones on a stack that is threaded through the slots themselves.
//!
//! A region turns into a pool by [rebinding](RawRegion::rebind) it to the
//! element type:
//!
//! ```
//! use slot_pool::{FreeListPool, RawRegion};
//!
//! let mut buf = vec![0u8; FreeListPool::<u64>::required_bytes(4)];
//! let pool = RawRegion::new(&mut buf).rebind::<u64>();
//! assert_eq!(pool.capacity(), 4);
//!
//! let slot = pool.allocate().unwrap();
//! pool.construct(&slot, 42).unwrap();
//! assert_eq!(unsafe { pool.destroy(&slot) }, 42);
//! pool.deallocate(slot).unwrap();
//! ```
//!
//! The buffer is borrowed for the pool's whole lifetime and never resized.
//! Running out of slots is reported through [`AllocError`] and is meant to be
//! handled by the caller.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "allocator-api", feature(allocator_api))]
#![warn(missing_docs)]

extern crate alloc;

pub mod align;
#[cfg(feature = "allocator-api")]
mod allocator_api;
mod error;
mod pool;
mod region;

pub use error::{AllocError, RebindError, SlotError};
pub use pool::{FreeListPool, PoolId, Slot};
pub use region::{RawRegion, SlotSource};
