// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::fmt;

/// The pool has no free slot left.
///
/// Exhaustion is an expected condition, callers are supposed to check for it
/// on every allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("slot pool exhausted")
    }
}

impl core::error::Error for AllocError {}

/// Error returned when a [`Slot`](crate::Slot) is handed to a pool that did
/// not hand it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// The slot belongs to a different free list.
    ForeignSlot,
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::ForeignSlot => f.write_str("slot belongs to a different pool"),
        }
    }
}

impl core::error::Error for SlotError {}

/// Error returned when a pool cannot be rebound to a different element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebindError {
    /// The element type is larger than the pool's slots.
    SlotTooSmall {
        /// Size of the element type.
        required: usize,
        /// Size of a slot.
        available: usize,
    },
    /// The element type requires a stricter alignment than the pool's slots.
    Overaligned {
        /// Alignment of the element type.
        required: usize,
        /// Alignment of every slot.
        available: usize,
    },
}

impl fmt::Display for RebindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebindError::SlotTooSmall {
                required,
                available,
            } => write!(
                f,
                "element needs {required} bytes but slots are {available} bytes"
            ),
            RebindError::Overaligned {
                required,
                available,
            } => write!(
                f,
                "element needs {required}-byte alignment but slots are {available}-byte aligned"
            ),
        }
    }
}

impl core::error::Error for RebindError {}
