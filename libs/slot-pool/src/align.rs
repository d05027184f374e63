// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Address alignment helpers.
//!
//! Addresses are plain `usize`s here, the pool only ever feeds them the
//! result of [`pointer::addr`].

/// The machine word size, which is also the minimum slot size and alignment.
pub const WORD: usize = size_of::<usize>();

/// Returns `true` if `addr` is a multiple of `boundary`.
///
/// # Panics
///
/// Panics if `boundary` is not a power of two.
#[must_use]
#[inline]
pub const fn is_aligned(addr: usize, boundary: usize) -> bool {
    assert!(
        boundary.is_power_of_two(),
        "is_aligned: boundary is not a power-of-two"
    );

    addr & (boundary - 1) == 0
}

/// Returns the first multiple of `boundary` that is strictly greater than
/// `addr`, or `None` if that would overflow.
///
/// Note that an already aligned `addr` is moved to the *next* boundary, use
/// [`align_up`] to leave aligned addresses alone.
///
/// # Panics
///
/// Panics if `boundary` is not a power of two.
#[must_use]
#[inline]
pub const fn next_aligned(addr: usize, boundary: usize) -> Option<usize> {
    assert!(
        boundary.is_power_of_two(),
        "next_aligned: boundary is not a power-of-two"
    );

    let down = addr & 0usize.wrapping_sub(boundary);
    down.checked_add(boundary)
}

/// Rounds `addr` up to the nearest multiple of `boundary`, or returns `None`
/// if that would overflow.
///
/// # Panics
///
/// Panics if `boundary` is not a power of two.
#[must_use]
#[inline]
pub const fn align_up(addr: usize, boundary: usize) -> Option<usize> {
    if is_aligned(addr, boundary) {
        Some(addr)
    } else {
        next_aligned(addr, boundary)
    }
}
