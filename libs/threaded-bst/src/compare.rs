// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

/// A strict weak ordering over keys.
///
/// Two keys `a` and `b` are considered equal when neither `less(a, b)` nor
/// `less(b, a)` holds. Implementations must be irreflexive and transitive,
/// otherwise lookups and insertions silently misplace keys.
///
/// Any `Fn(&T, &T) -> bool` closure is a comparator.
pub trait Compare<T: ?Sized> {
    /// Returns `true` if `a` is ordered before `b`.
    fn less(&self, a: &T, b: &T) -> bool;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord + ?Sized> Compare<T> for Natural {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Orders keys by the reverse of their [`Ord`] implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reverse;

impl<T: Ord + ?Sized> Compare<T> for Reverse {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a > b
    }
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}
