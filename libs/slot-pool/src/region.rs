// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::align::{self, WORD};
use crate::pool::{FreeListPool, slot_layout};

/// A contiguous, word-aligned range of memory that slots can be carved from.
///
/// Both allocator shapes of this crate implement this trait: [`RawRegion`]
/// describes a buffer that has not been divided into slots yet, while
/// [`FreeListPool`] describes the part of a buffer that is covered by slots.
pub trait SlotSource {
    /// Returns the first usable address. This is always aligned to at least
    /// the machine word size.
    fn base(&self) -> NonNull<u8>;

    /// Returns the number of usable bytes starting at [`base`](Self::base).
    fn size(&self) -> usize;

    /// Returns `true` if `addr` falls inside the usable range.
    fn contains(&self, addr: usize) -> bool {
        let start = self.base().addr().get();
        addr >= start && addr - start < self.size()
    }
}

/// An aligned sub-range of an externally owned buffer.
///
/// A `RawRegion` cannot hand out memory itself. It only exists to be
/// [rebound](RawRegion::rebind) into a [`FreeListPool`] once the element type
/// is known. The start of the buffer is aligned up to the machine word size
/// on construction; the bytes skipped in the process are never touched.
pub struct RawRegion<'buf> {
    base: NonNull<u8>,
    size: usize,
    _buf: PhantomData<&'buf mut [u8]>,
}

impl fmt::Debug for RawRegion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawRegion")
            .field("base", &self.base)
            .field("size", &self.size)
            .finish()
    }
}

impl<'buf> RawRegion<'buf> {
    /// Creates a region over `buf`, aligning its start to the machine word
    /// size.
    pub fn new(buf: &'buf mut [u8]) -> Self {
        let addr = buf.as_ptr().addr();
        let skip = match align::align_up(addr, WORD) {
            Some(aligned) => aligned - addr,
            None => buf.len(),
        };
        let skip = skip.min(buf.len());

        let (_, usable) = buf.split_at_mut(skip);
        let size = usable.len();

        tracing::trace!(addr, skip, size, "new raw region");

        Self {
            base: NonNull::from(usable).cast(),
            size,
            _buf: PhantomData,
        }
    }

    /// Divides the region into slots for `T` and threads the free list
    /// through them.
    ///
    /// Every slot is at least one machine word wide so that a free slot can
    /// hold the link to the next one, which means the resulting pool is
    /// always of the free-list shape, regardless of `size_of::<T>()`.
    pub fn rebind<T>(self) -> FreeListPool<'buf, T> {
        let (slot_size, slot_align) = slot_layout::<T>();

        // The region is word aligned, `T` might want more than that.
        let addr = self.base.addr().get();
        let skip = align::align_up(addr, slot_align)
            .map_or(self.size, |aligned| aligned - addr)
            .min(self.size);

        // SAFETY: `skip <= self.size` so the result stays inside the region
        // (or one past its end for an empty remainder).
        let base = unsafe { self.base.add(skip) };

        // SAFETY: `base..base + size - skip` is a subrange of the buffer we
        // exclusively borrow for `'buf`.
        unsafe { FreeListPool::from_raw_parts(base, self.size - skip, slot_size, slot_align) }
    }
}

impl SlotSource for RawRegion<'_> {
    fn base(&self) -> NonNull<u8> {
        self.base
    }

    fn size(&self) -> usize {
        self.size
    }
}

impl<'buf> From<&'buf mut [u8]> for RawRegion<'buf> {
    fn from(buf: &'buf mut [u8]) -> Self {
        Self::new(buf)
    }
}

impl<'buf, const N: usize> From<&'buf mut [u8; N]> for RawRegion<'buf> {
    fn from(buf: &'buf mut [u8; N]) -> Self {
        Self::new(buf.as_mut_slice())
    }
}

impl<'buf> From<&'buf mut Vec<u8>> for RawRegion<'buf> {
    fn from(buf: &'buf mut Vec<u8>) -> Self {
        Self::new(buf.as_mut_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_start_to_word() {
        let mut buf = [0u8; 64];
        // Deliberately start at an odd offset.
        let region = RawRegion::new(&mut buf[1..]);

        assert!(align::is_aligned(region.base().addr().get(), WORD));
        assert!(region.size() <= 63);
        assert!(region.size() > 63 - WORD);
    }

    #[test]
    fn tiny_buffer_is_empty() {
        let mut buf = [0u8; 8];
        let region = RawRegion::new(&mut buf[1..2]);
        assert!(region.size() <= 1);

        let pool = region.rebind::<u64>();
        assert_eq!(pool.capacity(), 0);
    }

    #[test]
    fn contains() {
        let mut buf = vec![0u8; 32];
        let region = RawRegion::from(&mut buf);
        let base = region.base().addr().get();

        assert!(region.contains(base));
        assert!(region.contains(base + region.size() - 1));
        assert!(!region.contains(base + region.size()));
        assert!(!region.contains(base.wrapping_sub(1)));
    }
}
