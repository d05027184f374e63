// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Lets a [`FreeListPool`] back standard collections such as `Box::new_in`.

use core::alloc::{AllocError, Allocator, Layout};
use core::ptr::NonNull;

use crate::pool::FreeListPool;
use crate::region::SlotSource;

// SAFETY: every block handed out is a distinct slot that stays valid until it
// is pushed back onto the free list, and clones of the pool share that free
// list.
unsafe impl<T> Allocator for FreeListPool<'_, T> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            return Ok(NonNull::slice_from_raw_parts(layout.dangling(), 0));
        }
        if layout.size() > self.slot_size() || layout.align() > self.slot_align() {
            tracing::trace!(?layout, "layout does not fit a slot");
            return Err(AllocError);
        }

        let offset = self.pop_raw().ok_or(AllocError)?;
        // SAFETY: `offset` was just popped off this pool's free list.
        let ptr = unsafe { self.as_ptr_unchecked(offset) }.cast::<u8>();

        Ok(NonNull::slice_from_raw_parts(ptr, self.slot_size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        debug_assert!(self.contains(ptr.addr().get()));

        #[expect(
            clippy::cast_possible_truncation,
            reason = "pools never span more than u32::MAX bytes"
        )]
        let offset = (ptr.addr().get() - self.base().addr().get()) as u32;
        // SAFETY: the caller guarantees `ptr` was returned by `allocate` on
        // this free list, so the offset is a slot boundary inside the pool.
        unsafe {
            self.push_raw(offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use crate::{FreeListPool, RawRegion};

    #[test]
    fn boxes_come_from_the_pool() {
        let mut buf = vec![0u8; FreeListPool::<u64>::required_bytes(2)];
        let pool = RawRegion::new(&mut buf).rebind::<u64>();

        let a = Box::new_in(1u64, pool.clone());
        let b = Box::new_in(2u64, pool.clone());
        assert_eq!(pool.free_slots(), 0);
        assert!(Box::try_new_in(3u64, pool.clone()).is_err());

        assert_eq!(*a + *b, 3);
        drop(a);
        assert_eq!(pool.free_slots(), 1);
        drop(b);
        assert_eq!(pool.free_slots(), 2);
    }

    #[test]
    fn rejects_oversized_layouts() {
        let mut buf = vec![0u8; FreeListPool::<u64>::required_bytes(2)];
        let pool = RawRegion::new(&mut buf).rebind::<u64>();

        assert!(Box::try_new_in([0u64; 4], pool.clone()).is_err());
        assert_eq!(pool.free_slots(), 2);
    }
}
