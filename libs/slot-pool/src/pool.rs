// Copyright 2025. Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use alloc::rc::Rc;
use core::cell::Cell;
use core::marker::PhantomData;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};
use core::{fmt, mem};

use crate::align::WORD;
use crate::error::{AllocError, RebindError, SlotError};
use crate::region::SlotSource;

/// Terminates the free list.
const NIL: u32 = !0;

/// Returns the `(size, align)` of a slot holding a `T`.
///
/// A slot is always large enough to hold the free-list link (a `u32` offset,
/// padded to a full word) and always word aligned.
pub(crate) const fn slot_layout<T>() -> (usize, usize) {
    let align = if align_of::<T>() > WORD {
        align_of::<T>()
    } else {
        WORD
    };
    let size = if size_of::<T>() > WORD {
        size_of::<T>()
    } else {
        WORD
    };

    // Round up so consecutive slots stay aligned.
    (size.next_multiple_of(align), align)
}

/// Identifies a free list. Shared by every handle that aliases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(usize);

impl PoolId {
    fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A slot handed out by [`FreeListPool::allocate`].
///
/// Slots are move-only: returning one to the pool consumes it, so a slot can
/// not be freed twice. Dropping a `Slot` without deallocating it leaks the
/// slot for the lifetime of the pool.
///
/// A slot does not track whether a value currently lives in it, see
/// [`FreeListPool::construct`] and [`FreeListPool::destroy`].
#[must_use = "dropping a `Slot` leaks it, return it with `FreeListPool::deallocate`"]
pub struct Slot<T> {
    offset: u32,
    pool: PoolId,
    _m: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("offset", &self.offset)
            .field("pool", &self.pool)
            .finish()
    }
}

impl<T> Slot<T> {
    /// Returns the byte offset of this slot from the start of its pool.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Returns the pool this slot was allocated from.
    #[inline]
    pub fn pool(&self) -> PoolId {
        self.pool
    }

    /// Consumes the slot, returning its byte offset.
    ///
    /// The slot stays allocated, use [`FreeListPool::slot_at`] to turn the
    /// offset back into a `Slot`.
    #[inline]
    pub fn into_offset(self) -> u32 {
        self.offset
    }
}

/// The free list shared by all handles of a pool.
struct Inner {
    id: PoolId,
    base: NonNull<u8>,
    slot_size: u32,
    slot_align: usize,
    capacity: u32,
    /// Offset of the first free slot, every free slot stores the offset of the
    /// next one in its first four bytes.
    free_list: Cell<u32>,
    free: Cell<u32>,
}

impl Inner {
    /// Pointer to the slot at `offset`.
    ///
    /// # Safety
    ///
    /// `offset` must be the offset of one of this pool's slots.
    #[inline]
    unsafe fn slot_ptr(&self, offset: u32) -> NonNull<u8> {
        debug_assert!(offset < self.capacity * self.slot_size);
        debug_assert_eq!(offset % self.slot_size, 0);

        // SAFETY: ensured by caller.
        unsafe { self.base.add(offset as usize) }
    }

    #[inline]
    fn pop(&self) -> Option<u32> {
        let top = self.free_list.get();
        if top == NIL {
            return None;
        }

        // SAFETY: `top` came off the free list, so it is a valid free slot
        // that holds the link to the next free slot.
        let next = unsafe { self.slot_ptr(top).cast::<u32>().read() };
        self.free_list.set(next);
        self.free.set(self.free.get() - 1);

        Some(top)
    }

    /// # Safety
    ///
    /// `offset` must be an allocated slot of this pool that no live value
    /// occupies.
    #[inline]
    unsafe fn push(&self, offset: u32) {
        // SAFETY: ensured by caller. Slots are word aligned and at least a
        // word wide, so the link fits.
        unsafe {
            self.slot_ptr(offset).cast::<u32>().write(self.free_list.get());
        }
        self.free_list.set(offset);
        self.free.set(self.free.get() + 1);
    }

    /// Returns `true` if `offset` starts a slot of this pool.
    ///
    /// Every `Slot` satisfies this by construction, so this is only asserted
    /// in debug builds.
    fn is_slot(&self, offset: u32) -> bool {
        offset < self.capacity * self.slot_size && offset % self.slot_size == 0
    }
}

/// A fixed-capacity pool of equally sized slots.
///
/// Free slots form a stack that is threaded through the slots themselves, so
/// the pool needs no bookkeeping memory besides the head of that stack.
/// [`allocate`](Self::allocate) pops the top slot, [`deallocate`](Self::deallocate)
/// pushes a slot back; both are O(1).
///
/// `FreeListPool` is a cheap handle: cloning it (or [rebinding](Self::rebind)
/// it to another element type) yields a handle to the *same* free list. Two
/// handles compare equal iff they share a free list, which is exactly when
/// slots obtained from one may be returned to the other.
///
/// The pool is not thread-safe and neither `Send` nor `Sync`.
pub struct FreeListPool<'buf, T> {
    inner: Rc<Inner>,
    _m: PhantomData<(&'buf mut [u8], fn() -> T)>,
}

impl<T> Clone for FreeListPool<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            _m: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FreeListPool<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeListPool")
            .field("id", &self.inner.id)
            .field("slot_size", &self.inner.slot_size)
            .field("capacity", &self.inner.capacity)
            .field("free", &self.inner.free.get())
            .finish_non_exhaustive()
    }
}

impl<T, U> PartialEq<FreeListPool<'_, U>> for FreeListPool<'_, T> {
    fn eq(&self, other: &FreeListPool<'_, U>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for FreeListPool<'_, T> {}

impl<'buf, T> FreeListPool<'buf, T> {
    /// Lays out the free list over `size` bytes starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be aligned to `slot_align` and `base..base + size` must be
    /// valid for reads and writes and not be accessed through any other
    /// pointer for `'buf`.
    pub(crate) unsafe fn from_raw_parts(
        base: NonNull<u8>,
        size: usize,
        slot_size: usize,
        slot_align: usize,
    ) -> Self {
        debug_assert!(base.addr().get() % slot_align == 0);
        debug_assert!(slot_size >= WORD && slot_size % slot_align == 0);

        // Offsets are stored as `u32`, `NIL` is reserved.
        let max_bytes = size.min(NIL as usize);
        let capacity = u32::try_from(max_bytes / slot_size).unwrap_or(0);
        let slot_size = u32::try_from(slot_size).unwrap_or(NIL);

        let inner = Inner {
            id: PoolId::next(),
            base,
            slot_size,
            slot_align,
            capacity,
            free_list: Cell::new(NIL),
            free: Cell::new(0),
        };

        // Push in reverse so that the first allocation hands out the lowest
        // slot.
        for index in (0..capacity).rev() {
            // SAFETY: `index < capacity` so the slot lies inside the buffer,
            // and nothing has been allocated yet.
            unsafe {
                inner.push(index * slot_size);
            }
        }

        tracing::debug!(
            pool = ?inner.id,
            slot_size,
            slot_align,
            capacity,
            "laid out free list"
        );

        Self {
            inner: Rc::new(inner),
            _m: PhantomData,
        }
    }

    /// Returns the number of bytes a buffer needs so that a pool of `T` built
    /// over it has at least `slots` slots, regardless of where the buffer
    /// starts.
    #[must_use]
    pub const fn required_bytes(slots: usize) -> usize {
        let (size, align) = slot_layout::<T>();
        slots * size + (align - 1)
    }

    /// Returns the identity of the free list behind this handle.
    #[inline]
    pub fn id(&self) -> PoolId {
        self.inner.id
    }

    /// Returns the total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity as usize
    }

    /// Returns the number of slots currently on the free list.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.inner.free.get() as usize
    }

    /// Returns the size of a single slot in bytes.
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.inner.slot_size as usize
    }

    /// Returns the alignment of every slot.
    #[inline]
    pub fn slot_align(&self) -> usize {
        self.inner.slot_align
    }

    /// Pops a slot off the free list.
    ///
    /// The slot is uninitialized, use [`construct`](Self::construct) to place
    /// a value into it.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if every slot is in use.
    pub fn allocate(&self) -> Result<Slot<T>, AllocError> {
        match self.inner.pop() {
            Some(offset) => Ok(Slot {
                offset,
                pool: self.inner.id,
                _m: PhantomData,
            }),
            None => {
                tracing::trace!(pool = ?self.inner.id, "pool exhausted");
                Err(AllocError)
            }
        }
    }

    /// Pushes `slot` back onto the free list.
    ///
    /// A value that still lives in the slot is leaked, call
    /// [`destroy`](Self::destroy) first.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if `slot` was not allocated from this free list.
    pub fn deallocate(&self, slot: Slot<T>) -> Result<(), SlotError> {
        if slot.pool != self.inner.id {
            return Err(SlotError::ForeignSlot);
        }
        debug_assert!(self.inner.is_slot(slot.offset));

        // SAFETY: the slot came from this free list and, since `Slot` is
        // move-only, is not on it right now.
        unsafe {
            self.inner.push(slot.offset);
        }
        Ok(())
    }

    /// Moves `value` into `slot`.
    ///
    /// A value that already lives in the slot is overwritten without being
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if `slot` was not allocated from this free list.
    pub fn construct(&self, slot: &Slot<T>, value: T) -> Result<(), SlotError> {
        let ptr = self.try_as_ptr(slot)?;

        // SAFETY: the slot is allocated, exclusively owned through `slot` and
        // suitably sized and aligned for `T`.
        unsafe {
            ptr.write(value);
        }
        Ok(())
    }

    /// Moves the value out of `slot`, leaving the slot allocated but
    /// uninitialized.
    ///
    /// # Safety
    ///
    /// `slot` must belong to this pool and hold a value placed there by
    /// [`construct`](Self::construct) that has not been destroyed since.
    pub unsafe fn destroy(&self, slot: &Slot<T>) -> T {
        debug_assert_eq!(slot.pool, self.inner.id);

        // SAFETY: ensured by caller.
        unsafe { self.as_ptr_unchecked(slot.offset).read() }
    }

    /// Returns a reference to the value in `slot`.
    ///
    /// # Safety
    ///
    /// `slot` must belong to this pool and hold a value placed there by
    /// [`construct`](Self::construct) that has not been destroyed since.
    pub unsafe fn get(&self, slot: &Slot<T>) -> &T {
        debug_assert_eq!(slot.pool, self.inner.id);

        // SAFETY: ensured by caller.
        unsafe { self.as_ptr_unchecked(slot.offset).as_ref() }
    }

    /// Returns a pointer to the memory of `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if `slot` was not allocated from this free list.
    pub fn try_as_ptr(&self, slot: &Slot<T>) -> Result<NonNull<T>, SlotError> {
        if slot.pool != self.inner.id {
            return Err(SlotError::ForeignSlot);
        }
        debug_assert!(self.inner.is_slot(slot.offset));

        // SAFETY: the slot belongs to this free list, and every `Slot` of it
        // starts on a slot boundary inside the pool.
        Ok(unsafe { self.as_ptr_unchecked(slot.offset) })
    }

    /// Returns a pointer to the slot at `offset` without any checks.
    ///
    /// # Safety
    ///
    /// `offset` must be the offset of a slot of this pool, as returned by
    /// [`Slot::offset`].
    #[inline]
    pub unsafe fn as_ptr_unchecked(&self, offset: u32) -> NonNull<T> {
        // SAFETY: ensured by caller.
        unsafe { self.inner.slot_ptr(offset).cast() }
    }

    /// Recreates the `Slot` handle for `offset`.
    ///
    /// # Safety
    ///
    /// `offset` must come from [`Slot::into_offset`] on a slot of this free
    /// list that has not been deallocated since, and no other `Slot` for the
    /// same offset may exist.
    #[inline]
    pub unsafe fn slot_at(&self, offset: u32) -> Slot<T> {
        debug_assert!(self.inner.is_slot(offset));

        Slot {
            offset,
            pool: self.inner.id,
            _m: PhantomData,
        }
    }

    /// Returns a handle to the same free list that hands out slots for `U`.
    ///
    /// # Errors
    ///
    /// Returns [`RebindError`] if a `U` does not fit into this pool's slots.
    pub fn rebind<U>(&self) -> Result<FreeListPool<'buf, U>, RebindError> {
        if size_of::<U>() > self.slot_size() {
            return Err(RebindError::SlotTooSmall {
                required: size_of::<U>(),
                available: self.slot_size(),
            });
        }
        if align_of::<U>() > self.slot_align() {
            return Err(RebindError::Overaligned {
                required: align_of::<U>(),
                available: self.slot_align(),
            });
        }

        tracing::trace!(pool = ?self.inner.id, to = core::any::type_name::<U>(), "rebind");

        Ok(FreeListPool {
            inner: Rc::clone(&self.inner),
            _m: PhantomData,
        })
    }

    /// Exchanges the free lists behind two handles.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.inner, &mut other.inner);
    }

    /// Pops a slot and returns its raw offset.
    pub(crate) fn pop_raw(&self) -> Option<u32> {
        self.inner.pop()
    }

    /// Returns a raw offset to the free list.
    ///
    /// # Safety
    ///
    /// `offset` must be an allocated slot of this free list.
    pub(crate) unsafe fn push_raw(&self, offset: u32) {
        // SAFETY: ensured by caller.
        unsafe { self.inner.push(offset) }
    }
}

impl<T> SlotSource for FreeListPool<'_, T> {
    fn base(&self) -> NonNull<u8> {
        self.inner.base
    }

    fn size(&self) -> usize {
        self.capacity() * self.slot_size()
    }
}

#[cfg(test)]
mod tests {
    use crate::RawRegion;

    use super::*;

    #[test]
    fn slot_layout_is_at_least_a_word() {
        assert_eq!(slot_layout::<u8>(), (WORD, WORD));
        assert_eq!(slot_layout::<usize>(), (WORD, WORD));
        assert_eq!(slot_layout::<[u8; 9]>(), (2 * WORD, WORD));
        assert_eq!(slot_layout::<u128>().0, 16);
    }

    #[test]
    fn lifo_order() {
        let mut buf = vec![0u8; FreeListPool::<u64>::required_bytes(3)];
        let pool = RawRegion::new(&mut buf).rebind::<u64>();

        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), pool.slot_size() as u32);

        let b_offset = b.offset();
        pool.deallocate(b).unwrap();

        // The slot freed last comes back first.
        let c = pool.allocate().unwrap();
        assert_eq!(c.offset(), b_offset);

        pool.deallocate(a).unwrap();
        pool.deallocate(c).unwrap();
        assert_eq!(pool.free_slots(), pool.capacity());
    }

    #[test]
    fn handed_out_offsets_are_slot_boundaries() {
        let mut buf = vec![0u8; FreeListPool::<[u8; 12]>::required_bytes(3)];
        let pool = RawRegion::new(&mut buf).rebind::<[u8; 12]>();
        assert_eq!(pool.slot_size(), 16);

        let slots: Vec<_> = (0..3).map(|_| pool.allocate().unwrap()).collect();
        for slot in &slots {
            assert!(pool.inner.is_slot(slot.offset()));
        }

        assert!(!pool.inner.is_slot(8));
        assert!(!pool.inner.is_slot(48));

        for slot in slots {
            pool.deallocate(slot).unwrap();
        }
    }

    #[test]
    fn clones_share_the_free_list() {
        let mut buf = vec![0u8; FreeListPool::<u64>::required_bytes(2)];
        let pool = RawRegion::new(&mut buf).rebind::<u64>();
        let alias = pool.clone();

        assert_eq!(pool, alias);

        let slot = alias.allocate().unwrap();
        assert_eq!(pool.free_slots(), 1);

        // Memory from one handle may be returned to the other.
        pool.deallocate(slot).unwrap();
        assert_eq!(alias.free_slots(), 2);
    }

    #[test]
    fn rebind_checks_layout() {
        let mut buf = vec![0u8; FreeListPool::<[u64; 2]>::required_bytes(2)];
        let pool = RawRegion::new(&mut buf).rebind::<[u64; 2]>();

        let smaller = pool.rebind::<u32>().unwrap();
        assert_eq!(smaller, pool);
        assert_eq!(smaller.slot_size(), 16);

        assert_eq!(
            pool.rebind::<[u64; 3]>().unwrap_err(),
            RebindError::SlotTooSmall {
                required: 24,
                available: 16
            }
        );
    }

    #[test]
    fn swap_exchanges_free_lists() {
        let mut buf_a = vec![0u8; FreeListPool::<u64>::required_bytes(1)];
        let mut buf_b = vec![0u8; FreeListPool::<u64>::required_bytes(4)];
        let mut a = RawRegion::new(&mut buf_a).rebind::<u64>();
        let mut b = RawRegion::new(&mut buf_b).rebind::<u64>();
        let (a_id, b_id) = (a.id(), b.id());

        a.swap(&mut b);

        assert_eq!(a.id(), b_id);
        assert_eq!(b.id(), a_id);
        assert_eq!(a.capacity(), 4);
        assert_eq!(b.capacity(), 1);
    }
}
