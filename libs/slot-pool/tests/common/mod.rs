#![allow(unused, reason = "not used by all tests")]

use slot_pool::{FreeListPool, RawRegion};

/// Returns a zeroed buffer large enough for a pool of exactly `slots` `T`s.
pub fn buffer_for<T>(slots: usize) -> Vec<u8> {
    vec![0u8; FreeListPool::<T>::required_bytes(slots)]
}

/// Builds a pool of `T` over `buf`.
pub fn pool_over<T>(buf: &mut Vec<u8>) -> FreeListPool<'_, T> {
    RawRegion::new(buf).rebind::<T>()
}
