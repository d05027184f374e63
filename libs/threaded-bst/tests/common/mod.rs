#![allow(unused, reason = "not used by all tests")]

use threaded_bst::{NodePool, RawRegion};

/// Returns a zeroed buffer large enough for a pool of exactly `slots` nodes.
pub fn buffer_for<T>(slots: usize) -> Vec<u8> {
    vec![0u8; NodePool::<T>::required_bytes(slots)]
}

/// Lays out a node pool over `buf`.
pub fn pool_over<T>(buf: &mut Vec<u8>) -> NodePool<'_, T> {
    RawRegion::new(buf).rebind()
}
