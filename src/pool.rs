//! Process-wide free list for encode buffers.

use std::sync::Mutex;

/// Buffers that grew beyond this are dropped rather than retained.
const MAX_RECYCLED_CAPACITY: usize = 1 << 20;
const MAX_POOLED: usize = 32;

static POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

pub(crate) fn get() -> Vec<u8> {
    POOL.lock()
        .ok()
        .and_then(|mut pool| pool.pop())
        .unwrap_or_default()
}

pub(crate) fn put(mut buf: Vec<u8>) {
    if buf.capacity() > MAX_RECYCLED_CAPACITY {
        return;
    }
    buf.clear();
    if let Ok(mut pool) = POOL.lock() {
        if pool.len() < MAX_POOLED {
            pool.push(buf);
        }
    }
}
