//! Reusable response buffers.
//!
//! Matched requests capture the upstream body and the rendered template in a
//! byte buffer borrowed from a [`BufferPool`]. Buffers are handed out through
//! a [`PooledBuffer`] guard that clears the buffer and puts it back when it is
//! dropped, so every exit path of a request returns its buffer.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Idle buffers kept when no limit is configured.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Largest capacity, in bytes, a buffer may have and still be kept for reuse.
pub const DEFAULT_MAX_RETAINED_CAPACITY: usize = 1 << 20;

/// Shared free list of byte buffers.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    max_idle: usize,
    max_retained_capacity: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE, DEFAULT_MAX_RETAINED_CAPACITY)
    }
}

impl BufferPool {
    #[must_use]
    pub fn new(max_idle: usize, max_retained_capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
            max_retained_capacity,
        }
    }

    /// Take an empty buffer, reusing an idle one when available.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut buf = self.free.lock().pop().unwrap_or_default();
        buf.clear();
        PooledBuffer { pool: self, buf }
    }

    /// Number of buffers currently waiting for reuse.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > self.max_retained_capacity {
            return;
        }
        buf.clear();
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
