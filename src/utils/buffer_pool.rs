//! # Buffer Pool
//!
//! Object pool for the output buffers produced by encoding, amortizing
//! allocation cost for the very common case of many small messages.
//!
//! Buffers at or below 4KB capacity return to the pool when dropped; larger
//! ones are released to the allocator so one oversized encode does not pin
//! memory for the rest of the process.
//!
//! ## Usage
//! ```rust
//! use proto_codec::utils::buffer_pool::BufferPool;
//!
//! let pool = BufferPool::new(8);
//! let mut buffer = pool.acquire();
//! buffer.extend_from_slice(&[0x08, 0x05]);
//! // Returned to the pool on drop
//! ```

use std::sync::{Arc, Mutex};

/// Maximum buffer capacity eligible for pooling (4KB).
const MAX_POOLED_BUFFER_SIZE: usize = 4096;

/// Capacity of freshly allocated pool buffers.
const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// An output buffer that returns itself to its pool when dropped.
pub struct PooledBuffer {
    buffer: Vec<u8>,
    pool: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl PooledBuffer {
    /// Take the underlying buffer out, detaching it from the pool.
    pub fn into_inner(mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // Zero capacity means into_inner already detached the allocation.
        if self.buffer.capacity() == 0 || self.buffer.capacity() > MAX_POOLED_BUFFER_SIZE {
            return;
        }
        self.buffer.clear();
        if let Ok(mut pool) = self.pool.lock() {
            pool.push(std::mem::take(&mut self.buffer));
        }
    }
}

impl std::ops::Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl std::ops::DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buffer
    }
}

/// Thread-safe pool of reusable encode-output buffers.
pub struct BufferPool {
    pool: Arc<Mutex<Vec<Vec<u8>>>>,
    initial_capacity: usize,
}

impl BufferPool {
    /// Create a pool pre-filled with `pool_size` buffers.
    pub fn new(pool_size: usize) -> Self {
        let mut pool = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            pool.push(Vec::with_capacity(DEFAULT_BUFFER_CAPACITY));
        }

        Self {
            pool: Arc::new(Mutex::new(pool)),
            initial_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Acquire an empty buffer, allocating a new one if the pool is drained.
    pub fn acquire(&self) -> PooledBuffer {
        let buffer = if let Ok(mut pool) = self.pool.lock() {
            pool.pop()
                .unwrap_or_else(|| Vec::with_capacity(self.initial_capacity))
        } else {
            Vec::with_capacity(self.initial_capacity)
        };

        PooledBuffer {
            buffer,
            pool: self.pool.clone(),
        }
    }

    /// Number of buffers currently idle in the pool.
    pub fn available(&self) -> usize {
        self.pool.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_POOL_SIZE)
    }
}

impl Clone for BufferPool {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            initial_capacity: self.initial_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_return() {
        let pool = BufferPool::new(4);
        assert_eq!(pool.available(), 4);

        let mut buf = pool.acquire();
        assert_eq!(pool.available(), 3);
        buf.push(42);

        drop(buf);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_returned_buffer_is_cleared() {
        let pool = BufferPool::new(1);
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"payload");
        }
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 7);
    }

    #[test]
    fn test_drained_pool_allocates() {
        let pool = BufferPool::new(1);
        let _a = pool.acquire();
        let _b = pool.acquire();
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_oversized_buffer_not_pooled() {
        let pool = BufferPool::new(1);
        {
            let mut buf = pool.acquire();
            buf.resize(MAX_POOLED_BUFFER_SIZE + 1, 0);
        }
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_into_inner_detaches() {
        let pool = BufferPool::new(1);
        let buf = pool.acquire();
        let inner = buf.into_inner();
        assert!(inner.is_empty());
        assert_eq!(pool.available(), 0);
    }
}
