// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Byte-buffer and packet pooling.
//!
//! Grounded on the bucketed, size-keyed pool used for audio frame buffers
//! elsewhere in this codebase: buffers are grouped into fixed-size buckets
//! so the hot per-packet path never touches the global allocator once the
//! buckets have warmed up.

use std::sync::{Arc, Mutex};

use bytes::BytesMut;

use super::packet::Packet;

#[derive(Debug, Default)]
struct Bucket {
    buffer_size: usize,
    free: Vec<BytesMut>,
}

#[derive(Debug)]
struct PoolInner {
    buckets: Vec<Bucket>,
    buffers_per_bucket: usize,
}

/// Default bucket sizes for UDP-sized audio/FEC payloads.
pub const DEFAULT_BUCKET_SIZES: &[usize] = &[256, 512, 1024, 1500];
pub const DEFAULT_BUFFERS_PER_BUCKET: usize = 32;

/// A thread-safe, size-bucketed pool of reusable byte buffers.
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<Mutex<PoolInner>>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_SIZES, DEFAULT_BUFFERS_PER_BUCKET)
    }
}

impl BufferPool {
    #[must_use]
    pub fn new(bucket_sizes: &[usize], buffers_per_bucket: usize) -> Self {
        let buckets = bucket_sizes
            .iter()
            .map(|&buffer_size| Bucket {
                buffer_size,
                free: Vec::with_capacity(buffers_per_bucket),
            })
            .collect();
        BufferPool {
            inner: Arc::new(Mutex::new(PoolInner {
                buckets,
                buffers_per_bucket,
            })),
        }
    }

    /// Acquires a zeroed buffer of at least `size` bytes, reusing a pooled
    /// one if a bucket fits and one is free.
    #[must_use]
    pub fn acquire(&self, size: usize) -> BytesMut {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(bucket) = inner
            .buckets
            .iter_mut()
            .find(|b| b.buffer_size >= size)
        {
            if let Some(mut buf) = bucket.free.pop() {
                buf.resize(size, 0);
                return buf;
            }
        }
        BytesMut::zeroed(size)
    }

    /// Returns a buffer to the pool, if it fits a bucket with room to spare.
    pub fn release(&self, mut buffer: BytesMut) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let buffers_per_bucket = inner.buffers_per_bucket;
        if let Some(bucket) = inner
            .buckets
            .iter_mut()
            .find(|b| b.buffer_size >= buffer.len())
        {
            if bucket.free.len() < buffers_per_bucket {
                buffer.clear();
                bucket.free.push(buffer);
            }
        }
    }
}

/// Allocates fresh [`Packet`] handles, drawing their backing buffer from a
/// shared [`BufferPool`] when one is prepared.
#[derive(Debug, Clone, Default)]
pub struct PacketFactory {
    buffers: BufferPool,
}

impl PacketFactory {
    #[must_use]
    pub fn new(buffers: BufferPool) -> Self {
        PacketFactory { buffers }
    }

    /// Allocates a new, empty packet.
    #[must_use]
    pub fn new_packet(&self) -> Packet {
        Packet::new()
    }

    /// Allocates a new packet already prepared with a pooled buffer of
    /// `size` bytes.
    #[must_use]
    pub fn new_prepared_packet(&self, size: usize) -> Packet {
        let packet = Packet::new();
        let buf = self.buffers.acquire(size);
        packet.set_buffer(buf.freeze());
        packet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_reuses_buffer_from_bucket() {
        let pool = BufferPool::new(&[64], 4);
        let buf = pool.acquire(32);
        assert_eq!(buf.len(), 32);
        pool.release(buf);

        let reused = pool.acquire(16);
        assert_eq!(reused.len(), 16);
    }

    #[test]
    fn bucket_over_capacity_drops_released_buffer() {
        let pool = BufferPool::new(&[64], 1);
        pool.release(BytesMut::zeroed(10));
        pool.release(BytesMut::zeroed(10));
        // Second release exceeded bucket capacity; pool silently drops it
        // rather than erroring, since a full bucket is routine, not fatal.
        let inner = pool.inner.lock().unwrap();
        assert_eq!(inner.buckets[0].free.len(), 1);
    }

    #[test]
    fn factory_prepares_packet_with_requested_size() {
        let factory = PacketFactory::default();
        let packet = factory.new_prepared_packet(256);
        assert_eq!(packet.buffer().len(), 256);
    }

    #[tokio::test]
    async fn pool_is_shared_across_tasks() {
        let pool = BufferPool::new(&[64], 8);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let buf = pool.acquire(32);
                pool.release(buf);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
