//! Bounded byte buffer for record encoding
//!
//! `RawBuffer` wraps a `BytesMut` with a hard size limit. Appends are
//! all-or-nothing: an append that would pass the limit fails and leaves the
//! buffer untouched. Capacity grows by doubling, clamped to the limit.

use bytes::{Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::{MAX_DATA_SIZE, Result};

/// Initial allocation for a fresh buffer
const DEFAULT_CAPACITY: usize = 256;

/// Growable byte buffer with a fixed upper bound
#[derive(Debug, Clone)]
pub struct RawBuffer {
    data: BytesMut,
    limit: usize,
}

impl RawBuffer {
    /// Create a buffer bounded by `MAX_DATA_SIZE`
    pub fn new() -> Self {
        Self::with_limit(MAX_DATA_SIZE)
    }

    /// Create a buffer bounded by `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(DEFAULT_CAPACITY.min(limit)),
            limit,
        }
    }

    /// Append bytes at the end
    ///
    /// Fails without writing anything if the result would exceed the limit.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let remaining = self.remaining();
        if bytes.len() > remaining {
            return Err(ProtocolError::buffer_overflow(bytes.len(), remaining));
        }

        let needed = self.data.len() + bytes.len();
        if needed > self.data.capacity() {
            let target = (self.data.capacity() * 2).max(needed).min(self.limit);
            self.data.reserve(target - self.data.len());
        }

        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Append a single byte
    #[inline]
    pub fn append_u8(&mut self, value: u8) -> Result<()> {
        self.append(&[value])
    }

    /// Overwrite already-written bytes starting at `offset`
    ///
    /// Used to patch the length prefix once the record is complete.
    pub fn update(&mut self, bytes: &[u8], offset: usize) -> Result<()> {
        let buffer_len = self.data.len();
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= buffer_len)
            .ok_or(ProtocolError::UpdateOutOfRange {
                offset,
                len: bytes.len(),
                buffer_len,
            })?;

        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Drop all content, keeping the allocation
    #[inline]
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Number of bytes written
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing has been written
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes still available before the limit
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.data.len())
    }

    /// Current allocation size
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Hard upper bound on length
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// View the written bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy the written bytes into an immutable `Bytes`
    ///
    /// The buffer keeps its content so it can be rebuilt or inspected.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }

    /// Take the written bytes, leaving the buffer empty
    pub fn take(&mut self) -> Bytes {
        self.data.split().freeze()
    }
}

impl Default for RawBuffer {
    fn default() -> Self {
        Self::new()
    }
}
