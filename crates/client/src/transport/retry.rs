//! Bounded replay queue for records whose send failed

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;

/// FIFO of encoded records, dropping the oldest when full
pub struct RetryQueue {
    records: Mutex<VecDeque<Bytes>>,
    capacity: usize,
    evicted: AtomicU64,
}

impl RetryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            evicted: AtomicU64::new(0),
        }
    }

    /// Append a record, evicting the oldest at capacity
    ///
    /// With zero capacity the record is dropped immediately.
    pub fn push(&self, record: Bytes) {
        if self.capacity == 0 {
            self.evicted.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut records = self.records.lock();
        if records.len() >= self.capacity {
            records.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                capacity = self.capacity,
                "retry queue full, dropped oldest record"
            );
        }
        records.push_back(record);
    }

    /// Take the oldest record
    pub fn pop(&self) -> Option<Bytes> {
        self.records.lock().pop_front()
    }

    /// Put a record back at the head after a failed replay
    ///
    /// If new records filled the queue in the meantime, the newest is dropped
    /// to keep the bound.
    pub fn push_front(&self, record: Bytes) {
        if self.capacity == 0 {
            self.evicted.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut records = self.records.lock();
        if records.len() >= self.capacity {
            records.pop_back();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        records.push_front(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records dropped because the queue was full
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u8) -> Bytes {
        Bytes::from(vec![n; 4])
    }

    #[test]
    fn test_fifo_order() {
        let queue = RetryQueue::new(3);
        queue.push(record(1));
        queue.push(record(2));

        assert_eq!(queue.pop(), Some(record(1)));
        assert_eq!(queue.pop(), Some(record(2)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_bound_evicts_oldest() {
        let queue = RetryQueue::new(10);
        for n in 0..15 {
            queue.push(record(n));
        }

        assert_eq!(queue.len(), 10);
        assert_eq!(queue.evicted(), 5);
        assert_eq!(queue.pop(), Some(record(5)));
    }

    #[test]
    fn test_push_front_keeps_bound() {
        let queue = RetryQueue::new(2);
        queue.push(record(1));
        queue.push(record(2));

        queue.push_front(record(0));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(record(0)));
        assert_eq!(queue.pop(), Some(record(1)));
    }

    #[test]
    fn test_zero_capacity_drops_everything() {
        let queue = RetryQueue::new(0);
        queue.push(record(1));
        queue.push_front(record(2));

        assert!(queue.is_empty());
        assert_eq!(queue.evicted(), 2);
    }
}
