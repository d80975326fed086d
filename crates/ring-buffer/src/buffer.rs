//! Fixed-Capacity Ring Buffer Implementation

use crate::RingBufferError;
use std::collections::vec_deque::{self, VecDeque};

/// Default buffer capacity (10 samples)
pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity FIFO ring buffer.
///
/// Holds at most `capacity` items in insertion order. Pushing into a full
/// buffer evicts the oldest item. Synchronization is left to the owner.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Storage, oldest item at the front
    storage: VecDeque<T>,
    /// Capacity of the buffer
    capacity: usize,
    /// Total items written (for statistics)
    total_written: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::ZeroCapacity);
        }
        Ok(Self {
            storage: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        })
    }

    /// Create a buffer with default capacity (10 items)
    pub fn with_default_capacity() -> Self {
        Self {
            storage: VecDeque::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
            total_written: 0,
        }
    }

    /// Push an item into the buffer, returning the evicted oldest item if full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.storage.len() == self.capacity {
            self.storage.pop_front()
        } else {
            None
        };
        self.storage.push_back(item);
        self.total_written += 1;
        evicted
    }

    /// Get the number of items currently in the buffer
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate items oldest first
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.storage.iter()
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<&T> {
        self.storage.back()
    }

    /// Get total items written since creation (for statistics)
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
