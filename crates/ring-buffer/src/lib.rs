//! Ring Buffer
//!
//! Provides a fixed-capacity FIFO ring buffer used for rolling sample windows.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};

use thiserror::Error;

/// Ring buffer errors
#[derive(Debug, Error)]
pub enum RingBufferError {
    #[error("Ring buffer capacity must be at least 1")]
    ZeroCapacity,
}
