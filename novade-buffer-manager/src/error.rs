//! Errors raised while importing, releasing or caching buffers.

use crate::buffer::BufferId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The native handle cannot describe a buffer (for example a negative fd).
    #[error("Invalid native handle for buffer {0:?}: {1}")]
    InvalidHandle(BufferId, String),

    /// The importer refused the buffer.
    #[error("Failed to import buffer {id:?}: {reason}")]
    ImportFailed { id: BufferId, reason: String },

    /// Importing would exceed the configured number of live buffers.
    #[error("Too many imported buffers (limit {limit})")]
    CapacityExceeded { limit: usize },

    /// A slot index beyond the end of a slot cache.
    #[error("Slot {slot} out of range for cache of {len} slots")]
    SlotOutOfRange { slot: u32, len: usize },
}
