//! # Novade Buffer Manager
//!
//! Buffer ownership for the NovaDE display composer: native handle
//! descriptors, the [`HandleImporter`] seam that acquires and releases buffer
//! references, the RAII [`BufferHandle`] with a single release point, and the
//! [`SlotCache`] arrays of [`BufferCacheEntry`] the composer keeps per display
//! and per layer.

pub mod buffer;
pub mod cache;
pub mod error;
pub mod handle;

pub use buffer::{BufferFormat, BufferId, BufferManager};
pub use cache::{BufferCacheEntry, SlotCache};
pub use error::BufferError;
pub use handle::{BufferHandle, HandleImporter, NativeHandle};

#[cfg(test)]
pub use handle::MockHandleImporter;
