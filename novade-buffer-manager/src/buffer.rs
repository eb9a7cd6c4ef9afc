//! Buffer identities, formats and the reference counting importer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::BufferError;
use crate::handle::{HandleImporter, NativeHandle};

/// Identity of a buffer as reported by its allocator.
///
/// The raw value `0` is reserved for buffers without an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BufferId(u64);

impl BufferId {
    /// The "no identity" value.
    pub const NONE: BufferId = BufferId(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Creates a new, process-unique `BufferId`. Never returns [`BufferId::NONE`].
    pub fn new_unique() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        BufferId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Enumerates common pixel formats for buffers.
///
/// These formats align with DRM fourcc formats. This list can be extended as
/// more formats are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferFormat {
    /// 32-bit RGBA, 8 bits per channel.
    #[default]
    Rgba8888,
    /// 32-bit RGBX, alpha ignored.
    Rgbx8888,
    /// 32-bit ARGB format, 8 bits per channel, alpha first.
    Argb8888,
    /// 32-bit XRGB format, 8 bits per channel, alpha ignored (X).
    Xrgb8888,
    /// 16-bit RGB, 5-6-5.
    Rgb565,
    /// 64-bit RGBA, half float per channel.
    RgbaFp16,
    /// 32-bit RGBA, 10 bits per colour channel and 2 bits of alpha.
    Rgba1010102,
    /// YUV format, NV12 (2-plane Y followed by interleaved UV).
    Nv12,
}

/// Bookkeeping for one imported buffer identity.
#[derive(Debug)]
struct BufferDetails {
    ref_count: usize,
    fd_count: usize,
}

#[derive(Debug, Default)]
struct ManagerState {
    buffers: HashMap<BufferId, BufferDetails>,
    live: usize,
}

/// Reference counting [`HandleImporter`] with an upper bound on live imports.
///
/// Every successful import of a handle adds one reference to its identity and
/// every free removes one. Buffers without an identity are counted under
/// [`BufferId::NONE`].
#[derive(Debug)]
pub struct BufferManager {
    state: Mutex<ManagerState>,
    capacity: usize,
}

impl BufferManager {
    /// Creates a new, empty `BufferManager` accepting at most `capacity` live imports.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(ManagerState::default()),
            capacity,
        }
    }

    /// Number of outstanding imports of `id`.
    pub fn ref_count(&self, id: BufferId) -> usize {
        self.state.lock().buffers.get(&id).map_or(0, |details| details.ref_count)
    }

    /// Total number of outstanding imports across all identities.
    pub fn live_buffers(&self) -> usize {
        self.state.lock().live
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl HandleImporter for BufferManager {
    fn import_buffer(&self, handle: &NativeHandle) -> Result<(), BufferError> {
        if let Some(fd) = handle.fds.iter().find(|fd| **fd < 0) {
            return Err(BufferError::InvalidHandle(
                handle.buffer_id,
                format!("negative file descriptor {}", fd),
            ));
        }

        let mut state = self.state.lock();
        if state.live >= self.capacity {
            warn!(buffer = handle.buffer_id.raw(), limit = self.capacity, "Buffer import rejected, capacity reached");
            return Err(BufferError::CapacityExceeded { limit: self.capacity });
        }

        let details = state.buffers.entry(handle.buffer_id).or_insert(BufferDetails {
            ref_count: 0,
            fd_count: handle.fds.len(),
        });
        details.ref_count += 1;
        debug!(
            buffer = handle.buffer_id.raw(),
            fds = details.fd_count,
            refs = details.ref_count,
            "Imported buffer"
        );
        state.live += 1;
        Ok(())
    }

    fn free_buffer(&self, handle: &NativeHandle) {
        let mut state = self.state.lock();
        let remove = match state.buffers.get_mut(&handle.buffer_id) {
            Some(details) => {
                details.ref_count -= 1;
                details.ref_count == 0
            }
            None => {
                warn!(buffer = handle.buffer_id.raw(), "Freeing a buffer that was never imported");
                return;
            }
        };
        if remove {
            state.buffers.remove(&handle.buffer_id);
        }
        state.live -= 1;
        debug!(buffer = handle.buffer_id.raw(), "Freed buffer");
    }
}
