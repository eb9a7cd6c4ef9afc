//! Slot caches of owned buffer handles.

use tracing::trace;

use crate::error::BufferError;
use crate::handle::{BufferHandle, NativeHandle};

/// One cache slot. Holds at most one handle and is never shared.
#[derive(Debug, Default)]
pub struct BufferCacheEntry {
    handle: Option<BufferHandle>,
}

impl BufferCacheEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handle`, releasing the previously held one first.
    pub fn assign(&mut self, handle: Option<BufferHandle>) {
        self.clear();
        self.handle = handle;
    }

    /// Releases the held handle, if any.
    pub fn clear(&mut self) {
        if let Some(old) = self.handle.take() {
            trace!(buffer = old.id().raw(), "Releasing cached buffer");
        }
    }

    pub fn handle(&self) -> Option<&NativeHandle> {
        self.handle.as_ref().map(BufferHandle::native)
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }
}

/// Fixed-size array of [`BufferCacheEntry`], resized only on request.
#[derive(Debug, Default)]
pub struct SlotCache {
    entries: Vec<BufferCacheEntry>,
}

impl SlotCache {
    pub fn new(slot_count: u32) -> Self {
        let mut cache = Self::default();
        cache.resize(slot_count);
        cache
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Grows with empty entries or shrinks, releasing the handles held by the
    /// removed slots.
    pub fn resize(&mut self, slot_count: u32) {
        let slot_count = slot_count as usize;
        if slot_count < self.entries.len() {
            let released = self.entries[slot_count..].iter().filter(|e| !e.is_empty()).count();
            if released > 0 {
                trace!(released, new_len = slot_count, "Shrinking slot cache drops populated entries");
            }
        }
        self.entries.resize_with(slot_count, BufferCacheEntry::new);
    }

    pub fn get(&self, slot: u32) -> Result<&BufferCacheEntry, BufferError> {
        let len = self.entries.len();
        self.entries
            .get(slot as usize)
            .ok_or(BufferError::SlotOutOfRange { slot, len })
    }

    pub fn get_mut(&mut self, slot: u32) -> Result<&mut BufferCacheEntry, BufferError> {
        let len = self.entries.len();
        self.entries
            .get_mut(slot as usize)
            .ok_or(BufferError::SlotOutOfRange { slot, len })
    }

    /// Number of slots currently holding a handle.
    pub fn populated(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_empty()).count()
    }
}
