//! Buffer lookups against the per-display and per-layer slot caches.
//!
//! A command either names a slot and a new handle, which is imported and
//! then stored in the slot, or names only a slot and reuses what it holds.

use std::sync::Arc;

use novade_buffer_manager::{BufferCacheEntry, BufferHandle, HandleImporter, NativeHandle};
use tracing::trace;

use crate::display::{DisplayData, DisplayRegistry};
use crate::error::{ComposerError, ComposerResult};
use crate::types::{DisplayId, LayerId};

/// Which cache a buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    ClientTarget,
    /// Virtual displays only; physical displays have no output slots.
    OutputBuffer,
    LayerBuffer(LayerId),
    /// Single slot (`0`), cloned rather than imported.
    SidebandStream(LayerId),
}

/// A buffer resolved for one command, ready to hand to the driver.
#[derive(Debug)]
pub enum ResolvedBuffer {
    /// No handle was supplied.
    Empty,
    /// Copy of the handle held by the slot. Owns no reference.
    Cached(Option<NativeHandle>),
    /// Freshly imported (or cloned) handle, to be stored by `update`.
    Owned(BufferHandle),
}

impl ResolvedBuffer {
    pub fn native(&self) -> Option<&NativeHandle> {
        match self {
            ResolvedBuffer::Empty => None,
            ResolvedBuffer::Cached(handle) => handle.as_ref(),
            ResolvedBuffer::Owned(handle) => Some(handle.native()),
        }
    }
}

fn cache_entry(data: &mut DisplayData, kind: BufferKind, slot: u32) -> ComposerResult<&mut BufferCacheEntry> {
    match kind {
        BufferKind::ClientTarget => Ok(data.client_targets.get_mut(slot)?),
        BufferKind::OutputBuffer => Ok(data.output_buffers.get_mut(slot)?),
        BufferKind::LayerBuffer(layer) => Ok(data.layer_mut(layer)?.buffers.get_mut(slot)?),
        BufferKind::SidebandStream(layer) => {
            let layer = data.layer_mut(layer)?;
            if slot != 0 {
                return Err(ComposerError::BadParameter);
            }
            Ok(&mut layer.sideband_stream)
        }
    }
}

/// Front end of the slot caches held in the [`DisplayRegistry`].
pub struct BufferSlotCache {
    registry: Arc<DisplayRegistry>,
    importer: Arc<dyn HandleImporter>,
}

impl BufferSlotCache {
    pub fn new(registry: Arc<DisplayRegistry>, importer: Arc<dyn HandleImporter>) -> Self {
        Self { registry, importer }
    }

    /// Resolves the buffer a command refers to.
    ///
    /// With `use_cache` the supplied handle is ignored and the slot content is
    /// returned; the display, layer and slot must exist. Otherwise the handle
    /// is imported (cloned for sideband streams) without touching the cache.
    pub fn lookup(
        &self,
        display: DisplayId,
        kind: BufferKind,
        slot: u32,
        use_cache: bool,
        handle: Option<&NativeHandle>,
    ) -> ComposerResult<ResolvedBuffer> {
        if use_cache {
            return self.registry.with_display(display, |data| {
                let entry = cache_entry(data, kind, slot)?;
                Ok(ResolvedBuffer::Cached(entry.handle().cloned()))
            });
        }

        let Some(handle) = handle else {
            return Ok(ResolvedBuffer::Empty);
        };
        match kind {
            BufferKind::SidebandStream(_) => Ok(ResolvedBuffer::Owned(BufferHandle::cloned(handle))),
            _ => {
                let imported = BufferHandle::import(self.importer.clone(), handle)?;
                let display_id = display.0;
                trace!(display = display_id, buffer = handle.buffer_id.raw(), ?kind, "Imported buffer");
                Ok(ResolvedBuffer::Owned(imported))
            }
        }
    }

    /// Stores a buffer returned by [`BufferSlotCache::lookup`] into its slot,
    /// releasing what the slot held. A no-op for cached lookups.
    ///
    /// On failure the buffer is released.
    pub fn update(
        &self,
        display: DisplayId,
        kind: BufferKind,
        slot: u32,
        use_cache: bool,
        buffer: ResolvedBuffer,
    ) -> ComposerResult<()> {
        if use_cache {
            return Ok(());
        }
        let handle = match buffer {
            ResolvedBuffer::Owned(handle) => Some(handle),
            ResolvedBuffer::Empty | ResolvedBuffer::Cached(_) => None,
        };
        self.registry.with_display(display, |data| {
            cache_entry(data, kind, slot)?.assign(handle);
            Ok(())
        })
    }

    pub fn set_client_target_slot_count(&self, display: DisplayId, count: u32) -> ComposerResult<()> {
        self.registry.with_display(display, |data| {
            data.client_targets.resize(count);
            Ok(())
        })
    }

    pub fn set_layer_buffer_slot_count(&self, display: DisplayId, layer: LayerId, count: u32) -> ComposerResult<()> {
        self.registry.with_display(display, |data| {
            data.layer_mut(layer)?.buffers.resize(count);
            Ok(())
        })
    }
}
