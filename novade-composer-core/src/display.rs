//! Registry of live displays and their per-display state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use novade_buffer_manager::{BufferCacheEntry, SlotCache};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{ComposerError, ComposerResult};
use crate::types::{DisplayId, LayerId};

/// Commit progress of one display within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommitState {
    #[default]
    Idle,
    Validating,
    Validated,
    ValidatedWithChanges,
    Presenting,
    Presented,
}

/// Commit bookkeeping kept with the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitTracker {
    pub state: CommitState,
    /// Validation reported changes the client has not accepted yet.
    pub pending_changes: bool,
}

/// Buffer caches of one layer.
#[derive(Debug)]
pub struct LayerBuffers {
    pub buffers: SlotCache,
    pub sideband_stream: BufferCacheEntry,
}

impl LayerBuffers {
    pub fn new(slot_count: u32) -> Self {
        Self {
            buffers: SlotCache::new(slot_count),
            sideband_stream: BufferCacheEntry::new(),
        }
    }
}

#[derive(Debug)]
pub struct DisplayData {
    pub id: DisplayId,
    pub is_virtual: bool,
    pub client_targets: SlotCache,
    /// Empty on physical displays.
    pub output_buffers: SlotCache,
    pub layers: BTreeMap<LayerId, LayerBuffers>,
    pub commit: CommitTracker,
    destroyed: bool,
}

impl DisplayData {
    fn new(id: DisplayId, is_virtual: bool, client_target_slots: u32, output_slots: u32) -> Self {
        Self {
            id,
            is_virtual,
            client_targets: SlotCache::new(client_target_slots),
            output_buffers: SlotCache::new(output_slots),
            layers: BTreeMap::new(),
            commit: CommitTracker::default(),
            destroyed: false,
        }
    }

    pub fn layer_mut(&mut self, layer: LayerId) -> ComposerResult<&mut LayerBuffers> {
        self.layers.get_mut(&layer).ok_or(ComposerError::BadLayer)
    }
}

/// Owned map from display id to display state.
///
/// Each display sits behind its own lock; the map lock is only held to find
/// or replace entries. A display removed while a caller still holds its
/// `Arc` is marked destroyed so stale handles fail with `BadDisplay`.
#[derive(Debug, Default)]
pub struct DisplayRegistry {
    displays: RwLock<HashMap<DisplayId, Arc<Mutex<DisplayData>>>>,
}

impl DisplayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a display. An existing entry with the same id is kept and `false`
    /// is returned.
    pub fn add_display(&self, id: DisplayId, is_virtual: bool, client_target_slots: u32, output_slots: u32) -> bool {
        let mut displays = self.displays.write();
        if displays.contains_key(&id) {
            debug!(display = id.0, "Display already registered");
            return false;
        }
        displays.insert(
            id,
            Arc::new(Mutex::new(DisplayData::new(id, is_virtual, client_target_slots, output_slots))),
        );
        debug!(display = id.0, is_virtual, "Display registered");
        true
    }

    /// Removes a display, releasing every buffer it cached.
    pub fn remove_display(&self, id: DisplayId) -> ComposerResult<()> {
        let removed = self.displays.write().remove(&id).ok_or(ComposerError::BadDisplay)?;
        let mut data = removed.lock();
        data.destroyed = true;
        data.layers.clear();
        data.client_targets.resize(0);
        data.output_buffers.resize(0);
        debug!(display = id.0, "Display removed");
        Ok(())
    }

    pub fn contains(&self, id: DisplayId) -> bool {
        self.displays.read().contains_key(&id)
    }

    /// Runs `f` on the display while holding its lock.
    pub fn with_display<R>(
        &self,
        id: DisplayId,
        f: impl FnOnce(&mut DisplayData) -> ComposerResult<R>,
    ) -> ComposerResult<R> {
        let display = self.displays.read().get(&id).cloned().ok_or(ComposerError::BadDisplay)?;
        let mut data = display.lock();
        if data.destroyed {
            return Err(ComposerError::BadDisplay);
        }
        f(&mut data)
    }

    pub fn add_layer(&self, display: DisplayId, layer: LayerId, slot_count: u32) -> ComposerResult<()> {
        self.with_display(display, |data| {
            data.layers.insert(layer, LayerBuffers::new(slot_count));
            Ok(())
        })
    }

    pub fn remove_layer(&self, display: DisplayId, layer: LayerId) -> ComposerResult<()> {
        self.with_display(display, |data| {
            data.layers.remove(&layer).map(|_| ()).ok_or(ComposerError::BadLayer)
        })
    }

    /// Snapshot of `(id, is_virtual, layers)` for every live display.
    pub fn snapshot(&self) -> Vec<(DisplayId, bool, Vec<LayerId>)> {
        let displays: Vec<_> = self.displays.read().values().cloned().collect();
        let mut out: Vec<_> = displays
            .iter()
            .map(|display| {
                let data = display.lock();
                (data.id, data.is_virtual, data.layers.keys().copied().collect())
            })
            .collect();
        out.sort_by_key(|(id, _, _)| *id);
        out
    }

    pub fn commit_tracker(&self, display: DisplayId) -> ComposerResult<CommitTracker> {
        self.with_display(display, |data| Ok(data.commit))
    }

    pub(crate) fn update_commit(
        &self,
        display: DisplayId,
        f: impl FnOnce(&mut CommitTracker),
    ) -> ComposerResult<()> {
        self.with_display(display, |data| {
            f(&mut data.commit);
            Ok(())
        })
    }
}
