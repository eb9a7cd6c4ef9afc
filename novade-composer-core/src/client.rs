//! The composer client: per-client display state, event forwarding and the
//! command entry points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use novade_buffer_manager::{BufferFormat, BufferId, NativeHandle};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::buffer_cache::BufferSlotCache;
use crate::command::{DisplayCommand, ExtendedDisplayCommand};
use crate::composer::Composer;
use crate::display::DisplayRegistry;
use crate::driver::DisplayDriver;
use crate::engine::CommandEngine;
use crate::error::{ComposerError, ComposerResult};
use crate::events::{ComposerCallback, DisplayEventHandler};
use crate::result::CommandResultPayload;
use crate::types::{DisplayId, LayerId, VsyncPeriodChangeTimeline};
use crate::writeback::{CaptureCallback, CaptureConfig, WritebackPipeline};

/// Display the driver is asked to refresh when another display disconnects.
const PRIMARY_DISPLAY: DisplayId = DisplayId(0);

/// Driver event sink of one client.
struct ClientEvents {
    registry: Arc<DisplayRegistry>,
    driver: Arc<dyn DisplayDriver>,
    command_lock: Arc<Mutex<()>>,
    callback: RwLock<Option<Arc<dyn ComposerCallback>>>,
    enabled: AtomicBool,
    initial_client_target_slots: u32,
    writeback: Arc<WritebackPipeline>,
}

impl ClientEvents {
    /// The consumer callback, when events are enabled.
    fn callback(&self, event: &'static str, display: DisplayId) -> Option<Arc<dyn ComposerCallback>> {
        let display_id = display.0;
        if !self.enabled.load(Ordering::Acquire) {
            warn!(display = display_id, event, "Callbacks disabled, dropping event");
            return None;
        }
        let callback = self.callback.read().clone();
        if callback.is_none() {
            warn!(display = display_id, event, "No callback registered, dropping event");
        }
        callback
    }
}

impl DisplayEventHandler for ClientEvents {
    fn on_hotplug(&self, display: DisplayId, connected: bool) {
        let Some(callback) = self.callback("hotplug", display) else {
            return;
        };
        let display_id = display.0;
        info!(display = display_id, connected, "Hotplug");
        if connected {
            self.registry
                .add_display(display, false, self.initial_client_target_slots, 0);
            callback.on_hotplug(display, true);
            return;
        }

        callback.on_hotplug(display, false);
        if let Err(err) = self.driver.refresh(PRIMARY_DISPLAY) {
            warn!(display = PRIMARY_DISPLAY.0, error = %err, "Refresh after disconnect failed");
        }
        let _guard = self.command_lock.lock();
        if let Err(err) = self.registry.remove_display(display) {
            debug!(display = display_id, error = %err, "Disconnected display was not tracked");
        }
        self.writeback.remove_display(display);
    }

    fn on_refresh(&self, display: DisplayId) {
        if let Some(callback) = self.callback("refresh", display) {
            callback.on_refresh(display);
        }
    }

    fn on_vsync(&self, display: DisplayId, timestamp_nanos: i64, vsync_period_nanos: i32) {
        if let Some(callback) = self.callback("vsync", display) {
            callback.on_vsync(display, timestamp_nanos, vsync_period_nanos);
        }
    }

    fn on_vsync_period_timing_changed(&self, display: DisplayId, timeline: VsyncPeriodChangeTimeline) {
        if let Some(callback) = self.callback("vsync_period_timing_changed", display) {
            callback.on_vsync_period_timing_changed(display, timeline);
        }
    }

    fn on_seamless_possible(&self, display: DisplayId) {
        if let Some(callback) = self.callback("seamless_possible", display) {
            callback.on_seamless_possible(display);
        }
    }

    fn on_vsync_idle(&self, display: DisplayId) {
        if let Some(callback) = self.callback("vsync_idle", display) {
            callback.on_vsync_idle(display);
        }
    }
}

/// A client of the [`Composer`]. Created through [`Composer::create_client`];
/// dropping it releases everything it created.
pub struct ComposerClient {
    composer: Arc<Composer>,
    events: Arc<ClientEvents>,
    registry: Arc<DisplayRegistry>,
    cache: BufferSlotCache,
}

impl ComposerClient {
    pub(crate) fn new(composer: Arc<Composer>) -> Self {
        let registry = Arc::new(DisplayRegistry::new());
        let events = Arc::new(ClientEvents {
            registry: registry.clone(),
            driver: composer.driver.clone(),
            command_lock: composer.command_lock.clone(),
            callback: RwLock::new(None),
            enabled: AtomicBool::new(false),
            initial_client_target_slots: composer.config.buffer_cache.initial_client_target_slot_count,
            writeback: composer.writeback.clone(),
        });
        composer.driver.register_event_handler(Some(events.clone()));
        let cache = BufferSlotCache::new(registry.clone(), composer.importer.clone());
        info!("Composer client created");
        Self {
            composer,
            events,
            registry,
            cache,
        }
    }

    /// Installs the consumer callback and enables event delivery.
    pub fn register_callback(&self, callback: Arc<dyn ComposerCallback>) {
        *self.events.callback.write() = Some(callback);
        self.events.enabled.store(true, Ordering::Release);
        debug!("Composer callback registered");
    }

    pub fn registry(&self) -> &DisplayRegistry {
        &self.registry
    }

    /// Creates a layer on `display` with `slot_count` buffer slots.
    ///
    /// If the display vanished between the driver call and the bookkeeping
    /// the driver layer is left alone and `BadDisplay` is returned.
    pub fn create_layer(&self, display: DisplayId, slot_count: u32) -> ComposerResult<LayerId> {
        let display_id = display.0;
        let layer = self.composer.driver.create_layer(display)?;
        if let Err(err) = self.registry.add_layer(display, layer, slot_count) {
            warn!(display = display_id, layer = layer.0, "Display vanished while creating layer");
            return Err(err);
        }
        debug!(display = display_id, layer = layer.0, slot_count, "Layer created");
        Ok(layer)
    }

    pub fn destroy_layer(&self, display: DisplayId, layer: LayerId) -> ComposerResult<()> {
        self.composer.driver.destroy_layer(display, layer)?;
        self.registry.remove_layer(display, layer)?;
        let display_id = display.0;
        debug!(display = display_id, layer = layer.0, "Layer destroyed");
        Ok(())
    }

    /// Creates a virtual display. Returns the display and the output format
    /// the driver chose.
    pub fn create_virtual_display(
        &self,
        width: u32,
        height: u32,
        format: BufferFormat,
        output_slot_count: u32,
    ) -> ComposerResult<(DisplayId, BufferFormat)> {
        let (display, format) = self.composer.driver.create_virtual_display(width, height, format)?;
        let display_id = display.0;
        let slots = self.events.initial_client_target_slots;
        if !self.registry.add_display(display, true, slots, output_slot_count) {
            warn!(display = display_id, "Virtual display id already tracked");
        }
        info!(display = display_id, width, height, ?format, "Virtual display created");
        Ok((display, format))
    }

    pub fn destroy_virtual_display(&self, display: DisplayId) -> ComposerResult<()> {
        self.composer.driver.destroy_virtual_display(display)?;
        self.registry.remove_display(display)?;
        self.composer.writeback.remove_display(display);
        let display_id = display.0;
        info!(display = display_id, "Virtual display destroyed");
        Ok(())
    }

    pub fn set_client_target_slot_count(&self, display: DisplayId, count: u32) -> ComposerResult<()> {
        self.cache.set_client_target_slot_count(display, count)
    }

    pub fn set_layer_buffer_slot_count(&self, display: DisplayId, layer: LayerId, count: u32) -> ComposerResult<()> {
        self.cache.set_layer_buffer_slot_count(display, layer, count)
    }

    /// Executes one command batch under the global command lock.
    pub fn execute_commands(&self, commands: &[DisplayCommand]) -> ComposerResult<Vec<CommandResultPayload>> {
        let _guard = self.composer.command_lock.lock();
        CommandEngine::new(self.composer.driver.as_ref(), &self.registry, &self.cache).execute(commands)
    }

    pub fn execute_extended_commands(
        &self,
        commands: &[ExtendedDisplayCommand],
    ) -> ComposerResult<Vec<CommandResultPayload>> {
        let _guard = self.composer.command_lock.lock();
        CommandEngine::new(self.composer.driver.as_ref(), &self.registry, &self.cache).execute_extended(commands)
    }

    /// Requests a capture of `display` into `buffer`. The result is delivered
    /// through `callback` once the driver reports completion.
    pub fn post_capture(
        &self,
        display: DisplayId,
        config: CaptureConfig,
        buffer: &NativeHandle,
        callback: Arc<dyn CaptureCallback>,
    ) -> ComposerResult<()> {
        if !self.registry.contains(display) {
            return Err(ComposerError::BadDisplay);
        }
        self.composer.writeback.post(display, config, buffer, callback)
    }

    /// Reports the driver's completion of the capture into `buffer_id`.
    pub fn notify_capture_done(&self, display: DisplayId, status: i32, buffer_id: BufferId) -> ComposerResult<()> {
        self.composer.writeback.on_completion(display, status, buffer_id)
    }

    /// Number of captures of `display` not yet notified.
    pub fn pending_captures(&self, display: DisplayId) -> usize {
        self.composer.writeback.pending(display)
    }

    fn final_present(&self, display: DisplayId) {
        let display_id = display.0;
        let driver = &self.composer.driver;
        match driver.commit_or_prepare(display, true) {
            Ok(_) => {
                if let Err(err) = driver.accept_display_changes(display) {
                    warn!(display = display_id, error = %err, "Final accept failed");
                }
                if let Err(err) = driver.present_display(display) {
                    warn!(display = display_id, error = %err, "Final present failed");
                }
            }
            Err(err) => warn!(display = display_id, error = %err, "Final validate failed"),
        }
    }
}

impl Drop for ComposerClient {
    fn drop(&mut self) {
        info!("Destroying composer client");
        self.events.enabled.store(false, Ordering::Release);
        self.composer.driver.register_event_handler(None);

        {
            let _guard = self.composer.command_lock.lock();
            for (display, is_virtual, layers) in self.registry.snapshot() {
                let display_id = display.0;
                debug!(display = display_id, layers = layers.len(), "Releasing client resources");
                for layer in layers {
                    if let Err(err) = self.composer.driver.destroy_layer(display, layer) {
                        warn!(display = display_id, layer = layer.0, error = %err, "Failed to destroy layer");
                    }
                }
                if is_virtual {
                    if let Err(err) = self.composer.driver.destroy_virtual_display(display) {
                        warn!(display = display_id, error = %err, "Failed to destroy virtual display");
                    }
                    self.composer.writeback.remove_display(display);
                } else {
                    self.final_present(display);
                }
                let _ = self.registry.remove_display(display);
            }
        }

        self.composer.on_client_destroyed();
        info!("Composer client removed");
    }
}
