//! Execution of command batches.
//!
//! Each display entry is applied field by field. A failing field records one
//! error against the entry's index and execution carries on with the next
//! field; nothing aborts the batch.

use tracing::{debug, warn};

use crate::buffer_cache::{BufferKind, BufferSlotCache};
use crate::command::{Buffer, ClientTarget, DisplayBrightness, DisplayCommand, ExtendedDisplayCommand, LayerCommand};
use crate::display::DisplayRegistry;
use crate::driver::DisplayDriver;
use crate::error::{ComposerError, ComposerResult};
use crate::result::{CommandResultPayload, ResultWriter};
use crate::types::{Color, DisplayId, LayerId, Transform};

pub struct CommandEngine<'a> {
    pub(crate) driver: &'a dyn DisplayDriver,
    pub(crate) registry: &'a DisplayRegistry,
    cache: &'a BufferSlotCache,
    pub(crate) writer: ResultWriter,
    command_index: usize,
}

impl<'a> CommandEngine<'a> {
    pub fn new(driver: &'a dyn DisplayDriver, registry: &'a DisplayRegistry, cache: &'a BufferSlotCache) -> Self {
        Self {
            driver,
            registry,
            cache,
            writer: ResultWriter::new(),
            command_index: 0,
        }
    }

    /// Executes a batch and returns the payloads it produced.
    ///
    /// # Errors
    ///
    /// `BadParameter` for an empty batch. Failures of individual commands
    /// are reported as [`CommandResultPayload::Error`] entries instead.
    pub fn execute(&mut self, commands: &[DisplayCommand]) -> ComposerResult<Vec<CommandResultPayload>> {
        if commands.is_empty() {
            return Err(ComposerError::BadParameter);
        }
        for (index, command) in commands.iter().enumerate() {
            self.command_index = index;
            self.execute_display_command(command);
        }
        self.command_index = 0;
        Ok(self.writer.take_pending_results())
    }

    /// Executes a vendor extension batch into the same result format.
    pub fn execute_extended(
        &mut self,
        commands: &[ExtendedDisplayCommand],
    ) -> ComposerResult<Vec<CommandResultPayload>> {
        if commands.is_empty() {
            return Err(ComposerError::BadParameter);
        }
        for (index, command) in commands.iter().enumerate() {
            self.command_index = index;
            self.execute_extended_display_command(command);
        }
        self.command_index = 0;
        Ok(self.writer.take_pending_results())
    }

    pub(crate) fn record(&mut self, display: DisplayId, op: &'static str, result: ComposerResult<()>) {
        if let Err(error) = result {
            let display_id = display.0;
            warn!(
                display = display_id,
                command_index = self.command_index,
                op,
                %error,
                "Command failed"
            );
            self.writer.set_error(self.command_index, error);
        }
    }

    fn apply<T>(
        &mut self,
        display: DisplayId,
        field: Option<&T>,
        op: &'static str,
        f: impl FnOnce(&mut Self, &T) -> ComposerResult<()>,
    ) {
        if let Some(value) = field {
            let result = f(self, value);
            self.record(display, op, result);
        }
    }

    fn execute_display_command(&mut self, command: &DisplayCommand) {
        let display = command.display;
        debug!(
            display = command.display.0,
            command_index = self.command_index,
            layers = command.layers.len(),
            "Executing display command"
        );

        self.apply(display, command.brightness.as_ref(), "set_display_brightness", |engine, brightness| {
            engine.set_display_brightness(display, brightness)
        });
        for layer in &command.layers {
            self.execute_layer_command(display, layer);
        }
        self.apply(display, command.color_transform.as_ref(), "set_color_transform", |engine, matrix| {
            engine.driver.set_color_transform(display, matrix)
        });
        self.apply(display, command.client_target.as_ref(), "set_client_target", |engine, target| {
            engine.set_client_target(display, target, target.buffer.handle.is_none())
        });
        self.apply(display, command.output_buffer.as_ref(), "set_output_buffer", |engine, buffer| {
            engine.set_output_buffer(display, buffer)
        });
        if let Some(commit) = command.commit {
            self.execute_commit(display, commit, command.expected_present_time);
        }
    }

    fn execute_layer_command(&mut self, display: DisplayId, command: &LayerCommand) {
        let layer = command.layer;
        self.apply(display, command.cursor_position.as_ref(), "set_layer_cursor_position", |engine, position| {
            engine.driver.set_layer_cursor_position(display, layer, *position)
        });
        self.apply(display, command.buffer.as_ref(), "set_layer_buffer", |engine, buffer| {
            engine.set_layer_buffer(display, layer, buffer)
        });
        self.apply(display, command.damage.as_ref(), "set_layer_surface_damage", |engine, damage| {
            engine.driver.set_layer_surface_damage(display, layer, damage)
        });
        self.apply(display, command.blend_mode.as_ref(), "set_layer_blend_mode", |engine, mode| {
            engine.driver.set_layer_blend_mode(display, layer, *mode)
        });
        self.apply(display, command.composition.as_ref(), "set_layer_composition_type", |engine, composition| {
            engine.driver.set_layer_composition_type(display, layer, *composition)
        });
        self.apply(display, command.color.as_ref(), "set_layer_color", |engine, color| {
            engine.driver.set_layer_color(display, layer, Color::from(*color))
        });
        self.apply(display, command.dataspace.as_ref(), "set_layer_dataspace", |engine, dataspace| {
            engine.driver.set_layer_dataspace(display, layer, *dataspace)
        });
        self.apply(display, command.display_frame.as_ref(), "set_layer_display_frame", |engine, frame| {
            engine.driver.set_layer_display_frame(display, layer, *frame)
        });
        self.apply(display, command.plane_alpha.as_ref(), "set_layer_plane_alpha", |engine, alpha| {
            engine.driver.set_layer_plane_alpha(display, layer, *alpha)
        });
        self.apply(display, command.sideband_stream.as_ref(), "set_layer_sideband_stream", |engine, stream| {
            engine.set_layer_sideband_stream(display, layer, stream)
        });
        self.apply(display, command.source_crop.as_ref(), "set_layer_source_crop", |engine, crop| {
            engine.driver.set_layer_source_crop(display, layer, *crop)
        });
        self.apply(display, command.visible_region.as_ref(), "set_layer_visible_region", |engine, region| {
            engine.driver.set_layer_visible_region(display, layer, region)
        });
        self.apply(display, command.transform.as_ref(), "set_layer_transform", |engine, transform| {
            let transform = if transform.contains(Transform::INVALID_HINT) {
                Transform::empty()
            } else {
                *transform
            };
            engine.driver.set_layer_transform(display, layer, transform)
        });
        self.apply(display, command.z_order.as_ref(), "set_layer_z_order", |engine, z| {
            engine.driver.set_layer_z_order(display, layer, *z)
        });
        self.apply(display, command.per_frame_metadata.as_ref(), "set_layer_per_frame_metadata", |engine, metadata| {
            engine.driver.set_layer_per_frame_metadata(display, layer, metadata)
        });
        self.apply(
            display,
            command.per_frame_metadata_blob.as_ref(),
            "set_layer_per_frame_metadata_blobs",
            |engine, blobs| engine.driver.set_layer_per_frame_metadata_blobs(display, layer, blobs),
        );
        self.apply(display, command.brightness.as_ref(), "set_layer_brightness", |engine, brightness| {
            if !brightness.is_finite() || !(0.0..=1.0).contains(brightness) {
                return Err(ComposerError::BadParameter);
            }
            engine.driver.set_layer_brightness(display, layer, *brightness)
        });
        self.apply(display, command.blocking_region.as_ref(), "set_layer_blocking_region", |engine, region| {
            engine.driver.set_layer_blocking_region(display, layer, region)
        });
    }

    fn execute_extended_display_command(&mut self, command: &ExtendedDisplayCommand) {
        let display = command.display;
        for layer_command in &command.layers {
            let layer = layer_command.layer;
            self.apply(display, layer_command.layer_type.as_ref(), "set_layer_type", |engine, layer_type| {
                engine.driver.set_layer_type(display, layer, *layer_type)
            });
            self.apply(display, layer_command.layer_flags.as_ref(), "set_layer_flags", |engine, flags| {
                engine.driver.set_layer_flags(display, layer, *flags)
            });
        }
        self.apply(display, command.client_target.as_ref(), "set_cached_client_target", |engine, target| {
            engine.set_client_target(display, target, true)
        });
        self.apply(display, command.elapse_time.as_ref(), "set_display_elapse_time", |engine, elapse| {
            engine.driver.set_display_elapse_time(display, *elapse)
        });
    }

    fn set_display_brightness(&self, display: DisplayId, brightness: &DisplayBrightness) -> ComposerResult<()> {
        let value = brightness.brightness;
        let valid = value.is_finite() && ((0.0..=1.0).contains(&value) || value == -1.0);
        if !valid {
            return Err(ComposerError::BadParameter);
        }
        self.driver.set_display_brightness(display, value)
    }

    // The driver's status wins over the cache update's, but the update always
    // runs so an imported buffer ends up in its slot or is released.

    fn set_layer_buffer(&self, display: DisplayId, layer: LayerId, buffer: &Buffer) -> ComposerResult<()> {
        let use_cache = buffer.handle.is_none();
        let kind = BufferKind::LayerBuffer(layer);
        let resolved = self
            .cache
            .lookup(display, kind, buffer.slot, use_cache, buffer.handle.as_ref())?;
        let result = self
            .driver
            .set_layer_buffer(display, layer, resolved.native(), buffer.fence);
        let updated = self.cache.update(display, kind, buffer.slot, use_cache, resolved);
        result.and(updated)
    }

    fn set_layer_sideband_stream(
        &self,
        display: DisplayId,
        layer: LayerId,
        stream: &novade_buffer_manager::NativeHandle,
    ) -> ComposerResult<()> {
        let kind = BufferKind::SidebandStream(layer);
        let resolved = self.cache.lookup(display, kind, 0, false, Some(stream))?;
        let result = self
            .driver
            .set_layer_sideband_stream(display, layer, resolved.native());
        let updated = self.cache.update(display, kind, 0, false, resolved);
        result.and(updated)
    }

    fn set_client_target(&self, display: DisplayId, target: &ClientTarget, use_cache: bool) -> ComposerResult<()> {
        let kind = BufferKind::ClientTarget;
        let slot = target.buffer.slot;
        let resolved = self
            .cache
            .lookup(display, kind, slot, use_cache, target.buffer.handle.as_ref())?;
        let result = self.driver.set_client_target(
            display,
            resolved.native(),
            target.buffer.fence,
            target.dataspace,
            &target.damage,
        );
        let updated = self.cache.update(display, kind, slot, use_cache, resolved);
        result.and(updated)
    }

    fn set_output_buffer(&self, display: DisplayId, buffer: &Buffer) -> ComposerResult<()> {
        let use_cache = buffer.handle.is_none();
        let kind = BufferKind::OutputBuffer;
        let resolved = self
            .cache
            .lookup(display, kind, buffer.slot, use_cache, buffer.handle.as_ref())?;
        let result = self.driver.set_output_buffer(display, resolved.native(), buffer.fence);
        let updated = self.cache.update(display, kind, buffer.slot, use_cache, resolved);
        result.and(updated)
    }
}
