//! The hardware display driver seam.
//!
//! List queries follow the two-call convention: called with `None` they
//! return the number of entries available, called with a slice they fill at
//! most `slice.len()` entries and return how many were written.

use std::sync::Arc;

use novade_buffer_manager::{BufferFormat, NativeHandle};

use crate::error::ComposerResult;
use crate::events::DisplayEventHandler;
use crate::result::{ChangedCompositionLayer, LayerRequestEntry, ReleaseFence};
use crate::types::{
    BlendMode, ClientTargetProperty, Color, Composition, Dataspace, DisplayId, DisplayRequest, FRect, Fence,
    LayerFlags, LayerId, LayerType, PerFrameMetadata, PerFrameMetadataBlob, Point, Rect, Transform,
};
use crate::writeback::CaptureConfig;

/// Non-error status of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommitStatus {
    #[default]
    Ok,
    /// Validation changed the composition of some layers; the client has to
    /// look at the changes before presenting.
    HasChanges,
}

/// What the driver did on `commit_or_prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitOutcome {
    pub status: CommitStatus,
    /// The frame was only prepared; the client must present it after validation.
    pub needs_commit: bool,
    /// Present fence, when the driver already committed the frame.
    pub present_fence: Option<Fence>,
}

pub trait DisplayDriver: Send + Sync {
    /// Installs the receiver of hotplug, refresh and vsync events, or removes it.
    fn register_event_handler(&self, handler: Option<Arc<dyn DisplayEventHandler>>);

    /// Fills raw capability codes.
    fn capabilities(&self, out: Option<&mut [i32]>) -> usize;

    fn create_layer(&self, display: DisplayId) -> ComposerResult<LayerId>;
    fn destroy_layer(&self, display: DisplayId, layer: LayerId) -> ComposerResult<()>;
    /// Returns the new display and the output format the driver picked.
    fn create_virtual_display(
        &self,
        width: u32,
        height: u32,
        format: BufferFormat,
    ) -> ComposerResult<(DisplayId, BufferFormat)>;
    fn destroy_virtual_display(&self, display: DisplayId) -> ComposerResult<()>;

    /// Validates the pending frame and, unless `validate_only`, may commit it
    /// right away.
    fn commit_or_prepare(&self, display: DisplayId, validate_only: bool) -> ComposerResult<CommitOutcome>;
    fn present_display(&self, display: DisplayId) -> ComposerResult<Option<Fence>>;
    fn accept_display_changes(&self, display: DisplayId) -> ComposerResult<()>;
    fn changed_composition_types(
        &self,
        display: DisplayId,
        out: Option<&mut [ChangedCompositionLayer]>,
    ) -> ComposerResult<usize>;
    /// Returns the display request mask and the layer request count.
    fn display_requests(
        &self,
        display: DisplayId,
        out: Option<&mut [LayerRequestEntry]>,
    ) -> ComposerResult<(DisplayRequest, usize)>;
    fn release_fences(&self, display: DisplayId, out: Option<&mut [ReleaseFence]>) -> ComposerResult<usize>;
    fn client_target_property(&self, display: DisplayId) -> ComposerResult<ClientTargetProperty>;
    fn refresh(&self, display: DisplayId) -> ComposerResult<()>;

    fn set_display_brightness(&self, display: DisplayId, brightness: f32) -> ComposerResult<()>;
    fn set_color_transform(&self, display: DisplayId, matrix: &[f32; 16]) -> ComposerResult<()>;
    fn set_client_target(
        &self,
        display: DisplayId,
        target: Option<&NativeHandle>,
        fence: Option<Fence>,
        dataspace: Dataspace,
        damage: &[Rect],
    ) -> ComposerResult<()>;
    fn set_output_buffer(
        &self,
        display: DisplayId,
        buffer: Option<&NativeHandle>,
        fence: Option<Fence>,
    ) -> ComposerResult<()>;
    fn set_expected_present_time(&self, display: DisplayId, timestamp_nanos: u64) -> ComposerResult<()>;
    fn set_display_elapse_time(&self, display: DisplayId, elapse_nanos: u64) -> ComposerResult<()>;

    fn set_layer_cursor_position(&self, display: DisplayId, layer: LayerId, position: Point) -> ComposerResult<()>;
    fn set_layer_buffer(
        &self,
        display: DisplayId,
        layer: LayerId,
        buffer: Option<&NativeHandle>,
        fence: Option<Fence>,
    ) -> ComposerResult<()>;
    fn set_layer_surface_damage(&self, display: DisplayId, layer: LayerId, damage: &[Rect]) -> ComposerResult<()>;
    fn set_layer_blend_mode(&self, display: DisplayId, layer: LayerId, mode: BlendMode) -> ComposerResult<()>;
    fn set_layer_composition_type(
        &self,
        display: DisplayId,
        layer: LayerId,
        composition: Composition,
    ) -> ComposerResult<()>;
    fn set_layer_color(&self, display: DisplayId, layer: LayerId, color: Color) -> ComposerResult<()>;
    fn set_layer_dataspace(&self, display: DisplayId, layer: LayerId, dataspace: Dataspace) -> ComposerResult<()>;
    fn set_layer_display_frame(&self, display: DisplayId, layer: LayerId, frame: Rect) -> ComposerResult<()>;
    fn set_layer_plane_alpha(&self, display: DisplayId, layer: LayerId, alpha: f32) -> ComposerResult<()>;
    fn set_layer_sideband_stream(
        &self,
        display: DisplayId,
        layer: LayerId,
        stream: Option<&NativeHandle>,
    ) -> ComposerResult<()>;
    fn set_layer_source_crop(&self, display: DisplayId, layer: LayerId, crop: FRect) -> ComposerResult<()>;
    fn set_layer_visible_region(&self, display: DisplayId, layer: LayerId, region: &[Rect]) -> ComposerResult<()>;
    fn set_layer_transform(&self, display: DisplayId, layer: LayerId, transform: Transform) -> ComposerResult<()>;
    fn set_layer_z_order(&self, display: DisplayId, layer: LayerId, z: u32) -> ComposerResult<()>;
    fn set_layer_per_frame_metadata(
        &self,
        display: DisplayId,
        layer: LayerId,
        metadata: &[PerFrameMetadata],
    ) -> ComposerResult<()>;
    fn set_layer_per_frame_metadata_blobs(
        &self,
        display: DisplayId,
        layer: LayerId,
        blobs: &[PerFrameMetadataBlob],
    ) -> ComposerResult<()>;
    fn set_layer_brightness(&self, display: DisplayId, layer: LayerId, brightness: f32) -> ComposerResult<()>;
    fn set_layer_blocking_region(&self, display: DisplayId, layer: LayerId, region: &[Rect]) -> ComposerResult<()>;
    fn set_layer_type(&self, display: DisplayId, layer: LayerId, layer_type: LayerType) -> ComposerResult<()>;
    fn set_layer_flags(&self, display: DisplayId, layer: LayerId, flags: LayerFlags) -> ComposerResult<()>;

    /// Queues `buffer` as the target of a capture of `display`. Completion is
    /// reported later through the writeback pipeline.
    fn submit_readback_buffer(
        &self,
        display: DisplayId,
        buffer: &NativeHandle,
        config: &CaptureConfig,
    ) -> ComposerResult<()>;
}

/// Runs a two-call query: size, then fill.
///
/// A count of zero is an empty result and skips the fill call.
pub fn query_sized<T, F>(mut query: F) -> ComposerResult<Vec<T>>
where
    T: Default + Clone,
    F: FnMut(Option<&mut [T]>) -> ComposerResult<usize>,
{
    let count = query(None)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut entries = vec![T::default(); count];
    let filled = query(Some(&mut entries))?;
    entries.truncate(filled.min(count));
    Ok(entries)
}
