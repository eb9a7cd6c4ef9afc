//! Command batches submitted by the client.
//!
//! Every field is optional and only present fields are applied. Per display
//! entry the order is: display brightness, the layer commands (each in the
//! field order of [`LayerCommand`]), color transform, client target, output
//! buffer, then the single commit command.

use novade_buffer_manager::NativeHandle;

use crate::types::{
    BlendMode, Composition, Dataspace, DisplayId, FColor, FRect, Fence, LayerFlags, LayerId, LayerType,
    PerFrameMetadata, PerFrameMetadataBlob, Point, Rect, Transform,
};

/// A buffer reference: a slot of a cache plus an optional new handle.
///
/// Without a handle the buffer already cached in `slot` is used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Buffer {
    pub slot: u32,
    pub handle: Option<NativeHandle>,
    pub fence: Option<Fence>,
}

impl Buffer {
    /// A buffer that replaces the content of `slot`.
    pub fn new(slot: u32, handle: NativeHandle) -> Self {
        Self {
            slot,
            handle: Some(handle),
            fence: None,
        }
    }

    /// A buffer that reuses the content of `slot`.
    pub fn cached(slot: u32) -> Self {
        Self {
            slot,
            handle: None,
            fence: None,
        }
    }

    pub fn with_fence(mut self, fence: Fence) -> Self {
        self.fence = Some(fence);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientTarget {
    pub buffer: Buffer,
    pub dataspace: Dataspace,
    pub damage: Vec<Rect>,
}

/// Display brightness in `[0, 1]`, or `-1` to turn the backlight off.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayBrightness {
    pub brightness: f32,
}

/// The commit step ending a display entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitCommand {
    Validate,
    AcceptChanges,
    Present,
    PresentOrValidate,
}

/// Per-layer mutations, applied in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerCommand {
    pub layer: LayerId,
    pub cursor_position: Option<Point>,
    pub buffer: Option<Buffer>,
    pub damage: Option<Vec<Rect>>,
    pub blend_mode: Option<BlendMode>,
    pub composition: Option<Composition>,
    pub color: Option<FColor>,
    pub dataspace: Option<Dataspace>,
    pub display_frame: Option<Rect>,
    pub plane_alpha: Option<f32>,
    pub sideband_stream: Option<NativeHandle>,
    pub source_crop: Option<FRect>,
    pub visible_region: Option<Vec<Rect>>,
    pub transform: Option<Transform>,
    pub z_order: Option<u32>,
    pub per_frame_metadata: Option<Vec<PerFrameMetadata>>,
    pub per_frame_metadata_blob: Option<Vec<PerFrameMetadataBlob>>,
    pub brightness: Option<f32>,
    pub blocking_region: Option<Vec<Rect>>,
}

impl LayerCommand {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayCommand {
    pub display: DisplayId,
    pub brightness: Option<DisplayBrightness>,
    pub layers: Vec<LayerCommand>,
    pub color_transform: Option<[f32; 16]>,
    pub client_target: Option<ClientTarget>,
    pub output_buffer: Option<Buffer>,
    /// Forwarded before `Validate` and `PresentOrValidate`, in nanoseconds.
    pub expected_present_time: Option<i64>,
    pub commit: Option<CommitCommand>,
}

impl DisplayCommand {
    pub fn new(display: DisplayId) -> Self {
        Self {
            display,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtendedLayerCommand {
    pub layer: LayerId,
    pub layer_type: Option<LayerType>,
    pub layer_flags: Option<LayerFlags>,
}

/// Vendor extension entry.
///
/// `client_target` always uses the buffer cached in its slot; a supplied
/// handle is ignored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendedDisplayCommand {
    pub display: DisplayId,
    pub layers: Vec<ExtendedLayerCommand>,
    pub client_target: Option<ClientTarget>,
    /// Time elapsed since the last frame, in nanoseconds.
    pub elapse_time: Option<u64>,
}
