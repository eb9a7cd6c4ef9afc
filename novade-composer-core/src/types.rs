//! Value types shared by commands, results and the driver interface.

use std::fmt;

use bitflags::bitflags;
use novade_buffer_manager::BufferFormat;

/// Identifier of a display, assigned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DisplayId(pub i64);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a layer, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LayerId(pub i64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer rectangle, edges exclusive on the right and bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Colour as sent by clients, channels nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// 8-bit colour as consumed by drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<FColor> for Color {
    fn from(color: FColor) -> Self {
        fn channel(v: f32) -> u8 {
            // NaN saturates to 0 in the cast.
            (255.0 * v).round().clamp(0.0, 255.0) as u8
        }
        Color {
            r: channel(color.r),
            g: channel(color.g),
            b: channel(color.b),
            a: channel(color.a),
        }
    }
}

/// How a layer is composed onto the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Composition {
    #[default]
    Invalid,
    Client,
    Device,
    SolidColor,
    Cursor,
    Sideband,
    DisplayDecoration,
    RefreshRateIndicator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Invalid,
    None,
    Premultiplied,
    Coverage,
}

/// Opaque dataspace value, forwarded untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dataspace(pub i32);

bitflags! {
    /// Layer transform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Transform: u32 {
        const FLIP_H = 1;
        const FLIP_V = 2;
        const ROT_90 = 4;
        const ROT_180 = Self::FLIP_H.bits() | Self::FLIP_V.bits();
        const ROT_270 = Self::ROT_180.bits() | Self::ROT_90.bits();
        /// Hint that the rotation could not be expressed; applied as no transform.
        const INVALID_HINT = 128;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerFrameMetadata {
    pub key: i32,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerFrameMetadataBlob {
    pub key: i32,
    pub blob: Vec<u8>,
}

/// Sync fence file descriptor handed across the driver boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fence {
    pub fd: i32,
}

/// Format the driver wants the client target rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClientTargetProperty {
    pub pixel_format: BufferFormat,
    pub dataspace: Dataspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DimmingStage {
    #[default]
    None,
    Linear,
    Gamma,
}

bitflags! {
    /// Display-wide requests returned by validation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DisplayRequest: u32 {
        const FLIP_CLIENT_TARGET = 1;
        const WRITE_CLIENT_TARGET_TO_OUTPUT = 2;
    }
}

bitflags! {
    /// Per-layer requests returned by validation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayerRequest: u32 {
        const CLEAR_CLIENT_TARGET = 1;
    }
}

/// Vendor classification of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerType {
    #[default]
    Unknown,
    App,
    Game,
    Browser,
}

bitflags! {
    /// Vendor layer flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayerFlags: u32 {
        const COMPATIBLE = 1;
        const SINGLE_BUFFER = 2;
    }
}

/// Device capabilities the composer advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    SidebandStream,
    SkipValidate,
}

impl Capability {
    /// Capabilities that can be advertised, in advertising order.
    pub const ALL: [Capability; 2] = [Capability::SidebandStream, Capability::SkipValidate];

    /// Raw driver code of the capability.
    pub const fn raw(self) -> i32 {
        match self {
            Capability::SidebandStream => 1,
            Capability::SkipValidate => 4,
        }
    }
}

/// Details of a refresh-period change announced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VsyncPeriodChangeTimeline {
    pub new_vsync_applied_time_nanos: i64,
    pub refresh_required: bool,
    pub refresh_time_nanos: i64,
}
