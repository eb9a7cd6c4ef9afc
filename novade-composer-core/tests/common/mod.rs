#![allow(dead_code)]

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use novade_buffer_manager::{BufferFormat, BufferId, BufferManager, NativeHandle};
use novade_composer_core::driver::{CommitOutcome, DisplayDriver};
use novade_composer_core::error::{ComposerError, ComposerResult};
use novade_composer_core::events::{ComposerCallback, DisplayEventHandler};
use novade_composer_core::result::{ChangedCompositionLayer, LayerRequestEntry, ReleaseFence};
use novade_composer_core::types::{
    BlendMode, ClientTargetProperty, Color, Composition, Dataspace, DisplayId, DisplayRequest, FRect, Fence,
    LayerFlags, LayerId, LayerType, PerFrameMetadata, PerFrameMetadataBlob, Point, Rect, Transform,
    VsyncPeriodChangeTimeline,
};
use novade_composer_core::writeback::{CaptureCallback, CaptureConfig, CaptureStatus};
use parking_lot::Mutex;

pub fn init_logging() {
    novade_core::logging::init_minimal_logging();
}

pub fn native(id: u64) -> NativeHandle {
    NativeHandle::new(BufferId::new(id), vec![10], vec![0])
}

pub fn importer() -> Arc<BufferManager> {
    Arc::new(BufferManager::new(64))
}

/// One driver call as seen by the fake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub display: DisplayId,
    pub layer: Option<LayerId>,
}

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<Call>,
    pub handler: Option<Arc<dyn DisplayEventHandler>>,
    pub capabilities: Vec<i32>,
    pub next_layer: i64,
    pub next_virtual: i64,
    pub commit_outcome: CommitOutcome,
    pub commit_error: Option<ComposerError>,
    pub present_fence: Option<Fence>,
    pub present_error: Option<ComposerError>,
    pub accept_error: Option<ComposerError>,
    pub changed: Vec<ChangedCompositionLayer>,
    pub request_mask: DisplayRequest,
    pub layer_requests: Vec<LayerRequestEntry>,
    pub release_fences: Vec<ReleaseFence>,
    pub release_fence_error: bool,
    pub client_target_property: ClientTargetProperty,
    pub client_target_property_error: Option<ComposerError>,
    pub failing_layers: Vec<LayerId>,
    pub create_layer_hook: Option<Box<dyn Fn(DisplayId) + Send>>,
    pub readback_error: Option<ComposerError>,
    pub buffers: Vec<(&'static str, Option<BufferId>)>,
    pub colors: Vec<Color>,
    pub transforms: Vec<Transform>,
    pub brightness: Vec<f32>,
    pub expected_present_times: Vec<u64>,
}

/// Recording display driver. Every call is logged; behavior is configured
/// through [`FakeDriver::state`].
#[derive(Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> parking_lot::MutexGuard<'_, FakeState> {
        self.state.lock()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.state.lock().calls.iter().map(|call| call.op).collect()
    }

    pub fn count(&self, op: &str) -> usize {
        self.state.lock().calls.iter().filter(|call| call.op == op).count()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn handler(&self) -> Option<Arc<dyn DisplayEventHandler>> {
        self.state.lock().handler.clone()
    }

    fn record(&self, op: &'static str, display: DisplayId, layer: Option<LayerId>) {
        self.state.lock().calls.push(Call { op, display, layer });
    }

    fn layer_op(&self, op: &'static str, display: DisplayId, layer: LayerId) -> ComposerResult<()> {
        let mut state = self.state.lock();
        state.calls.push(Call {
            op,
            display,
            layer: Some(layer),
        });
        if state.failing_layers.contains(&layer) {
            return Err(ComposerError::BadLayer);
        }
        Ok(())
    }

    fn record_buffer(&self, op: &'static str, buffer: Option<&NativeHandle>) {
        self.state.lock().buffers.push((op, buffer.map(|b| b.buffer_id)));
    }
}

fn fill<T: Clone>(source: &[T], out: Option<&mut [T]>) -> usize {
    match out {
        None => source.len(),
        Some(out) => {
            let n = out.len().min(source.len());
            out[..n].clone_from_slice(&source[..n]);
            n
        }
    }
}

impl DisplayDriver for FakeDriver {
    fn register_event_handler(&self, handler: Option<Arc<dyn DisplayEventHandler>>) {
        let mut state = self.state.lock();
        state.calls.push(Call {
            op: "register_event_handler",
            display: DisplayId(0),
            layer: None,
        });
        state.handler = handler;
    }

    fn capabilities(&self, out: Option<&mut [i32]>) -> usize {
        fill(&self.state.lock().capabilities, out)
    }

    fn create_layer(&self, display: DisplayId) -> ComposerResult<LayerId> {
        let (layer, hook) = {
            let mut state = self.state.lock();
            state.next_layer += 1;
            let layer = LayerId(state.next_layer);
            state.calls.push(Call {
                op: "create_layer",
                display,
                layer: Some(layer),
            });
            (layer, state.create_layer_hook.take())
        };
        if let Some(hook) = hook {
            hook(display);
        }
        Ok(layer)
    }

    fn destroy_layer(&self, display: DisplayId, layer: LayerId) -> ComposerResult<()> {
        self.record("destroy_layer", display, Some(layer));
        Ok(())
    }

    fn create_virtual_display(
        &self,
        _width: u32,
        _height: u32,
        format: BufferFormat,
    ) -> ComposerResult<(DisplayId, BufferFormat)> {
        let mut state = self.state.lock();
        state.next_virtual += 1;
        let display = DisplayId(100 + state.next_virtual);
        state.calls.push(Call {
            op: "create_virtual_display",
            display,
            layer: None,
        });
        Ok((display, format))
    }

    fn destroy_virtual_display(&self, display: DisplayId) -> ComposerResult<()> {
        self.record("destroy_virtual_display", display, None);
        Ok(())
    }

    fn commit_or_prepare(&self, display: DisplayId, validate_only: bool) -> ComposerResult<CommitOutcome> {
        let op = if validate_only { "validate" } else { "commit_or_prepare" };
        self.record(op, display, None);
        let state = self.state.lock();
        match state.commit_error {
            Some(err) => Err(err),
            None => Ok(state.commit_outcome),
        }
    }

    fn present_display(&self, display: DisplayId) -> ComposerResult<Option<Fence>> {
        self.record("present_display", display, None);
        let state = self.state.lock();
        match state.present_error {
            Some(err) => Err(err),
            None => Ok(state.present_fence),
        }
    }

    fn accept_display_changes(&self, display: DisplayId) -> ComposerResult<()> {
        self.record("accept_display_changes", display, None);
        self.state.lock().accept_error.map_or(Ok(()), Err)
    }

    fn changed_composition_types(
        &self,
        _display: DisplayId,
        out: Option<&mut [ChangedCompositionLayer]>,
    ) -> ComposerResult<usize> {
        Ok(fill(&self.state.lock().changed, out))
    }

    fn display_requests(
        &self,
        _display: DisplayId,
        out: Option<&mut [LayerRequestEntry]>,
    ) -> ComposerResult<(DisplayRequest, usize)> {
        let state = self.state.lock();
        Ok((state.request_mask, fill(&state.layer_requests, out)))
    }

    fn release_fences(&self, _display: DisplayId, out: Option<&mut [ReleaseFence]>) -> ComposerResult<usize> {
        let state = self.state.lock();
        if state.release_fence_error {
            return Err(ComposerError::NoResources);
        }
        Ok(fill(&state.release_fences, out))
    }

    fn client_target_property(&self, _display: DisplayId) -> ComposerResult<ClientTargetProperty> {
        let state = self.state.lock();
        match state.client_target_property_error {
            Some(err) => Err(err),
            None => Ok(state.client_target_property),
        }
    }

    fn refresh(&self, display: DisplayId) -> ComposerResult<()> {
        self.record("refresh", display, None);
        Ok(())
    }

    fn set_display_brightness(&self, display: DisplayId, brightness: f32) -> ComposerResult<()> {
        self.record("set_display_brightness", display, None);
        self.state.lock().brightness.push(brightness);
        Ok(())
    }

    fn set_color_transform(&self, display: DisplayId, _matrix: &[f32; 16]) -> ComposerResult<()> {
        self.record("set_color_transform", display, None);
        Ok(())
    }

    fn set_client_target(
        &self,
        display: DisplayId,
        target: Option<&NativeHandle>,
        _fence: Option<Fence>,
        _dataspace: Dataspace,
        _damage: &[Rect],
    ) -> ComposerResult<()> {
        self.record("set_client_target", display, None);
        self.record_buffer("set_client_target", target);
        Ok(())
    }

    fn set_output_buffer(
        &self,
        display: DisplayId,
        buffer: Option<&NativeHandle>,
        _fence: Option<Fence>,
    ) -> ComposerResult<()> {
        self.record("set_output_buffer", display, None);
        self.record_buffer("set_output_buffer", buffer);
        Ok(())
    }

    fn set_expected_present_time(&self, display: DisplayId, timestamp_nanos: u64) -> ComposerResult<()> {
        self.record("set_expected_present_time", display, None);
        self.state.lock().expected_present_times.push(timestamp_nanos);
        Ok(())
    }

    fn set_display_elapse_time(&self, display: DisplayId, _elapse_nanos: u64) -> ComposerResult<()> {
        self.record("set_display_elapse_time", display, None);
        Ok(())
    }

    fn set_layer_cursor_position(&self, display: DisplayId, layer: LayerId, _position: Point) -> ComposerResult<()> {
        self.layer_op("set_layer_cursor_position", display, layer)
    }

    fn set_layer_buffer(
        &self,
        display: DisplayId,
        layer: LayerId,
        buffer: Option<&NativeHandle>,
        _fence: Option<Fence>,
    ) -> ComposerResult<()> {
        self.record_buffer("set_layer_buffer", buffer);
        self.layer_op("set_layer_buffer", display, layer)
    }

    fn set_layer_surface_damage(&self, display: DisplayId, layer: LayerId, _damage: &[Rect]) -> ComposerResult<()> {
        self.layer_op("set_layer_surface_damage", display, layer)
    }

    fn set_layer_blend_mode(&self, display: DisplayId, layer: LayerId, _mode: BlendMode) -> ComposerResult<()> {
        self.layer_op("set_layer_blend_mode", display, layer)
    }

    fn set_layer_composition_type(
        &self,
        display: DisplayId,
        layer: LayerId,
        _composition: Composition,
    ) -> ComposerResult<()> {
        self.layer_op("set_layer_composition_type", display, layer)
    }

    fn set_layer_color(&self, display: DisplayId, layer: LayerId, color: Color) -> ComposerResult<()> {
        self.state.lock().colors.push(color);
        self.layer_op("set_layer_color", display, layer)
    }

    fn set_layer_dataspace(&self, display: DisplayId, layer: LayerId, _dataspace: Dataspace) -> ComposerResult<()> {
        self.layer_op("set_layer_dataspace", display, layer)
    }

    fn set_layer_display_frame(&self, display: DisplayId, layer: LayerId, _frame: Rect) -> ComposerResult<()> {
        self.layer_op("set_layer_display_frame", display, layer)
    }

    fn set_layer_plane_alpha(&self, display: DisplayId, layer: LayerId, _alpha: f32) -> ComposerResult<()> {
        self.layer_op("set_layer_plane_alpha", display, layer)
    }

    fn set_layer_sideband_stream(
        &self,
        display: DisplayId,
        layer: LayerId,
        stream: Option<&NativeHandle>,
    ) -> ComposerResult<()> {
        self.record_buffer("set_layer_sideband_stream", stream);
        self.layer_op("set_layer_sideband_stream", display, layer)
    }

    fn set_layer_source_crop(&self, display: DisplayId, layer: LayerId, _crop: FRect) -> ComposerResult<()> {
        self.layer_op("set_layer_source_crop", display, layer)
    }

    fn set_layer_visible_region(&self, display: DisplayId, layer: LayerId, _region: &[Rect]) -> ComposerResult<()> {
        self.layer_op("set_layer_visible_region", display, layer)
    }

    fn set_layer_transform(&self, display: DisplayId, layer: LayerId, transform: Transform) -> ComposerResult<()> {
        self.state.lock().transforms.push(transform);
        self.layer_op("set_layer_transform", display, layer)
    }

    fn set_layer_z_order(&self, display: DisplayId, layer: LayerId, _z: u32) -> ComposerResult<()> {
        self.layer_op("set_layer_z_order", display, layer)
    }

    fn set_layer_per_frame_metadata(
        &self,
        display: DisplayId,
        layer: LayerId,
        _metadata: &[PerFrameMetadata],
    ) -> ComposerResult<()> {
        self.layer_op("set_layer_per_frame_metadata", display, layer)
    }

    fn set_layer_per_frame_metadata_blobs(
        &self,
        display: DisplayId,
        layer: LayerId,
        _blobs: &[PerFrameMetadataBlob],
    ) -> ComposerResult<()> {
        self.layer_op("set_layer_per_frame_metadata_blobs", display, layer)
    }

    fn set_layer_brightness(&self, display: DisplayId, layer: LayerId, brightness: f32) -> ComposerResult<()> {
        self.state.lock().brightness.push(brightness);
        self.layer_op("set_layer_brightness", display, layer)
    }

    fn set_layer_blocking_region(&self, display: DisplayId, layer: LayerId, _region: &[Rect]) -> ComposerResult<()> {
        self.layer_op("set_layer_blocking_region", display, layer)
    }

    fn set_layer_type(&self, display: DisplayId, layer: LayerId, _layer_type: LayerType) -> ComposerResult<()> {
        self.layer_op("set_layer_type", display, layer)
    }

    fn set_layer_flags(&self, display: DisplayId, layer: LayerId, _flags: LayerFlags) -> ComposerResult<()> {
        self.layer_op("set_layer_flags", display, layer)
    }

    fn submit_readback_buffer(
        &self,
        display: DisplayId,
        _buffer: &NativeHandle,
        _config: &CaptureConfig,
    ) -> ComposerResult<()> {
        self.record("submit_readback_buffer", display, None);
        self.state.lock().readback_error.map_or(Ok(()), Err)
    }
}

/// Consumer-side event as seen by [`RecordingCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Hotplug(DisplayId, bool),
    Refresh(DisplayId),
    Vsync(DisplayId, i64, i32),
    VsyncPeriodTimingChanged(DisplayId, VsyncPeriodChangeTimeline),
    SeamlessPossible(DisplayId),
    VsyncIdle(DisplayId),
}

#[derive(Default)]
pub struct RecordingCallback {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingCallback {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl ComposerCallback for RecordingCallback {
    fn on_hotplug(&self, display: DisplayId, connected: bool) {
        self.events.lock().push(Event::Hotplug(display, connected));
    }

    fn on_refresh(&self, display: DisplayId) {
        self.events.lock().push(Event::Refresh(display));
    }

    fn on_vsync(&self, display: DisplayId, timestamp_nanos: i64, vsync_period_nanos: i32) {
        self.events
            .lock()
            .push(Event::Vsync(display, timestamp_nanos, vsync_period_nanos));
    }

    fn on_vsync_period_timing_changed(&self, display: DisplayId, timeline: VsyncPeriodChangeTimeline) {
        self.events
            .lock()
            .push(Event::VsyncPeriodTimingChanged(display, timeline));
    }

    fn on_seamless_possible(&self, display: DisplayId) {
        self.events.lock().push(Event::SeamlessPossible(display));
    }

    fn on_vsync_idle(&self, display: DisplayId) {
        self.events.lock().push(Event::VsyncIdle(display));
    }
}

/// Capture callback forwarding every notification to a channel.
pub struct CaptureRecorder {
    sender: Mutex<Sender<(CaptureStatus, BufferId)>>,
}

impl CaptureRecorder {
    pub fn new() -> (Arc<Self>, Receiver<(CaptureStatus, BufferId)>) {
        let (sender, receiver) = mpsc::channel();
        (
            Arc::new(Self {
                sender: Mutex::new(sender),
            }),
            receiver,
        )
    }
}

impl CaptureCallback for CaptureRecorder {
    fn notify_capture_done(&self, status: CaptureStatus, buffer: &NativeHandle) {
        let _ = self.sender.lock().send((status, buffer.buffer_id));
    }
}

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);
