//! Display events: driver to composer, and composer to its consumer.

use crate::types::{DisplayId, VsyncPeriodChangeTimeline};

/// Receiver of driver events. Installed once per client through
/// [`crate::driver::DisplayDriver::register_event_handler`].
pub trait DisplayEventHandler: Send + Sync {
    fn on_hotplug(&self, display: DisplayId, connected: bool);
    fn on_refresh(&self, display: DisplayId);
    fn on_vsync(&self, display: DisplayId, timestamp_nanos: i64, vsync_period_nanos: i32);
    fn on_vsync_period_timing_changed(&self, display: DisplayId, timeline: VsyncPeriodChangeTimeline);
    fn on_seamless_possible(&self, display: DisplayId);
    fn on_vsync_idle(&self, display: DisplayId);
}

/// Consumer-side callback of a [`crate::client::ComposerClient`].
pub trait ComposerCallback: Send + Sync {
    fn on_hotplug(&self, display: DisplayId, connected: bool);
    fn on_refresh(&self, display: DisplayId);
    fn on_vsync(&self, display: DisplayId, timestamp_nanos: i64, vsync_period_nanos: i32);
    fn on_vsync_period_timing_changed(&self, display: DisplayId, timeline: VsyncPeriodChangeTimeline);
    fn on_seamless_possible(&self, display: DisplayId);
    fn on_vsync_idle(&self, display: DisplayId);
}
