use std::time::Duration;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::WindowId;

/// Converts a refresh rate in millihertz into a refresh interval.
///
/// Returns `None` for zero.
pub fn refresh_interval_from_millihertz(millihertz: u32) -> Option<Duration> {
    (millihertz > 0).then(|| Duration::from_nanos(1_000_000_000_000 / u64::from(millihertz)))
}

#[derive(Default)]
struct MonitorProbe {
    millihertz: Option<u32>,
}

impl ApplicationHandler for MonitorProbe {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.millihertz = event_loop
            .primary_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz())
            .or_else(|| {
                event_loop
                    .available_monitors()
                    .find_map(|monitor| monitor.refresh_rate_millihertz())
            });
        event_loop.exit();
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, _event: WindowEvent) {}
}

/// Reads the refresh interval of the primary display.
///
/// Spins up a `winit` event loop just long enough to enumerate monitors.
/// `Ok(None)` means no monitor reported a rate. Most platforms allow one
/// event loop per process, so call this once, before any windowing.
pub fn probe_refresh_interval() -> Result<Option<Duration>> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut probe = MonitorProbe::default();

    event_loop
        .run_app(&mut probe)
        .context("monitor probe event loop terminated with error")?;

    let interval = probe.millihertz.and_then(refresh_interval_from_millihertz);
    match (probe.millihertz, interval) {
        (Some(mhz), Some(interval)) => {
            log::debug!("display refresh: {mhz} mHz ({interval:?} per refresh)")
        }
        _ => log::debug!("display did not report a refresh rate"),
    }

    Ok(interval)
}
