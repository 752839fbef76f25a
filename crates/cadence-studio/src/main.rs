mod config;
mod stats;

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use cadence_engine::core::FrameListeners;
use cadence_engine::display::probe_refresh_interval;
use cadence_engine::logging::init_logging;
use cadence_engine::scheduler::FrameScheduler;
use cadence_engine::signal::{IntervalRefreshSource, IntervalSourceConfig};

use config::StudioConfig;
use stats::FrameStats;

fn source_config() -> IntervalSourceConfig {
    match probe_refresh_interval() {
        Ok(Some(refresh_interval)) => IntervalSourceConfig {
            refresh_interval,
            ..IntervalSourceConfig::default()
        },
        Ok(None) => {
            log::warn!("display reported no refresh rate, pacing at 60 Hz");
            IntervalSourceConfig::default()
        }
        Err(e) => {
            log::warn!("display probe failed, pacing at 60 Hz: {e:#}");
            IntervalSourceConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let config = StudioConfig::from_env()?;
    init_logging(config.logging.clone());

    let source = IntervalRefreshSource::new(source_config())
        .context("failed to start refresh source")?;

    let listeners = FrameListeners::new();
    let stats = Arc::new(Mutex::new(FrameStats::default()));

    let s = Arc::clone(&stats);
    let _timing = listeners.add(move |timestamp| {
        let mut stats = s.lock().map_err(|_| anyhow::anyhow!("frame stats poisoned"))?;
        let ft = stats.record(timestamp);
        log::trace!("frame {} dt {:.3} ms", ft.frame_index, ft.dt * 1000.0);
        Ok(())
    });

    let scheduler = FrameScheduler::new(source, listeners.clone());
    let handle = scheduler.handle();
    let (done_tx, done_rx) = mpsc::channel();
    let budget = config.frames;

    let s = Arc::clone(&stats);
    let _budget = listeners.add(move |_| {
        let frames = s.lock().map_err(|_| anyhow::anyhow!("frame stats poisoned"))?.frames();
        if frames >= budget {
            handle.stop();
            done_tx.send(()).ok();
        }
        Ok(())
    });

    scheduler.start().context("failed to start frame loop")?;
    log::info!(
        "frame loop running for {} frames at {:?} per refresh",
        config.frames,
        scheduler.source().refresh_interval()
    );

    done_rx
        .recv_timeout(config.timeout)
        .with_context(|| format!("frame budget not reached within {:?}", config.timeout))?;

    let attached = scheduler.with_consumer(|listeners| listeners.len());
    log::debug!("{attached} frame listeners attached at shutdown");
    drop(scheduler);

    let summary = stats
        .lock()
        .map_err(|_| anyhow::anyhow!("frame stats poisoned"))?
        .summary();
    log::info!("done: {summary}");

    Ok(())
}
