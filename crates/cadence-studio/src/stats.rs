use cadence_engine::time::{FrameClock, FrameTime, MonotonicTime};

/// Running frame-timing statistics.
#[derive(Debug, Default)]
pub struct FrameStats {
    clock: FrameClock,
    last: Option<FrameTime>,
    dt_min: f32,
    dt_max: f32,
}

impl FrameStats {
    pub fn record(&mut self, timestamp: MonotonicTime) -> FrameTime {
        let ft = self.clock.tick_at(timestamp);

        // The first frame has no real delta.
        if ft.frame_index == 1 {
            self.dt_min = ft.dt;
            self.dt_max = ft.dt;
        } else if ft.frame_index > 1 {
            self.dt_min = self.dt_min.min(ft.dt);
            self.dt_max = self.dt_max.max(ft.dt);
        }

        self.last = Some(ft);
        ft
    }

    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }

    /// Mean frames per second over the run, once two frames were seen.
    pub fn mean_fps(&self) -> Option<f64> {
        let last = self.last?;
        (last.frame_index > 0 && last.elapsed > 0.0).then(|| last.frame_index as f64 / last.elapsed)
    }

    pub fn summary(&self) -> String {
        match self.mean_fps() {
            Some(fps) => format!(
                "{} frames, {:.1} fps mean, dt {:.2}..{:.2} ms",
                self.frames(),
                fps,
                self.dt_min * 1000.0,
                self.dt_max * 1000.0,
            ),
            None => format!("{} frames", self.frames()),
        }
    }
}
