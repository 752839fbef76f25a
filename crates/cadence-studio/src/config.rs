use std::time::Duration;

use anyhow::{Context, Result};
use cadence_engine::logging::LoggingConfig;

/// Studio run configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Frames to render before the loop stops itself.
    pub frames: u64,
    /// Upper bound on how long to wait for the frame budget.
    pub timeout: Duration,
    pub logging: LoggingConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            timeout: Duration::from_secs(30),
            logging: LoggingConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Defaults, with `CADENCE_FRAMES` overriding the frame budget.
    pub fn from_env() -> Result<Self> {
        Self::with_frames_override(std::env::var("CADENCE_FRAMES").ok().as_deref())
    }

    fn with_frames_override(frames: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = frames {
            config.frames = raw
                .trim()
                .parse()
                .with_context(|| format!("CADENCE_FRAMES must be a frame count, got {raw:?}"))?;
        }
        anyhow::ensure!(config.frames > 0, "frame budget must be at least one frame");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_without_override() {
        let config = StudioConfig::with_frames_override(None).unwrap();
        assert_eq!(config.frames, 120);
    }

    #[test]
    fn override_is_parsed() {
        let config = StudioConfig::with_frames_override(Some(" 30 ")).unwrap();
        assert_eq!(config.frames, 30);
    }

    #[test]
    fn bad_override_is_rejected() {
        assert!(StudioConfig::with_frames_override(Some("lots")).is_err());
        assert!(StudioConfig::with_frames_override(Some("0")).is_err());
    }
}
