//! Defines all configuration structures for the scheduler.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., a TOML file) using `serde`. Every field has a default, so an empty
//! file or no file at all yields a working configuration.

use anyhow::{bail, Context as _};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Prefix of environment variables that override file settings,
/// e.g. `HYPERFRAME__MAX_DELTA_SECS=0.05`.
pub const ENV_PREFIX: &str = "HYPERFRAME";

/// The top-level configuration for the `Scheduler`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// How often the frame driver calls `frame()`.
    #[serde(default)]
    pub frame_rate: FrameRate,

    /// Upper bound, in seconds, for the delta handed to `update` hooks.
    #[serde(default = "default_max_delta_secs")]
    pub max_delta_secs: f64,

    /// Frames after which a still-initializing component is flagged in the log.
    #[serde(default = "default_stalled_init_frames")]
    pub stalled_init_frames: u64,

    /// Capacity of each broadcast event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Defines the pacing of the frame driver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrameRate {
    /// ~60 frames per second. Matches a typical display refresh.
    #[default]
    High,
    /// ~30 frames per second.
    Medium,
    /// ~1 frame per second. Handy for watching a lifecycle in the logs.
    Low,
    /// A user-defined rate.
    Custom { frames_per_second: u32 },
}

impl FrameRate {
    pub fn frames_per_second(&self) -> u32 {
        match self {
            FrameRate::High => 60,
            FrameRate::Medium => 30,
            FrameRate::Low => 1,
            FrameRate::Custom { frames_per_second } => *frames_per_second,
        }
    }

    /// The time between two frames. A zero rate is rejected by validation;
    /// here it falls back to one frame per second.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frames_per_second().max(1)
    }
}

impl SchedulerConfig {
    /// Loads the configuration from an optional TOML file, then applies
    /// `HYPERFRAME__*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;
        let config: SchedulerConfig = settings
            .try_deserialize()
            .context("invalid scheduler configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        let config: SchedulerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.max_delta_secs.is_finite() || self.max_delta_secs <= 0.0 {
            bail!(
                "max_delta_secs must be a positive number, got {}",
                self.max_delta_secs
            );
        }
        if self.frame_rate.frames_per_second() == 0 {
            bail!("frame_rate must be at least one frame per second");
        }
        if self.event_capacity == 0 {
            bail!("event_capacity must be greater than zero");
        }
        Ok(())
    }

    /// Replaces every setting `validate` would reject with its default.
    ///
    /// Configurations built in code skip validation; this keeps them from
    /// turning the delta clamp into `NaN` or infinity.
    pub fn sanitized(mut self) -> Self {
        if !self.max_delta_secs.is_finite() || self.max_delta_secs <= 0.0 {
            warn!(
                value = self.max_delta_secs,
                fallback = default_max_delta_secs(),
                "invalid max_delta_secs, using the default"
            );
            self.max_delta_secs = default_max_delta_secs();
        }
        if self.frame_rate.frames_per_second() == 0 {
            warn!("frame_rate of zero frames per second, using the default");
            self.frame_rate = FrameRate::default();
        }
        if self.event_capacity == 0 {
            warn!(fallback = default_event_capacity(), "event_capacity of zero, using the default");
            self.event_capacity = default_event_capacity();
        }
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_rate: FrameRate::default(),
            max_delta_secs: default_max_delta_secs(),
            stalled_init_frames: default_stalled_init_frames(),
            event_capacity: default_event_capacity(),
        }
    }
}

// --- Default value functions for serde ---

fn default_max_delta_secs() -> f64 {
    0.1
}

fn default_stalled_init_frames() -> u64 {
    300
}

fn default_event_capacity() -> usize {
    256
}
