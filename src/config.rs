use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::error::Error;

/// Animation tuning knobs consumed by the zoom/pan/fade engine.
///
/// All speeds are per second of wall-clock time; the engine integrates them
/// against measured frame deltas, so these values are frame-rate independent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnimationOptions {
    /// Minimum zoom factor; every image starts here after a reset.
    pub zoom_out_limit: f32,
    /// Maximum zoom factor.
    pub zoom_in_limit: f32,
    /// Zoom change per second. Direction is randomized on each reset.
    pub zoom_speed: f32,
    /// Base pan speed in image pixels per second.
    pub pan_speed: f32,
    /// Pan magnitude multiplier range applied on reset and on each bounce.
    pub pan_speed_jitter: [f32; 2],
    /// Time an image remains fully visible before fading out, in ms.
    pub dwell_ms: u64,
    /// Duration of one fade leg (out or in), in ms.
    pub fade_ms: u64,
    /// Upper bound on a single frame delta, in ms. Gaps from a stalled or
    /// suspended render loop are clamped to this before integration.
    pub max_frame_step_ms: u64,
}

impl AnimationOptions {
    const fn default_zoom_out_limit() -> f32 {
        1.0
    }

    const fn default_zoom_in_limit() -> f32 {
        1.2
    }

    const fn default_zoom_speed() -> f32 {
        0.01
    }

    const fn default_pan_speed() -> f32 {
        24.0
    }

    const fn default_pan_speed_jitter() -> [f32; 2] {
        [0.5, 1.5]
    }

    const fn default_dwell_ms() -> u64 {
        5000
    }

    const fn default_fade_ms() -> u64 {
        1000
    }

    const fn default_max_frame_step_ms() -> u64 {
        250
    }

    /// Opacity change per second for one fade leg.
    #[must_use]
    pub fn fade_rate_per_sec(&self) -> f32 {
        1000.0 / self.fade_ms.max(1) as f32
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.zoom_out_limit > 0.0, "zoom-out-limit must be positive");
        ensure!(
            self.zoom_in_limit >= self.zoom_out_limit,
            "zoom-in-limit must be >= zoom-out-limit"
        );
        ensure!(self.zoom_speed > 0.0, "zoom-speed must be positive");
        ensure!(self.pan_speed >= 0.0, "pan-speed must be non-negative");
        ensure!(
            self.pan_speed_jitter[0] > 0.0 && self.pan_speed_jitter[0] <= self.pan_speed_jitter[1],
            "pan-speed-jitter must be an increasing positive range"
        );
        ensure!(self.dwell_ms > 0, "dwell-ms must be greater than zero");
        ensure!(self.fade_ms > 0, "fade-ms must be greater than zero");
        ensure!(
            self.max_frame_step_ms > 0,
            "max-frame-step-ms must be greater than zero"
        );
        Ok(())
    }
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            zoom_out_limit: Self::default_zoom_out_limit(),
            zoom_in_limit: Self::default_zoom_in_limit(),
            zoom_speed: Self::default_zoom_speed(),
            pan_speed: Self::default_pan_speed(),
            pan_speed_jitter: Self::default_pan_speed_jitter(),
            dwell_ms: Self::default_dwell_ms(),
            fade_ms: Self::default_fade_ms(),
            max_frame_step_ms: Self::default_max_frame_step_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Root directory to scan recursively for images.
    pub photo_library_path: PathBuf,
    /// Optional deterministic seed for the startup shuffle.
    pub startup_shuffle_seed: Option<u64>,
    /// Animation tuning for the zoom/pan/fade engine.
    pub animation: AnimationOptions,
}

impl Configuration {
    /// Load a configuration from a YAML file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be read, or [`Error::Config`]
    /// if its contents do not parse as this schema.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.photo_library_path.as_os_str().is_empty(),
            "photo-library-path must be set"
        );
        self.animation
            .validate()
            .context("invalid animation configuration")?;
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            photo_library_path: PathBuf::new(),
            startup_shuffle_seed: None,
            animation: AnimationOptions::default(),
        }
    }
}
