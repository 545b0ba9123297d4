use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{layout::Ellipse, scene::FruitPosition, CakeError, Result};

/// Top-level configuration structure for the application.
///
/// Every section validates itself; components call the relevant
/// `validate` when they are constructed so a bad value fails fast instead of
/// being clamped silently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampler: SamplerConfig,
    pub detector: DetectorConfig,
    pub candles: CandleConfig,
    pub celebration: CelebrationConfig,
    pub playback: PlaybackConfig,
    pub scene: SceneConfig,
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.sampler.validate()?;
        self.detector.validate()?;
        self.candles.validate()?;
        self.celebration.validate()?;
        self.playback.validate()?;
        self.scene.validate()
    }
}

/// Configuration of the analyser that turns microphone audio into energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Transform size in samples. Half of it is the number of averaged bins.
    pub fft_size: usize,
    /// Exponential smoothing applied to bin magnitudes between ticks.
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32_768).contains(&self.fft_size) {
            return Err(CakeError::config(format!(
                "sampler.fft_size must be a power of two in 32..=32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(CakeError::config(format!(
                "sampler.smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        if !self.min_decibels.is_finite()
            || !self.max_decibels.is_finite()
            || self.min_decibels >= self.max_decibels
        {
            return Err(CakeError::config(
                "sampler.min_decibels must be finite and below sampler.max_decibels",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Energy level (0-255) a sample has to exceed to count as blowing.
    pub threshold: f32,
    /// Consecutive loud samples needed before a gesture fires.
    pub required_frames: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 60.0,
            required_frames: 5,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=255.0).contains(&self.threshold) {
            return Err(CakeError::config(format!(
                "detector.threshold must be within 0..=255, got {}",
                self.threshold
            )));
        }
        if self.required_frames == 0 {
            return Err(CakeError::config("detector.required_frames must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandleConfig {
    pub max_candles: usize,
    pub ellipse: Ellipse,
    /// How long a flame takes to fade after being blown out.
    pub flame_fade_ms: u64,
    /// How long the smoke puff lingers above an extinguished wick.
    pub smoke_ms: u64,
}

impl Default for CandleConfig {
    fn default() -> Self {
        Self {
            max_candles: 20,
            ellipse: Ellipse::default(),
            flame_fade_ms: 200,
            smoke_ms: 1_000,
        }
    }
}

impl CandleConfig {
    pub fn validate(&self) -> Result<()> {
        self.ellipse.validate()
    }

    pub fn flame_fade(&self) -> Duration {
        Duration::from_millis(self.flame_fade_ms)
    }

    pub fn smoke(&self) -> Duration {
        Duration::from_millis(self.smoke_ms)
    }
}

/// Size of the confetti canvas in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CelebrationConfig {
    /// Lifetime of one celebration session.
    pub duration_ms: u64,
    /// Pause between the end of a session and the automatic reset.
    pub cool_down_ms: u64,
    pub spawn_count: usize,
    pub stagger_ms: u64,
    pub rise_min_ms: u64,
    pub rise_max_ms: u64,
    pub particle_count: usize,
    /// Added to every particle's vertical velocity once per step.
    pub gravity: f32,
    /// Period divisor of the sideways sway, in milliseconds.
    pub sway_period_ms: f32,
    /// Particles start up to this many pixels above the top edge.
    pub drop_height: f32,
    pub viewport: Viewport,
    /// Fixed seed for reproducible celebrations.
    pub seed: Option<u64>,
}

impl Default for CelebrationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 8_000,
            cool_down_ms: 0,
            spawn_count: 12,
            stagger_ms: 250,
            rise_min_ms: 4_000,
            rise_max_ms: 7_000,
            particle_count: 100,
            gravity: 0.02,
            sway_period_ms: 200.0,
            drop_height: 500.0,
            viewport: Viewport::default(),
            seed: None,
        }
    }
}

impl CelebrationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.duration_ms == 0 {
            return Err(CakeError::config("celebration.duration_ms must be positive"));
        }
        if self.rise_min_ms == 0 || self.rise_min_ms > self.rise_max_ms {
            return Err(CakeError::config(format!(
                "celebration rise range {}..={} ms is empty",
                self.rise_min_ms, self.rise_max_ms
            )));
        }
        if !self.gravity.is_finite() {
            return Err(CakeError::config("celebration.gravity must be finite"));
        }
        if !self.sway_period_ms.is_finite() || self.sway_period_ms <= 0.0 {
            return Err(CakeError::config("celebration.sway_period_ms must be positive"));
        }
        if !self.drop_height.is_finite() || self.drop_height < 0.0 {
            return Err(CakeError::config("celebration.drop_height must not be negative"));
        }
        let Viewport { width, height } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(CakeError::config("celebration.viewport must be positive"));
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn cool_down(&self) -> Duration {
        Duration::from_millis(self.cool_down_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Where in the birthday song playback starts.
    pub start_offset_seconds: f32,
    pub muted: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            start_offset_seconds: 3.0,
            muted: false,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.start_offset_seconds.is_finite() || self.start_offset_seconds < 0.0 {
            return Err(CakeError::config(
                "playback.start_offset_seconds must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Number of selectable cake styles.
    pub styles: u8,
    pub fruits: Vec<FruitPosition>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            styles: 3,
            fruits: FruitPosition::defaults(),
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.styles == 0 {
            return Err(CakeError::config("scene.styles must be at least 1"));
        }
        if self
            .fruits
            .iter()
            .any(|fruit| !fruit.x.is_finite() || !fruit.y.is_finite())
        {
            return Err(CakeError::config("scene.fruits must have finite positions"));
        }
        Ok(())
    }
}
