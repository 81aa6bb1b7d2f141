//! Sound and vibration feedback configuration.

use serde::{Deserialize, Serialize};

/// Audible and haptic feedback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectsConfig {
    /// Whether delivery plays a tone.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Whether delivery triggers a vibration pattern.
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    /// Tone volume, `0.0`–`1.0`.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Tone duration in milliseconds.
    #[serde(default = "default_tone_duration")]
    pub tone_duration_ms: u64,
    /// Sample rate used when rendering tones.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
            volume: default_volume(),
            tone_duration_ms: default_tone_duration(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl EffectsConfig {
    /// Volume clamped into `0.0..=1.0`.
    pub fn clamped_volume(&self) -> f32 {
        if self.volume.is_nan() {
            return default_volume();
        }
        self.volume.clamp(0.0, 1.0)
    }
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    0.5
}

fn default_tone_duration() -> u64 {
    200
}

fn default_sample_rate() -> u32 {
    44_100
}
