//! Audible and haptic delivery feedback.
//!
//! Both channels are best-effort. A missing device or a failing sink is
//! logged at debug level and never reaches the caller.

#[cfg(feature = "cpal-audio")]
pub mod cpal_sink;
pub mod tone;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use tracing::{debug, trace};

use chorus_core::config::EffectsConfig;
use chorus_core::result::AppResult;
use chorus_core::types::{NotificationKind, UserSettings};

#[cfg(feature = "cpal-audio")]
pub use cpal_sink::CpalAudioSink;
pub use tone::{HAPTIC_PATTERN, frequency_for, render_tone};

/// Output device for rendered tones.
pub trait AudioSink: Send + Sync + 'static {
    /// Sample rate tones must be rendered at.
    fn sample_rate(&self) -> u32;

    /// Queue mono samples for playback. Must not block.
    fn play(&self, samples: Arc<Vec<f32>>) -> AppResult<()>;
}

/// Vibration motor.
pub trait HapticSink: Send + Sync + 'static {
    /// Run an on/off pattern, starting with "on". Must not block.
    fn vibrate(&self, pattern: &[Duration]) -> AppResult<()>;
}

/// Fires feedback for each delivered notification.
pub struct EffectDispatcher {
    audio: Option<Arc<dyn AudioSink>>,
    haptics: Option<Arc<dyn HapticSink>>,
    sound_enabled: AtomicBool,
    vibration_enabled: AtomicBool,
    /// `f32` bits.
    volume: AtomicU32,
    tone_duration: Duration,
    defaults: EffectsConfig,
}

impl std::fmt::Debug for EffectDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectDispatcher")
            .field("audio", &self.audio.is_some())
            .field("haptics", &self.haptics.is_some())
            .field("sound_enabled", &self.sound_enabled())
            .field("vibration_enabled", &self.vibration_enabled())
            .field("volume", &self.volume())
            .finish()
    }
}

impl EffectDispatcher {
    /// Dispatcher with no devices attached.
    pub fn new(config: &EffectsConfig) -> Self {
        Self {
            audio: None,
            haptics: None,
            sound_enabled: AtomicBool::new(config.sound_enabled),
            vibration_enabled: AtomicBool::new(config.vibration_enabled),
            volume: AtomicU32::new(config.clamped_volume().to_bits()),
            tone_duration: Duration::from_millis(config.tone_duration_ms),
            defaults: config.clone(),
        }
    }

    /// Attach an audio device.
    pub fn with_audio(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.audio = Some(sink);
        self
    }

    /// Attach a haptic device.
    pub fn with_haptics(mut self, sink: Arc<dyn HapticSink>) -> Self {
        self.haptics = Some(sink);
        self
    }

    /// Play the tone and vibration for `kind`.
    pub fn notify(&self, kind: NotificationKind) {
        self.play_tone(kind);
        self.pulse();
    }

    /// Apply per-user preferences; absent flags restore the configured default.
    pub fn apply_settings(&self, settings: Option<&UserSettings>) {
        let sound = settings
            .and_then(|s| s.sound)
            .unwrap_or(self.defaults.sound_enabled);
        let vibration = settings
            .and_then(|s| s.vibration)
            .unwrap_or(self.defaults.vibration_enabled);
        self.sound_enabled.store(sound, Ordering::Relaxed);
        self.vibration_enabled.store(vibration, Ordering::Relaxed);
    }

    /// Set the tone volume, clamped into `0.0..=1.0`.
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    /// Current tone volume.
    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    /// Whether tones are played.
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    /// Whether vibration is triggered.
    pub fn vibration_enabled(&self) -> bool {
        self.vibration_enabled.load(Ordering::Relaxed)
    }

    fn play_tone(&self, kind: NotificationKind) {
        if !self.sound_enabled() {
            return;
        }
        let volume = self.volume();
        if volume <= 0.0 {
            return;
        }
        let Some(audio) = &self.audio else {
            trace!("No audio output, skipping tone");
            return;
        };

        let samples = render_tone(
            frequency_for(kind),
            self.tone_duration,
            audio.sample_rate(),
            volume,
        );
        if let Err(e) = audio.play(Arc::new(samples)) {
            debug!(kind = %kind, error = %e, "Tone playback failed");
        }
    }

    fn pulse(&self) {
        if !self.vibration_enabled() {
            return;
        }
        let Some(haptics) = &self.haptics else {
            trace!("No haptic device, skipping vibration");
            return;
        };
        if let Err(e) = haptics.vibrate(&HAPTIC_PATTERN) {
            debug!(error = %e, "Vibration failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::error::AppError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Speaker {
        played: Mutex<Vec<usize>>,
        broken: bool,
    }

    impl AudioSink for Speaker {
        fn sample_rate(&self) -> u32 {
            8_000
        }

        fn play(&self, samples: Arc<Vec<f32>>) -> AppResult<()> {
            if self.broken {
                return Err(AppError::capability("device unplugged"));
            }
            self.played.lock().unwrap().push(samples.len());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Motor {
        patterns: Mutex<Vec<Vec<Duration>>>,
    }

    impl HapticSink for Motor {
        fn vibrate(&self, pattern: &[Duration]) -> AppResult<()> {
            self.patterns.lock().unwrap().push(pattern.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_notify_plays_tone_and_pattern() {
        let speaker = Arc::new(Speaker::default());
        let motor = Arc::new(Motor::default());
        let effects = EffectDispatcher::new(&EffectsConfig::default())
            .with_audio(speaker.clone())
            .with_haptics(motor.clone());

        effects.notify(NotificationKind::Mention);

        assert_eq!(*speaker.played.lock().unwrap(), vec![1_600]);
        assert_eq!(*motor.patterns.lock().unwrap(), vec![HAPTIC_PATTERN.to_vec()]);
    }

    #[test]
    fn test_disabled_sound_short_circuits() {
        let speaker = Arc::new(Speaker::default());
        let effects = EffectDispatcher::new(&EffectsConfig {
            sound_enabled: false,
            ..EffectsConfig::default()
        })
        .with_audio(speaker.clone());

        effects.notify(NotificationKind::Message);
        assert!(speaker.played.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_or_broken_devices_are_silent() {
        EffectDispatcher::new(&EffectsConfig::default()).notify(NotificationKind::System);

        let broken = Arc::new(Speaker {
            broken: true,
            ..Speaker::default()
        });
        EffectDispatcher::new(&EffectsConfig::default())
            .with_audio(broken)
            .notify(NotificationKind::Badge);
    }

    #[test]
    fn test_user_settings_override_and_restore() {
        let effects = EffectDispatcher::new(&EffectsConfig::default());
        effects.apply_settings(Some(&UserSettings {
            sound: Some(false),
            vibration: None,
            show_when_active: None,
        }));
        assert!(!effects.sound_enabled());
        assert!(effects.vibration_enabled());

        effects.apply_settings(None);
        assert!(effects.sound_enabled());
    }

    #[test]
    fn test_volume_is_clamped() {
        let effects = EffectDispatcher::new(&EffectsConfig::default());
        assert_eq!(effects.volume(), 0.5);
        effects.set_volume(3.0);
        assert_eq!(effects.volume(), 1.0);
        effects.set_volume(-1.0);
        assert_eq!(effects.volume(), 0.0);
    }
}
