//! Tone synthesis for delivery feedback.

use std::f32::consts::TAU;
use std::time::Duration;

use chorus_core::types::NotificationKind;

/// Linear attack length.
pub const ATTACK: Duration = Duration::from_millis(10);

/// Gain the exponential release decays to at the end of the tone.
pub const RELEASE_FLOOR: f32 = 0.01;

/// Haptic pulse pattern: on, off, on.
pub const HAPTIC_PATTERN: [Duration; 3] = [
    Duration::from_millis(100),
    Duration::from_millis(50),
    Duration::from_millis(100),
];

/// Tone frequency in Hz for a notification kind.
pub fn frequency_for(kind: NotificationKind) -> f32 {
    match kind {
        NotificationKind::Message => 800.0,
        NotificationKind::Mention => 1000.0,
        NotificationKind::Achievement => 1200.0,
        NotificationKind::Badge => 1100.0,
        NotificationKind::System => 600.0,
        _ => 800.0,
    }
}

/// Render a mono sine tone with a linear attack and exponential release.
///
/// `volume` is the peak gain and is clamped into `0.0..=1.0`.
pub fn render_tone(frequency: f32, duration: Duration, sample_rate: u32, volume: f32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let total = (duration.as_secs_f32() * rate).round() as usize;
    let attack = ((ATTACK.as_secs_f32() * rate).round() as usize).min(total);
    let release = total.saturating_sub(attack);

    let peak = volume.clamp(0.0, 1.0);
    let floor = RELEASE_FLOOR.min(peak);
    // Per-sample multiplier taking the gain from `peak` to `floor`.
    let decay = if peak > 0.0 && release > 1 {
        (floor / peak).powf(1.0 / (release - 1) as f32)
    } else {
        1.0
    };

    let mut gain = peak;
    (0..total)
        .map(|i| {
            let envelope = if i < attack {
                peak * i as f32 / attack as f32
            } else {
                let current = gain;
                gain *= decay;
                current
            };
            envelope * (TAU * frequency * i as f32 / rate).sin()
        })
        .collect()
}
