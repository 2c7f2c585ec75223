//! Stack Audio - procedural music and sound effects for a stack-the-block arcade game
//!
//! Core modules:
//! - `synth`: Deterministic synthesis (clock, voices, tracks, one-shot effects)
//! - `director`: Menu/gameplay music switching with crossfades
//! - `settings`: Player audio preferences
//! - `export`: Offline WAV rendering
//!
//! Nothing here touches an audio device. The host pulls frames with
//! `fill`/`request_frames` and hands them to whatever output it owns.

pub mod director;
pub mod error;
pub mod export;
pub mod settings;
pub mod synth;

pub use director::MusicDirector;
pub use error::{AudioError, Result};
pub use settings::AudioSettings;
pub use synth::{Frame, OneShot, SfxConfig, SfxPlayer, Track, TrackConfig};

/// Audio configuration constants
pub mod consts {
    /// Host mix rate assumed when none is configured
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
    /// Beats per bar (every track is in 4/4)
    pub const BEATS_PER_BAR: u32 = 4;
    /// MIDI note of A4
    pub const A4_MIDI: i32 = 69;
    /// Frequency of A4 in Hz
    pub const A4_HZ: f64 = 440.0;
    /// Level treated as fully silent by the crossfader (dB)
    pub const SILENT_DB: f32 = -60.0;
    /// Playing level of a faded-in music track (dB)
    pub const MUSIC_DB: f32 = -10.0;
    /// Upper bound on combo-driven pitch increases
    pub const MAX_COMBO_STEPS: u32 = 12;
}

/// Convert a MIDI note number to a frequency in Hz
#[inline]
pub fn midi_to_hz(midi: i32) -> f64 {
    consts::A4_HZ * 2f64.powf((midi - consts::A4_MIDI) as f64 / 12.0)
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Hermite smoothstep on [0, 1], clamping the input
#[inline]
pub fn smoothstep01(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// tanh saturation with input drive. Strictly inside ±1 until `x·drive`
/// approaches 19, where f64 rounds tanh to exactly ±1.
#[inline]
pub fn soft_clip(x: f64, drive: f64) -> f64 {
    (x * drive).tanh()
}

/// Number of samples covering `seconds`, never less than one
#[inline]
pub fn samples_for(seconds: f64, sample_rate: u32) -> usize {
    let n = (seconds.max(0.0) * sample_rate.max(1) as f64).round();
    if n.is_finite() { (n as usize).max(1) } else { 1 }
}

/// Number of silent samples for a gap; zero is allowed
#[inline]
pub fn gap_samples(seconds: f64, sample_rate: u32) -> usize {
    let n = (seconds.max(0.0) * sample_rate.max(1) as f64).round();
    if n.is_finite() { n as usize } else { 0 }
}

/// Decibels to linear gain
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}
