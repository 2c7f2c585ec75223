//! Drum voices
//!
//! Each drum is a pure function of local time since its trigger. Noise is
//! drawn from the caller's seeded source only while the voice is sounding.

use serde::{Deserialize, Serialize};

use std::f64::consts::TAU;

use super::osc::{Noise, decay, sine, tone};
use crate::lerp;

/// Kick: sine with a linear pitch drop and exponential decay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KickParams {
    /// Pitch at the trigger (Hz)
    pub freq_start: f64,
    /// Pitch at the end of the window (Hz)
    pub freq_end: f64,
    /// Active window in seconds
    pub duration: f64,
    /// Envelope decay rate (1/s)
    pub decay: f64,
    pub level: f64,
}

impl KickParams {
    /// Amplitude envelope; zero outside `[0, duration)`
    #[inline]
    pub fn envelope(&self, t: f64) -> f64 {
        if t < 0.0 || t >= self.duration {
            0.0
        } else {
            decay(t, self.decay)
        }
    }

    /// Instantaneous pitch at local time `t`
    #[inline]
    pub fn freq(&self, t: f64) -> f64 {
        lerp(self.freq_start, self.freq_end, t / self.duration)
    }

    /// Phase of the glide: the integral of `freq` from the trigger
    #[inline]
    pub fn phase(&self, t: f64) -> f64 {
        let sweep = (self.freq_end - self.freq_start) / self.duration;
        TAU * (self.freq_start * t + 0.5 * sweep * t * t)
    }

    #[inline]
    pub fn sample(&self, t: f64) -> f64 {
        let env = self.envelope(t);
        if env == 0.0 {
            return 0.0;
        }
        sine(self.phase(t)) * env * self.level
    }
}

/// Which beats fire the kick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickPattern {
    /// Beats (0..4) that always fire
    pub beats: Vec<u32>,
    /// Extra beat added once intensity passes `extra_above`
    #[serde(default)]
    pub extra_beat: Option<u32>,
    #[serde(default)]
    pub extra_above: f64,
}

impl KickPattern {
    pub fn fires(&self, beat: u32, intensity: f64) -> bool {
        self.beats.contains(&beat)
            || (self.extra_beat == Some(beat) && intensity > self.extra_above)
    }
}

/// One noise pulse inside a clap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Burst {
    pub start: f64,
    pub end: f64,
    pub gain: f64,
}

/// Snare or clap: noise plus a low tonal body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnareParams {
    pub duration: f64,
    pub decay: f64,
    /// Body sine frequency (Hz)
    pub body_freq: f64,
    pub body_level: f64,
    pub noise_level: f64,
    pub level: f64,
    /// Noise pulses; empty means one continuous snap
    #[serde(default)]
    pub bursts: Vec<Burst>,
}

impl SnareParams {
    /// Gate applied to the noise at local time `t`
    pub fn burst_gain(&self, t: f64) -> f64 {
        if self.bursts.is_empty() {
            return 1.0;
        }
        self.bursts
            .iter()
            .filter(|b| t >= b.start && t < b.end)
            .map(|b| b.gain)
            .sum()
    }

    pub fn sample(&self, t: f64, noise: &mut Noise) -> f64 {
        if t < 0.0 || t >= self.duration {
            return 0.0;
        }
        let env = decay(t, self.decay);
        let snap = noise.sample() * self.burst_gain(t) * self.noise_level;
        let body = tone(self.body_freq, t) * self.body_level;
        (snap + body) * env * self.level
    }
}

/// Closed hat with on/off-beat accents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HatParams {
    pub duration: f64,
    pub decay: f64,
    /// Level on even eighths
    pub on_level: f64,
    /// Level on odd eighths
    pub off_level: f64,
    /// Multiplier reached at full intensity (1.0 = no change)
    #[serde(default = "unity")]
    pub intensity_boost: f64,
}

fn unity() -> f64 {
    1.0
}

impl HatParams {
    pub fn level(&self, eighth: u32, intensity: f64) -> f64 {
        let base = if eighth % 2 == 0 {
            self.on_level
        } else {
            self.off_level
        };
        lerp(base, base * self.intensity_boost, intensity)
    }

    pub fn sample(&self, t: f64, eighth: u32, intensity: f64, noise: &mut Noise) -> f64 {
        if t < 0.0 || t >= self.duration {
            return 0.0;
        }
        noise.sample() * decay(t, self.decay) * self.level(eighth, intensity)
    }
}

/// Plain decaying noise hit (open hat, perc tick)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseHit {
    pub duration: f64,
    pub decay: f64,
    pub level: f64,
}

impl NoiseHit {
    pub fn sample(&self, t: f64, noise: &mut Noise) -> f64 {
        if t < 0.0 || t >= self.duration {
            return 0.0;
        }
        noise.sample() * decay(t, self.decay) * self.level
    }
}

/// Noise hit placed on chosen grid slots, optionally gated by intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotHit {
    pub hit: NoiseHit,
    /// Grid slots (eighths or sixteenths, depending on the part) that fire
    pub slots: Vec<u32>,
    /// Only fires while intensity is above this
    #[serde(default)]
    pub above: Option<f64>,
}

impl SlotHit {
    pub fn fires(&self, slot: u32, intensity: f64) -> bool {
        self.slots.contains(&slot) && self.above.is_none_or(|min| intensity > min)
    }

    pub fn sample(&self, slot: u32, t: f64, intensity: f64, noise: &mut Noise) -> f64 {
        if self.fires(slot, intensity) {
            self.hit.sample(t, noise)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kick() -> KickParams {
        KickParams {
            freq_start: 140.0,
            freq_end: 55.0,
            duration: 0.10,
            decay: 34.0,
            level: 0.95,
        }
    }

    #[test]
    fn test_kick_envelope_decays_within_window() {
        let k = kick();
        let start = k.envelope(0.0);
        assert_eq!(start, 1.0);
        let mut prev = start;
        for i in 1..100 {
            let t = i as f64 * 0.001;
            let env = k.envelope(t);
            assert!(env <= start);
            assert!(env <= prev);
            prev = env;
        }
    }

    #[test]
    fn test_kick_silent_outside_window() {
        let k = kick();
        assert_eq!(k.sample(-0.001), 0.0);
        assert_eq!(k.sample(0.10), 0.0);
        assert_eq!(k.sample(0.5), 0.0);
        assert_eq!(k.envelope(0.2), 0.0);
    }

    #[test]
    fn test_kick_glides_down_without_reversing() {
        let k = KickParams { decay: 0.0, ..kick() };
        let sr = 44_100.0;
        let n = (k.duration * sr) as usize;
        let samples: Vec<f64> = (0..n).map(|i| k.sample((i as f64 + 0.5) / sr)).collect();
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count();
        // Mean pitch 97.5 Hz over 0.1 s is about 19.5 half cycles
        assert!((18..=21).contains(&crossings), "{crossings} crossings");

        assert_eq!(k.freq(0.0), 140.0);
        assert!((k.freq(k.duration) - 55.0).abs() < 1e-9);
        let dt = 1e-6;
        let t = k.duration - dt;
        let measured = (k.phase(t + dt) - k.phase(t - dt)) / (2.0 * dt * TAU);
        assert!((measured - k.freq(t)).abs() < 1e-3);
    }

    #[test]
    fn test_kick_pattern_extra_beat() {
        let pattern = KickPattern {
            beats: vec![0, 2],
            extra_beat: Some(1),
            extra_above: 0.75,
        };
        assert!(pattern.fires(0, 0.0));
        assert!(!pattern.fires(1, 0.5));
        assert!(pattern.fires(1, 0.8));
        assert!(!pattern.fires(3, 1.0));
    }

    #[test]
    fn test_clap_bursts_gate_noise() {
        let clap = SnareParams {
            duration: 0.14,
            decay: 20.0,
            body_freq: 210.0,
            body_level: 0.12,
            noise_level: 0.55,
            level: 0.55,
            bursts: vec![
                Burst { start: 0.0, end: 0.02, gain: 1.0 },
                Burst { start: 0.03, end: 0.05, gain: 0.8 },
                Burst { start: 0.06, end: 0.08, gain: 0.6 },
            ],
        };
        assert_eq!(clap.burst_gain(0.01), 1.0);
        assert_eq!(clap.burst_gain(0.025), 0.0);
        assert_eq!(clap.burst_gain(0.04), 0.8);
        assert_eq!(clap.burst_gain(0.07), 0.6);
        assert_eq!(clap.burst_gain(0.1), 0.0);

        let mut noise = Noise::new(1);
        assert_eq!(clap.sample(0.2, &mut noise), 0.0);
    }

    #[test]
    fn test_hat_accent_and_intensity() {
        let hat = HatParams {
            duration: 0.028,
            decay: 140.0,
            on_level: 0.11,
            off_level: 0.09,
            intensity_boost: 1.6,
        };
        assert!((hat.level(0, 0.0) - 0.11).abs() < 1e-12);
        assert!((hat.level(1, 0.0) - 0.09).abs() < 1e-12);
        assert!((hat.level(0, 1.0) - 0.176).abs() < 1e-12);
    }

    #[test]
    fn test_noise_hit_silent_before_swung_onset() {
        let hit = NoiseHit {
            duration: 0.1,
            decay: 28.0,
            level: 0.07,
        };
        let mut noise = Noise::new(9);
        assert_eq!(hit.sample(-0.01, &mut noise), 0.0);
    }

    #[test]
    fn test_perc_needs_intensity() {
        let perc = SlotHit {
            hit: NoiseHit {
                duration: 0.02,
                decay: 220.0,
                level: 0.07,
            },
            slots: vec![2, 6, 10, 14],
            above: Some(0.55),
        };
        assert!(!perc.fires(2, 0.55));
        assert!(perc.fires(2, 0.6));
        assert!(!perc.fires(3, 1.0));

        let open_hat = SlotHit {
            above: None,
            ..perc
        };
        assert!(open_hat.fires(6, 0.0));
    }
}
