//! Oscillator primitives: phase accumulators, one-pole smoothing, noise

use std::f64::consts::{PI, TAU};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Running oscillator phase in radians.
///
/// Advanced by `2π·f/sample_rate` each frame so pitch changes never jump the
/// waveform. Kept in [0, 2π); integer harmonics of the phase are unaffected
/// by the wrap.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseAccumulator {
    phase: f64,
}

impl PhaseAccumulator {
    pub const fn new() -> Self {
        Self { phase: 0.0 }
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Phase increment for one frame at `freq`
    #[inline]
    pub fn increment(freq: f64, sample_rate: f64) -> f64 {
        TAU * freq / sample_rate
    }

    /// Advance one frame and return the new phase
    #[inline]
    pub fn advance(&mut self, freq: f64, sample_rate: f64) -> f64 {
        self.phase = (self.phase + Self::increment(freq, sample_rate)).rem_euclid(TAU);
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// One-pole low-pass: `y += a·(x − y)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnePole {
    state: f64,
}

impl OnePole {
    pub const fn new() -> Self {
        Self { state: 0.0 }
    }

    /// Filter one sample with smoothing coefficient `a` in (0, 1]
    #[inline]
    pub fn process(&mut self, x: f64, a: f64) -> f64 {
        self.state += a.clamp(0.0, 1.0) * (x - self.state);
        self.state
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// Seeded white noise source (PCG32)
#[derive(Debug, Clone)]
pub struct Noise {
    seed: u64,
    rng: Pcg32,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next uniform sample in [-1, 1)
    #[inline]
    pub fn sample(&mut self) -> f64 {
        self.rng.random::<f64>() * 2.0 - 1.0
    }

    /// Rewind to the construction seed
    pub fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
    }
}

#[inline]
pub fn sine(phase: f64) -> f64 {
    phase.sin()
}

/// Triangle via arcsine of sine: band-softer than a naive triangle
#[inline]
pub fn triangle(phase: f64) -> f64 {
    2.0 / PI * phase.sin().asin()
}

/// Rounded square: tanh-shaped sine
#[inline]
pub fn soft_square(phase: f64, drive: f64) -> f64 {
    (phase.sin() * drive).tanh()
}

/// Exponential decay envelope `exp(−rate·t)`, silent before the onset
#[inline]
pub fn decay(t: f64, rate: f64) -> f64 {
    if t < 0.0 { 0.0 } else { (-t * rate).exp() }
}

/// Sine of a tone started at local time zero (no accumulator)
#[inline]
pub fn tone(freq: f64, t: f64) -> f64 {
    (TAU * freq * t).sin()
}
