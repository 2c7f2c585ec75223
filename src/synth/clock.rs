//! Musical clock: elapsed seconds to bar/beat/eighth/sixteenth position
//!
//! Positions are recomputed from the time cursor every frame. Nothing is
//! cached between frames, so a position is a pure function of `t`.

use serde::{Deserialize, Serialize};

use crate::consts::BEATS_PER_BAR;

/// Largest swing push, as a fraction of an eighth note
pub const MAX_SWING_PUSH: f64 = 0.15;

const EIGHTHS_PER_BAR: u32 = BEATS_PER_BAR * 2;
const SIXTEENTHS_PER_BAR: u32 = BEATS_PER_BAR * 4;

/// Hierarchical musical position at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Bar index since track start (or since the last loop wrap)
    pub bar: u64,
    /// Beat within the bar (0..4)
    pub beat: u32,
    /// Eighth note within the bar (0..8)
    pub eighth: u32,
    /// Sixteenth note within the bar (0..16)
    pub sixteenth: u32,
    /// Seconds since the bar started, in [0, bar_len)
    pub t_in_bar: f64,
    /// Seconds since the beat started
    pub t_in_beat: f64,
    /// Seconds since the (swung) eighth onset. Negative while an off-beat
    /// onset is still being delayed by swing.
    pub t_in_eighth: f64,
    /// Seconds since the sixteenth started
    pub t_in_sixteenth: f64,
    /// Fraction of the bar elapsed, in [0, 1)
    pub bar_phase: f64,
}

/// Tempo, swing and loop settings for one track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    /// Tempo in beats per minute
    pub bpm: f64,
    /// Swing amount: 0.5 is straight, 0.55-0.60 is a light shuffle
    #[serde(default = "straight")]
    pub swing: f64,
    /// Wrap time every this many bars (None = never wrap)
    #[serde(default)]
    pub loop_bars: Option<u32>,
}

fn straight() -> f64 {
    0.5
}

impl Clock {
    /// Straight 4/4 clock with no loop
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            swing: straight(),
            loop_bars: None,
        }
    }

    pub fn with_swing(mut self, swing: f64) -> Self {
        self.swing = swing;
        self
    }

    pub fn with_loop(mut self, bars: u32) -> Self {
        self.loop_bars = Some(bars);
        self
    }

    /// Tempo actually used for timing (at least 1 BPM)
    #[inline]
    fn effective_bpm(&self) -> f64 {
        if self.bpm.is_finite() { self.bpm.max(1.0) } else { 120.0 }
    }

    #[inline]
    pub fn beat_len(&self) -> f64 {
        60.0 / self.effective_bpm()
    }

    #[inline]
    pub fn bar_len(&self) -> f64 {
        BEATS_PER_BAR as f64 * self.beat_len()
    }

    #[inline]
    pub fn eighth_len(&self) -> f64 {
        self.beat_len() * 0.5
    }

    #[inline]
    pub fn sixteenth_len(&self) -> f64 {
        self.beat_len() * 0.25
    }

    /// Loop length in seconds, if the track loops
    pub fn loop_len(&self) -> Option<f64> {
        self.loop_bars
            .filter(|&bars| bars > 0)
            .map(|bars| bars as f64 * self.bar_len())
    }

    /// Delay applied to odd eighths, as a fraction of an eighth
    #[inline]
    pub fn swing_push(&self) -> f64 {
        (self.swing - 0.5).clamp(0.0, MAX_SWING_PUSH)
    }

    /// Musical position at `t` seconds
    pub fn position(&self, t: f64) -> Position {
        let mut t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        if let Some(len) = self.loop_len() {
            t %= len;
        }

        let bar_len = self.bar_len();
        let mut bar = (t / bar_len).floor();
        let mut t_in_bar = t - bar * bar_len;
        // Division rounding can leave the remainder a hair outside the bar
        if t_in_bar >= bar_len {
            bar += 1.0;
            t_in_bar -= bar_len;
        }
        let t_in_bar = t_in_bar.clamp(0.0, bar_len * (1.0 - f64::EPSILON));

        let beat_len = self.beat_len();
        let beat = subdivide(t_in_bar, beat_len, BEATS_PER_BAR);
        let t_in_beat = (t_in_bar - beat as f64 * beat_len).max(0.0);

        let sixteenth_len = self.sixteenth_len();
        let sixteenth = subdivide(t_in_bar, sixteenth_len, SIXTEENTHS_PER_BAR);
        let t_in_sixteenth = (t_in_bar - sixteenth as f64 * sixteenth_len).max(0.0);

        let eighth_len = self.eighth_len();
        let eighth = subdivide(t_in_bar, eighth_len, EIGHTHS_PER_BAR);
        let frac = (t_in_bar / eighth_len - eighth as f64).clamp(0.0, 1.0);
        let swung = if eighth % 2 == 1 {
            frac - self.swing_push()
        } else {
            frac
        };

        Position {
            bar: bar as u64,
            beat,
            eighth,
            sixteenth,
            t_in_bar,
            t_in_beat,
            t_in_eighth: swung * eighth_len,
            t_in_sixteenth,
            bar_phase: t_in_bar / bar_len,
        }
    }
}

#[inline]
fn subdivide(t_in_bar: f64, unit: f64, count: u32) -> u32 {
    ((t_in_bar / unit).floor() as u32).min(count - 1)
}

/// Fixed chord progression, one entry per bar (semitones from the key root)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression(pub Vec<i32>);

impl Progression {
    pub fn new(steps: Vec<i32>) -> Self {
        Self(steps)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of `bar` inside the progression
    #[inline]
    pub fn slot(&self, bar: u64) -> usize {
        if self.0.is_empty() {
            0
        } else {
            (bar % self.0.len() as u64) as usize
        }
    }

    /// Chord offset for `bar` (0 for an empty progression)
    #[inline]
    pub fn chord(&self, bar: u64) -> i32 {
        self.0.get(self.slot(bar)).copied().unwrap_or(0)
    }
}
