//! Pitched continuous voices: bass, arpeggio, pad, pluck, lead
//!
//! Each voice owns its phase accumulators (and filter state where it has
//! one). Phases advance every frame whether or not the voice is audible, so a
//! note change never jumps the waveform.

use serde::{Deserialize, Serialize};

use super::clock::Position;
use super::osc::{OnePole, PhaseAccumulator, decay, sine, soft_square, triangle};
use crate::{lerp, midi_to_hz, smoothstep01};

/// Note choice for the bass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BassLine {
    /// Chord root on even beats, fifth on odd beats
    RootFifth,
    /// Fixed sequence, one note per `beats_per_step` beats, independent of chord
    Steps { notes: Vec<i32>, beats_per_step: u32 },
}

/// Bass waveform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BassShape {
    /// tanh-rounded square
    SoftSquare { drive: f64 },
    /// Sine blended with an arcsine triangle
    SineTriangle { sine: f64, triangle: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BassParams {
    pub root_midi: i32,
    pub line: BassLine,
    pub shape: BassShape,
    /// Per-beat decay rate (1/s)
    pub decay: f64,
    /// Level at intensity 0
    pub level: f64,
    /// Level at intensity 1
    pub level_intense: f64,
}

#[derive(Debug, Clone)]
pub struct BassVoice {
    pub params: BassParams,
    phase: PhaseAccumulator,
}

impl BassVoice {
    pub fn new(params: BassParams) -> Self {
        Self {
            params,
            phase: PhaseAccumulator::new(),
        }
    }

    /// Semitone offset (from `root_midi`) sounding at `pos`
    pub fn semitone(&self, pos: &Position, chord: i32) -> i32 {
        match &self.params.line {
            BassLine::RootFifth => chord + if pos.beat % 2 == 0 { 0 } else { 7 },
            BassLine::Steps {
                notes,
                beats_per_step,
            } => {
                if notes.is_empty() {
                    return 0;
                }
                let beat_index = pos.bar * crate::consts::BEATS_PER_BAR as u64 + pos.beat as u64;
                let step = beat_index / (*beats_per_step).max(1) as u64;
                notes[(step % notes.len() as u64) as usize]
            }
        }
    }

    pub fn sample(&mut self, pos: &Position, chord: i32, intensity: f64, sample_rate: f64) -> f64 {
        let freq = midi_to_hz(self.params.root_midi + self.semitone(pos, chord));
        let phase = self.phase.advance(freq, sample_rate);

        let wave = match self.params.shape {
            BassShape::SoftSquare { drive } => soft_square(phase, drive),
            BassShape::SineTriangle {
                sine: s,
                triangle: tri,
            } => sine(phase) * s + triangle(phase) * tri,
        };
        let level = lerp(self.params.level, self.params.level_intense, intensity);
        wave * decay(pos.t_in_beat, self.params.decay) * level
    }

    pub fn phase(&self) -> f64 {
        self.phase.phase()
    }

    pub fn reset(&mut self) {
        self.phase.reset();
    }
}

/// Sixteenth-note arpeggio over chord tones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArpParams {
    pub base_midi: i32,
    /// Chord-tone intervals cycled by sixteenth step
    pub tones: Vec<i32>,
    /// Semitones added on the first half of every 8-step group
    pub octave_bounce: i32,
    /// Audible window after each step (seconds, shorter than a sixteenth)
    pub window: f64,
    pub decay: f64,
    /// Level of the 2nd harmonic relative to the fundamental
    pub harmonic: f64,
    pub level: f64,
    pub level_intense: f64,
}

#[derive(Debug, Clone)]
pub struct ArpVoice {
    pub params: ArpParams,
    phase: PhaseAccumulator,
}

impl ArpVoice {
    pub fn new(params: ArpParams) -> Self {
        Self {
            params,
            phase: PhaseAccumulator::new(),
        }
    }

    pub fn note(&self, sixteenth: u32, chord: i32) -> i32 {
        let tones = &self.params.tones;
        let pick = if tones.is_empty() {
            0
        } else {
            tones[sixteenth as usize % tones.len()]
        };
        let octave = if sixteenth % 8 < 4 {
            self.params.octave_bounce
        } else {
            0
        };
        self.params.base_midi + chord + pick + octave
    }

    pub fn sample(&mut self, pos: &Position, chord: i32, intensity: f64, sample_rate: f64) -> f64 {
        let freq = midi_to_hz(self.note(pos.sixteenth, chord));
        let phase = self.phase.advance(freq, sample_rate);

        let t = pos.t_in_sixteenth;
        if t >= self.params.window {
            return 0.0;
        }
        let body = sine(phase) + sine(phase * 2.0) * self.params.harmonic;
        let level = lerp(self.params.level, self.params.level_intense, intensity);
        body * decay(t, self.params.decay) * level
    }

    pub fn reset(&mut self) {
        self.phase.reset();
    }
}

/// Sustained triad with tremolo and per-bar edge fades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadParams {
    pub base_midi: i32,
    /// Chord offsets voiced with a minor third; all others are major
    #[serde(default)]
    pub minor_chords: Vec<i32>,
    /// Mix weights for root, third, fifth
    pub weights: [f64; 3],
    /// One-pole smoothing coefficient
    pub lowpass: f64,
    pub tremolo_rate: f64,
    pub tremolo_depth: f64,
    pub level: f64,
}

#[derive(Debug, Clone)]
pub struct PadVoice {
    pub params: PadParams,
    phases: [PhaseAccumulator; 3],
    lp: OnePole,
}

impl PadVoice {
    pub fn new(params: PadParams) -> Self {
        Self {
            params,
            phases: [PhaseAccumulator::new(); 3],
            lp: OnePole::new(),
        }
    }

    /// Root, third and fifth as MIDI notes
    pub fn triad(&self, chord: i32) -> [i32; 3] {
        let root = self.params.base_midi + chord;
        let third = if self.params.minor_chords.contains(&chord) {
            3
        } else {
            4
        };
        [root, root + third, root + 7]
    }

    /// `t` is elapsed track time, used for the tremolo
    pub fn sample(&mut self, pos: &Position, chord: i32, t: f64, sample_rate: f64) -> f64 {
        let mut sum = 0.0;
        for ((note, phase), weight) in self
            .triad(chord)
            .into_iter()
            .zip(self.phases.iter_mut())
            .zip(self.params.weights)
        {
            sum += sine(phase.advance(midi_to_hz(note), sample_rate)) * weight;
        }

        let smoothed = self.lp.process(sum, self.params.lowpass);
        let depth = self.params.tremolo_depth;
        let trem = (1.0 - depth) + depth * sine(std::f64::consts::TAU * self.params.tremolo_rate * t);
        let edge = smoothstep01(pos.bar_phase) * smoothstep01(1.0 - pos.bar_phase);

        smoothed * trem * edge * self.params.level
    }

    pub fn reset(&mut self) {
        self.phases.iter_mut().for_each(PhaseAccumulator::reset);
        self.lp.reset();
    }
}

/// Pentatonic pluck on accented sixteenths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluckParams {
    pub base_midi: i32,
    /// Sixteenth steps (0..16) that trigger a note
    pub steps: Vec<u32>,
    pub scale: Vec<i32>,
    pub decay: f64,
    pub harmonic: f64,
    pub level: f64,
}

#[derive(Debug, Clone)]
pub struct PluckVoice {
    pub params: PluckParams,
    phase: PhaseAccumulator,
}

impl PluckVoice {
    pub fn new(params: PluckParams) -> Self {
        Self {
            params,
            phase: PhaseAccumulator::new(),
        }
    }

    pub fn note(&self, pos: &Position, chord: i32) -> i32 {
        let scale = &self.params.scale;
        let pick = if scale.is_empty() {
            0
        } else {
            let idx = (pos.sixteenth as u64 + pos.bar) % scale.len() as u64;
            scale[idx as usize]
        };
        self.params.base_midi + chord + pick
    }

    pub fn sample(&mut self, pos: &Position, chord: i32, sample_rate: f64) -> f64 {
        let freq = midi_to_hz(self.note(pos, chord));
        let phase = self.phase.advance(freq, sample_rate);

        if !self.params.steps.contains(&pos.sixteenth) {
            return 0.0;
        }
        let body = sine(phase) + sine(phase * 2.0) * self.params.harmonic;
        body * decay(pos.t_in_sixteenth, self.params.decay) * self.params.level
    }

    pub fn reset(&mut self) {
        self.phase.reset();
    }
}

/// Intensity-gated lead through an intensity-dependent low-pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadParams {
    pub base_midi: i32,
    /// Silent below this intensity
    pub threshold: f64,
    pub scale: Vec<i32>,
    /// Audible window after each note (seconds)
    pub window: f64,
    pub decay: f64,
    /// Weights of harmonics 1, 2 and 3
    pub harmonics: [f64; 3],
    pub level: f64,
    pub level_intense: f64,
    /// Low-pass coefficient at intensity 0 and 1
    pub cutoff: f64,
    pub cutoff_intense: f64,
}

#[derive(Debug, Clone)]
pub struct LeadVoice {
    pub params: LeadParams,
    phase: PhaseAccumulator,
    lp: OnePole,
}

impl LeadVoice {
    pub fn new(params: LeadParams) -> Self {
        Self {
            params,
            phase: PhaseAccumulator::new(),
            lp: OnePole::new(),
        }
    }

    /// Note for an even sixteenth step
    pub fn note(&self, sixteenth: u32, chord: i32) -> i32 {
        let scale = &self.params.scale;
        let pick = if scale.is_empty() {
            0
        } else {
            scale[(sixteenth / 2) as usize % scale.len()]
        };
        self.params.base_midi + chord + pick
    }

    pub fn sample(&mut self, pos: &Position, chord: i32, intensity: f64, sample_rate: f64) -> f64 {
        let freq = midi_to_hz(self.note(pos.sixteenth, chord));
        let phase = self.phase.advance(freq, sample_rate);
        let cutoff = lerp(self.params.cutoff, self.params.cutoff_intense, intensity);

        let gated = intensity < self.params.threshold
            || pos.sixteenth % 2 != 0
            || pos.t_in_sixteenth >= self.params.window;
        if gated {
            // Keep the filter settling so the next note starts clean
            self.lp.process(0.0, cutoff);
            return 0.0;
        }

        let [h1, h2, h3] = self.params.harmonics;
        let body = sine(phase) * h1 + sine(phase * 2.0) * h2 + sine(phase * 3.0) * h3;
        let level = lerp(self.params.level, self.params.level_intense, intensity);
        let raw = body * decay(pos.t_in_sixteenth, self.params.decay) * level;
        self.lp.process(raw, cutoff)
    }

    pub fn reset(&mut self) {
        self.phase.reset();
        self.lp.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::clock::Clock;

    fn lead() -> LeadVoice {
        LeadVoice::new(LeadParams {
            base_midi: 79,
            threshold: 0.30,
            scale: vec![0, 3, 5, 7, 10],
            window: 0.11,
            decay: 28.0,
            harmonics: [0.75, 0.22, 0.10],
            level: 0.08,
            level_intense: 0.18,
            cutoff: 0.22,
            cutoff_intense: 0.14,
        })
    }

    #[test]
    fn test_root_fifth_alternates() {
        let bass = BassVoice::new(BassParams {
            root_midi: 33,
            line: BassLine::RootFifth,
            shape: BassShape::SoftSquare { drive: 2.8 },
            decay: 3.0,
            level: 0.42,
            level_intense: 0.60,
        });
        let clock = Clock::new(128.0);
        let on = clock.position(0.01);
        let off = clock.position(clock.beat_len() + 0.01);
        assert_eq!(bass.semitone(&on, 8), 8);
        assert_eq!(bass.semitone(&off, 8), 15);
    }

    #[test]
    fn test_bass_steps_change_every_two_beats() {
        let bass = BassVoice::new(BassParams {
            root_midi: 36,
            line: BassLine::Steps {
                notes: vec![0, 0, 7, 7, 9, 9, 5, 5],
                beats_per_step: 2,
            },
            shape: BassShape::SineTriangle {
                sine: 0.55,
                triangle: 0.35,
            },
            decay: 3.2,
            level: 0.55,
            level_intense: 0.55,
        });
        let clock = Clock::new(92.0);
        let beat = clock.beat_len();
        let notes: Vec<i32> = (0..16)
            .map(|b| bass.semitone(&clock.position(b as f64 * beat + 0.01), 0))
            .collect();
        assert_eq!(notes, vec![0, 0, 0, 0, 7, 7, 7, 7, 9, 9, 9, 9, 5, 5, 5, 5]);
    }

    #[test]
    fn test_arp_octave_bounce() {
        let arp = ArpVoice::new(ArpParams {
            base_midi: 72,
            tones: vec![0, 3, 7, 10],
            octave_bounce: 12,
            window: 0.08,
            decay: 55.0,
            harmonic: 0.12,
            level: 0.14,
            level_intense: 0.24,
        });
        assert_eq!(arp.note(0, 0), 84);
        assert_eq!(arp.note(3, 0), 94);
        assert_eq!(arp.note(4, 0), 72);
        assert_eq!(arp.note(9, 3), 90);
    }

    #[test]
    fn test_pad_minor_third_on_configured_chord() {
        let pad = PadVoice::new(PadParams {
            base_midi: 60,
            minor_chords: vec![9],
            weights: [0.45, 0.35, 0.25],
            lowpass: 0.09,
            tremolo_rate: 1.0 / 6.0,
            tremolo_depth: 0.08,
            level: 0.33,
        });
        assert_eq!(pad.triad(0), [60, 64, 67]);
        assert_eq!(pad.triad(9), [69, 72, 76]);
    }

    #[test]
    fn test_pad_silent_at_bar_edges() {
        let mut pad = PadVoice::new(PadParams {
            base_midi: 60,
            minor_chords: Vec::new(),
            weights: [0.45, 0.35, 0.25],
            lowpass: 0.09,
            tremolo_rate: 1.0 / 6.0,
            tremolo_depth: 0.08,
            level: 0.33,
        });
        let clock = Clock::new(92.0);
        let pos = clock.position(0.0);
        assert_eq!(pad.sample(&pos, 0, 0.0, 44_100.0), 0.0);
    }

    #[test]
    fn test_lead_gated_below_threshold() {
        let mut lead = lead();
        let clock = Clock::new(128.0);
        let pos = clock.position(0.01);
        assert_eq!(lead.sample(&pos, 0, 0.1, 44_100.0), 0.0);
        assert_ne!(lead.sample(&pos, 0, 0.9, 44_100.0), 0.0);
    }

    #[test]
    fn test_lead_skips_odd_steps() {
        let mut lead = lead();
        let clock = Clock::new(128.0);
        let pos = clock.position(clock.sixteenth_len() + 0.01);
        assert_eq!(pos.sixteenth, 1);
        assert_eq!(lead.sample(&pos, 0, 1.0, 44_100.0), 0.0);
    }

    #[test]
    fn test_reset_restores_phase() {
        let mut bass = BassVoice::new(BassParams {
            root_midi: 33,
            line: BassLine::RootFifth,
            shape: BassShape::SoftSquare { drive: 2.8 },
            decay: 3.0,
            level: 0.42,
            level_intense: 0.60,
        });
        let pos = Clock::new(128.0).position(0.0);
        for _ in 0..100 {
            bass.sample(&pos, 0, 0.0, 44_100.0);
        }
        assert_ne!(bass.phase(), 0.0);
        bass.reset();
        assert_eq!(bass.phase(), 0.0);
    }
}
