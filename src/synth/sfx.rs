//! One-shot sound effects
//!
//! A trigger expands into a short score of stages (tones, glides, noise,
//! silent gaps), renders all of it at once and appends the frames to a queue
//! that `fill` drains. Phase and filter state is local to each stage.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::mix::Frame;
use super::osc::{Noise, OnePole, PhaseAccumulator, decay, sine, tone};
use crate::consts::{DEFAULT_SAMPLE_RATE, MAX_COMBO_STEPS};
use crate::error::{AudioError, Result};
use crate::{gap_samples, lerp, midi_to_hz, samples_for, soft_clip};

/// Longest single stage a config may ask for (seconds)
pub const MAX_STAGE_SECONDS: f64 = 10.0;

/// Effects the game can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OneShot {
    /// UI button press
    Click,
    /// Perfectly aligned drop; pitch rises with the combo
    Perfect { combo: u32 },
    /// Combo counter step
    ComboTick { combo: u32 },
    /// Falling arpeggio, sub drop, sweep and thud
    GameOver,
    /// Sliding tone with a sub octave (block falling off)
    Fall,
    /// Short low impact
    Thud,
    /// Soft noise rush
    Whoosh,
    /// Chime sliding down
    ChimeDown,
}

/// Effect tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SfxConfig {
    /// Level of every effect except the click
    pub volume: f64,
    pub seed: u64,
    /// Most audio the player will hold unplayed; oldest frames go first
    pub max_queue_seconds: f64,

    pub click_volume: f64,
    pub click_pitch: f64,
    pub click_duration: f64,

    pub perfect_pitch: f64,
    /// Hz added per combo step
    pub perfect_step: f64,
    /// Second chime pitch relative to the first
    pub perfect_interval: f64,
    pub perfect_durations: [f64; 2],
    /// Silence between the two chimes
    pub perfect_delay: f64,
    pub chime_noise: f64,

    pub combo_tick_pitch: f64,
    pub combo_tick_step: f64,
    pub combo_tick_duration: f64,
    pub combo_tick_noise: f64,

    /// Game over arpeggio, MIDI notes in play order
    pub game_over_notes: Vec<i32>,
    pub note_duration: f64,
    pub note_gap: f64,
    /// Fraction of the start pitch each note glides down by
    pub slide_ratio: f64,
    pub detune_cents: f64,
    pub sub_drop: Glide,
    pub sweep_duration: f64,
    pub sweep_level: f64,
    pub thud_deep: ThudParams,

    pub fall: Glide,
    pub thud: ThudParams,
    pub whoosh_duration: f64,
    pub whoosh_level: f64,
    pub chime_down: Glide,
}

/// Pitch glide between two frequencies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glide {
    pub from: f64,
    pub to: f64,
    pub duration: f64,
    /// Level (sub drop) or noise amount (fall, chime down)
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThudParams {
    pub freq: f64,
    pub decay: f64,
    pub duration: f64,
    pub level: f64,
    pub noise: f64,
    pub drive: f64,
}

impl Default for SfxConfig {
    fn default() -> Self {
        Self {
            volume: 0.35,
            seed: 4242,
            max_queue_seconds: 4.0,
            click_volume: 0.6,
            click_pitch: 900.0,
            click_duration: 0.055,
            perfect_pitch: 880.0,
            perfect_step: 70.0,
            perfect_interval: 1.25,
            perfect_durations: [0.045, 0.050],
            perfect_delay: 0.03,
            chime_noise: 0.18,
            combo_tick_pitch: 720.0,
            combo_tick_step: 55.0,
            combo_tick_duration: 0.05,
            combo_tick_noise: 0.10,
            game_over_notes: vec![76, 74, 71, 67, 64, 62, 60],
            note_duration: 0.12,
            note_gap: 0.015,
            slide_ratio: 0.22,
            detune_cents: 10.0,
            sub_drop: Glide {
                from: 180.0,
                to: 55.0,
                duration: 0.26,
                amount: 0.65,
            },
            sweep_duration: 0.22,
            sweep_level: 0.22,
            thud_deep: ThudParams {
                freq: 58.0,
                decay: 16.0,
                duration: 0.18,
                level: 0.55,
                noise: 0.12,
                drive: 2.0,
            },
            fall: Glide {
                from: 520.0,
                to: 180.0,
                duration: 0.30,
                amount: 0.04,
            },
            thud: ThudParams {
                freq: 90.0,
                decay: 55.0,
                duration: 0.12,
                level: 0.8,
                noise: 0.20,
                drive: 1.6,
            },
            whoosh_duration: 0.35,
            whoosh_level: 0.7,
            chime_down: Glide {
                from: 880.0,
                to: 440.0,
                duration: 0.35,
                amount: 0.05,
            },
        }
    }
}

/// One step of an effect score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Gap(f64),
    Click {
        pitch: f64,
        duration: f64,
        volume: f64,
    },
    /// Sine plus 2nd harmonic with a short upward pitch flick
    Chime {
        pitch: f64,
        duration: f64,
        noise: f64,
    },
    /// Detuned two-voice note with vibrato and a curved downward glide
    Note {
        from: f64,
        to: f64,
        duration: f64,
        detune_cents: f64,
        brightness: f64,
    },
    SubDrop(Glide),
    /// Low-passed noise whose cutoff falls across the stage
    NoiseSweep { duration: f64, level: f64 },
    Thud(ThudParams),
    Fall(Glide),
    Whoosh { duration: f64, level: f64 },
    ChimeDown(Glide),
}

impl Stage {
    pub fn duration(&self) -> f64 {
        match *self {
            Stage::Gap(d) => d,
            Stage::Click { duration, .. }
            | Stage::Chime { duration, .. }
            | Stage::Note { duration, .. }
            | Stage::NoiseSweep { duration, .. }
            | Stage::Whoosh { duration, .. } => duration,
            Stage::SubDrop(g) | Stage::Fall(g) | Stage::ChimeDown(g) => g.duration,
            Stage::Thud(p) => p.duration,
        }
    }

    /// Frames this stage renders to
    pub fn len(&self, sample_rate: u32) -> usize {
        match self {
            Stage::Gap(d) => gap_samples(*d, sample_rate),
            other => samples_for(other.duration(), sample_rate),
        }
    }

    fn render(&self, sample_rate: u32, volume: f64, noise: &mut Noise, out: &mut VecDeque<Frame>) {
        let n = self.len(sample_rate);
        let sr = sample_rate.max(1) as f64;
        let mut push = |x: f64| out.push_back(Frame::mono(x as f32));

        match *self {
            Stage::Gap(_) => (0..n).for_each(|_| push(0.0)),
            Stage::Click {
                pitch,
                volume: level,
                ..
            } => {
                for i in 0..n {
                    let t = i as f64 / sr;
                    let x = tone(pitch, t) * 0.75 + noise.sample() * 0.25;
                    push(soft_clip(x * decay(t, 70.0) * level, 1.0));
                }
            }
            Stage::Chime {
                pitch,
                noise: amount,
                ..
            } => {
                let mut ph = PhaseAccumulator::new();
                for i in 0..n {
                    let t = i as f64 / sr;
                    let f = pitch * (1.0 + 0.08 * decay(t, 35.0));
                    let p = ph.advance(f, sr);
                    let x = sine(p) * 0.85 + sine(p * 2.0) * 0.18 + noise.sample() * amount;
                    push(soft_clip(x * decay(t, 18.0) * volume, 1.5));
                }
            }
            Stage::Note {
                from,
                to,
                detune_cents,
                brightness,
                ..
            } => {
                let detune = 2f64.powf(detune_cents / 1200.0);
                let mut p1 = PhaseAccumulator::new();
                let mut p2 = PhaseAccumulator::new();
                for i in 0..n {
                    let t = i as f64 / sr;
                    let k = i as f64 / n as f64;
                    let vib = 1.0 + 0.012 * (TAU * 8.0 * t).sin();
                    let f1 = lerp(from, to, k * k) * vib;
                    let a = p1.advance(f1, sr);
                    let b = p2.advance(f1 * detune, sr);
                    let x = sine(a) * 0.70
                        + sine(b) * 0.85 * 0.55
                        + sine(a * 2.0) * brightness
                        + sine(a * 3.0) * brightness * 0.35
                        + noise.sample() * 0.05;
                    push(soft_clip(x * decay(t, 11.0) * volume, 1.9));
                }
            }
            Stage::SubDrop(g) => {
                let mut ph = PhaseAccumulator::new();
                for i in 0..n {
                    let t = i as f64 / sr;
                    let k = i as f64 / n as f64;
                    let p = ph.advance(lerp(g.from, g.to, k * k), sr);
                    push(soft_clip(sine(p) * decay(t, 9.0) * volume * g.amount, 2.2));
                }
            }
            Stage::NoiseSweep { level, .. } => {
                let mut lp = OnePole::new();
                for i in 0..n {
                    let t = i as f64 / sr;
                    let k = i as f64 / n as f64;
                    let x = lp.process(noise.sample(), lerp(0.18, 0.03, k));
                    push(soft_clip(x * decay(t, 7.5) * volume * level, 1.3));
                }
            }
            Stage::Thud(p) => {
                for i in 0..n {
                    let t = i as f64 / sr;
                    let x = tone(p.freq, t) * 0.95 + noise.sample() * p.noise;
                    push(soft_clip(x * decay(t, p.decay) * volume * p.level, p.drive));
                }
            }
            Stage::Fall(g) => {
                let mut ph = PhaseAccumulator::new();
                let mut sub = PhaseAccumulator::new();
                for i in 0..n {
                    let t = i as f64 / sr;
                    let k = i as f64 / n as f64;
                    let f = lerp(g.from, g.to, k);
                    let p = ph.advance(f, sr);
                    let s = sub.advance(f * 0.5, sr);
                    let x = sine(p) * 0.85 + sine(s) * 0.25 + noise.sample() * g.amount;
                    push(soft_clip(x * decay(t, 10.0) * volume, 1.4));
                }
            }
            Stage::Whoosh { level, .. } => {
                for i in 0..n {
                    let t = i as f64 / sr;
                    let x = noise.sample() * 0.55 + tone(120.0, t) * 0.18;
                    push(soft_clip(x * decay(t, 9.5) * volume * level, 1.2));
                }
            }
            Stage::ChimeDown(g) => {
                let mut ph = PhaseAccumulator::new();
                let mut sub = PhaseAccumulator::new();
                for i in 0..n {
                    let t = i as f64 / sr;
                    let k = i as f64 / n as f64;
                    let f = lerp(g.from, g.to, k * k);
                    let p = ph.advance(f, sr);
                    let s = sub.advance(f * 0.5, sr);
                    let x = sine(p) * 0.90
                        + sine(p * 2.0) * 0.18
                        + sine(s) * 0.12
                        + noise.sample() * g.amount;
                    push(soft_clip(x * decay(t, 8.5) * volume, 1.6));
                }
            }
        }
    }
}

impl SfxConfig {
    /// Stages an effect expands to, in play order
    pub fn score(&self, kind: OneShot) -> Vec<Stage> {
        match kind {
            OneShot::Click => vec![Stage::Click {
                pitch: self.click_pitch,
                duration: self.click_duration,
                volume: self.click_volume,
            }],
            OneShot::Perfect { combo } => {
                let pitch = self.perfect_pitch + combo_steps(combo) * self.perfect_step;
                vec![
                    Stage::Chime {
                        pitch,
                        duration: self.perfect_durations[0],
                        noise: self.chime_noise,
                    },
                    Stage::Gap(self.perfect_delay),
                    Stage::Chime {
                        pitch: pitch * self.perfect_interval,
                        duration: self.perfect_durations[1],
                        noise: self.chime_noise,
                    },
                ]
            }
            OneShot::ComboTick { combo } => vec![Stage::Chime {
                pitch: self.combo_tick_pitch + combo_steps(combo) * self.combo_tick_step,
                duration: self.combo_tick_duration,
                noise: self.combo_tick_noise,
            }],
            OneShot::GameOver => {
                let mut stages = Vec::with_capacity(self.game_over_notes.len() * 2 + 3);
                for &midi in &self.game_over_notes {
                    let from = midi_to_hz(midi);
                    stages.push(Stage::Gap(self.note_gap));
                    stages.push(Stage::Note {
                        from,
                        to: from * (1.0 - self.slide_ratio),
                        duration: self.note_duration,
                        detune_cents: self.detune_cents,
                        brightness: 0.28,
                    });
                }
                stages.push(Stage::SubDrop(self.sub_drop));
                stages.push(Stage::NoiseSweep {
                    duration: self.sweep_duration,
                    level: self.sweep_level,
                });
                stages.push(Stage::Thud(self.thud_deep));
                stages
            }
            OneShot::Fall => vec![Stage::Fall(self.fall)],
            OneShot::Thud => vec![Stage::Thud(self.thud)],
            OneShot::Whoosh => vec![Stage::Whoosh {
                duration: self.whoosh_duration,
                level: self.whoosh_level,
            }],
            OneShot::ChimeDown => vec![Stage::ChimeDown(self.chime_down)],
        }
    }
}

impl SfxConfig {
    /// Parse a tuning file and reject values that cannot be rendered
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || !self.click_volume.is_finite() {
            return Err(AudioError::invalid("volume", "must be finite"));
        }
        let durations = [
            ("click_duration", self.click_duration),
            ("perfect_durations[0]", self.perfect_durations[0]),
            ("perfect_durations[1]", self.perfect_durations[1]),
            ("perfect_delay", self.perfect_delay),
            ("combo_tick_duration", self.combo_tick_duration),
            ("note_duration", self.note_duration),
            ("note_gap", self.note_gap),
            ("sub_drop.duration", self.sub_drop.duration),
            ("sweep_duration", self.sweep_duration),
            ("thud_deep.duration", self.thud_deep.duration),
            ("fall.duration", self.fall.duration),
            ("thud.duration", self.thud.duration),
            ("whoosh_duration", self.whoosh_duration),
            ("chime_down.duration", self.chime_down.duration),
        ];
        for (field, seconds) in durations {
            if !seconds.is_finite() || !(0.0..=MAX_STAGE_SECONDS).contains(&seconds) {
                return Err(AudioError::invalid(
                    field,
                    format!("must be within 0..={MAX_STAGE_SECONDS}s, got {seconds}"),
                ));
            }
        }
        if !self.max_queue_seconds.is_finite() || self.max_queue_seconds <= 0.0 {
            return Err(AudioError::invalid(
                "max_queue_seconds",
                format!("must be positive, got {}", self.max_queue_seconds),
            ));
        }
        for kind in [OneShot::GameOver, OneShot::Perfect { combo: 0 }] {
            let seconds: f64 = self.score(kind).iter().map(Stage::duration).sum();
            if seconds > self.max_queue_seconds {
                return Err(AudioError::invalid(
                    "max_queue_seconds",
                    format!("{kind:?} runs {seconds:.3}s, longer than the queue"),
                ));
            }
        }
        Ok(())
    }
}

/// Total frames of a score, saturating on absurd durations
fn score_len(stages: &[Stage], sample_rate: u32) -> usize {
    stages
        .iter()
        .fold(0usize, |n, s| n.saturating_add(s.len(sample_rate)))
}

fn combo_steps(combo: u32) -> f64 {
    combo.min(MAX_COMBO_STEPS) as f64
}

/// Queue of rendered one-shot frames.
///
/// Frames already handed out by `fill` are never touched again; game over
/// drops whatever is still queued before rendering. The queue never holds
/// more than `max_queue_seconds` of audio.
#[derive(Debug, Clone)]
pub struct SfxPlayer {
    config: SfxConfig,
    sample_rate: u32,
    noise: Noise,
    queue: VecDeque<Frame>,
}

impl SfxPlayer {
    pub fn new(config: SfxConfig, sample_rate: u32) -> Self {
        if sample_rate == 0 {
            log::warn!("SfxPlayer sample rate 0, using 1 Hz");
        }
        if let Err(e) = config.validate() {
            log::warn!("Effect config rejected, oversized effects will be dropped: {e}");
        }
        Self {
            noise: Noise::new(config.seed),
            config,
            sample_rate: sample_rate.max(1),
            queue: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &SfxConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Queue capacity in frames
    pub fn max_queued_frames(&self) -> usize {
        samples_for(self.config.max_queue_seconds, self.sample_rate)
    }

    /// Render `kind` and append it to the queue.
    ///
    /// When the queue would overflow, the oldest queued frames are dropped.
    /// A burst longer than the whole queue is not played at all.
    pub fn trigger(&mut self, kind: OneShot) {
        if kind == OneShot::GameOver {
            self.queue.clear();
        }
        let stages = self.config.score(kind);
        let total = score_len(&stages, self.sample_rate);
        let cap = self.max_queued_frames();
        if total > cap {
            log::warn!("Dropping {kind:?}: {total} frames do not fit the {cap} frame queue");
            return;
        }
        let overflow = (self.queue.len() + total).saturating_sub(cap);
        if overflow > 0 {
            log::warn!("Effect queue full, dropping {overflow} oldest frames");
            self.queue.drain(..overflow);
        }
        self.queue.reserve(total);
        for stage in &stages {
            stage.render(self.sample_rate, self.config.volume, &mut self.noise, &mut self.queue);
        }
        log::debug!("Queued {kind:?}: {total} frames");
    }

    /// Frames `kind` renders to at the current sample rate
    pub fn burst_len(&self, kind: OneShot) -> usize {
        score_len(&self.config.score(kind), self.sample_rate)
    }

    /// Drain queued frames into `out`, padding with silence
    pub fn fill(&mut self, out: &mut [Frame]) {
        for frame in out.iter_mut() {
            *frame = self.queue.pop_front().unwrap_or(Frame::SILENT);
        }
    }

    pub fn request_frames(&mut self, n: usize) -> Vec<Frame> {
        let mut out = vec![Frame::SILENT; n];
        self.fill(&mut out);
        out
    }

    pub fn queued_frames(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Drop queued frames and rewind the noise seed
    pub fn reset(&mut self) {
        self.queue.clear();
        self.noise.reset();
    }
}

impl Default for SfxPlayer {
    fn default() -> Self {
        Self::new(SfxConfig::default(), DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_sum(stages: &[(f64, bool)], sr: u32) -> usize {
        stages
            .iter()
            .map(|&(d, gap)| {
                if gap {
                    (d * sr as f64).round() as usize
                } else {
                    ((d * sr as f64).round() as usize).max(1)
                }
            })
            .sum()
    }

    #[test]
    fn test_click_length() {
        let mut sfx = SfxPlayer::default();
        sfx.trigger(OneShot::Click);
        let expected = samples_for(0.055, 44_100);
        assert!(expected.abs_diff(2426) <= 1);
        assert_eq!(sfx.queued_frames(), expected);
        assert_eq!(sfx.burst_len(OneShot::Click), expected);
    }

    #[test]
    fn test_perfect_length_is_sum_of_stages() {
        let sfx = SfxPlayer::default();
        let expected = stage_sum(&[(0.045, false), (0.03, true), (0.050, false)], 44_100);
        assert_eq!(sfx.burst_len(OneShot::Perfect { combo: 3 }), expected);
    }

    #[test]
    fn test_game_over_length_is_sum_of_stages() {
        let sfx = SfxPlayer::default();
        let mut stages = Vec::new();
        for _ in 0..7 {
            stages.push((0.015, true));
            stages.push((0.12, false));
        }
        stages.extend([(0.26, false), (0.22, false), (0.18, false)]);
        let expected = stage_sum(&stages, 44_100);
        let actual = sfx.burst_len(OneShot::GameOver);
        assert!(actual.abs_diff(expected) <= stages.len());
    }

    #[test]
    fn test_perfect_pitch_caps_at_twelve() {
        let config = SfxConfig::default();
        let pitch = |combo| match config.score(OneShot::Perfect { combo })[0] {
            Stage::Chime { pitch, .. } => pitch,
            _ => unreachable!(),
        };
        assert_eq!(pitch(0), 880.0);
        assert_eq!(pitch(12), 880.0 + 12.0 * 70.0);
        assert_eq!(pitch(40), pitch(12));
    }

    #[test]
    fn test_second_chime_is_higher() {
        let config = SfxConfig::default();
        let stages = config.score(OneShot::Perfect { combo: 0 });
        match (stages[0], stages[2]) {
            (Stage::Chime { pitch: a, .. }, Stage::Chime { pitch: b, .. }) => {
                assert!((b / a - 1.25).abs() < 1e-12)
            }
            _ => panic!("unexpected score {stages:?}"),
        }
    }

    #[test]
    fn test_triggers_append() {
        let mut sfx = SfxPlayer::default();
        sfx.trigger(OneShot::Click);
        sfx.trigger(OneShot::ComboTick { combo: 2 });
        assert_eq!(
            sfx.queued_frames(),
            sfx.burst_len(OneShot::Click) + sfx.burst_len(OneShot::ComboTick { combo: 2 })
        );
    }

    #[test]
    fn test_game_over_clears_pending_frames() {
        let mut sfx = SfxPlayer::default();
        sfx.trigger(OneShot::Click);
        sfx.trigger(OneShot::Perfect { combo: 5 });
        let pulled = sfx.request_frames(100);
        sfx.trigger(OneShot::GameOver);
        assert_eq!(sfx.queued_frames(), sfx.burst_len(OneShot::GameOver));
        // Already pulled frames are the caller's
        assert_eq!(pulled.len(), 100);
    }

    #[test]
    fn test_fill_pads_with_silence() {
        let mut sfx = SfxPlayer::default();
        sfx.trigger(OneShot::Thud);
        let len = sfx.queued_frames();
        let out = sfx.request_frames(len + 50);
        assert!(out[..len].iter().any(|f| f.left != 0.0));
        assert!(out[len..].iter().all(|f| *f == Frame::SILENT));
        assert!(sfx.is_idle());
    }

    #[test]
    fn test_game_over_starts_with_gap() {
        let mut sfx = SfxPlayer::default();
        sfx.trigger(OneShot::GameOver);
        let gap = gap_samples(0.015, 44_100);
        let out = sfx.request_frames(gap);
        assert!(out.iter().all(|f| *f == Frame::SILENT));
    }

    #[test]
    fn test_output_bounded_and_mono() {
        let mut sfx = SfxPlayer::default();
        for kind in [
            OneShot::Click,
            OneShot::Perfect { combo: 12 },
            OneShot::ComboTick { combo: 12 },
            OneShot::Fall,
            OneShot::Thud,
            OneShot::Whoosh,
            OneShot::ChimeDown,
            OneShot::GameOver,
        ] {
            sfx.trigger(kind);
        }
        let n = sfx.queued_frames();
        for frame in sfx.request_frames(n) {
            assert!(frame.left.abs() <= 1.0);
            assert_eq!(frame.left, frame.right);
        }
    }

    #[test]
    fn test_reset_reproduces_output() {
        let mut sfx = SfxPlayer::default();
        sfx.trigger(OneShot::Whoosh);
        let first = sfx.request_frames(2_000);
        sfx.reset();
        sfx.trigger(OneShot::Whoosh);
        assert_eq!(sfx.request_frames(2_000), first);
    }

    #[test]
    fn test_queue_is_capped() {
        let mut sfx = SfxPlayer::default();
        let cap = sfx.max_queued_frames();
        assert_eq!(cap, samples_for(4.0, 44_100));
        for _ in 0..200 {
            sfx.trigger(OneShot::Whoosh);
        }
        assert_eq!(sfx.queued_frames(), cap);

        // The newest burst survives at the tail
        let mut fresh = SfxPlayer::default();
        fresh.trigger(OneShot::Whoosh);
        let len = fresh.queued_frames();
        let tail = sfx.request_frames(cap).split_off(cap - len);
        assert!(tail.iter().any(|f| f.left != 0.0));
    }

    #[test]
    fn test_oversized_burst_is_dropped() {
        let config = SfxConfig {
            whoosh_duration: 1e30,
            ..SfxConfig::default()
        };
        assert!(config.validate().is_err());
        let mut sfx = SfxPlayer::new(config, 44_100);
        sfx.trigger(OneShot::Click);
        let queued = sfx.queued_frames();
        sfx.trigger(OneShot::Whoosh);
        assert_eq!(sfx.queued_frames(), queued);
        assert_eq!(sfx.burst_len(OneShot::Whoosh), usize::MAX);
    }

    #[test]
    fn test_validate_rejects_bad_durations() {
        assert!(SfxConfig::default().validate().is_ok());

        let bad = [
            SfxConfig { note_gap: -0.01, ..SfxConfig::default() },
            SfxConfig { click_duration: f64::NAN, ..SfxConfig::default() },
            SfxConfig { whoosh_duration: f64::INFINITY, ..SfxConfig::default() },
            SfxConfig { perfect_delay: 11.0, ..SfxConfig::default() },
            SfxConfig { max_queue_seconds: 0.0, ..SfxConfig::default() },
            SfxConfig { max_queue_seconds: 1.0, ..SfxConfig::default() },
            SfxConfig { volume: f64::NAN, ..SfxConfig::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(AudioError::InvalidConfig { .. })),
                "{config:?}"
            );
        }
        let json = r#"{"fall": {"from": 1, "to": 1, "duration": -1, "amount": 0}}"#;
        assert!(SfxConfig::from_json(json).is_err());
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: SfxConfig = serde_json::from_str(r#"{"volume": 0.5}"#).unwrap();
        assert_eq!(config.volume, 0.5);
        assert_eq!(config.click_pitch, 900.0);
    }
}
