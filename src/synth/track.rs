//! Music tracks: configuration presets and the per-frame mixer

use std::fmt;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, Progression};
use super::drums::{Burst, HatParams, KickParams, KickPattern, NoiseHit, SlotHit, SnareParams};
use super::mix::{Frame, duck, duck_partial};
use super::osc::Noise;
use super::voices::{
    ArpParams, ArpVoice, BassLine, BassParams, BassShape, BassVoice, LeadParams, LeadVoice,
    PadParams, PadVoice, PluckParams, PluckVoice,
};
use crate::consts::DEFAULT_SAMPLE_RATE;
use crate::error::{AudioError, Result};

/// Which shipped track a preset describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStyle {
    /// Swung lo-fi loop behind the title screen
    Menu,
    /// Driving arcade track whose density follows intensity
    Gameplay,
}

impl TrackStyle {
    pub fn config(self) -> TrackConfig {
        match self {
            TrackStyle::Menu => TrackConfig::menu(),
            TrackStyle::Gameplay => TrackConfig::gameplay(),
        }
    }
}

impl fmt::Display for TrackStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackStyle::Menu => write!(f, "menu"),
            TrackStyle::Gameplay => write!(f, "gameplay"),
        }
    }
}

/// How a melodic voice sits in the mix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Share of the kick duck applied (0 = untouched, 1 = fully ducked)
    pub duck: f64,
    /// Fraction added to the left channel and subtracted from the right
    #[serde(default)]
    pub width: f64,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            duck: 1.0,
            width: 0.0,
        }
    }
}

/// A voice's parameters plus its mix routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part<P> {
    pub voice: P,
    #[serde(default)]
    pub route: Route,
}

impl<P> Part<P> {
    pub fn new(voice: P, duck: f64, width: f64) -> Self {
        Self {
            voice,
            route: Route { duck, width },
        }
    }
}

/// Kick sidechain settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sidechain {
    pub amount: f64,
    pub floor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrumKit {
    pub kick: KickParams,
    pub kick_pattern: KickPattern,
    pub snare: SnareParams,
    /// Beats the snare/clap plays on
    pub snare_beats: Vec<u32>,
    pub hat: HatParams,
    /// Open hat on chosen eighths (swung like the closed hat)
    #[serde(default)]
    pub open_hat: Option<SlotHit>,
    /// Tick on chosen sixteenths
    #[serde(default)]
    pub perc: Option<SlotHit>,
}

/// Full tuning of one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub name: String,
    pub clock: Clock,
    pub progression: Progression,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    pub seed: u64,
    /// Gain applied to the summed mono mix
    pub master_gain: f64,
    /// Soft-clip drive on each output channel
    pub drive: f64,
    /// Level of the constant background noise bed
    pub noise_floor: f64,
    /// Intensity the track starts with
    #[serde(default)]
    pub intensity: f64,
    pub sidechain: Sidechain,
    pub drums: DrumKit,
    pub bass: Part<BassParams>,
    #[serde(default)]
    pub arp: Option<Part<ArpParams>>,
    #[serde(default)]
    pub pad: Option<Part<PadParams>>,
    #[serde(default)]
    pub pluck: Option<Part<PluckParams>>,
    #[serde(default)]
    pub lead: Option<Part<LeadParams>>,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl TrackConfig {
    /// Lo-fi title loop: 92 BPM, light swing, I-V-vi-IV over four bars
    pub fn menu() -> Self {
        Self {
            name: "menu".to_string(),
            clock: Clock::new(92.0).with_swing(0.56).with_loop(4),
            progression: Progression::new(vec![0, 7, 9, 5]),
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: 1337,
            master_gain: 0.17,
            drive: 1.4,
            noise_floor: 0.006,
            intensity: 0.0,
            sidechain: Sidechain {
                amount: 0.9,
                floor: 0.60,
            },
            drums: DrumKit {
                kick: KickParams {
                    freq_start: 100.0,
                    freq_end: 48.0,
                    duration: 0.12,
                    decay: 28.0,
                    level: 0.95,
                },
                kick_pattern: KickPattern {
                    beats: vec![0, 2],
                    extra_beat: None,
                    extra_above: 0.0,
                },
                snare: SnareParams {
                    duration: 0.14,
                    decay: 20.0,
                    body_freq: 210.0,
                    body_level: 0.12,
                    noise_level: 0.55,
                    level: 0.55,
                    bursts: vec![
                        Burst {
                            start: 0.0,
                            end: 0.02,
                            gain: 1.0,
                        },
                        Burst {
                            start: 0.03,
                            end: 0.05,
                            gain: 0.8,
                        },
                        Burst {
                            start: 0.06,
                            end: 0.08,
                            gain: 0.6,
                        },
                    ],
                },
                snare_beats: vec![1, 3],
                hat: HatParams {
                    duration: 0.03,
                    decay: 120.0,
                    on_level: 0.16,
                    off_level: 0.11,
                    intensity_boost: 1.0,
                },
                open_hat: Some(SlotHit {
                    hit: NoiseHit {
                        duration: 0.10,
                        decay: 28.0,
                        level: 0.07,
                    },
                    slots: vec![3, 7],
                    above: None,
                }),
                perc: None,
            },
            bass: Part::new(
                BassParams {
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
                },
                1.0,
                0.0,
            ),
            arp: None,
            pad: Some(Part::new(
                PadParams {
                    base_midi: 60,
                    minor_chords: vec![9],
                    weights: [0.45, 0.35, 0.25],
                    lowpass: 0.09,
                    tremolo_rate: 1.0 / 6.0,
                    tremolo_depth: 0.08,
                    level: 0.33,
                },
                1.0,
                0.05,
            )),
            pluck: Some(Part::new(
                PluckParams {
                    base_midi: 72,
                    steps: vec![0, 4, 6, 8, 10, 12, 14],
                    scale: vec![0, 2, 4, 7, 9],
                    decay: 65.0,
                    harmonic: 0.15,
                    level: 0.18,
                },
                0.35,
                0.02,
            )),
            lead: None,
        }
    }

    /// Arcade gameplay track: 128 BPM, i-VI-III-VII, intensity-driven layers
    pub fn gameplay() -> Self {
        Self {
            name: "gameplay".to_string(),
            clock: Clock::new(128.0),
            progression: Progression::new(vec![0, 8, 3, 10]),
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: 777,
            master_gain: 0.13,
            drive: 1.7,
            noise_floor: 0.0018,
            intensity: 0.0,
            sidechain: Sidechain {
                amount: 1.05,
                floor: 0.50,
            },
            drums: DrumKit {
                kick: KickParams {
                    freq_start: 140.0,
                    freq_end: 55.0,
                    duration: 0.10,
                    decay: 34.0,
                    level: 0.95,
                },
                kick_pattern: KickPattern {
                    beats: vec![0, 2],
                    extra_beat: Some(1),
                    extra_above: 0.75,
                },
                snare: SnareParams {
                    duration: 0.12,
                    decay: 18.0,
                    body_freq: 220.0,
                    body_level: 0.12,
                    noise_level: 0.65,
                    level: 0.55,
                    bursts: Vec::new(),
                },
                snare_beats: vec![1, 3],
                hat: HatParams {
                    duration: 0.028,
                    decay: 140.0,
                    on_level: 0.11,
                    off_level: 0.09,
                    intensity_boost: 1.6,
                },
                open_hat: None,
                perc: Some(SlotHit {
                    hit: NoiseHit {
                        duration: 0.020,
                        decay: 220.0,
                        level: 0.07,
                    },
                    slots: vec![2, 6, 10, 14],
                    above: Some(0.55),
                }),
            },
            bass: Part::new(
                BassParams {
                    root_midi: 33,
                    line: BassLine::RootFifth,
                    shape: BassShape::SoftSquare { drive: 2.8 },
                    decay: 3.0,
                    level: 0.42,
                    level_intense: 0.60,
                },
                1.0,
                0.0,
            ),
            arp: Some(Part::new(
                ArpParams {
                    base_midi: 72,
                    tones: vec![0, 3, 7, 10],
                    octave_bounce: 12,
                    window: 0.08,
                    decay: 55.0,
                    harmonic: 0.12,
                    level: 0.14,
                    level_intense: 0.24,
                },
                0.45,
                0.02,
            )),
            pad: None,
            pluck: None,
            lead: Some(Part::new(
                LeadParams {
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
                },
                0.25,
                0.02,
            )),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the engine would otherwise have to clamp silently
    pub fn validate(&self) -> Result<()> {
        if !self.clock.bpm.is_finite() || self.clock.bpm <= 0.0 {
            return Err(AudioError::invalid(
                "clock.bpm",
                format!("must be positive, got {}", self.clock.bpm),
            ));
        }
        if self.progression.is_empty() {
            return Err(AudioError::invalid("progression", "must not be empty"));
        }
        if self.sample_rate == 0 {
            return Err(AudioError::invalid("sample_rate", "must be non-zero"));
        }
        if let BassLine::Steps { notes, .. } = &self.bass.voice.line
            && notes.is_empty()
        {
            return Err(AudioError::invalid("bass.voice.line.notes", "must not be empty"));
        }
        if let Some(arp) = &self.arp
            && arp.voice.tones.is_empty()
        {
            return Err(AudioError::invalid("arp.voice.tones", "must not be empty"));
        }
        if let Some(pluck) = &self.pluck
            && pluck.voice.scale.is_empty()
        {
            return Err(AudioError::invalid("pluck.voice.scale", "must not be empty"));
        }
        if let Some(lead) = &self.lead
            && lead.voice.scale.is_empty()
        {
            return Err(AudioError::invalid("lead.voice.scale", "must not be empty"));
        }
        Ok(())
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self::menu()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// One continuously generated music track.
///
/// Created stopped; `start` begins emission. A stopped track fills with
/// silence and its cursor does not move.
#[derive(Debug, Clone)]
pub struct Track {
    config: TrackConfig,
    state: PlayState,
    /// Frames emitted since the last restart
    frames: u64,
    intensity: f64,
    noise: Noise,
    bass: BassVoice,
    arp: Option<ArpVoice>,
    pad: Option<PadVoice>,
    pluck: Option<PluckVoice>,
    lead: Option<LeadVoice>,
}

impl Track {
    pub fn new(config: TrackConfig) -> Self {
        if config.sample_rate == 0 {
            log::warn!("Track '{}' has sample rate 0, using 1 Hz", config.name);
        }
        Self {
            state: PlayState::Stopped,
            frames: 0,
            intensity: clamp_intensity(config.intensity),
            noise: Noise::new(config.seed),
            bass: BassVoice::new(config.bass.voice.clone()),
            arp: config.arp.as_ref().map(|p| ArpVoice::new(p.voice.clone())),
            pad: config.pad.as_ref().map(|p| PadVoice::new(p.voice.clone())),
            pluck: config.pluck.as_ref().map(|p| PluckVoice::new(p.voice.clone())),
            lead: config.lead.as_ref().map(|p| LeadVoice::new(p.voice.clone())),
            config,
        }
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.max(1)
    }

    pub fn start(&mut self) {
        if self.state != PlayState::Playing {
            log::info!("Track '{}' started", self.config.name);
            self.state = PlayState::Playing;
        }
    }

    pub fn stop(&mut self) {
        if self.state != PlayState::Stopped {
            log::info!("Track '{}' stopped", self.config.name);
            self.state = PlayState::Stopped;
        }
    }

    /// Rewind to the first frame and start playing.
    ///
    /// Resets the cursor, noise seed, phases and filters; intensity is kept.
    pub fn restart(&mut self) {
        self.frames = 0;
        self.noise.reset();
        self.bass.reset();
        self.arp.iter_mut().for_each(ArpVoice::reset);
        self.pad.iter_mut().for_each(PadVoice::reset);
        self.pluck.iter_mut().for_each(PluckVoice::reset);
        self.lead.iter_mut().for_each(LeadVoice::reset);
        self.state = PlayState::Playing;
        log::info!("Track '{}' restarted", self.config.name);
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Set intensity, clamped to [0, 1]; non-finite input becomes 0
    pub fn set_intensity(&mut self, value: f32) {
        let v = value as f64;
        let clamped = clamp_intensity(v);
        if clamped != v {
            log::warn!("Intensity {value} out of range, clamped to {clamped}");
        }
        self.intensity = clamped;
    }

    pub fn intensity(&self) -> f32 {
        self.intensity as f32
    }

    /// Seconds of audio emitted since the last restart
    pub fn elapsed_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate() as f64
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }

    /// Fill `out` with the next frames. Does not allocate.
    pub fn fill(&mut self, out: &mut [Frame]) {
        if !self.is_playing() {
            out.fill(Frame::SILENT);
            return;
        }
        for frame in out.iter_mut() {
            *frame = self.next_frame();
        }
    }

    pub fn request_frames(&mut self, n: usize) -> Vec<Frame> {
        let mut out = vec![Frame::SILENT; n];
        self.fill(&mut out);
        out
    }

    fn next_frame(&mut self) -> Frame {
        let sr = self.sample_rate() as f64;
        let t = self.frames as f64 / sr;
        let cfg = &self.config;
        let pos = cfg.clock.position(t);
        let chord = cfg.progression.chord(pos.bar);
        let intensity = self.intensity;
        let drums = &cfg.drums;

        let kick = if drums.kick_pattern.fires(pos.beat, intensity) {
            drums.kick.sample(pos.t_in_beat)
        } else {
            0.0
        };
        let snare = if drums.snare_beats.contains(&pos.beat) {
            drums.snare.sample(pos.t_in_beat, &mut self.noise)
        } else {
            0.0
        };
        let hat = drums
            .hat
            .sample(pos.t_in_eighth, pos.eighth, intensity, &mut self.noise);
        let open_hat = drums.open_hat.as_ref().map_or(0.0, |h| {
            h.sample(pos.eighth, pos.t_in_eighth, intensity, &mut self.noise)
        });
        let perc = drums.perc.as_ref().map_or(0.0, |h| {
            h.sample(pos.sixteenth, pos.t_in_sixteenth, intensity, &mut self.noise)
        });

        let duck = duck(kick, cfg.sidechain.amount, cfg.sidechain.floor);
        let mut music = 0.0;
        let mut side = 0.0;
        let mut send = |sample: f64, route: &Route| {
            let ducked = sample * duck_partial(duck, route.duck);
            music += ducked;
            side += ducked * route.width;
        };

        send(
            self.bass.sample(&pos, chord, intensity, sr),
            &cfg.bass.route,
        );
        if let (Some(voice), Some(part)) = (self.arp.as_mut(), cfg.arp.as_ref()) {
            send(voice.sample(&pos, chord, intensity, sr), &part.route);
        }
        if let (Some(voice), Some(part)) = (self.pad.as_mut(), cfg.pad.as_ref()) {
            send(voice.sample(&pos, chord, t, sr), &part.route);
        }
        if let (Some(voice), Some(part)) = (self.pluck.as_mut(), cfg.pluck.as_ref()) {
            send(voice.sample(&pos, chord, sr), &part.route);
        }
        if let (Some(voice), Some(part)) = (self.lead.as_mut(), cfg.lead.as_ref()) {
            send(voice.sample(&pos, chord, intensity, sr), &part.route);
        }

        let bed = self.noise.sample() * cfg.noise_floor;
        let mono = (kick + snare + hat + open_hat + perc + music + bed) * cfg.master_gain;

        self.frames += 1;
        Frame::from_mid_side(mono, side, cfg.drive)
    }
}

fn clamp_intensity(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples_for;
    use proptest::prelude::*;

    fn playing(config: TrackConfig) -> Track {
        let mut track = Track::new(config);
        track.start();
        track
    }

    #[test]
    fn test_presets_validate() {
        assert!(TrackConfig::menu().validate().is_ok());
        assert!(TrackConfig::gameplay().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut config = TrackConfig::gameplay();
        config.clock.bpm = 0.0;
        assert!(config.validate().is_err());

        let mut config = TrackConfig::menu();
        config.progression = Progression::new(Vec::new());
        assert!(config.validate().is_err());

        let mut config = TrackConfig::menu();
        config.sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = TrackConfig::menu();
        let json = config.to_json().unwrap();
        assert_eq!(TrackConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_intensity_clamped() {
        let mut track = Track::new(TrackConfig::gameplay());
        track.set_intensity(1.5);
        assert_eq!(track.intensity(), 1.0);
        track.set_intensity(-0.2);
        assert_eq!(track.intensity(), 0.0);
        track.set_intensity(f32::NAN);
        assert_eq!(track.intensity(), 0.0);
        track.set_intensity(0.4);
        assert_eq!(track.intensity(), 0.4);
    }

    #[test]
    fn test_stopped_track_is_silent_and_frozen() {
        let mut track = Track::new(TrackConfig::menu());
        let out = track.request_frames(512);
        assert!(out.iter().all(|f| *f == Frame::SILENT));
        assert_eq!(track.elapsed_time(), 0.0);
    }

    #[test]
    fn test_zero_frames_requested() {
        let mut track = playing(TrackConfig::gameplay());
        assert!(track.request_frames(0).is_empty());
        assert_eq!(track.frames_emitted(), 0);
    }

    #[test]
    fn test_elapsed_time_counts_frames() {
        let mut track = playing(TrackConfig::gameplay());
        track.request_frames(22_050);
        assert!((track.elapsed_time() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_track_produces_sound() {
        let mut track = playing(TrackConfig::gameplay());
        let out = track.request_frames(4_410);
        assert!(out.iter().any(|f| f.left.abs() > 0.01));
    }

    #[test]
    fn test_restart_matches_fresh_track() {
        let mut reused = playing(TrackConfig::gameplay());
        reused.set_intensity(0.8);
        reused.request_frames(10_000);
        reused.restart();
        let replay = reused.request_frames(8_192);

        let mut fresh = playing(TrackConfig::gameplay());
        fresh.set_intensity(0.8);
        let first = fresh.request_frames(8_192);

        assert_eq!(replay, first);
    }

    #[test]
    fn test_fill_matches_request_frames() {
        let mut a = playing(TrackConfig::menu());
        let mut b = playing(TrackConfig::menu());
        let mut buf = vec![Frame::SILENT; 1_000];
        a.fill(&mut buf[..400]);
        a.fill(&mut buf[400..]);
        assert_eq!(buf, b.request_frames(1_000));
    }

    fn kick_only() -> TrackConfig {
        let mut config = TrackConfig::gameplay();
        config.clock = Clock::new(120.0);
        config.noise_floor = 0.0;
        config.drums.snare.level = 0.0;
        config.drums.hat.on_level = 0.0;
        config.drums.hat.off_level = 0.0;
        config.drums.open_hat = None;
        config.drums.perc = None;
        config.bass.voice.level = 0.0;
        config.bass.voice.level_intense = 0.0;
        config.arp = None;
        config.pad = None;
        config.pluck = None;
        config.lead = None;
        config
    }

    #[test]
    fn test_kick_triggers_on_beats_zero_and_two() {
        let mut track = playing(kick_only());
        let window = samples_for(track.config().drums.kick.duration, 44_100);
        let out = track.request_frames(44_100 + window + 100);

        // Each hit starts at zero phase, so it is audible from the next frame
        for onset in [0, 44_100] {
            assert!(out[onset].peak() < 1e-9);
            assert!(out[onset + 1].peak() > 0.0, "no kick at {onset}");
            assert!(out[onset + window - 2].peak() > 0.0);
            assert_eq!(out[onset + window + 1], Frame::SILENT);
        }
        // Beat 1 only fires at high intensity
        assert!(out[window + 1..44_100].iter().all(|f| f.peak() == 0.0));
    }

    #[test]
    fn test_menu_loop_repeats() {
        let mut track = playing(TrackConfig::menu());
        let loop_len = track.config().clock.loop_len().unwrap();
        let loop_frames = (loop_len * 44_100.0).round() as usize;
        track.request_frames(loop_frames);
        let pos = track.config().clock.position(track.elapsed_time());
        assert_eq!(pos.bar, 0);
    }

    #[test]
    fn test_sample_rate_zero_floors() {
        let mut config = TrackConfig::menu();
        config.sample_rate = 0;
        let mut track = Track::new(config);
        track.start();
        assert_eq!(track.sample_rate(), 1);
        assert_eq!(track.request_frames(3).len(), 3);
    }

    #[test]
    fn test_gameplay_layers_follow_intensity() {
        let mut calm = playing(TrackConfig::gameplay());
        let mut intense = playing(TrackConfig::gameplay());
        intense.set_intensity(1.0);
        let a = calm.request_frames(44_100);
        let b = intense.request_frames(44_100);
        assert_ne!(a, b);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_output_bounded(intensity in 0.0f32..=1.0, skip in 0usize..20_000) {
            let mut track = playing(TrackConfig::gameplay());
            track.set_intensity(intensity);
            track.request_frames(skip);
            for frame in track.request_frames(2_048) {
                prop_assert!(frame.left.abs() <= 1.0 && frame.right.abs() <= 1.0);
            }
        }

        #[test]
        fn prop_set_intensity_in_range(value in proptest::num::f32::ANY) {
            let mut track = Track::new(TrackConfig::gameplay());
            track.set_intensity(value);
            prop_assert!((0.0..=1.0).contains(&track.intensity()));
        }
    }
}
