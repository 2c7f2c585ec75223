//! Menu/gameplay music switching
//!
//! `MusicDirector` owns both music tracks and the effect player and mixes
//! them into one stream. Scene changes crossfade the tracks in decibels with
//! a sine in-out curve.

use std::f32::consts::PI;

use crate::consts::{MUSIC_DB, SILENT_DB};
use crate::settings::AudioSettings;
use crate::synth::{Frame, OneShot, SfxConfig, SfxPlayer, Track, TrackConfig};
use crate::{db_to_gain, gap_samples};

/// Frames mixed per inner block; sizes the stack scratch buffers
const BLOCK: usize = 256;

/// Which music the player should be hearing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    Menu,
    Gameplay,
}

/// Sine in-out easing on [0, 1]
#[inline]
pub fn sine_in_out(p: f32) -> f32 {
    0.5 - 0.5 * (PI * p.clamp(0.0, 1.0)).cos()
}

/// Simultaneous level ramps for both tracks
#[derive(Debug, Clone, Copy, PartialEq)]
struct Crossfade {
    menu: (f32, f32),
    gameplay: (f32, f32),
    frame: usize,
    frames: usize,
    /// Stop the gameplay track once the ramp ends
    stop_gameplay: bool,
}

impl Crossfade {
    fn levels(&self) -> (f32, f32) {
        let p = sine_in_out(self.frame as f32 / self.frames.max(1) as f32);
        (
            self.menu.0 + (self.menu.1 - self.menu.0) * p,
            self.gameplay.0 + (self.gameplay.1 - self.gameplay.0) * p,
        )
    }

    fn is_done(&self) -> bool {
        self.frame >= self.frames
    }
}

/// Owns the menu track, gameplay track and effect player
#[derive(Debug, Clone)]
pub struct MusicDirector {
    menu: Track,
    gameplay: Track,
    sfx: SfxPlayer,
    settings: AudioSettings,
    scene: Scene,
    /// Current track levels in dB
    menu_db: f32,
    gameplay_db: f32,
    fade: Option<Crossfade>,
}

impl MusicDirector {
    /// Director with the shipped track and effect presets
    pub fn new(settings: AudioSettings) -> Self {
        Self::with_configs(
            TrackConfig::menu(),
            TrackConfig::gameplay(),
            SfxConfig::default(),
            settings,
        )
    }

    pub fn with_configs(
        menu: TrackConfig,
        gameplay: TrackConfig,
        sfx: SfxConfig,
        settings: AudioSettings,
    ) -> Self {
        if menu.sample_rate != gameplay.sample_rate {
            log::warn!(
                "Menu and gameplay sample rates differ ({} vs {})",
                menu.sample_rate,
                gameplay.sample_rate
            );
        }
        let sample_rate = menu.sample_rate;
        Self {
            menu: Track::new(menu),
            gameplay: Track::new(gameplay),
            sfx: SfxPlayer::new(sfx, sample_rate),
            settings: settings.sanitized(),
            scene: Scene::Menu,
            menu_db: MUSIC_DB,
            gameplay_db: SILENT_DB,
            fade: None,
        }
    }

    /// Begin menu playback
    pub fn start(&mut self) {
        self.menu.start();
    }

    /// Fade from the menu loop into a freshly restarted gameplay track
    pub fn enter_gameplay(&mut self) {
        self.gameplay.restart();
        self.gameplay_db = SILENT_DB;
        self.menu.start();
        self.sfx.trigger(OneShot::Click);
        self.begin_crossfade(Scene::Gameplay, (SILENT_DB, MUSIC_DB), false);
    }

    /// Fade back to the menu loop; gameplay stops once it is inaudible
    pub fn return_to_menu(&mut self) {
        self.menu.start();
        self.begin_crossfade(Scene::Menu, (MUSIC_DB, SILENT_DB), true);
    }

    /// Game over sting plus the fade back to the menu
    pub fn game_over(&mut self) {
        self.sfx.trigger(OneShot::GameOver);
        self.return_to_menu();
    }

    fn begin_crossfade(&mut self, scene: Scene, targets: (f32, f32), stop_gameplay: bool) {
        let seconds = self.settings.crossfade();
        let frames = gap_samples(seconds as f64, self.sfx.sample_rate());
        let (menu_to, gameplay_to) = targets;
        log::info!("Crossfading to {scene:?} over {seconds:.2}s");

        // Starts from wherever a running fade left the levels
        let fade = Crossfade {
            menu: (self.menu_db, menu_to),
            gameplay: (self.gameplay_db, gameplay_to),
            frame: 0,
            frames,
            stop_gameplay,
        };
        self.scene = scene;
        self.fade = Some(fade);
        if fade.is_done() {
            self.finish_fade(fade);
        }
    }

    fn finish_fade(&mut self, fade: Crossfade) {
        self.menu_db = fade.menu.1;
        self.gameplay_db = fade.gameplay.1;
        self.fade = None;
        if fade.stop_gameplay {
            self.gameplay.stop();
        }
    }

    /// Advance the running crossfade by one frame
    fn step_fade(&mut self) {
        let Some(mut fade) = self.fade else {
            return;
        };
        fade.frame += 1;
        if fade.is_done() {
            self.finish_fade(fade);
        } else {
            (self.menu_db, self.gameplay_db) = fade.levels();
            self.fade = Some(fade);
        }
    }

    pub fn set_intensity(&mut self, value: f32) {
        self.gameplay.set_intensity(value);
    }

    pub fn trigger(&mut self, kind: OneShot) {
        self.sfx.trigger(kind);
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Current (menu, gameplay) levels in dB
    pub fn levels_db(&self) -> (f32, f32) {
        (self.menu_db, self.gameplay_db)
    }

    pub fn menu(&self) -> &Track {
        &self.menu
    }

    pub fn gameplay(&self) -> &Track {
        &self.gameplay
    }

    pub fn sfx(&self) -> &SfxPlayer {
        &self.sfx
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: AudioSettings) {
        self.settings = settings.sanitized();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.settings.set_muted(muted);
    }

    /// Mix the next frames of both tracks and the effects into `out`.
    /// Does not allocate.
    pub fn fill(&mut self, out: &mut [Frame]) {
        let mut menu = [Frame::SILENT; BLOCK];
        let mut gameplay = [Frame::SILENT; BLOCK];
        let mut sfx = [Frame::SILENT; BLOCK];

        for chunk in out.chunks_mut(BLOCK) {
            let n = chunk.len();
            self.menu.fill(&mut menu[..n]);
            self.gameplay.fill(&mut gameplay[..n]);
            self.sfx.fill(&mut sfx[..n]);

            let music = self.settings.effective_music();
            let effects = self.settings.effective_sfx();
            for (i, frame) in chunk.iter_mut().enumerate() {
                let menu_gain = db_to_gain(self.menu_db) * music;
                let gameplay_gain = db_to_gain(self.gameplay_db) * music;
                let mixed = menu[i] * menu_gain + gameplay[i] * gameplay_gain + sfx[i] * effects;
                *frame = mixed.clipped(1.0);
                self.step_fade();
            }
        }
    }

    pub fn request_frames(&mut self, n: usize) -> Vec<Frame> {
        let mut out = vec![Frame::SILENT; n];
        self.fill(&mut out);
        out
    }
}

impl Default for MusicDirector {
    fn default() -> Self {
        Self::new(AudioSettings::default())
    }
}
