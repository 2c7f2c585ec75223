//! Player audio preferences
//!
//! Stored as JSON next to the game's other settings. A missing or corrupt
//! file falls back to defaults rather than failing startup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Audio settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Silence everything without losing the volume levels
    pub muted: bool,
    /// Menu/gameplay crossfade time in seconds
    pub crossfade_seconds: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            music_volume: 0.7,
            sfx_volume: 1.0,
            muted: false,
            crossfade_seconds: 0.9,
        }
    }
}

impl AudioSettings {
    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = clamp_volume(vol);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = clamp_volume(vol);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = clamp_volume(vol);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Effective master gain (0 while muted)
    pub fn effective_master(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Effective music gain (respects mute and master)
    pub fn effective_music(&self) -> f32 {
        self.effective_master() * self.music_volume
    }

    /// Effective SFX gain (respects mute and master)
    pub fn effective_sfx(&self) -> f32 {
        self.effective_master() * self.sfx_volume
    }

    /// Crossfade time, never negative
    pub fn crossfade(&self) -> f32 {
        if self.crossfade_seconds.is_finite() {
            self.crossfade_seconds.max(0.0)
        } else {
            0.0
        }
    }

    /// Bring hand-edited values back into range
    pub fn sanitized(mut self) -> Self {
        self.master_volume = clamp_volume(self.master_volume);
        self.music_volume = clamp_volume(self.music_volume);
        self.sfx_volume = clamp_volume(self.sfx_volume);
        self.crossfade_seconds = self.crossfade();
        self
    }

    /// Load settings from `path`, using defaults when it is missing or unreadable
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded audio settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default audio settings ({}): {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load settings from `path`, reporting why it failed
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        Ok(settings.sanitized())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Audio settings saved to {}", path.display());
        Ok(())
    }
}

fn clamp_volume(vol: f32) -> f32 {
    if vol.is_finite() { vol.clamp(0.0, 1.0) } else { 0.0 }
}
