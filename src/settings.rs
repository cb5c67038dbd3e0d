//! Player settings and preferences
//!
//! Persisted as plain JSON next to the encrypted records.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::challenge::{ChallengeMode, ZEN_SPEED_DEFAULT};
use crate::sim::combo::InteractionMode;

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,

    // === Gameplay ===
    pub challenge_mode: ChallengeMode,
    /// Speed used when Zen is selected (1.0 - 5.0)
    pub zen_speed: f64,
    pub interaction_mode: InteractionMode,
    /// Practice language; `None` when practice is off
    pub practice_language: Option<String>,

    // === Leaderboard ===
    /// Blank submits as "Guest"
    pub player_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            master_volume: 0.8,
            challenge_mode: ChallengeMode::Normal,
            zen_speed: ZEN_SPEED_DEFAULT,
            interaction_mode: InteractionMode::Pointer,
            practice_language: None,
            player_name: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, defaults on any failure
    pub fn load(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<Settings>(&bytes) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings.sanitized()
                }
                Err(error) => {
                    log::warn!("Ignoring malformed settings: {error}");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        fs::write(path, data)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Clamp values a hand-edited file may have pushed out of range
    pub fn sanitized(mut self) -> Self {
        self.master_volume = if self.master_volume.is_finite() {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            0.8
        };
        self.zen_speed = match ChallengeMode::zen(self.zen_speed) {
            ChallengeMode::Zen { speed } => speed,
            _ => ZEN_SPEED_DEFAULT,
        };
        if let ChallengeMode::Zen { speed } = self.challenge_mode {
            self.challenge_mode = ChallengeMode::zen(speed);
        }
        self
    }

    /// Challenge mode for the next run; Zen picks up `zen_speed`
    pub fn session_mode(&self) -> ChallengeMode {
        match self.challenge_mode {
            ChallengeMode::Zen { .. } => ChallengeMode::zen(self.zen_speed),
            mode => mode,
        }
    }

    /// Practice language if set and not blank
    pub fn practice(&self) -> Option<&str> {
        self.practice_language.as_deref().filter(|l| !l.trim().is_empty())
    }
}
