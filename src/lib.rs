//! sysdiag - falling code-snippet arcade game behind a "system diagnostic" front
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawner, fall physics, scoring, session clock)
//! - `persistence`: Encrypted single-record files with integrity verification
//! - `highscores`: Top-10 leaderboard
//! - `achievements`: Persisted achievement record and stats tracking
//! - `audio`: Sound cue mapping (best-effort)
//! - `hooks`: Event fan-out to collaborators

pub mod achievements;
pub mod audio;
pub mod error;
pub mod highscores;
pub mod hooks;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod snippets;

pub use error::{ExportError, SnippetError, StoreError};
pub use highscores::{Leaderboard, LeaderboardEntry};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Nominal animation frame (60 Hz); entity speeds are expressed per frame
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Session clock granularity
    pub const SECOND_MS: f64 = 1000.0;
    /// Longest step a single tick simulates; hosts catch up over several ticks
    pub const MAX_STEP_MS: f64 = 1000.0;

    /// Spawn interval at difficulty 1.0
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 700.0;
    /// Upper bound on entities spawned by one step
    pub const MAX_SPAWNS_PER_STEP: u32 = 32;

    /// Entities whose vertical position drops below this are missed
    pub const MISS_THRESHOLD: f32 = 40.0;
    /// Horizontal room kept free on the right edge when spawning
    pub const SPAWN_MARGIN_X: f32 = 200.0;
    /// Viewport used when the host does not provide one
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 800.0;

    /// Random component of an entity's base speed: 1.0 + [0, 1.5)
    pub const BASE_SPEED_MIN: f32 = 1.0;
    pub const BASE_SPEED_SPREAD: f32 = 1.5;

    /// Typed input must be at least this long to resolve an entity
    pub const MIN_MATCH_LEN: usize = 6;

    /// Combo timeouts per interaction mode
    pub const POINTER_COMBO_TIMEOUT_MS: u64 = 2000;
    pub const KEYBOARD_COMBO_TIMEOUT_MS: u64 = 3000;
    /// Streaks shorter than this are not displayed (start or end)
    pub const COMBO_DISPLAY_THRESHOLD: u32 = 3;
    /// Streak lengths that trigger the milestone cue
    pub const COMBO_MILESTONES: [u32; 3] = [20, 50, 100];

    /// Window for the hit-rate based score multiplier
    pub const HIT_RATE_WINDOW_MS: u64 = 1000;

    /// Progress checkpoint cadence (running seconds)
    pub const CHECKPOINT_INTERVAL_SECS: u32 = 30;
}

/// Round to one decimal place, the precision scores are kept at
#[inline]
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
