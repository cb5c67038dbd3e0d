//! Challenge-mode policies
//!
//! Selected once per session; a different mode means a new session.

use serde::{Deserialize, Serialize};

use super::difficulty::max_misses;

/// Run length of a time-attack session
pub const TIME_ATTACK_SECONDS: u32 = 60;
/// Fixed miss budget in survival
pub const SURVIVAL_MISS_LIMIT: u32 = 5;
/// Multiplier applied to spawn rate and fall speed in time attack
pub const TIME_ATTACK_MULTIPLIER: f64 = 2.0;

pub const ZEN_SPEED_MIN: f64 = 1.0;
pub const ZEN_SPEED_MAX: f64 = 5.0;
pub const ZEN_SPEED_DEFAULT: f64 = 1.5;

fn clamp_zen_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        crate::round_tenth(speed.clamp(ZEN_SPEED_MIN, ZEN_SPEED_MAX))
    } else {
        ZEN_SPEED_DEFAULT
    }
}

/// Termination/spawn/speed rules for a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ChallengeMode {
    /// Miss ceiling grows with level
    #[default]
    Normal,
    /// 60 second sprint at double speed
    TimeAttack,
    /// Five misses and out
    Survival,
    /// Untimed, unranked, user-chosen speed
    Zen { speed: f64 },
}

impl ChallengeMode {
    /// Zen mode with the speed clamped to [1.0, 5.0] and rounded to one decimal
    pub fn zen(speed: f64) -> Self {
        ChallengeMode::Zen {
            speed: clamp_zen_speed(speed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeMode::Normal => "Normal",
            ChallengeMode::TimeAttack => "Time Attack",
            ChallengeMode::Survival => "Survival",
            ChallengeMode::Zen { .. } => "Zen",
        }
    }

    /// Parse a mode name; zen takes the given speed
    pub fn from_str(s: &str, zen_speed: f64) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "normal" => Some(ChallengeMode::Normal),
            "timeattack" | "time" => Some(ChallengeMode::TimeAttack),
            "survival" => Some(ChallengeMode::Survival),
            "zen" => Some(ChallengeMode::zen(zen_speed)),
            _ => None,
        }
    }

    /// Divisor applied to the spawn interval
    pub fn spawn_divisor(&self) -> f64 {
        match self {
            ChallengeMode::Normal | ChallengeMode::Survival => 1.0,
            ChallengeMode::TimeAttack => TIME_ATTACK_MULTIPLIER,
            // Literal or deserialized variants skip `zen()`
            ChallengeMode::Zen { speed } => clamp_zen_speed(*speed),
        }
    }

    /// Multiplier applied to every new entity's fall speed
    pub fn fall_multiplier(&self) -> f64 {
        // Same knob as spawning in every mode
        self.spawn_divisor()
    }

    /// Whether the session ends with this state
    pub fn should_end(&self, missed: u32, seconds: u32, level: u32) -> bool {
        match self {
            ChallengeMode::Normal => missed >= max_misses(level),
            ChallengeMode::TimeAttack => seconds >= TIME_ATTACK_SECONDS,
            ChallengeMode::Survival => missed >= SURVIVAL_MISS_LIMIT,
            ChallengeMode::Zen { .. } => false,
        }
    }

    /// Whether a (stopwatch or countdown) timer is shown
    pub fn timer_visible(&self) -> bool {
        !matches!(self, ChallengeMode::Zen { .. })
    }

    /// Ranked runs go through leaderboard submission
    pub fn is_ranked(&self) -> bool {
        !matches!(self, ChallengeMode::Zen { .. })
    }

    /// Countdown for time-limited modes
    pub fn remaining_time(&self, seconds: u32) -> Option<u32> {
        match self {
            ChallengeMode::TimeAttack => Some(TIME_ATTACK_SECONDS.saturating_sub(seconds)),
            _ => None,
        }
    }
}
