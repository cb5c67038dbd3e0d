//! Session state and core simulation types
//!
//! Everything a run mutates lives in `GameState`; there are no globals, so
//! independent sessions can coexist in one process.

use std::rc::Rc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::catalog::{CategoryFilter, CategoryPool};
use super::challenge::ChallengeMode;
use super::cheats::{Cheat, CheatState};
use super::combo::{ComboTracker, InteractionMode};
use super::difficulty;
use super::scoring::{NoModifiers, ScoreBook, ScoreModifiers};
use crate::consts::*;

/// Session clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Clock and spawner running
    Running,
    /// Disguise overlay shown; everything frozen
    Suspended,
    /// Run ended (terminal)
    Over,
}

/// A falling snippet
#[derive(Debug, Clone, PartialEq)]
pub struct FallingEntity {
    pub id: u32,
    pub category: String,
    pub text: String,
    pub score_value: f64,
    /// Pixels per nominal frame, fixed at spawn
    pub speed: f32,
    /// `x` = left edge, `y` = vertical position (starts at viewport height, decreases)
    pub pos: Vec2,
    /// Pointer hovering: frozen in place
    pub paused: bool,
}

/// How the player resolved an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Clicked
    PointerHit,
    /// Typed prefix match
    KeyboardHit,
}

/// Why points were credited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    Hit,
    /// Cheat or collaborator injection
    Bonus,
}

/// End-of-run report
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub final_score: f64,
    pub missed_count: u32,
    pub elapsed_seconds: u32,
    pub level: u32,
    pub mode: ChallengeMode,
    pub ranked: bool,
    pub max_combo: u32,
}

/// Events emitted by the simulation for the presentation layer and collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Spawned {
        id: u32,
        category: String,
        text: String,
    },
    /// Entity resolved by the player
    Hit {
        id: u32,
        resolution: Resolution,
        amount: f64,
        combo: u32,
        pos: Vec2,
    },
    Missed {
        id: u32,
        missed_count: u32,
    },
    ScoreChanged {
        source: ScoreSource,
        amount: f64,
        total: f64,
        pos: Option<Vec2>,
    },
    NewRecord {
        score: f64,
    },
    /// Streak reached the display threshold or grew past it
    ComboChanged {
        count: u32,
    },
    ComboMilestone {
        count: u32,
    },
    ComboEnded {
        count: u32,
    },
    /// Pointer started hovering an entity
    Hovered {
        id: u32,
    },
    /// One key press outside the typing box
    KeyPressed {
        at_ms: u64,
    },
    /// Disguise overlay toggled
    SuspendToggled {
        suspended: bool,
        at_ms: u64,
    },
    InteractionModeChanged {
        mode: InteractionMode,
    },
    CheatActivated {
        cheat: Cheat,
    },
    CheatExpired {
        cheat: Cheat,
    },
    SecondElapsed {
        seconds: u32,
        stability: f64,
    },
    LevelUp {
        level: u32,
    },
    LowStability {
        stability: f64,
    },
    NearFail {
        missed_count: u32,
        max_misses: u32,
    },
    /// Time to persist a progress snapshot
    Checkpoint,
    /// Fired exactly once per run
    GameOver(SessionSummary),
}

/// Per-run configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub seed: u64,
    pub viewport: Vec2,
    pub mode: ChallengeMode,
    pub interaction: InteractionMode,
    /// Practice filter; `None` when not practising
    pub practice: Option<Rc<dyn CategoryFilter>>,
    /// Practice language label kept for progress snapshots
    pub practice_language: Option<String>,
    pub custom_snippets: Vec<String>,
    pub modifiers: Rc<dyn ScoreModifiers>,
    /// Highest score seen so far in this process
    pub best_score: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            viewport: Vec2::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            mode: ChallengeMode::Normal,
            interaction: InteractionMode::Pointer,
            practice: None,
            practice_language: None,
            custom_snippets: Vec::new(),
            modifiers: Rc::new(NoModifiers),
            best_score: 0.0,
        }
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub mode: ChallengeMode,
    pub interaction: InteractionMode,
    pub phase: SessionPhase,
    pub viewport: Vec2,
    pub missed_count: u32,
    pub elapsed_seconds: u32,
    pub level: u32,
    /// Global difficulty, recomputed every second
    pub speed_multiplier: f64,
    /// Displayed stability percentage
    pub stability: f64,
    /// Live entities (spawn order)
    pub entities: Vec<FallingEntity>,
    pub(crate) score: ScoreBook,
    pub(crate) combo: ComboTracker,
    pub(crate) cheats: CheatState,
    pub(crate) pool: CategoryPool,
    pub(crate) modifiers: Rc<dyn ScoreModifiers>,
    pub(crate) practice_language: Option<String>,
    /// Session time in ms; does not advance while suspended
    pub(crate) clock_ms: u64,
    pub(crate) clock_frac_ms: f64,
    pub(crate) second_accum_ms: f64,
    pub(crate) spawn_accum_ms: f64,
    next_id: u32,
}

impl GameState {
    pub fn new(config: SessionConfig) -> Self {
        let pool = CategoryPool::build(&config.custom_snippets, config.practice.as_deref());
        log::info!(
            "Session start: mode={} interaction={} categories={}",
            config.mode.as_str(),
            config.interaction.as_str(),
            pool.categories().len()
        );

        Self {
            seed: config.seed,
            rng: Pcg32::seed_from_u64(config.seed),
            mode: config.mode,
            interaction: config.interaction,
            phase: SessionPhase::Running,
            viewport: config.viewport,
            missed_count: 0,
            elapsed_seconds: 0,
            level: 1,
            speed_multiplier: 1.0,
            stability: 100.0,
            entities: Vec::new(),
            score: ScoreBook::new(config.best_score),
            combo: ComboTracker::new(config.interaction),
            cheats: CheatState::default(),
            pool,
            modifiers: config.modifiers,
            practice_language: config.practice_language,
            clock_ms: 0,
            clock_frac_ms: 0.0,
            second_accum_ms: 0.0,
            spawn_accum_ms: 0.0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn score(&self) -> f64 {
        self.score.score()
    }

    /// Highest score seen in this process, including the current run
    pub fn best_score(&self) -> f64 {
        self.score.best()
    }

    pub fn combo_count(&self) -> u32 {
        self.combo.count()
    }

    pub fn max_combo(&self) -> u32 {
        self.combo.peak()
    }

    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::Over
    }

    pub fn is_suspended(&self) -> bool {
        self.phase == SessionPhase::Suspended
    }

    pub fn is_practice(&self) -> bool {
        self.practice_language.is_some()
    }

    pub fn practice_language(&self) -> Option<&str> {
        self.practice_language.as_deref()
    }

    pub fn wall_cheat_active(&self) -> bool {
        self.cheats.wall_active()
    }

    pub fn pool(&self) -> &CategoryPool {
        &self.pool
    }

    /// Session time in ms
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Miss ceiling of the current level
    pub fn max_misses(&self) -> u32 {
        difficulty::max_misses(self.level)
    }

    /// Current spawn interval in ms
    pub fn spawn_interval_ms(&self) -> f64 {
        BASE_SPAWN_INTERVAL_MS / self.speed_multiplier / self.mode.spawn_divisor()
    }

    pub fn entity(&self, id: u32) -> Option<&FallingEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Summary of the run as it stands
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            final_score: self.score(),
            missed_count: self.missed_count,
            elapsed_seconds: self.elapsed_seconds,
            level: self.level,
            mode: self.mode,
            ranked: self.mode.is_ranked(),
            max_combo: self.combo.peak(),
        }
    }
}
