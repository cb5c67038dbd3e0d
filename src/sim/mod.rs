//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No I/O; persistence and sound consume the emitted events

pub mod catalog;
pub mod challenge;
pub mod cheats;
pub mod combo;
pub mod difficulty;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod typing;

pub use catalog::{Category, CategoryFilter, CategoryPool, PracticeFilter, builtin_categories};
pub use challenge::ChallengeMode;
pub use cheats::Cheat;
pub use combo::{ComboTracker, InteractionMode};
pub use scoring::{ItemEffects, NoModifiers, ScoreModifiers};
pub use state::{
    FallingEntity, GameEvent, GameState, Resolution, ScoreSource, SessionConfig, SessionPhase,
    SessionSummary,
};
pub use tick::{Click, TickInput, tick};
pub use typing::{highlight_matches, unique_prefix_match};
