//! Mid-run progress snapshot
//!
//! Written on every checkpoint event, discarded at game over, offered for
//! restore on the next launch unless it is stale.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::store::SecureStore;
use crate::sim::combo::InteractionMode;
use crate::sim::difficulty;
use crate::sim::state::GameState;

pub const SNAPSHOT_VERSION: &str = "1.0";
/// Snapshots older than this are deleted on load
pub const SNAPSHOT_MAX_AGE_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub score: f64,
    pub missed_count: u32,
    pub seconds: u32,
    pub interaction_mode: InteractionMode,
    pub is_practice_mode: bool,
    pub practice_language: Option<String>,
    pub combo_count: u32,
    /// Unix millis at capture
    pub timestamp: i64,
    pub version: String,
}

impl ProgressSnapshot {
    pub fn capture(state: &GameState, now_ms: i64) -> Self {
        Self {
            score: state.score(),
            missed_count: state.missed_count,
            seconds: state.elapsed_seconds,
            interaction_mode: state.interaction,
            is_practice_mode: state.is_practice(),
            practice_language: state.practice_language().map(str::to_string),
            combo_count: state.combo_count(),
            timestamp: now_ms,
            version: SNAPSHOT_VERSION.to_string(),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) > SNAPSHOT_MAX_AGE_MS
    }

    /// Resume a fresh session from this snapshot.
    ///
    /// Level, difficulty and stability are re-derived from the restored
    /// seconds and misses. The combo streak is not carried over.
    pub fn apply_to(&self, state: &mut GameState) {
        state.score.restore(self.score);
        state.missed_count = self.missed_count;
        state.elapsed_seconds = self.seconds;
        state.interaction = self.interaction_mode;
        state.combo.set_mode(self.interaction_mode);

        state.level = difficulty::level(self.seconds);
        state.speed_multiplier = difficulty::speed_multiplier(self.seconds);
        state.stability = difficulty::stability(self.missed_count, state.level);
        log::info!(
            "Restored progress: score={:.1} missed={} seconds={}",
            self.score,
            self.missed_count,
            self.seconds
        );
    }
}

/// Secure store for the progress snapshot
#[derive(Debug, Clone)]
pub struct ProgressStore {
    store: SecureStore,
}

impl ProgressStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: SecureStore::new(path),
        }
    }

    pub fn with_store(store: SecureStore) -> Self {
        Self { store }
    }

    pub fn save(&self, snapshot: &ProgressSnapshot) -> bool {
        self.store.save_or_log(snapshot)
    }

    /// Valid snapshot, if any. Expired snapshots are deleted.
    pub fn load(&self, now_ms: i64) -> Option<ProgressSnapshot> {
        let snapshot: ProgressSnapshot = match self.store.try_load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return None,
            Err(error) => {
                log::warn!("Ignoring saved progress: {error}");
                return None;
            }
        };

        if snapshot.version != SNAPSHOT_VERSION {
            log::warn!("Incompatible progress version {}", snapshot.version);
            return None;
        }
        if snapshot.is_expired(now_ms) {
            log::info!("Saved progress expired");
            self.discard();
            return None;
        }
        Some(snapshot)
    }

    pub fn exists(&self) -> bool {
        self.store.exists()
    }

    /// Remove the snapshot (game over or expiry)
    pub fn discard(&self) {
        if let Err(error) = self.store.delete() {
            log::warn!("Failed to delete saved progress: {error}");
        }
    }

    /// Handle a checkpoint or game-over event for `state`
    pub fn on_event(&self, event: &crate::sim::GameEvent, state: &GameState, now_ms: i64) {
        use crate::sim::GameEvent;
        match event {
            GameEvent::Checkpoint => {
                self.save(&ProgressSnapshot::capture(state, now_ms));
            }
            GameEvent::GameOver(_) => self.discard(),
            _ => {}
        }
    }
}
