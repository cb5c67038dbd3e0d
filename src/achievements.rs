//! Achievement record and stats tracking
//!
//! The catalog of achievements and their unlock rules live outside the
//! core; this module keeps the persisted record and feeds its stats bag
//! from simulation events.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::SecureStore;
use crate::sim::cheats::Cheat;
use crate::sim::state::GameEvent;

/// Key presses counted toward the concurrency peak
const KEY_WINDOW_MS: u64 = 1000;
/// Runs at most this long count as fast completions
pub const FAST_COMPLETION_SECS: u32 = 600;
/// Flawless runs at least this long count as long sessions
pub const LONG_SESSION_SECS: u32 = 60;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementState {
    pub unlocked: bool,
    /// ISO-8601 unlock time
    pub unlocked_at: Option<String>,
    pub progress: f64,
}

/// Counters read by unlock rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AchievementStats {
    pub total_clicks: u64,
    /// Running seconds across all sessions
    pub total_runtime: u64,
    pub max_concurrent_keys: u32,
    pub boss_key_used: bool,
    /// Fastest overlay round trip in ms; `None` until measured
    pub fastest_boss_key_response: Option<u64>,
    pub sessions_completed: u32,
    pub fast_game_completion: bool,
    pub long_session: bool,
    pub coffee_code: bool,
    pub first_data_save: bool,
    pub settings_saved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementRecord {
    pub achievements: BTreeMap<String, AchievementState>,
    pub stats: AchievementStats,
}

impl AchievementRecord {
    /// Add entries for ids not yet present; existing entries are kept as-is
    pub fn register_ids<'a, I: IntoIterator<Item = &'a str>>(&mut self, ids: I) {
        for id in ids {
            self.achievements.entry(id.to_string()).or_default();
        }
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.achievements.get(id).is_some_and(|a| a.unlocked)
    }

    /// Mark a registered achievement unlocked. False if unknown or already unlocked.
    pub fn unlock(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        let Some(state) = self.achievements.get_mut(id) else {
            return false;
        };
        if state.unlocked {
            return false;
        }
        state.unlocked = true;
        state.unlocked_at = Some(at.to_rfc3339_opts(SecondsFormat::Millis, true));
        state.progress = 100.0;
        log::info!("Achievement unlocked: {id}");
        true
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.values().filter(|a| a.unlocked).count()
    }
}

/// Fire-and-forget receiver of simulation events
pub trait AchievementHook {
    /// `wall_ms` is real time, which keeps running while the session is suspended
    fn notify(&mut self, event: &GameEvent, wall_ms: u64);
}

/// Updates an [`AchievementRecord`]'s stats from events
#[derive(Debug, Clone, Default)]
pub struct StatsTracker {
    record: AchievementRecord,
    key_presses: VecDeque<u64>,
    suspended_at: Option<u64>,
    dirty: bool,
}

impl StatsTracker {
    pub fn new(record: AchievementRecord) -> Self {
        Self {
            record,
            ..Default::default()
        }
    }

    pub fn record(&self) -> &AchievementRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut AchievementRecord {
        self.dirty = true;
        &mut self.record
    }

    pub fn stats(&self) -> &AchievementStats {
        &self.record.stats
    }

    /// Changed since the last [`StatsTracker::take_dirty`]
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// First leaderboard submission. Returns true the first time.
    pub fn mark_first_save(&mut self) -> bool {
        let first = !self.record.stats.first_data_save;
        self.record.stats.first_data_save = true;
        self.dirty |= first;
        first
    }

    pub fn mark_settings_saved(&mut self) {
        if !self.record.stats.settings_saved {
            self.record.stats.settings_saved = true;
            self.dirty = true;
        }
    }

    fn track_key(&mut self, wall_ms: u64) {
        self.key_presses.push_back(wall_ms);
        while let Some(&front) = self.key_presses.front() {
            if wall_ms.saturating_sub(front) >= KEY_WINDOW_MS {
                self.key_presses.pop_front();
            } else {
                break;
            }
        }
        let concurrent = self.key_presses.len() as u32;
        if concurrent > self.record.stats.max_concurrent_keys {
            self.record.stats.max_concurrent_keys = concurrent;
            self.dirty = true;
        }
    }

    fn track_suspend(&mut self, suspended: bool, wall_ms: u64) {
        let stats = &mut self.record.stats;
        if suspended {
            stats.boss_key_used = true;
            self.suspended_at = Some(wall_ms);
            self.dirty = true;
            return;
        }
        if let Some(start) = self.suspended_at.take() {
            let response = wall_ms.saturating_sub(start);
            if stats.fastest_boss_key_response.is_none_or(|best| response < best) {
                stats.fastest_boss_key_response = Some(response);
                self.dirty = true;
            }
        }
    }
}

impl AchievementHook for StatsTracker {
    fn notify(&mut self, event: &GameEvent, wall_ms: u64) {
        let stats = &mut self.record.stats;
        match event {
            GameEvent::Hit { .. } => {
                stats.total_clicks += 1;
                self.dirty = true;
            }
            GameEvent::KeyPressed { .. } => self.track_key(wall_ms),
            GameEvent::SuspendToggled { suspended, .. } => self.track_suspend(*suspended, wall_ms),
            GameEvent::SecondElapsed { .. } => {
                stats.total_runtime += 1;
                self.dirty = true;
            }
            GameEvent::CheatActivated {
                cheat: Cheat::KernelPatch,
            } => {
                stats.coffee_code = true;
                self.dirty = true;
            }
            GameEvent::GameOver(summary) => {
                stats.sessions_completed += 1;
                // Independent predicates; a run can satisfy both
                if summary.elapsed_seconds <= FAST_COMPLETION_SECS {
                    stats.fast_game_completion = true;
                }
                if summary.elapsed_seconds >= LONG_SESSION_SECS && summary.missed_count == 0 {
                    stats.long_session = true;
                }
                self.dirty = true;
            }
            _ => {}
        }
    }
}

/// Achievement file behind the secure store
#[derive(Debug, Clone)]
pub struct AchievementStore {
    store: SecureStore,
}

impl AchievementStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: SecureStore::new(path),
        }
    }

    /// Saved record, or a zeroed one
    pub fn load(&self) -> AchievementRecord {
        self.store.load_or_default()
    }

    pub fn save(&self, record: &AchievementRecord) -> bool {
        self.store.save_or_log(record)
    }
}
