//! High score leaderboard
//!
//! Persisted through the secure store, tracks the top 10 ranked runs.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::persistence::SecureStore;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;
/// Longest stored player name
pub const MAX_NAME_LEN: usize = 20;
/// Name used when the player leaves it blank
pub const DEFAULT_NAME: &str = "Guest";

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: f64,
    /// Display date of the run
    pub date: String,
    /// Unix timestamp (ms) when achieved; earlier wins ties
    pub timestamp: i64,
}

/// Top runs, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary entries, restoring order and length
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>) -> Self {
        sort_entries(&mut entries);
        entries.truncate(MAX_HIGH_SCORES);
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Whether a finished run earns a place
    pub fn qualifies(&self, score: f64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify).
    /// A tie ranks below the existing entry.
    pub fn potential_rank(&self, score: f64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a run stamped with the current time
    pub fn submit(&mut self, name: &str, score: f64) -> Option<usize> {
        self.submit_at(name, score, Utc::now().timestamp_millis())
    }

    /// Insert a run; returns its rank, or None if it fell off the end
    pub fn submit_at(&mut self, name: &str, score: f64, timestamp: i64) -> Option<usize> {
        let entry = LeaderboardEntry {
            name: display_name(name),
            score: crate::round_tenth(score),
            date: format_date(timestamp),
            timestamp,
        };
        self.entries.push(entry.clone());
        sort_entries(&mut self.entries);
        self.entries.truncate(MAX_HIGH_SCORES);

        let rank = self.entries.iter().position(|e| *e == entry).map(|i| i + 1);
        log::info!("Leaderboard submission: {} {:.1} -> {:?}", entry.name, entry.score, rank);
        rank
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn top_score(&self) -> Option<f64> {
        self.entries.first().map(|e| e.score)
    }

    /// Pretty JSON array
    pub fn export_json(&self) -> Result<String, ExportError> {
        if self.is_empty() {
            return Err(ExportError::Empty { what: "scores" });
        }
        serde_json::to_string_pretty(&self.entries).map_err(|_| ExportError::Empty { what: "scores" })
    }

    /// `Rank,User,Objects,Date` table
    pub fn export_csv(&self) -> Result<String, ExportError> {
        if self.is_empty() {
            return Err(ExportError::Empty { what: "scores" });
        }
        let mut out = String::from("Rank,User,Objects,Date\n");
        let rows: Vec<String> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{},{},{},{}", i + 1, csv_field(&e.name), e.score, e.date))
            .collect();
        out.push_str(&rows.join("\n"));
        Ok(out)
    }
}

/// Descending score, then ascending timestamp
fn sort_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
}

fn display_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed.chars().take(MAX_NAME_LEN).collect()
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Calendar date of a Unix-ms timestamp
pub fn format_date(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Leaderboard file behind the secure store
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    store: SecureStore,
}

impl LeaderboardStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: SecureStore::new(path),
        }
    }

    pub fn with_store(store: SecureStore) -> Self {
        Self { store }
    }

    /// Saved leaderboard, empty on any failure
    pub fn load(&self) -> Leaderboard {
        let board: Leaderboard = self.store.load_or_default();
        log::info!("Loaded {} high scores", board.len());
        // Files written by other builds may be out of order
        Leaderboard::from_entries(board.entries)
    }

    pub fn save(&self, board: &Leaderboard) -> bool {
        let saved = self.store.save_or_log(board);
        if saved {
            log::info!("High scores saved ({} entries)", board.len());
        }
        saved
    }
}
