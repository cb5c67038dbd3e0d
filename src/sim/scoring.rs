//! Score arithmetic and item modifiers

use std::collections::VecDeque;

use crate::consts::HIT_RATE_WINDOW_MS;
use crate::round_tenth;

/// Score and speed modifiers supplied by the item layer
pub trait ScoreModifiers: std::fmt::Debug {
    /// Added to the base value of each hit
    fn flat_bonus(&self) -> f64 {
        0.0
    }

    /// Multiplies `(base + flat_bonus)`; `hits_per_second` counts this hit
    fn multiplier(&self, _hits_per_second: usize) -> f64 {
        1.0
    }

    /// Extra factor on new entities' fall speed
    fn fall_speed_multiplier(&self) -> f64 {
        1.0
    }
}

/// No items equipped
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModifiers;

impl ScoreModifiers for NoModifiers {}

/// Equipped item effects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemEffects {
    /// +2 on every hit
    pub flat_bonus_item: bool,
    /// Multiplier scaled by recent hit rate
    pub autoscale_item: bool,
    /// Fall speed factor, `None` for 1.0
    pub fall_speed: Option<f64>,
}

impl ScoreModifiers for ItemEffects {
    fn flat_bonus(&self) -> f64 {
        if self.flat_bonus_item { 2.0 } else { 0.0 }
    }

    fn multiplier(&self, hits_per_second: usize) -> f64 {
        if !self.autoscale_item {
            return 1.0;
        }
        match hits_per_second {
            n if n >= 5 => 5.0,
            4 => 4.0,
            3 => 3.0,
            2 => 2.0,
            _ => 1.5,
        }
    }

    fn fall_speed_multiplier(&self) -> f64 {
        self.fall_speed.unwrap_or(1.0)
    }
}

/// Outcome of a score mutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreChange {
    /// Points credited (after modifiers)
    pub amount: f64,
    /// Running total after rounding
    pub total: f64,
    /// Total beat the best seen so far
    pub new_record: bool,
}

/// Running score with best-score detection
#[derive(Debug, Clone, Default)]
pub struct ScoreBook {
    score: f64,
    best: f64,
    recent_hits: VecDeque<u64>,
}

impl ScoreBook {
    /// `best` is the highest score seen earlier in this process
    pub fn new(best: f64) -> Self {
        Self {
            score: 0.0,
            best,
            recent_hits: VecDeque::new(),
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    /// Restore a saved total (progress snapshot)
    pub fn restore(&mut self, score: f64) {
        self.score = round_tenth(score.max(0.0));
        self.best = self.best.max(self.score);
    }

    /// Hits inside the rate window ending at `now_ms`
    pub fn hits_per_second(&self) -> usize {
        self.recent_hits.len()
    }

    /// Credit a hit worth `base` through the modifiers
    pub fn credit_hit(&mut self, base: f64, now_ms: u64, modifiers: &dyn ScoreModifiers) -> ScoreChange {
        self.recent_hits.push_back(now_ms);
        while let Some(&front) = self.recent_hits.front() {
            if now_ms.saturating_sub(front) >= HIT_RATE_WINDOW_MS {
                self.recent_hits.pop_front();
            } else {
                break;
            }
        }

        let amount = (base + modifiers.flat_bonus()) * modifiers.multiplier(self.hits_per_second());
        self.add(amount)
    }

    /// Credit points as-is (cheats, auto-play items)
    pub fn add(&mut self, amount: f64) -> ScoreChange {
        self.score = round_tenth(self.score + amount);
        let new_record = self.score > self.best;
        if new_record {
            self.best = self.score;
        }
        ScoreChange {
            amount,
            total: self.score,
            new_record,
        }
    }
}
