//! Hit streak tracking
//!
//! `Idle(0)` -> hit -> `Active(1)` -> hit within timeout -> `Active(n + 1)`.
//! A timeout, a miss or the end of the session drops back to `Idle(0)`.

use serde::{Deserialize, Serialize};

use crate::consts::{
    COMBO_DISPLAY_THRESHOLD, COMBO_MILESTONES, KEYBOARD_COMBO_TIMEOUT_MS, POINTER_COMBO_TIMEOUT_MS,
};

/// How the player resolves entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InteractionMode {
    /// Click on entities
    #[default]
    Pointer,
    /// Type a prefix of the entity text
    Keyboard,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionMode::Pointer => "click",
            InteractionMode::Keyboard => "type",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            InteractionMode::Pointer => InteractionMode::Keyboard,
            InteractionMode::Keyboard => InteractionMode::Pointer,
        }
    }

    /// Streak timeout for this mode
    pub fn combo_timeout_ms(&self) -> u64 {
        match self {
            InteractionMode::Pointer => POINTER_COMBO_TIMEOUT_MS,
            InteractionMode::Keyboard => KEYBOARD_COMBO_TIMEOUT_MS,
        }
    }
}

/// Result of registering a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboHit {
    /// Streak length including this hit
    pub count: u32,
    /// A previous displayable streak that lapsed before this hit
    pub ended: Option<u32>,
    /// The hit landed exactly on a milestone
    pub milestone: bool,
}

/// Single streak counter for a session
#[derive(Debug, Clone, Default)]
pub struct ComboTracker {
    mode: InteractionMode,
    count: u32,
    last_hit_ms: Option<u64>,
    peak: u32,
}

impl ComboTracker {
    pub fn new(mode: InteractionMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Longest streak seen since the last full reset
    pub fn peak(&self) -> u32 {
        self.peak
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    fn lapsed(&self, now_ms: u64) -> bool {
        match self.last_hit_ms {
            Some(last) => now_ms.saturating_sub(last) > self.mode.combo_timeout_ms(),
            None => false,
        }
    }

    /// Drop to idle, reporting the streak if it was long enough to display
    fn drop_streak(&mut self) -> Option<u32> {
        let ended = (self.count >= COMBO_DISPLAY_THRESHOLD).then_some(self.count);
        self.count = 0;
        ended
    }

    /// Credit a hit at `now_ms`
    pub fn register_hit(&mut self, now_ms: u64) -> ComboHit {
        let ended = if self.lapsed(now_ms) {
            self.drop_streak()
        } else {
            None
        };

        self.count += 1;
        self.last_hit_ms = Some(now_ms);
        self.peak = self.peak.max(self.count);

        ComboHit {
            count: self.count,
            ended,
            milestone: COMBO_MILESTONES.contains(&self.count),
        }
    }

    /// Expire the streak if the timeout has elapsed with no hit
    pub fn expire(&mut self, now_ms: u64) -> Option<u32> {
        if self.count > 0 && self.lapsed(now_ms) {
            self.drop_streak()
        } else {
            None
        }
    }

    /// A miss breaks the streak regardless of timing
    pub fn on_miss(&mut self) -> Option<u32> {
        self.drop_streak()
    }

    /// End of session: back to idle, nothing carried into the next run
    pub fn finish(&mut self) -> Option<u32> {
        let ended = self.drop_streak();
        self.last_hit_ms = None;
        ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_timeout_extends() {
        let mut combo = ComboTracker::new(InteractionMode::Pointer);
        let timeout = InteractionMode::Pointer.combo_timeout_ms();
        assert_eq!(combo.register_hit(0).count, 1);
        assert_eq!(combo.register_hit(timeout - 1).count, 2);
    }

    #[test]
    fn test_hit_after_timeout_restarts() {
        let mut combo = ComboTracker::new(InteractionMode::Pointer);
        let timeout = InteractionMode::Pointer.combo_timeout_ms();
        combo.register_hit(0);
        let hit = combo.register_hit(timeout + 1);
        assert_eq!(hit.count, 1);
        assert_eq!(hit.ended, None);
    }

    #[test]
    fn test_keyboard_timeout_longer() {
        assert!(
            InteractionMode::Keyboard.combo_timeout_ms() > InteractionMode::Pointer.combo_timeout_ms()
        );
        let mut combo = ComboTracker::new(InteractionMode::Keyboard);
        combo.register_hit(0);
        assert_eq!(combo.register_hit(POINTER_COMBO_TIMEOUT_MS + 500).count, 2);
    }

    #[test]
    fn test_miss_resets_regardless_of_time() {
        let mut combo = ComboTracker::new(InteractionMode::Pointer);
        for t in 0..5 {
            combo.register_hit(t * 10);
        }
        assert_eq!(combo.on_miss(), Some(5));
        assert_eq!(combo.count(), 0);
        assert_eq!(combo.register_hit(60).count, 1);
        assert_eq!(combo.peak(), 5);
    }

    #[test]
    fn test_short_streak_ends_silently() {
        let mut combo = ComboTracker::new(InteractionMode::Pointer);
        combo.register_hit(0);
        combo.register_hit(100);
        assert_eq!(combo.on_miss(), None);
    }

    #[test]
    fn test_expire() {
        let mut combo = ComboTracker::new(InteractionMode::Pointer);
        combo.register_hit(0);
        combo.register_hit(10);
        combo.register_hit(20);
        assert_eq!(combo.expire(1000), None);
        assert_eq!(combo.count(), 3);
        assert_eq!(combo.expire(20 + POINTER_COMBO_TIMEOUT_MS + 1), Some(3));
        assert_eq!(combo.count(), 0);
        assert_eq!(combo.expire(100_000), None);
    }

    #[test]
    fn test_lapsed_streak_reported_on_next_hit() {
        let mut combo = ComboTracker::new(InteractionMode::Pointer);
        for t in [0, 10, 20, 30] {
            combo.register_hit(t);
        }
        let hit = combo.register_hit(10_000);
        assert_eq!(hit.ended, Some(4));
        assert_eq!(hit.count, 1);
    }

    #[test]
    fn test_milestones() {
        let mut combo = ComboTracker::new(InteractionMode::Pointer);
        let milestones: Vec<u32> = (0..100)
            .map(|t| combo.register_hit(t))
            .filter(|hit| hit.milestone)
            .map(|hit| hit.count)
            .collect();
        assert_eq!(milestones, vec![20, 50, 100]);
    }

    #[test]
    fn test_finish_clears_timestamp() {
        let mut combo = ComboTracker::new(InteractionMode::Pointer);
        combo.register_hit(0);
        combo.finish();
        // No lapse is computed against the previous run's last hit
        let hit = combo.register_hit(1_000_000);
        assert_eq!(hit.count, 1);
        assert_eq!(hit.ended, None);
    }
}
