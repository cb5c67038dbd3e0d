//! Difficulty curve
//!
//! Pure functions of elapsed session time.

/// Global speed multiplier after `seconds` of running time.
///
/// `1.0 + (seconds / 120)^1.2 * 0.5`: starts at 1.0 and grows without bound.
/// Scales fall speed directly and the spawn interval inversely.
pub fn speed_multiplier(seconds: u32) -> f64 {
    1.0 + (f64::from(seconds) / 120.0).powf(1.2) * 0.5
}

/// 1-indexed level; increments at every 60 second boundary.
pub fn level(seconds: u32) -> u32 {
    seconds / 60 + 1
}

/// Miss ceiling for a level. Misses are never refunded, the ceiling rises instead.
pub fn max_misses(level: u32) -> u32 {
    10 + level.saturating_sub(1) * 5
}

/// Displayed stability percentage, clamped at 0
pub fn stability(missed: u32, level: u32) -> f64 {
    (100.0 - f64::from(missed) / f64::from(max_misses(level)) * 100.0).max(0.0)
}
