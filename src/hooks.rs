//! Event fan-out to collaborators
//!
//! The simulation only returns events; the host passes them through here so
//! the achievement and sound collaborators see every event in order.

use crate::achievements::AchievementHook;
use crate::audio::SoundSink;
use crate::sim::state::GameEvent;

/// Deliver `events` to both collaborators. Neither can affect the session.
pub fn dispatch(
    events: &[GameEvent],
    wall_ms: u64,
    achievements: &mut dyn AchievementHook,
    sound: &mut dyn SoundSink,
) {
    for event in events {
        achievements.notify(event, wall_ms);
        sound.on_event(event);
    }
}

/// Final summary in the `(final_score, missed_count, elapsed_seconds)` shape, if the run ended
pub fn session_end(events: &[GameEvent]) -> Option<(f64, u32, u32)> {
    events.iter().find_map(|e| match e {
        GameEvent::GameOver(s) => Some((s.final_score, s.missed_count, s.elapsed_seconds)),
        _ => None,
    })
}
