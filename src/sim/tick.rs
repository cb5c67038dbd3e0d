//! Simulation step
//!
//! Advances a session by `dt_ms` of wall time and reports what happened.
//! Within one step: misses are settled before player hits, and the
//! per-second clock recomputes level and difficulty before judging the run.

use glam::Vec2;
use rand::Rng;

use super::cheats::{Cheat, KERNEL_PATCH_FACTOR};
use super::difficulty;
use super::state::{
    FallingEntity, GameEvent, GameState, Resolution, ScoreSource, SessionPhase,
};
use super::typing::unique_prefix_match;
use crate::consts::*;

/// A pointer click on an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub id: u32,
    /// Screen position of the click
    pub pos: Vec2,
}

/// Input gathered since the previous step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Escape: toggle the disguise overlay
    pub toggle_suspend: bool,
    /// Switch between pointer and keyboard play
    pub toggle_interaction: bool,
    /// Entity under the pointer
    pub hover: Option<u32>,
    pub click: Option<Click>,
    /// Characters typed outside the typing box (cheat codes, key stats)
    pub keys: String,
    /// Typing box submitted with Enter
    pub submit: Option<String>,
}

/// Advance the session by `dt_ms`
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f64) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.is_over() {
        return events;
    }
    let dt_ms = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, MAX_STEP_MS)
    } else {
        0.0
    };

    if input.toggle_suspend {
        toggle_suspend(state, &mut events);
    }

    for _ in input.keys.chars() {
        events.push(GameEvent::KeyPressed {
            at_ms: state.clock_ms,
        });
    }

    if input.toggle_interaction {
        state.interaction = state.interaction.toggled();
        state.combo.set_mode(state.interaction);
        events.push(GameEvent::InteractionModeChanged {
            mode: state.interaction,
        });
    }

    if state.phase != SessionPhase::Running {
        return events;
    }

    for ch in input.keys.chars() {
        if let Some(cheat) = state.cheats.feed(ch) {
            activate_cheat(state, cheat, &mut events);
        }
    }

    advance_clock(state, dt_ms);

    update_hover(state, input.hover, &mut events);
    advance_entities(state, dt_ms, &mut events);
    if state.is_over() {
        return events;
    }

    if let Some(count) = state.combo.expire(state.clock_ms) {
        events.push(GameEvent::ComboEnded { count });
    }

    resolve_input(state, input, &mut events);
    advance_cheats(state, dt_ms, &mut events);
    advance_spawner(state, dt_ms, &mut events);
    advance_seconds(state, dt_ms, &mut events);

    events
}

impl GameState {
    /// Credit points outside hit resolution (auto-play items, cheats).
    ///
    /// Skips combo credit and item modifiers; rounding and best-score
    /// detection still apply. No effect once the run is over.
    pub fn add_score(&mut self, amount: f64, pos: Option<Vec2>) -> Vec<GameEvent> {
        debug_assert!(amount >= 0.0, "negative score credit {amount}");
        let mut events = Vec::new();
        if !self.is_over() {
            credit_bonus(self, amount, pos, &mut events);
        }
        events
    }

    /// Spawn one entity immediately
    pub fn spawn(&mut self) -> Option<u32> {
        let mut events = Vec::new();
        spawn_entity(self, &mut events);
        events.iter().find_map(|e| match e {
            GameEvent::Spawned { id, .. } => Some(*id),
            _ => None,
        })
    }
}

fn toggle_suspend(state: &mut GameState, events: &mut Vec<GameEvent>) {
    match state.phase {
        SessionPhase::Running => {
            state.phase = SessionPhase::Suspended;
            // Removed without score or miss credit
            state.entities.clear();
        }
        SessionPhase::Suspended => state.phase = SessionPhase::Running,
        SessionPhase::Over => return,
    }
    events.push(GameEvent::SuspendToggled {
        suspended: state.phase == SessionPhase::Suspended,
        at_ms: state.clock_ms,
    });
}

fn activate_cheat(state: &mut GameState, cheat: Cheat, events: &mut Vec<GameEvent>) {
    log::debug!("Cheat activated: {}", cheat.banner());
    if cheat == Cheat::KernelPatch {
        // Holds until the next per-second recompute
        state.speed_multiplier *= KERNEL_PATCH_FACTOR;
    }
    events.push(GameEvent::CheatActivated { cheat });
}

fn advance_clock(state: &mut GameState, dt_ms: f64) {
    state.clock_frac_ms += dt_ms;
    let whole = state.clock_frac_ms.floor();
    state.clock_ms += whole as u64;
    state.clock_frac_ms -= whole;
}

fn update_hover(state: &mut GameState, hover: Option<u32>, events: &mut Vec<GameEvent>) {
    for entity in &mut state.entities {
        let hovered = hover == Some(entity.id);
        if hovered && !entity.paused {
            events.push(GameEvent::Hovered { id: entity.id });
        }
        entity.paused = hovered;
    }
}

/// Move every entity and settle misses
fn advance_entities(state: &mut GameState, dt_ms: f64, events: &mut Vec<GameEvent>) {
    let frames = (dt_ms / FRAME_MS) as f32;
    let invincible = state.cheats.wall_active();
    let mut missed = Vec::new();

    for entity in &mut state.entities {
        if !entity.paused {
            entity.pos.y -= entity.speed * frames;
        }
        if entity.pos.y < MISS_THRESHOLD {
            if invincible {
                entity.pos.y = MISS_THRESHOLD;
            } else {
                missed.push(entity.id);
            }
        }
    }

    if missed.is_empty() {
        return;
    }
    state.entities.retain(|e| !missed.contains(&e.id));

    for id in missed {
        state.missed_count += 1;
        events.push(GameEvent::Missed {
            id,
            missed_count: state.missed_count,
        });
        if let Some(count) = state.combo.on_miss() {
            events.push(GameEvent::ComboEnded { count });
        }

        if state
            .mode
            .should_end(state.missed_count, state.elapsed_seconds, state.level)
        {
            game_over(state, events);
            return;
        }
    }
}

fn resolve_input(state: &mut GameState, input: &TickInput, events: &mut Vec<GameEvent>) {
    use super::combo::InteractionMode;

    if let (Some(click), InteractionMode::Pointer) = (input.click, state.interaction) {
        if let Some(index) = state.entities.iter().position(|e| e.id == click.id) {
            let entity = state.entities.remove(index);
            credit_hit(state, entity, Resolution::PointerHit, click.pos, events);
        }
    }

    if let (Some(buffer), InteractionMode::Keyboard) = (&input.submit, state.interaction) {
        if let Some(id) = unique_prefix_match(&state.entities, buffer) {
            if let Some(index) = state.entities.iter().position(|e| e.id == id) {
                let entity = state.entities.remove(index);
                let pos = entity.pos;
                credit_hit(state, entity, Resolution::KeyboardHit, pos, events);
            }
        }
    }
}

fn credit_hit(
    state: &mut GameState,
    entity: FallingEntity,
    resolution: Resolution,
    pos: Vec2,
    events: &mut Vec<GameEvent>,
) {
    let now = state.clock_ms;
    let change = state
        .score
        .credit_hit(entity.score_value, now, state.modifiers.as_ref());
    let combo = state.combo.register_hit(now);

    if let Some(count) = combo.ended {
        events.push(GameEvent::ComboEnded { count });
    }
    events.push(GameEvent::Hit {
        id: entity.id,
        resolution,
        amount: change.amount,
        combo: combo.count,
        pos,
    });
    events.push(GameEvent::ScoreChanged {
        source: ScoreSource::Hit,
        amount: change.amount,
        total: change.total,
        pos: Some(pos),
    });
    if change.new_record {
        events.push(GameEvent::NewRecord {
            score: change.total,
        });
    }
    if combo.count >= COMBO_DISPLAY_THRESHOLD {
        events.push(GameEvent::ComboChanged { count: combo.count });
    }
    if combo.milestone {
        events.push(GameEvent::ComboMilestone { count: combo.count });
    }
}

fn credit_bonus(state: &mut GameState, amount: f64, pos: Option<Vec2>, events: &mut Vec<GameEvent>) {
    let change = state.score.add(amount);
    events.push(GameEvent::ScoreChanged {
        source: ScoreSource::Bonus,
        amount: change.amount,
        total: change.total,
        pos,
    });
    if change.new_record {
        events.push(GameEvent::NewRecord {
            score: change.total,
        });
    }
}

fn advance_cheats(state: &mut GameState, dt_ms: f64, events: &mut Vec<GameEvent>) {
    let timers = state.cheats.advance(dt_ms);

    for _ in 0..timers.money_ticks {
        let bonus = f64::from(state.rng.random_range(10u32..=20));
        let center = state.viewport / 2.0;
        let jitter = Vec2::new(
            state.rng.random_range(-100.0..100.0),
            state.rng.random_range(-50.0..50.0),
        );
        credit_bonus(state, bonus, Some(center + jitter), events);
    }

    if timers.wall_expired {
        events.push(GameEvent::CheatExpired {
            cheat: Cheat::WallHack,
        });
    }
    if timers.money_expired {
        events.push(GameEvent::CheatExpired {
            cheat: Cheat::MoneyHack,
        });
    }
}

fn advance_spawner(state: &mut GameState, dt_ms: f64, events: &mut Vec<GameEvent>) {
    state.spawn_accum_ms += dt_ms;
    let mut spawned = 0;
    loop {
        let interval = state.spawn_interval_ms();
        if !(interval.is_finite() && interval > 0.0) {
            state.spawn_accum_ms = 0.0;
            return;
        }
        if state.spawn_accum_ms < interval {
            break;
        }
        if spawned == MAX_SPAWNS_PER_STEP {
            state.spawn_accum_ms %= interval;
            break;
        }
        state.spawn_accum_ms -= interval;
        spawn_entity(state, events);
        spawned += 1;
    }
}

fn spawn_entity(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.phase != SessionPhase::Running {
        return;
    }

    let Some((category, text)) = state.pool.pick(&mut state.rng) else {
        return;
    };
    let (name, score_value, speed_bonus, text) = (
        category.name.clone(),
        category.score,
        category.speed_bonus,
        text.to_string(),
    );

    let x = state.rng.random::<f32>() * (state.viewport.x - SPAWN_MARGIN_X).max(0.0);
    let base = BASE_SPEED_MIN + state.rng.random_range(0.0..BASE_SPEED_SPREAD);
    // Fixed for the entity's lifetime
    let speed = base
        * speed_bonus
        * state.speed_multiplier as f32
        * state.mode.fall_multiplier() as f32
        * state.modifiers.fall_speed_multiplier() as f32;

    let id = state.next_entity_id();
    state.entities.push(FallingEntity {
        id,
        category: name.clone(),
        text: text.clone(),
        score_value,
        speed,
        pos: Vec2::new(x, state.viewport.y),
        paused: false,
    });
    events.push(GameEvent::Spawned {
        id,
        category: name,
        text,
    });
}

fn advance_seconds(state: &mut GameState, dt_ms: f64, events: &mut Vec<GameEvent>) {
    state.second_accum_ms += dt_ms;
    while state.second_accum_ms >= SECOND_MS && state.phase == SessionPhase::Running {
        state.second_accum_ms -= SECOND_MS;
        on_second(state, events);
    }
}

fn on_second(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.elapsed_seconds += 1;
    let seconds = state.elapsed_seconds;

    let level = difficulty::level(seconds);
    state.speed_multiplier = difficulty::speed_multiplier(seconds);
    if level > state.level {
        log::debug!("Level up: {level}");
        events.push(GameEvent::LevelUp { level });
    }
    state.level = level;

    let max_misses = difficulty::max_misses(level);
    state.stability = difficulty::stability(state.missed_count, level);
    events.push(GameEvent::SecondElapsed {
        seconds,
        stability: state.stability,
    });

    if state.stability < 20.0 && seconds % 5 == 0 {
        events.push(GameEvent::LowStability {
            stability: state.stability,
        });
    }
    let miss_ratio = f64::from(state.missed_count) / f64::from(max_misses);
    if miss_ratio > 0.8 && miss_ratio < 1.0 && seconds % 3 == 0 {
        events.push(GameEvent::NearFail {
            missed_count: state.missed_count,
            max_misses,
        });
    }

    if seconds % CHECKPOINT_INTERVAL_SECS == 0 && !state.is_practice() {
        events.push(GameEvent::Checkpoint);
    }

    if state.mode.should_end(state.missed_count, seconds, level) {
        game_over(state, events);
    }
}

/// Terminal transition: cancel everything that could still mutate the run
fn game_over(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.phase = SessionPhase::Over;
    state.entities.clear();
    state.cheats.cancel();
    if let Some(count) = state.combo.finish() {
        events.push(GameEvent::ComboEnded { count });
    }

    let summary = state.summary();
    log::info!(
        "Session over: score={:.1} missed={} seconds={} mode={}",
        summary.final_score,
        summary.missed_count,
        summary.elapsed_seconds,
        summary.mode.as_str()
    );
    events.push(GameEvent::GameOver(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::challenge::ChallengeMode;
    use crate::sim::combo::InteractionMode;
    use crate::sim::state::SessionConfig;

    fn session(mode: ChallengeMode) -> GameState {
        GameState::new(SessionConfig {
            seed: 12345,
            mode,
            ..Default::default()
        })
    }

    fn push_entity(state: &mut GameState, text: &str, y: f32, speed: f32) -> u32 {
        let id = state.next_entity_id();
        state.entities.push(FallingEntity {
            id,
            category: "JS".into(),
            text: text.into(),
            score_value: 1.0,
            speed,
            pos: Vec2::new(10.0, y),
            paused: false,
        });
        id
    }

    fn count<F: Fn(&GameEvent) -> bool>(events: &[GameEvent], f: F) -> usize {
        events.iter().filter(|e| f(e)).count()
    }

    #[test]
    fn test_spawn_cadence() {
        let mut state = session(ChallengeMode::Normal);
        let mut events = Vec::new();
        for _ in 0..21 {
            events.extend(tick(&mut state, &TickInput::default(), 100.0));
        }
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Spawned { .. })), 3);
        assert_eq!(state.elapsed_seconds, 2);
        for entity in &state.entities {
            assert!(entity.pos.y <= state.viewport.y);
            assert!(entity.pos.x >= 0.0 && entity.pos.x <= state.viewport.x - SPAWN_MARGIN_X);
        }
    }

    #[test]
    fn test_spawn_speed_formula_bounds() {
        let mut state = session(ChallengeMode::TimeAttack);
        for _ in 0..200 {
            state.spawn();
        }
        for entity in &state.entities {
            let bonus = state
                .pool()
                .categories()
                .iter()
                .find(|c| c.name == entity.category)
                .unwrap()
                .speed_bonus;
            let base = entity.speed / bonus / 2.0;
            assert!((1.0 - 1e-4..2.5 + 1e-4).contains(&base), "base speed {base}");
        }
    }

    #[test]
    fn test_entity_misses_at_threshold() {
        let mut state = session(ChallengeMode::Normal);
        let id = push_entity(&mut state, "import sys", 50.0, 20.0);
        let events = tick(&mut state, &TickInput::default(), FRAME_MS);
        assert_eq!(state.missed_count, 1);
        assert!(state.entity(id).is_none());
        assert!(events.contains(&GameEvent::Missed { id, missed_count: 1 }));
    }

    #[test]
    fn test_hover_pauses_entity() {
        let mut state = session(ChallengeMode::Normal);
        let id = push_entity(&mut state, "import sys", 50.0, 20.0);
        let input = TickInput {
            hover: Some(id),
            ..Default::default()
        };
        let events = tick(&mut state, &input, FRAME_MS);
        assert!(events.contains(&GameEvent::Hovered { id }));
        assert_eq!(state.entity(id).unwrap().pos.y, 50.0);

        // Still hovered: no second pause event
        let events = tick(&mut state, &input, FRAME_MS);
        assert!(!events.contains(&GameEvent::Hovered { id }));

        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert!(state.entity(id).is_none());
        assert_eq!(state.missed_count, 1);
    }

    #[test]
    fn test_wall_hack_clamps_at_threshold() {
        let mut state = session(ChallengeMode::Normal);
        let id = push_entity(&mut state, "import sys", 50.0, 20.0);
        let input = TickInput {
            keys: "black sheep wall".into(),
            ..Default::default()
        };
        let events = tick(&mut state, &input, FRAME_MS);
        assert!(events.contains(&GameEvent::CheatActivated {
            cheat: Cheat::WallHack
        }));
        for _ in 0..100 {
            tick(&mut state, &TickInput::default(), FRAME_MS);
        }
        assert_eq!(state.missed_count, 0);
        assert_eq!(state.entity(id).unwrap().pos.y, MISS_THRESHOLD);
    }

    #[test]
    fn test_pointer_hit_scores_and_builds_combo() {
        let mut state = session(ChallengeMode::Normal);
        let mut combos = Vec::new();
        for _ in 0..3 {
            let id = push_entity(&mut state, "import sys", 500.0, 1.0);
            let input = TickInput {
                click: Some(Click {
                    id,
                    pos: Vec2::new(10.0, 500.0),
                }),
                ..Default::default()
            };
            for event in tick(&mut state, &input, FRAME_MS) {
                if let GameEvent::Hit { combo, .. } = event {
                    combos.push(combo);
                }
            }
        }
        assert_eq!(combos, vec![1, 2, 3]);
        assert_eq!(state.score(), 3.0);
        assert_eq!(state.combo_count(), 3);
    }

    #[test]
    fn test_click_ignored_in_keyboard_mode() {
        let mut state = GameState::new(SessionConfig {
            interaction: InteractionMode::Keyboard,
            ..Default::default()
        });
        let id = push_entity(&mut state, "import sys", 500.0, 1.0);
        let input = TickInput {
            click: Some(Click { id, pos: Vec2::ZERO }),
            ..Default::default()
        };
        tick(&mut state, &input, FRAME_MS);
        assert!(state.entity(id).is_some());
        assert_eq!(state.score(), 0.0);
    }

    #[test]
    fn test_keyboard_submit_unique_prefix() {
        let mut state = GameState::new(SessionConfig {
            interaction: InteractionMode::Keyboard,
            ..Default::default()
        });
        let a = push_entity(&mut state, "int main()", 500.0, 1.0);
        let b = push_entity(&mut state, "int main()", 500.0, 1.0);
        let c = push_entity(&mut state, "import sys", 500.0, 1.0);

        let submit = |text: &str| TickInput {
            submit: Some(text.into()),
            ..Default::default()
        };

        tick(&mut state, &submit("int ma"), FRAME_MS);
        assert!(state.entity(a).is_some() && state.entity(b).is_some());

        tick(&mut state, &submit("impo"), FRAME_MS);
        assert!(state.entity(c).is_some());

        let events = tick(&mut state, &submit("import"), FRAME_MS);
        assert!(state.entity(c).is_none());
        assert_eq!(state.score(), 1.0);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Hit {
                resolution: Resolution::KeyboardHit,
                ..
            }
        )));
    }

    #[test]
    fn test_miss_resets_combo_before_same_tick_hit() {
        let mut state = session(ChallengeMode::Normal);
        for _ in 0..4 {
            let id = push_entity(&mut state, "import sys", 500.0, 1.0);
            let input = TickInput {
                click: Some(Click { id, pos: Vec2::ZERO }),
                ..Default::default()
            };
            tick(&mut state, &input, FRAME_MS);
        }
        assert_eq!(state.combo_count(), 4);

        push_entity(&mut state, "def init():", 41.0, 5.0);
        let target = push_entity(&mut state, "import sys", 500.0, 1.0);
        let input = TickInput {
            click: Some(Click {
                id: target,
                pos: Vec2::ZERO,
            }),
            ..Default::default()
        };
        let events = tick(&mut state, &input, FRAME_MS);

        let miss_at = events
            .iter()
            .position(|e| matches!(e, GameEvent::Missed { .. }))
            .unwrap();
        let hit_at = events
            .iter()
            .position(|e| matches!(e, GameEvent::Hit { .. }))
            .unwrap();
        assert!(miss_at < hit_at);
        assert!(events.contains(&GameEvent::ComboEnded { count: 4 }));
        assert_eq!(state.combo_count(), 1);
    }

    #[test]
    fn test_suspend_freezes_and_resumes() {
        let mut state = session(ChallengeMode::Normal);
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), 100.0);
        }
        let score_before = state.score();
        assert_eq!(state.elapsed_seconds, 3);
        assert!(!state.entities.is_empty());

        let toggle = TickInput {
            toggle_suspend: true,
            ..Default::default()
        };
        let events = tick(&mut state, &toggle, 100.0);
        assert!(state.is_suspended());
        assert!(state.entities.is_empty());
        assert!(matches!(
            events[0],
            GameEvent::SuspendToggled {
                suspended: true,
                ..
            }
        ));

        for _ in 0..100 {
            let events = tick(&mut state, &TickInput::default(), 100.0);
            assert!(events.is_empty());
        }
        assert_eq!(state.elapsed_seconds, 3);
        assert_eq!(state.missed_count, 0);
        assert_eq!(state.score(), score_before);

        tick(&mut state, &toggle, 100.0);
        assert_eq!(state.phase, SessionPhase::Running);
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), 100.0);
        }
        assert_eq!(state.elapsed_seconds, 4);
    }

    #[test]
    fn test_normal_game_over_exactly_at_ten_misses() {
        let mut state = session(ChallengeMode::Normal);
        let mut game_overs = 0;
        for _ in 0..65 {
            push_entity(&mut state, "import sys", 41.0, 5.0);
            let events = tick(&mut state, &TickInput::default(), FRAME_MS);
            game_overs += count(&events, |e| matches!(e, GameEvent::GameOver(_)));
            if state.is_over() {
                break;
            }
            assert!(state.missed_count < 10);
        }
        assert_eq!(state.level, 1);
        assert!(state.is_over());
        assert_eq!(state.missed_count, 10);
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_burst_of_misses_stops_at_ceiling() {
        let mut state = session(ChallengeMode::Normal);
        for _ in 0..65 {
            push_entity(&mut state, "import sys", 41.0, 5.0);
        }
        let events = tick(&mut state, &TickInput::default(), FRAME_MS);
        assert!(state.is_over());
        assert_eq!(state.missed_count, 10);
        assert!(state.entities.is_empty());
        let summary = events.iter().find_map(|e| match e {
            GameEvent::GameOver(summary) => Some(summary.clone()),
            _ => None,
        });
        assert_eq!(summary.unwrap().missed_count, 10);
    }

    #[test]
    fn test_survival_ends_at_five() {
        let mut state = session(ChallengeMode::Survival);
        state.level = 4;
        for _ in 0..5 {
            push_entity(&mut state, "import sys", 41.0, 5.0);
            tick(&mut state, &TickInput::default(), FRAME_MS);
        }
        assert!(state.is_over());
        assert_eq!(state.missed_count, 5);
    }

    #[test]
    fn test_time_attack_ends_at_sixty_seconds() {
        let mut state = session(ChallengeMode::TimeAttack);
        for _ in 0..59 {
            tick(&mut state, &TickInput::default(), 1000.0);
        }
        assert!(!state.is_over());
        let events = tick(&mut state, &TickInput::default(), 1000.0);
        assert!(state.is_over());
        assert_eq!(state.elapsed_seconds, 60);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::GameOver(_))), 1);
    }

    #[test]
    fn test_zen_runs_forever_and_levels_up() {
        let mut state = session(ChallengeMode::zen(1.0));
        let mut level_ups = Vec::new();
        for _ in 0..600 {
            for event in tick(&mut state, &TickInput::default(), 1000.0) {
                if let GameEvent::LevelUp { level } = event {
                    level_ups.push(level);
                }
            }
        }
        assert!(!state.is_over());
        assert!(state.missed_count > 0);
        assert_eq!(state.level, 11);
        assert_eq!(level_ups, (2..=11).collect::<Vec<_>>());
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut state = session(ChallengeMode::Survival);
        for _ in 0..5 {
            push_entity(&mut state, "import sys", 41.0, 5.0);
        }
        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert!(state.is_over());
        let score = state.score();

        let input = TickInput {
            toggle_suspend: true,
            keys: "show me money".into(),
            ..Default::default()
        };
        assert!(tick(&mut state, &input, 5000.0).is_empty());
        assert!(state.add_score(50.0, None).is_empty());
        assert_eq!(state.score(), score);
        assert_eq!(state.phase, SessionPhase::Over);
    }

    #[test]
    fn test_money_cheat_pays_bonus_without_combo() {
        let mut state = session(ChallengeMode::zen(1.0));
        let input = TickInput {
            keys: "show me money".into(),
            ..Default::default()
        };
        tick(&mut state, &input, 10.0);
        let events = tick(&mut state, &TickInput::default(), 1000.0);
        let bonus: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::ScoreChanged {
                    source: ScoreSource::Bonus,
                    amount,
                    ..
                } => Some(*amount),
                _ => None,
            })
            .collect();
        assert_eq!(bonus.len(), 1);
        assert!((10.0..=20.0).contains(&bonus[0]));
        assert_eq!(state.score(), bonus[0]);
        assert_eq!(state.combo_count(), 0);
    }

    #[test]
    fn test_kernel_patch_slows_until_next_second() {
        let mut state = session(ChallengeMode::Normal);
        let input = TickInput {
            keys: "coffee".into(),
            ..Default::default()
        };
        tick(&mut state, &input, 10.0);
        assert!((state.speed_multiplier - 0.8).abs() < 1e-12);
        tick(&mut state, &TickInput::default(), 1000.0);
        assert!(state.speed_multiplier >= 1.0);
    }

    #[test]
    fn test_add_score_hook() {
        let mut state = session(ChallengeMode::Normal);
        let events = state.add_score(1.25, Some(Vec2::new(5.0, 5.0)));
        assert_eq!(state.score(), 1.3);
        assert!(events.contains(&GameEvent::NewRecord { score: 1.3 }));
        assert_eq!(state.combo_count(), 0);
    }

    #[test]
    fn test_checkpoint_every_thirty_seconds() {
        let mut state = session(ChallengeMode::zen(1.0));
        let mut checkpoints = 0;
        for _ in 0..90 {
            let events = tick(&mut state, &TickInput::default(), 1000.0);
            checkpoints += count(&events, |e| matches!(e, GameEvent::Checkpoint));
        }
        assert_eq!(checkpoints, 3);
    }

    #[test]
    fn test_key_presses_reported() {
        let mut state = session(ChallengeMode::Normal);
        let input = TickInput {
            keys: "abc".into(),
            ..Default::default()
        };
        let events = tick(&mut state, &input, FRAME_MS);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::KeyPressed { .. })), 3);
    }

    #[test]
    fn test_interaction_toggle() {
        let mut state = session(ChallengeMode::Normal);
        let input = TickInput {
            toggle_interaction: true,
            ..Default::default()
        };
        let events = tick(&mut state, &input, FRAME_MS);
        assert_eq!(state.interaction, InteractionMode::Keyboard);
        assert!(events.contains(&GameEvent::InteractionModeChanged {
            mode: InteractionMode::Keyboard
        }));
    }

    #[test]
    fn test_unclamped_zen_speed_still_spawns() {
        for speed in [-1.0, 0.0, f64::NAN] {
            let mut state = session(ChallengeMode::Zen { speed });
            let mut spawns = 0;
            for _ in 0..21 {
                let events = tick(&mut state, &TickInput::default(), 100.0);
                spawns += count(&events, |e| matches!(e, GameEvent::Spawned { .. }));
            }
            assert!((3..=5).contains(&spawns), "speed {speed}: {spawns} spawns");
        }
    }

    #[test]
    fn test_bad_step_lengths_are_ignored() {
        let mut state = session(ChallengeMode::Normal);
        for dt in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, -500.0] {
            let events = tick(&mut state, &TickInput::default(), dt);
            assert!(events.is_empty(), "dt {dt}");
        }
        assert!(state.entities.is_empty());
        assert_eq!(state.clock_ms, 0);
        assert_eq!(state.elapsed_seconds, 0);
    }

    #[test]
    fn test_long_step_is_capped() {
        let mut state = session(ChallengeMode::zen(1.0));
        tick(&mut state, &TickInput::default(), 1.0e9);
        assert_eq!(state.elapsed_seconds, 1);
        assert_eq!(state.clock_ms, MAX_STEP_MS as u64);
        assert_eq!(state.entities.len(), 1);
    }

    #[test]
    fn test_spawns_per_step_bounded() {
        let mut state = session(ChallengeMode::zen(1.0));
        state.speed_multiplier = 1.0e6;
        let events = tick(&mut state, &TickInput::default(), FRAME_MS);
        let spawns = count(&events, |e| matches!(e, GameEvent::Spawned { .. }));
        assert_eq!(spawns as u32, MAX_SPAWNS_PER_STEP);
        assert!(state.spawn_accum_ms < state.spawn_interval_ms());
    }

    #[test]
    fn test_level_recomputed_before_judging() {
        let mut state = session(ChallengeMode::Normal);
        state.missed_count = 12;
        state.elapsed_seconds = 59;
        let events = tick(&mut state, &TickInput::default(), 1000.0);
        assert!(!state.is_over());
        assert_eq!(state.level, 2);
        assert_eq!(state.max_misses(), 15);
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_entity_speed_fixed_at_spawn() {
        let mut state = session(ChallengeMode::zen(1.0));
        let id = state.spawn().unwrap();
        let speed = state.entity(id).unwrap().speed;
        let multiplier = state.speed_multiplier;

        let input = TickInput {
            hover: Some(id),
            ..Default::default()
        };
        for _ in 0..120 {
            tick(&mut state, &input, 1000.0);
        }
        assert!(state.speed_multiplier > multiplier);
        let entity = state.entity(id).unwrap();
        assert_eq!(entity.speed, speed);
        assert_eq!(entity.pos.y, state.viewport.y);
    }

    #[test]
    fn test_cheats_ignored_while_suspended() {
        let mut state = session(ChallengeMode::Normal);
        let toggle = TickInput {
            toggle_suspend: true,
            ..Default::default()
        };
        tick(&mut state, &toggle, FRAME_MS);
        assert!(state.is_suspended());

        let input = TickInput {
            keys: "coffee black sheep wall".into(),
            ..Default::default()
        };
        let events = tick(&mut state, &input, FRAME_MS);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::KeyPressed { .. })), 23);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::CheatActivated { .. })));
        assert_eq!(state.speed_multiplier, 1.0);

        tick(&mut state, &toggle, FRAME_MS);
        assert!(!state.cheats.wall_active());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "negative score credit")]
    fn test_negative_bonus_rejected() {
        let mut state = session(ChallengeMode::Normal);
        state.add_score(-5.0, None);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = session(ChallengeMode::Normal);
        let mut state2 = session(ChallengeMode::Normal);
        for _ in 0..200 {
            tick(&mut state1, &TickInput::default(), FRAME_MS);
            tick(&mut state2, &TickInput::default(), FRAME_MS);
        }
        assert_eq!(state1.entities, state2.entities);
        assert_eq!(state1.missed_count, state2.missed_count);
    }
}
