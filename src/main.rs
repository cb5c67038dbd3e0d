//! sysdiag entry point
//!
//! Runs one headless session driven by a simple bot, then records the
//! result the way the interactive front end does.

use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use sysdiag::achievements::{AchievementStore, StatsTracker};
use sysdiag::audio::{AudioManager, LogBackend, SoundEffect};
use sysdiag::consts::*;
use sysdiag::highscores::LeaderboardStore;
use sysdiag::hooks;
use sysdiag::persistence::{DataDirs, ProgressSnapshot, ProgressStore};
use sysdiag::settings::Settings;
use sysdiag::sim::{
    CategoryFilter, ChallengeMode, Click, GameEvent, GameState, InteractionMode, PracticeFilter,
    SessionConfig, TickInput, tick,
};
use sysdiag::snippets::SnippetStore;

#[derive(Parser, Debug, Clone)]
#[clap(version, about = "Headless sysdiag session")]
struct Cli {
    /// challenge mode: normal, timeattack, survival or zen
    #[clap(short = 'm', long)]
    mode: Option<String>,

    /// zen mode speed (1.0 - 5.0)
    #[clap(long)]
    zen_speed: Option<f64>,

    /// RNG seed; random when omitted
    #[clap(short = 's', long)]
    seed: Option<u64>,

    /// stop after this many running seconds
    #[clap(long, default_value_t = 600)]
    max_seconds: u32,

    /// resolve entities by typing instead of clicking
    #[clap(short = 'k', long)]
    keyboard: bool,

    /// share of entities the bot resolves (0.0 - 1.0)
    #[clap(short = 'a', long, default_value_t = 0.85)]
    accuracy: f64,

    /// leaderboard name
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// directory holding all saved data
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// add a snippet to the custom category before playing (repeatable)
    #[clap(long = "add-snippet")]
    add_snippet: Vec<String>,
}

/// Entities the bot has decided to resolve
struct Bot {
    rng: Pcg32,
    accuracy: f64,
    targets: HashSet<u32>,
}

impl Bot {
    /// Height below which the bot reacts
    const REACTION_Y: f32 = 400.0;

    fn new(seed: u64, accuracy: f64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
            accuracy: if accuracy.is_finite() {
                accuracy.clamp(0.0, 1.0)
            } else {
                0.0
            },
            targets: HashSet::new(),
        }
    }

    fn observe(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Spawned { id, .. } => {
                    if self.rng.random_bool(self.accuracy) {
                        self.targets.insert(*id);
                    }
                }
                GameEvent::Missed { id, .. } | GameEvent::Hit { id, .. } => {
                    self.targets.remove(id);
                }
                _ => {}
            }
        }
    }

    fn input(&self, state: &GameState) -> TickInput {
        let target = state
            .entities
            .iter()
            .filter(|e| self.targets.contains(&e.id) && e.pos.y < Self::REACTION_Y)
            .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

        let mut input = TickInput::default();
        if let Some(entity) = target {
            match state.interaction {
                InteractionMode::Pointer => {
                    input.click = Some(Click {
                        id: entity.id,
                        pos: entity.pos,
                    });
                }
                InteractionMode::Keyboard => input.submit = Some(entity.text.clone()),
            }
        }
        input
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("sysdiag (headless) starting...");

    let dirs = cli
        .data_dir
        .as_ref()
        .map(DataDirs::with_root)
        .unwrap_or_else(DataDirs::resolve);
    log::info!("Data directory: {}", dirs.root().display());

    let mut settings = Settings::load(&dirs.settings());
    if let Some(speed) = cli.zen_speed {
        settings.zen_speed = speed;
    }
    if let Some(mode) = cli.mode.as_deref() {
        match ChallengeMode::from_str(mode, settings.zen_speed) {
            Some(mode) => settings.challenge_mode = mode,
            None => log::warn!("Unknown mode {mode:?}, keeping {}", settings.challenge_mode.as_str()),
        }
    }
    if cli.keyboard {
        settings.interaction_mode = InteractionMode::Keyboard;
    }
    if let Some(name) = cli.name.clone() {
        settings.player_name = name;
    }
    let settings = settings.sanitized();

    let leaderboard_store = LeaderboardStore::new(dirs.leaderboard());
    let achievement_store = AchievementStore::new(dirs.achievements());
    let progress_store = ProgressStore::new(dirs.progress());
    let mut board = leaderboard_store.load();

    let mut tracker = StatsTracker::new(achievement_store.load());
    let mut audio = AudioManager::new(LogBackend);
    audio.set_master_volume(settings.master_volume);
    audio.set_muted(!settings.sound_enabled);

    let snippet_store = SnippetStore::new(dirs.snippets());
    let mut snippets = snippet_store.load();
    for text in &cli.add_snippet {
        match snippet_store.add_and_save(&mut snippets, text, &mut tracker) {
            Ok(true) => audio.play(SoundEffect::SaveSettings),
            Ok(false) => {}
            Err(error) => log::warn!("Snippet {text:?} not added: {error}"),
        }
    }

    let practice = settings.practice().map(str::to_string);
    let filter = practice
        .clone()
        .map(|lang| Rc::new(PracticeFilter::new(Some(lang))) as Rc<dyn CategoryFilter>);

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let mut state = GameState::new(SessionConfig {
        seed,
        mode: settings.session_mode(),
        interaction: settings.interaction_mode,
        practice: filter,
        practice_language: practice,
        custom_snippets: snippets.as_slice().to_vec(),
        best_score: board.top_score().unwrap_or(0.0),
        ..Default::default()
    });
    log::info!("Game initialized with seed: {seed}");

    if !state.is_practice() {
        if let Some(snapshot) = progress_store.load(now_ms()) {
            snapshot.apply_to(&mut state);
        }
    }

    let mut bot = Bot::new(seed, cli.accuracy);

    let mut frame: u64 = 0;
    let mut summary = None;
    while !state.is_over() && state.elapsed_seconds < cli.max_seconds {
        let input = bot.input(&state);
        let events = tick(&mut state, &input, FRAME_MS);
        let wall_ms = (frame as f64 * FRAME_MS) as u64;
        frame += 1;

        bot.observe(&events);
        hooks::dispatch(&events, wall_ms, &mut tracker, &mut audio);
        for event in &events {
            progress_store.on_event(event, &state, now_ms());
            if let GameEvent::GameOver(s) = event {
                summary = Some(s.clone());
            }
        }
    }

    match summary {
        Some(summary) => {
            println!(
                "Session over: {:.1} points, {} missed, {}s, level {}, best combo {}",
                summary.final_score,
                summary.missed_count,
                summary.elapsed_seconds,
                summary.level,
                summary.max_combo
            );
            if summary.ranked && board.qualifies(summary.final_score) {
                if let Some(rank) = board.submit(&settings.player_name, summary.final_score) {
                    println!("New leaderboard entry at rank {rank}");
                }
                if leaderboard_store.save(&board) {
                    tracker.mark_first_save();
                }
            }
        }
        None => {
            println!(
                "Stopped after {}s with {:.1} points; progress saved",
                state.elapsed_seconds,
                state.score()
            );
            if !state.is_practice() {
                progress_store.save(&ProgressSnapshot::capture(&state, now_ms()));
            }
        }
    }

    if tracker.take_dirty() {
        achievement_store.save(tracker.record());
    }

    println!("\nRank  Name                  Score  Date");
    for (i, entry) in board.entries().iter().enumerate() {
        println!("{:>4}  {:<20}  {:>5.1}  {}", i + 1, entry.name, entry.score, entry.date);
    }
    if board.is_empty() {
        println!("  No logs.");
    }
}
