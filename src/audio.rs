//! Sound effects
//!
//! Procedurally described tones - no external files needed! The manager
//! turns simulation events into tone sequences and hands them to a
//! backend. Playback is best-effort: backend errors never reach the game.

use crate::error::AudioError;
use crate::sim::state::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Entity resolved
    Click,
    /// Streak at or past the display threshold; pitch rises with the count
    Combo(u32),
    /// Entity crossed the top
    Miss,
    /// Streak hit 20, 50 or 100
    PerfectCombo(u32),
    LevelUp,
    /// Pointer paused an entity
    Pause,
    CheatActivated,
    LowStability,
    NearFail,
    NewRecord,
    GameOver,
    /// Settings or custom snippets written
    SaveSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator note with an exponential gain decay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    /// Hz at start
    pub freq: f32,
    /// Hz at end; equal to `freq` for a flat note
    pub freq_end: f32,
    /// Offset from the start of the effect, seconds
    pub start: f32,
    pub duration: f32,
    /// Peak gain before master volume
    pub gain: f32,
}

impl Tone {
    fn note(waveform: Waveform, freq: f32, start: f32, duration: f32, gain: f32) -> Self {
        Self {
            waveform,
            freq,
            freq_end: freq,
            start,
            duration,
            gain,
        }
    }
}

/// Notes played one after another at a fixed spacing
fn arpeggio(waveform: Waveform, freqs: &[f32], spacing: f32, duration: f32, gain: f32) -> Vec<Tone> {
    freqs
        .iter()
        .enumerate()
        .map(|(i, &f)| Tone::note(waveform, f, i as f32 * spacing, duration, gain))
        .collect()
}

impl SoundEffect {
    /// Tone sequence for this effect
    pub fn tones(&self) -> Vec<Tone> {
        use Waveform::*;
        match *self {
            SoundEffect::Click => vec![Tone::note(Sine, 800.0, 0.0, 0.05, 0.3)],
            SoundEffect::Combo(count) => {
                let freq = (600.0 + count as f32 * 50.0).min(2000.0);
                let gain = (0.2 + count as f32 * 0.02).min(1.0);
                vec![Tone::note(Square, freq, 0.0, 0.15, gain)]
            }
            SoundEffect::Miss => vec![Tone {
                freq_end: 100.0,
                ..Tone::note(Sawtooth, 200.0, 0.0, 0.2, 0.4)
            }],
            SoundEffect::PerfectCombo(milestone) => {
                let freqs: &[f32] = if milestone >= 50 {
                    &[1046.5, 1318.51, 1567.98, 2093.0]
                } else {
                    &[783.99, 987.77, 1174.66, 1567.98]
                };
                arpeggio(Sine, freqs, 0.06, 0.25, 0.4)
            }
            SoundEffect::LevelUp => arpeggio(Triangle, &[440.0, 554.37, 659.25, 880.0], 0.08, 0.2, 0.35),
            SoundEffect::Pause => vec![Tone::note(Square, 500.0, 0.0, 0.08, 0.2)],
            SoundEffect::CheatActivated => arpeggio(Triangle, &[700.0, 1200.0, 700.0], 0.1, 0.12, 0.3),
            SoundEffect::LowStability => vec![Tone::note(Sawtooth, 150.0, 0.0, 0.3, 0.3)],
            SoundEffect::NearFail => arpeggio(Square, &[250.0, 250.0], 0.12, 0.1, 0.3),
            SoundEffect::NewRecord => arpeggio(
                Sine,
                &[523.25, 659.25, 783.99, 1046.5, 1318.51],
                0.09,
                0.35,
                0.3,
            ),
            SoundEffect::GameOver => arpeggio(Triangle, &[400.0, 300.0, 200.0], 0.15, 0.15, 0.3),
            SoundEffect::SaveSettings => arpeggio(Sine, &[600.0, 800.0], 0.08, 0.15, 0.25),
        }
    }
}

/// Sound cue for a simulation event, if it has one
pub fn effect_for(event: &GameEvent) -> Option<SoundEffect> {
    match event {
        GameEvent::Hit { .. } => Some(SoundEffect::Click),
        GameEvent::ComboChanged { count } => Some(SoundEffect::Combo(*count)),
        GameEvent::ComboMilestone { count } => Some(SoundEffect::PerfectCombo(*count)),
        GameEvent::Missed { .. } => Some(SoundEffect::Miss),
        GameEvent::Hovered { .. } => Some(SoundEffect::Pause),
        GameEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
        GameEvent::CheatActivated { .. } => Some(SoundEffect::CheatActivated),
        GameEvent::LowStability { .. } => Some(SoundEffect::LowStability),
        GameEvent::NearFail { .. } => Some(SoundEffect::NearFail),
        GameEvent::NewRecord { .. } => Some(SoundEffect::NewRecord),
        GameEvent::GameOver(_) => Some(SoundEffect::GameOver),
        _ => None,
    }
}

/// Output device
pub trait SoundBackend {
    /// Gains are already scaled by the effective volume
    fn play_tones(&mut self, tones: &[Tone]) -> Result<(), AudioError>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl SoundBackend for NullBackend {
    fn play_tones(&mut self, _tones: &[Tone]) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Writes each tone to the debug log (headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogBackend;

impl SoundBackend for LogBackend {
    fn play_tones(&mut self, tones: &[Tone]) -> Result<(), AudioError> {
        for tone in tones {
            log::debug!(
                "tone {:?} {:.0}Hz +{:.2}s for {:.2}s gain {:.2}",
                tone.waveform,
                tone.freq,
                tone.start,
                tone.duration,
                tone.gain
            );
        }
        Ok(())
    }
}

/// Receiver of simulation events for sound cues
pub trait SoundSink {
    fn on_event(&mut self, event: &GameEvent);
}

/// Audio manager for the game
#[derive(Debug)]
pub struct AudioManager<B: SoundBackend> {
    backend: B,
    master_volume: f32,
    muted: bool,
}

impl<B: SoundBackend> AudioManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            master_volume: 0.8,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let tones: Vec<Tone> = effect
            .tones()
            .into_iter()
            .map(|t| Tone {
                gain: (t.gain * vol).min(vol),
                ..t
            })
            .collect();
        if let Err(error) = self.backend.play_tones(&tones) {
            log::trace!("Dropped {effect:?}: {error}");
        }
    }
}

impl<B: SoundBackend> SoundSink for AudioManager<B> {
    fn on_event(&mut self, event: &GameEvent) {
        if let Some(effect) = effect_for(event) {
            self.play(effect);
        }
    }
}
