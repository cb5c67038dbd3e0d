//! Cheat codes typed outside the typing box

/// Rolling buffer length for code detection
const BUFFER_LEN: usize = 50;

/// Invincibility duration
pub const WALL_HACK_MS: f64 = 120_000.0;
/// Auto-bonus duration
pub const MONEY_HACK_MS: f64 = 60_000.0;
/// Auto-bonus cadence
pub const MONEY_TICK_MS: f64 = 1000.0;
/// Speed factor applied by the kernel patch
pub const KERNEL_PATCH_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cheat {
    /// Entities hang at the miss threshold instead of being missed
    WallHack,
    /// Periodic non-hit bonus
    MoneyHack,
    /// One-off slowdown
    KernelPatch,
}

impl Cheat {
    pub fn code(&self) -> &'static str {
        match self {
            Cheat::WallHack => "black sheep wall",
            Cheat::MoneyHack => "show me money",
            Cheat::KernelPatch => "coffee",
        }
    }

    pub fn banner(&self) -> &'static str {
        match self {
            Cheat::WallHack => "WALL HACK: INVINCIBLE (2m)",
            Cheat::MoneyHack => "MONEY HACK: AUTO-FARM (1m)",
            Cheat::KernelPatch => "KERNEL PATCH: PERFORMANCE BOOST",
        }
    }

    const ALL: [Cheat; 3] = [Cheat::WallHack, Cheat::MoneyHack, Cheat::KernelPatch];
}

/// What happened to the timers during one advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheatTimers {
    pub wall_expired: bool,
    pub money_expired: bool,
    /// Bonus payouts due
    pub money_ticks: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CheatState {
    buffer: String,
    wall_remaining_ms: f64,
    money_remaining_ms: f64,
    money_accum_ms: f64,
}

impl CheatState {
    pub fn wall_active(&self) -> bool {
        self.wall_remaining_ms > 0.0
    }

    pub fn money_active(&self) -> bool {
        self.money_remaining_ms > 0.0
    }

    /// Feed one typed character; returns the cheat it completed, if any
    pub fn feed(&mut self, ch: char) -> Option<Cheat> {
        self.buffer.extend(ch.to_lowercase());
        let overflow = self.buffer.chars().count().saturating_sub(BUFFER_LEN);
        if overflow > 0 {
            self.buffer = self.buffer.chars().skip(overflow).collect();
        }

        let cheat = Cheat::ALL
            .into_iter()
            .find(|cheat| self.buffer.ends_with(cheat.code()))?;
        self.buffer.clear();
        self.activate(cheat);
        Some(cheat)
    }

    /// Start (or restart) a cheat's timer. The kernel patch has none.
    pub fn activate(&mut self, cheat: Cheat) {
        match cheat {
            Cheat::WallHack => self.wall_remaining_ms = WALL_HACK_MS,
            Cheat::MoneyHack => {
                self.money_remaining_ms = MONEY_HACK_MS;
                self.money_accum_ms = 0.0;
            }
            Cheat::KernelPatch => {}
        }
    }

    /// Advance timers by `dt_ms` of session time
    pub fn advance(&mut self, dt_ms: f64) -> CheatTimers {
        let mut timers = CheatTimers::default();

        if self.wall_active() {
            self.wall_remaining_ms -= dt_ms;
            if !self.wall_active() {
                self.wall_remaining_ms = 0.0;
                timers.wall_expired = true;
            }
        }

        if self.money_active() {
            let live_ms = dt_ms.min(self.money_remaining_ms);
            self.money_accum_ms += live_ms;
            while self.money_accum_ms >= MONEY_TICK_MS {
                self.money_accum_ms -= MONEY_TICK_MS;
                timers.money_ticks += 1;
            }
            self.money_remaining_ms -= dt_ms;
            if !self.money_active() {
                self.money_remaining_ms = 0.0;
                self.money_accum_ms = 0.0;
                timers.money_expired = true;
            }
        }

        timers
    }

    /// Cancel every running timer (game over)
    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}
