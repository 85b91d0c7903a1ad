use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Moments the engine pauses at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After each walker step, before reading the next focus.
    Step,
    /// After a single key press.
    Key,
    /// After opening a combobox popup.
    Popup,
    /// After typing a chip token, so suggestions can render.
    Suggestions,
    /// After committing a value.
    Commit,
}

/// Delay policy. Production uses randomized human timing, tests use none.
pub trait Pacer {
    /// Per-keystroke delay for a normal typing burst.
    fn keystroke_ms(&mut self) -> u64;
    /// Per-keystroke delay for a verification retype.
    fn slow_keystroke_ms(&mut self) -> u64;
    fn pause(&mut self, pause: Pause);
}

/// Randomized timing in human ranges.
pub struct HumanPacer {
    rng: StdRng,
}

impl HumanPacer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible timing.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn range(pause: Pause) -> (u64, u64) {
        match pause {
            Pause::Step => (30, 120),
            Pause::Key => (50, 80),
            Pause::Popup => (100, 140),
            Pause::Suggestions => (120, 260),
            Pause::Commit => (90, 160),
        }
    }
}

impl Default for HumanPacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer for HumanPacer {
    fn keystroke_ms(&mut self) -> u64 {
        self.rng.gen_range(15..=40)
    }

    fn slow_keystroke_ms(&mut self) -> u64 {
        self.rng.gen_range(60..=120)
    }

    fn pause(&mut self, pause: Pause) {
        let (lo, hi) = Self::range(pause);
        let ms = self.rng.gen_range(lo..=hi);
        thread::sleep(Duration::from_millis(ms));
    }
}

/// No waiting at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn keystroke_ms(&mut self) -> u64 {
        0
    }

    fn slow_keystroke_ms(&mut self) -> u64 {
        0
    }

    fn pause(&mut self, _pause: Pause) {}
}
