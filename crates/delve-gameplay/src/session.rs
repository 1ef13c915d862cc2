//! Per-run counters: health, treasures and elapsed time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the run currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Still in progress
    #[default]
    Playing,
    /// Enough treasure collected
    Victory,
    /// Health ran out
    GameOver,
}

impl Outcome {
    /// Returns `true` once the run has ended.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Playing => "playing",
            Self::Victory => "victory",
            Self::GameOver => "game over",
        };
        f.write_str(name)
    }
}

/// Counters for a single run. Reset by replacing the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current health; may drop below zero
    pub health: i32,
    /// Starting health
    pub max_health: i32,
    /// Treasures picked up so far
    pub treasures_collected: u32,
    /// Game time in milliseconds
    pub elapsed_ms: u64,
    /// Ticks simulated
    pub ticks: u64,
}

impl SessionState {
    /// Starts a run at full health.
    #[must_use]
    pub fn new(max_health: i32) -> Self {
        Self {
            health: max_health,
            max_health,
            treasures_collected: 0,
            elapsed_ms: 0,
            ticks: 0,
        }
    }

    /// Subtracts `amount` from health.
    pub fn apply_damage(&mut self, amount: i32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Adds collected treasures.
    pub fn collect(&mut self, count: u32) {
        self.treasures_collected = self.treasures_collected.saturating_add(count);
    }

    /// Records one tick of `dt_ms` milliseconds.
    pub fn advance(&mut self, dt_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        self.ticks = self.ticks.saturating_add(1);
    }

    /// Derives the outcome. Game over takes precedence over victory.
    #[must_use]
    pub fn outcome(&self, treasures_to_win: u32) -> Outcome {
        if self.health <= 0 {
            Outcome::GameOver
        } else if self.treasures_collected >= treasures_to_win {
            Outcome::Victory
        } else {
            Outcome::Playing
        }
    }

    /// Health as a fraction of the maximum, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }

    /// Elapsed game time in whole seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_ms / 1000
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(100)
    }
}
