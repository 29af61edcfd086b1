use super::luck::LuckScore;
use crate::core::constants::{BACKLASH_PENALTY_CAP, BACKLASH_PENALTY_PER_POINT};
use serde::{Deserialize, Serialize};

/// Accumulated backlash from paid auguries. Each point costs 5 luck, up to 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BacklashState {
    points: u32,
}

impl BacklashState {
    pub fn new(points: u32) -> Self {
        Self { points }
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn add_points(&mut self, delta: u32) {
        self.points = self.points.saturating_add(delta);
    }

    /// Removes up to `amount` points and returns the new total.
    pub fn cleanse(&mut self, amount: u32) -> u32 {
        self.points = self.points.saturating_sub(amount);
        self.points
    }

    pub fn luck_penalty(&self) -> f64 {
        (self.points as f64 * BACKLASH_PENALTY_PER_POINT).min(BACKLASH_PENALTY_CAP)
    }

    pub fn effective_luck(&self, base: LuckScore) -> LuckScore {
        LuckScore::clamped(base.value() - self.luck_penalty())
    }
}
