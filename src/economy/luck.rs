use super::merit::MeritState;
use crate::core::constants::{LUCK_MAX, LUCK_MIN, LUCK_MULTIPLIER_HALVING};
use serde::{Deserialize, Serialize};

/// Luck in [-100, 100], always derived from the merit balance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LuckScore(f64);

impl LuckScore {
    pub fn clamped(value: f64) -> Self {
        Self(value.clamp(LUCK_MIN, LUCK_MAX))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Scales favourable outcomes: doubles every +50 luck.
    pub fn good_multiplier(&self) -> f64 {
        2f64.powf(self.0 / LUCK_MULTIPLIER_HALVING)
    }

    /// Scales harmful outcomes: doubles every -50 luck.
    pub fn bad_multiplier(&self) -> f64 {
        2f64.powf(-self.0 / LUCK_MULTIPLIER_HALVING)
    }
}

/// Smooth tanh curve from merit balance to luck, with separate scales for the
/// positive and negative sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuckMapping {
    positive_scale: f64,
    negative_scale: f64,
}

impl LuckMapping {
    pub fn new(positive_scale: f64, negative_scale: f64) -> Self {
        Self {
            positive_scale: positive_scale.max(1.0),
            negative_scale: negative_scale.max(1.0),
        }
    }

    /// Cap drives the positive side, the debt limit the negative side.
    pub fn for_merit(merit: &MeritState) -> Self {
        Self::new(merit.cap, merit.debt_limit().abs())
    }

    pub fn map(&self, balance: f64) -> LuckScore {
        if balance >= 0.0 {
            LuckScore::clamped(100.0 * (balance / self.positive_scale).tanh())
        } else {
            LuckScore::clamped(-100.0 * (balance.abs() / self.negative_scale).tanh())
        }
    }
}
