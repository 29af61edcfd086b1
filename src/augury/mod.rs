//! Daily augury: one free reading per day, then an escalating price ladder
//! where every paid reading adds backlash.

use crate::core::constants::{AUGURY_BACKLASH_PER_PAID_USE, AUGURY_BASE_COST, AUGURY_COST_INCREMENT};
use crate::economy::BacklashState;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuguryPricing {
    pub base_cost: f64,
    pub increment: f64,
}

impl Default for AuguryPricing {
    fn default() -> Self {
        Self {
            base_cost: AUGURY_BASE_COST,
            increment: AUGURY_COST_INCREMENT,
        }
    }
}

impl AuguryPricing {
    /// Price of the `paid_count`-th paid reading (1-based). Zero is free.
    pub fn cost(&self, paid_count: u32) -> f64 {
        if paid_count == 0 {
            return 0.0;
        }
        self.base_cost + self.increment * (paid_count - 1) as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuguryOutcome {
    Free,
    Paid { cost: f64, backlash_added: u32 },
}

impl fmt::Display for AuguryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuguryOutcome::Free => write!(f, "augury-free"),
            AuguryOutcome::Paid {
                cost,
                backlash_added,
            } => write!(f, "augury-paid cost={cost} backlash+{backlash_added}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuguryService {
    pricing: AuguryPricing,
    uses_today: u32,
}

impl AuguryService {
    pub fn new(pricing: AuguryPricing) -> Self {
        Self {
            pricing,
            uses_today: 0,
        }
    }

    pub fn uses_today(&self) -> u32 {
        self.uses_today
    }

    /// Called by the owner once per calendar day.
    pub fn reset_daily(&mut self) {
        self.uses_today = 0;
    }

    /// Performs one reading. The free reading still counts toward the ladder,
    /// so the first paid reading costs `base_cost`.
    pub fn perform(&mut self, backlash: &mut BacklashState) -> AuguryOutcome {
        if self.uses_today == 0 {
            self.uses_today = 1;
            return AuguryOutcome::Free;
        }

        let cost = self.pricing.cost(self.uses_today);
        self.uses_today += 1;
        backlash.add_points(AUGURY_BACKLASH_PER_PAID_USE);
        AuguryOutcome::Paid {
            cost,
            backlash_added: AUGURY_BACKLASH_PER_PAID_USE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reading_is_free_and_adds_no_backlash() {
        let mut service = AuguryService::default();
        let mut backlash = BacklashState::default();
        assert_eq!(service.perform(&mut backlash), AuguryOutcome::Free);
        assert_eq!(backlash.points(), 0);
    }

    #[test]
    fn test_paid_ladder_increases() {
        let mut service = AuguryService::default();
        let mut backlash = BacklashState::default();
        service.perform(&mut backlash);

        let costs: Vec<f64> = (0..3)
            .map(|_| match service.perform(&mut backlash) {
                AuguryOutcome::Paid { cost, backlash_added } => {
                    assert_eq!(backlash_added, 1);
                    cost
                }
                AuguryOutcome::Free => panic!("only the first reading is free"),
            })
            .collect();

        assert_eq!(costs, vec![50.0, 75.0, 100.0]);
        assert_eq!(backlash.points(), 3);
    }

    #[test]
    fn test_reset_daily_restores_free_reading() {
        let mut service = AuguryService::default();
        let mut backlash = BacklashState::default();
        service.perform(&mut backlash);
        service.perform(&mut backlash);
        service.reset_daily();
        assert_eq!(service.perform(&mut backlash), AuguryOutcome::Free);
        assert_eq!(backlash.points(), 1);
    }

    #[test]
    fn test_cost_of_zero_is_free() {
        assert_eq!(AuguryPricing::default().cost(0), 0.0);
    }
}
