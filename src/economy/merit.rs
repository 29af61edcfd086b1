use crate::core::constants::{DEFAULT_DAILY_GRANT, DEFAULT_MERIT_CAP, MERIT_EPSILON};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Merit balance with its cap, daily grant and the two secondary pools.
///
/// The balance may go negative down to the debt limit, which is always the
/// negated daily grant. Only `grant_daily` and `spend` move the balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritState {
    balance: f64,
    pub cap: f64,
    pub daily_grant: f64,
    pub reserve: f64,
    pub overflow_buffer: f64,
}

impl Default for MeritState {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_MERIT_CAP, DEFAULT_DAILY_GRANT)
    }
}

/// Split of one daily grant between the balance and the overflow buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyGrant {
    pub granted: f64,
    pub overflow: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpendOutcome {
    Success { remaining: f64 },
    DebtLimitReached { current: f64, limit: f64 },
    InvalidAmount,
}

impl fmt::Display for SpendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpendOutcome::Success { remaining } => write!(f, "success (merit={remaining})"),
            SpendOutcome::DebtLimitReached { current, limit } => {
                write!(f, "debt-limit-reached (merit={current}, limit={limit})")
            }
            SpendOutcome::InvalidAmount => write!(f, "invalid-amount"),
        }
    }
}

impl MeritState {
    pub fn new(balance: f64, cap: f64, daily_grant: f64) -> Self {
        Self {
            balance,
            cap: cap.max(1.0),
            daily_grant,
            reserve: 0.0,
            overflow_buffer: 0.0,
        }
    }

    pub fn with_pools(mut self, reserve: f64, overflow_buffer: f64) -> Self {
        self.reserve = reserve;
        self.overflow_buffer = overflow_buffer;
        self
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Lowest balance a spend may leave behind.
    pub fn debt_limit(&self) -> f64 {
        -self.daily_grant
    }

    /// Grants the daily amount; whatever would exceed the cap goes to the
    /// overflow buffer instead.
    pub fn grant_daily(&mut self) -> DailyGrant {
        let headroom = (self.cap - self.balance).max(0.0);
        let granted = self.daily_grant.min(headroom);
        let overflow = (self.daily_grant - granted).max(0.0);

        self.balance += granted;
        self.overflow_buffer += overflow;

        DailyGrant { granted, overflow }
    }

    pub fn spend(&mut self, amount: f64) -> SpendOutcome {
        if amount < 0.0 || amount.is_nan() {
            return SpendOutcome::InvalidAmount;
        }

        let projected = self.balance - amount;
        if projected < self.debt_limit() - MERIT_EPSILON {
            return SpendOutcome::DebtLimitReached {
                current: self.balance,
                limit: self.debt_limit(),
            };
        }

        self.balance = projected.max(self.debt_limit());
        SpendOutcome::Success {
            remaining: self.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_daily_below_cap() {
        let mut merit = MeritState::new(0.0, 1000.0, 120.0);
        let grant = merit.grant_daily();
        assert_eq!(grant, DailyGrant { granted: 120.0, overflow: 0.0 });
        assert_eq!(merit.balance(), 120.0);
        assert_eq!(merit.overflow_buffer, 0.0);
    }

    #[test]
    fn test_grant_daily_routes_excess_to_overflow() {
        let mut merit = MeritState::new(950.0, 1000.0, 120.0);
        let grant = merit.grant_daily();
        assert_eq!(grant.granted, 50.0);
        assert_eq!(grant.overflow, 70.0);
        assert_eq!(merit.balance(), 1000.0);
        assert_eq!(merit.overflow_buffer, 70.0);
    }

    #[test]
    fn test_grant_daily_above_cap_grants_nothing() {
        let mut merit = MeritState::new(1200.0, 1000.0, 120.0);
        let grant = merit.grant_daily();
        assert_eq!(grant.granted, 0.0);
        assert_eq!(grant.overflow, 120.0);
        assert_eq!(merit.balance(), 1200.0);
    }

    #[test]
    fn test_spend_into_debt_up_to_limit() {
        let mut merit = MeritState::new(0.0, 100.0, 50.0);
        assert_eq!(merit.spend(50.0), SpendOutcome::Success { remaining: -50.0 });
        assert_eq!(
            merit.spend(0.01),
            SpendOutcome::DebtLimitReached {
                current: -50.0,
                limit: -50.0
            }
        );
        assert_eq!(merit.balance(), -50.0);
    }

    #[test]
    fn test_spend_of_full_capacity_lands_on_limit() {
        let mut merit = MeritState::new(0.1, 1000.0, 120.0);
        let capacity = merit.balance() - merit.debt_limit();
        assert!(matches!(merit.spend(capacity), SpendOutcome::Success { .. }));
        assert!(merit.balance() >= merit.debt_limit());
        assert!((merit.balance() + 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_spend_negative_is_invalid() {
        let mut merit = MeritState::new(10.0, 100.0, 50.0);
        assert_eq!(merit.spend(-1.0), SpendOutcome::InvalidAmount);
        assert_eq!(merit.balance(), 10.0);
    }

    #[test]
    fn test_cap_floor_is_one() {
        let merit = MeritState::new(0.0, 0.0, 10.0);
        assert_eq!(merit.cap, 1.0);
    }
}
