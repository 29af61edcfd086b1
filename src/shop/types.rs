use crate::economy::MeritState;
use std::fmt;

/// Merit plus the coupon balance used at the shop.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub merit: MeritState,
    pub coupons: f64,
    /// Coupons needed per unit of cost; 0.8 means one cost takes 0.8 coupons.
    pub vip_rate: f64,
}

impl Wallet {
    pub fn new(merit: MeritState, coupons: f64, vip_rate: f64) -> Self {
        Self {
            merit,
            coupons: coupons.max(0.0),
            vip_rate: vip_rate.max(0.0),
        }
    }

    /// Merit that can still be spent, counting the allowed debt.
    pub fn merit_capacity(&self) -> f64 {
        (self.merit.balance() - self.merit.debt_limit()).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PurchaseOutcome {
    Success {
        spent_merit: f64,
        spent_coupons: f64,
        /// Informational bookkeeping cost of paying with coupons.
        ledger_penalty: f64,
    },
    DebtLimitReached {
        current: f64,
        limit: f64,
    },
    InsufficientCoupons,
    InvalidAmount,
}

impl PurchaseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PurchaseOutcome::Success { .. })
    }
}

impl fmt::Display for PurchaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseOutcome::Success {
                spent_merit,
                spent_coupons,
                ledger_penalty,
            } => write!(
                f,
                "success merit={spent_merit} coupons={spent_coupons} penalty={ledger_penalty}"
            ),
            PurchaseOutcome::DebtLimitReached { current, limit } => {
                write!(f, "debt-limit (merit={current}, limit={limit})")
            }
            PurchaseOutcome::InsufficientCoupons => write!(f, "insufficient-coupons"),
            PurchaseOutcome::InvalidAmount => write!(f, "invalid-amount"),
        }
    }
}
