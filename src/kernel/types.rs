use crate::gacha::GachaOutcome;
use crate::save::SaveState;
use crate::shop::PurchaseOutcome;
use std::fmt;

/// Result of a kernel operation: the updated snapshot plus what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub state: SaveState,
    pub outcome: T,
}

impl<T> Transition<T> {
    pub fn new(state: SaveState, outcome: T) -> Self {
        Self { state, outcome }
    }

    pub fn into_parts(self) -> (SaveState, T) {
        (self.state, self.outcome)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PullOutcome {
    /// `item_ids[i]` is the inventory id created for `results[i]`.
    Pulled {
        results: Vec<GachaOutcome>,
        item_ids: Vec<String>,
        payment: PurchaseOutcome,
    },
    PaymentDeclined(PurchaseOutcome),
}

impl PullOutcome {
    pub fn results(&self) -> &[GachaOutcome] {
        match self {
            PullOutcome::Pulled { results, .. } => results,
            PullOutcome::PaymentDeclined(_) => &[],
        }
    }
}

impl fmt::Display for PullOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullOutcome::Pulled { results, payment, .. } => {
                write!(f, "pulled {} ({payment})", results.len())
            }
            PullOutcome::PaymentDeclined(payment) => write!(f, "pull declined: {payment}"),
        }
    }
}
