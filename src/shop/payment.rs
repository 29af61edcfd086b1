use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResult {
    Success,
    Blocked(String),
}

impl fmt::Display for PaymentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentResult::Success => write!(f, "success"),
            PaymentResult::Blocked(reason) => write!(f, "blocked({reason})"),
        }
    }
}

/// Local stand-in for a store integration. Never moves real money.
#[derive(Debug, Clone)]
pub struct PaymentDebugService {
    enabled: bool,
}

impl Default for PaymentDebugService {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl PaymentDebugService {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn process(&self, amount: f64) -> PaymentResult {
        if !self.enabled {
            warn!(amount, "debug payment disabled");
            return PaymentResult::Blocked("debug-payment-disabled".to_string());
        }
        if amount < 0.0 || amount.is_nan() {
            return PaymentResult::Blocked("invalid-amount".to_string());
        }
        PaymentResult::Success
    }
}
