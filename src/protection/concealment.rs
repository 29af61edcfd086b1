use crate::core::constants::{DEFAULT_CONCEALMENT_MULTIPLIER, DEFAULT_CONCEALMENT_SECONDS};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ConcealmentState {
    #[default]
    Inactive,
    Active {
        multiplier: f64,
        /// `None` keeps the modifier until it is deactivated.
        #[serde(rename = "expiresAt")]
        expires_at: Option<DateTime<Utc>>,
    },
}

/// Time-limited modifier that lets s2/s3 events slip past as s1.
///
/// Expiry is lazy: the state flips to inactive the first time the
/// multiplier is read at or after `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConcealmentService {
    state: ConcealmentState,
}

impl ConcealmentService {
    pub fn restore(state: ConcealmentState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> ConcealmentState {
        self.state
    }

    /// Starts concealment with an evasion multiplier in [0, 1].
    pub fn activate(&mut self, multiplier: f64, duration: Option<Duration>, now: DateTime<Utc>) {
        let multiplier = if multiplier.is_nan() { 1.0 } else { multiplier.clamp(0.0, 1.0) };
        let expires_at = duration.map(|d| now + d);
        self.state = ConcealmentState::Active {
            multiplier,
            expires_at,
        };
        debug!(multiplier, ?expires_at, "concealment active");
    }

    /// Half evasion for one hour.
    pub fn activate_default(&mut self, now: DateTime<Utc>) {
        self.activate(
            DEFAULT_CONCEALMENT_MULTIPLIER,
            Some(Duration::seconds(DEFAULT_CONCEALMENT_SECONDS)),
            now,
        );
    }

    pub fn deactivate(&mut self) {
        self.state = ConcealmentState::Inactive;
    }

    pub fn current_multiplier(&mut self, now: DateTime<Utc>) -> f64 {
        match self.state {
            ConcealmentState::Inactive => 1.0,
            ConcealmentState::Active {
                expires_at: Some(expiry),
                ..
            } if now >= expiry => {
                debug!(%expiry, "concealment expired");
                self.deactivate();
                1.0
            }
            ConcealmentState::Active { multiplier, .. } => multiplier,
        }
    }

    pub fn is_active(&mut self, now: DateTime<Utc>) -> bool {
        self.current_multiplier(now) < 1.0
    }
}
