use super::calendar::{Calendar, CalendarSnapshot, CalendarValidator, DriftStatus};
use super::clock::MonotonicInstant;
use crate::economy::MeritState;
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrantStatus {
    /// One grant per elapsed calendar day since the last claim.
    Granted {
        days: u32,
        total_granted: f64,
        total_overflow: f64,
    },
    AlreadyClaimed,
    BackwardTimeDetected,
    InvalidInput,
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantStatus::Granted {
                days,
                total_granted,
                total_overflow,
            } => write!(
                f,
                "granted {total_granted} over {days}d (overflow {total_overflow})"
            ),
            GrantStatus::AlreadyClaimed => write!(f, "already claimed today"),
            GrantStatus::BackwardTimeDetected => write!(f, "wall clock moved backward"),
            GrantStatus::InvalidInput => write!(f, "invalid clock reading"),
        }
    }
}

/// Pays the daily merit grant once per calendar day, catching up on missed
/// days and refusing to pay when the wall clock has been rolled back.
#[derive(Debug, Clone, Default)]
pub struct DailyRewardService {
    calendar: Calendar,
    validator: CalendarValidator,
    last_grant: Option<DateTime<Utc>>,
}

impl DailyRewardService {
    pub fn new(calendar: Calendar) -> Self {
        Self::restore(calendar, None)
    }

    /// Rebuilds the service from the wall time of the last paid grant, which
    /// also becomes the reference tick for rollback detection.
    pub fn restore(calendar: Calendar, last_grant: Option<DateTime<Utc>>) -> Self {
        let last_tick = last_grant.map(|wall| CalendarSnapshot {
            wall,
            monotonic: MonotonicInstant::default(),
        });
        Self {
            calendar,
            validator: CalendarValidator::resume(calendar, last_tick),
            last_grant,
        }
    }

    pub fn last_grant(&self) -> Option<DateTime<Utc>> {
        self.last_grant
    }

    pub fn attempt_grant(
        &mut self,
        wall: DateTime<Utc>,
        monotonic: MonotonicInstant,
        merit: &mut MeritState,
    ) -> GrantStatus {
        if !monotonic.seconds.is_finite() || monotonic.seconds < 0.0 {
            warn!(seconds = monotonic.seconds, "rejecting monotonic reading");
            return GrantStatus::InvalidInput;
        }

        if self.validator.record_tick(wall, monotonic) == DriftStatus::Backward {
            warn!(%wall, "backward wall clock, daily grant withheld");
            return GrantStatus::BackwardTimeDetected;
        }

        let today = self.calendar.day_ordinal(wall);
        let days = match self.last_grant {
            None => 1,
            Some(last) => {
                let elapsed = today - self.calendar.day_ordinal(last);
                if elapsed <= 0 {
                    return GrantStatus::AlreadyClaimed;
                }
                elapsed
            }
        };

        let mut total_granted = 0.0;
        let mut total_overflow = 0.0;
        for _ in 0..days {
            let grant = merit.grant_daily();
            total_granted += grant.granted;
            total_overflow += grant.overflow;
        }
        self.last_grant = Some(wall);

        debug!(days, total_granted, total_overflow, "daily grant paid");
        GrantStatus::Granted {
            days: u32::try_from(days).unwrap_or(u32::MAX),
            total_granted,
            total_overflow,
        }
    }
}
