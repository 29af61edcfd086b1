use super::clock::MonotonicInstant;
use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};
use std::fmt;

/// Local calendar used to turn instants into day ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Days since 0001-01-01 in this calendar's local time.
    pub fn day_ordinal(&self, wall: DateTime<Utc>) -> i64 {
        wall.with_timezone(&self.offset).date_naive().num_days_from_ce() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarSnapshot {
    pub wall: DateTime<Utc>,
    pub monotonic: MonotonicInstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftStatus {
    Ok,
    SameDay,
    Forward { days: i64 },
    Backward,
}

impl fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftStatus::Ok => write!(f, "ok"),
            DriftStatus::SameDay => write!(f, "same-day"),
            DriftStatus::Forward { days } => write!(f, "forward+{days}d"),
            DriftStatus::Backward => write!(f, "backward"),
        }
    }
}

/// Tracks (wall, monotonic) ticks and flags wall-clock rollback.
///
/// A backward tick is rejected without replacing the last snapshot, so
/// rolling the clock back and forth cannot walk the reference day around.
#[derive(Debug, Clone, Default)]
pub struct CalendarValidator {
    calendar: Calendar,
    last: Option<CalendarSnapshot>,
}

impl CalendarValidator {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            last: None,
        }
    }

    /// Continues from a tick recorded in an earlier session.
    pub fn resume(calendar: Calendar, last: Option<CalendarSnapshot>) -> Self {
        Self { calendar, last }
    }

    pub fn last_snapshot(&self) -> Option<CalendarSnapshot> {
        self.last
    }

    pub fn record_tick(&mut self, wall: DateTime<Utc>, monotonic: MonotonicInstant) -> DriftStatus {
        let snapshot = CalendarSnapshot { wall, monotonic };
        let Some(previous) = self.last else {
            self.last = Some(snapshot);
            return DriftStatus::Ok;
        };

        let delta = self.calendar.day_ordinal(wall) - self.calendar.day_ordinal(previous.wall);
        if delta < 0 {
            return DriftStatus::Backward;
        }

        self.last = Some(snapshot);
        if delta == 0 {
            DriftStatus::SameDay
        } else {
            DriftStatus::Forward { days: delta }
        }
    }
}
