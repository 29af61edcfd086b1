use chrono::{DateTime, Duration, Utc};
use std::time::Instant;

/// Seconds on a monotonic timeline. Never affected by wall-clock changes,
/// but only comparable within one process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct MonotonicInstant {
    pub seconds: f64,
}

impl MonotonicInstant {
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Elapsed seconds since `earlier`, never negative.
    pub fn elapsed_since(&self, earlier: MonotonicInstant) -> f64 {
        (self.seconds - earlier.seconds).max(0.0)
    }

    pub fn plus_seconds(&self, seconds: f64) -> Self {
        Self {
            seconds: self.seconds + seconds,
        }
    }
}

/// Source of wall-clock and monotonic readings.
pub trait Clock {
    fn wall_now(&self) -> DateTime<Utc>;
    fn monotonic_now(&self) -> MonotonicInstant;
}

/// Real clocks; the monotonic origin is the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic_now(&self) -> MonotonicInstant {
        MonotonicInstant::from_seconds(self.origin.elapsed().as_secs_f64())
    }
}

/// Hand-driven clock for tests and replays. Wall time can be moved
/// independently of monotonic time to simulate clock tampering.
#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    wall: DateTime<Utc>,
    monotonic: MonotonicInstant,
}

impl ManualClock {
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            wall,
            monotonic: MonotonicInstant::default(),
        }
    }

    /// Moves both clocks forward together.
    pub fn advance(&mut self, by: Duration) {
        self.wall += by;
        self.monotonic = self.monotonic.plus_seconds(by.num_milliseconds() as f64 / 1000.0);
    }

    /// Sets only the wall clock.
    pub fn set_wall(&mut self, wall: DateTime<Utc>) {
        self.wall = wall;
    }
}

impl Clock for ManualClock {
    fn wall_now(&self) -> DateTime<Utc> {
        self.wall
    }

    fn monotonic_now(&self) -> MonotonicInstant {
        self.monotonic
    }
}
