use super::report_log::EventReportLog;
use super::sampler::{SeveritySampler, WeightedSeverity};
use super::types::*;
use crate::core::config::EventConfig;
use crate::core::constants::{
    MAX_EVENT_WINDOW_HOURS, S2_BUFFER_COST, S2_RESERVE_COST, S3_BUFFER_COST, S3_RESERVE_COST,
};
use crate::economy::{LuckScore, MeritState};
use crate::protection::{ConcealmentService, DefenseService};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, info};

/// What protection absorbed a high-severity event, if anything.
struct Protection {
    consumed_reserve: f64,
    consumed_buffer: f64,
    defense_charge_used: bool,
}

impl Protection {
    fn none() -> Self {
        Self {
            consumed_reserve: 0.0,
            consumed_buffer: 0.0,
            defense_charge_used: false,
        }
    }

    fn applied(&self) -> bool {
        self.consumed_reserve > 0.0 || self.consumed_buffer > 0.0 || self.defense_charge_used
    }
}

/// Hourly risk roll: luck-weighted severity, concealment, the s3 cooldown,
/// ordered protection and the rescue window after an unmitigated s3.
pub struct EventEngine {
    config: EventConfig,
    sampler: Box<dyn SeveritySampler>,
    last_s3: Option<DateTime<Utc>>,
    rescue_deadline: Option<DateTime<Utc>>,
    concealment: ConcealmentService,
    defense: DefenseService,
    reports: EventReportLog,
}

impl EventEngine {
    pub fn new(config: EventConfig, report_capacity: usize) -> Self {
        let sampler = WeightedSeverity::new(config.weights);
        Self::with_sampler(config, report_capacity, Box::new(sampler))
    }

    pub fn with_sampler(
        config: EventConfig,
        report_capacity: usize,
        sampler: Box<dyn SeveritySampler>,
    ) -> Self {
        Self {
            config,
            sampler,
            last_s3: None,
            rescue_deadline: None,
            concealment: ConcealmentService::default(),
            defense: DefenseService::default(),
            reports: EventReportLog::new(report_capacity),
        }
    }

    /// Reloads the timestamps kept in a save.
    pub fn restore(&mut self, last_s3: Option<DateTime<Utc>>, rescue_deadline: Option<DateTime<Utc>>) {
        self.last_s3 = last_s3;
        self.rescue_deadline = rescue_deadline;
    }

    pub fn set_sampler(&mut self, sampler: Box<dyn SeveritySampler>) {
        self.sampler = sampler;
    }

    pub fn last_s3(&self) -> Option<DateTime<Utc>> {
        self.last_s3
    }

    pub fn pending_rescue_deadline(&self) -> Option<DateTime<Utc>> {
        self.rescue_deadline
    }

    pub fn concealment(&self) -> &ConcealmentService {
        &self.concealment
    }

    pub fn concealment_mut(&mut self) -> &mut ConcealmentService {
        &mut self.concealment
    }

    pub fn defense(&self) -> &DefenseService {
        &self.defense
    }

    pub fn defense_mut(&mut self) -> &mut DefenseService {
        &mut self.defense
    }

    pub fn reports(&self) -> &EventReportLog {
        &self.reports
    }

    pub fn reports_mut(&mut self) -> &mut EventReportLog {
        &mut self.reports
    }

    /// One event at `now`. Protection draws on `merit.reserve` and
    /// `merit.overflow_buffer`.
    pub fn roll_event<R: Rng>(
        &mut self,
        now: DateTime<Utc>,
        luck: LuckScore,
        merit: &mut MeritState,
        rng: &mut R,
    ) -> EventRollResult {
        let original = self.sampler.sample(luck, rng);
        let mut severity = original;

        let mut concealment_applied = false;
        let multiplier = self.concealment.current_multiplier(now);
        if multiplier < 1.0 && severity.is_high() && rng.gen::<f64>() > multiplier {
            severity = Severity::S1;
            concealment_applied = true;
        }

        let mut downgraded_by_cooldown = false;
        if severity == Severity::S3 {
            if self.within_s3_cooldown(now) {
                severity = Severity::S2;
                downgraded_by_cooldown = true;
            } else {
                self.last_s3 = Some(now);
            }
        }

        let protection = if severity.is_high() {
            self.protect(severity, merit)
        } else {
            Protection::none()
        };
        let protected = protection.applied();

        let mut rescue_deadline = None;
        if severity == Severity::S3 && !protected {
            let hours = self.config.rescue_hours.clamp(1, MAX_EVENT_WINDOW_HOURS);
            let deadline = now + Duration::hours(hours);
            self.rescue_deadline = Some(deadline);
            rescue_deadline = Some(deadline);
            info!(%deadline, "unprotected s3, rescue window open");
        } else if protected {
            self.rescue_deadline = None;
        }

        let result = EventRollResult {
            timestamp: now,
            original,
            final_severity: severity,
            consumed_reserve: protection.consumed_reserve,
            consumed_buffer: protection.consumed_buffer,
            downgraded_by_cooldown,
            concealment_applied,
            protected,
            defense_charge_used: protection.defense_charge_used,
            rescue_deadline,
        };

        if original.is_high() {
            self.reports.append(EventReport::from(&result));
        }
        debug!(%result, "event rolled");
        result
    }

    /// Rolls one event per hour after `start`, for `hours` hours.
    pub fn simulate_offline<R: Rng>(
        &mut self,
        start: DateTime<Utc>,
        hours: u32,
        luck: LuckScore,
        merit: &mut MeritState,
        rng: &mut R,
    ) -> Vec<EventRollResult> {
        let mut cursor = start;
        (0..hours)
            .map(|_| {
                cursor += Duration::hours(1);
                self.roll_event(cursor, luck, merit, rng)
            })
            .collect()
    }

    fn within_s3_cooldown(&self, now: DateTime<Utc>) -> bool {
        match self.last_s3 {
            Some(last) => (now - last).num_hours() < self.config.s3_cooldown_hours,
            None => false,
        }
    }

    /// Reserve first, then the overflow buffer, then one defense charge.
    fn protect(&mut self, severity: Severity, merit: &mut MeritState) -> Protection {
        let (reserve_cost, buffer_cost) = match severity {
            Severity::S3 => (S3_RESERVE_COST, S3_BUFFER_COST),
            _ => (S2_RESERVE_COST, S2_BUFFER_COST),
        };
        let mut protection = Protection::none();

        if merit.reserve >= reserve_cost {
            merit.reserve -= reserve_cost;
            protection.consumed_reserve = reserve_cost;
        } else if merit.overflow_buffer >= buffer_cost {
            merit.overflow_buffer -= buffer_cost;
            protection.consumed_buffer = buffer_cost;
        } else if self.defense.consume() {
            protection.defense_charge_used = true;
        }

        if protection.applied() {
            debug!(
                %severity,
                reserve = protection.consumed_reserve,
                buffer = protection.consumed_buffer,
                defense = protection.defense_charge_used,
                "event protected"
            );
        }
        protection
    }
}
