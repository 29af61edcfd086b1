use super::types::EventReport;
use crate::core::constants::{DEFAULT_REPORT_CAPACITY, MIN_REPORT_CAPACITY};
use std::collections::VecDeque;

/// Bounded history of event reports; the oldest entries fall off first.
#[derive(Debug, Clone)]
pub struct EventReportLog {
    reports: VecDeque<EventReport>,
    capacity: usize,
}

impl Default for EventReportLog {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_CAPACITY)
    }
}

impl EventReportLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_REPORT_CAPACITY);
        Self {
            reports: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn append(&mut self, report: EventReport) {
        if self.reports.len() == self.capacity {
            self.reports.pop_front();
        }
        self.reports.push_back(report);
    }

    /// Replaces the log with saved reports, keeping only the newest.
    pub fn restore(&mut self, reports: impl IntoIterator<Item = EventReport>) {
        self.reports.clear();
        for report in reports {
            self.append(report);
        }
    }

    pub fn snapshot(&self) -> Vec<EventReport> {
        self.reports.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Severity;
    use chrono::{Duration, TimeZone, Utc};

    fn report(minute: i64) -> EventReport {
        EventReport {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
            original: Severity::S2,
            final_severity: Severity::S2,
            rescue_deadline: None,
        }
    }

    #[test]
    fn test_capacity_floor() {
        assert_eq!(EventReportLog::new(3).capacity(), 10);
        assert_eq!(EventReportLog::default().capacity(), 100);
    }

    #[test]
    fn test_oldest_dropped_when_full() {
        let mut log = EventReportLog::new(10);
        for i in 0..15 {
            log.append(report(i));
        }
        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot[0], report(5));
        assert_eq!(snapshot[9], report(14));
    }

    #[test]
    fn test_restore_trims_to_capacity() {
        let mut log = EventReportLog::new(10);
        log.append(report(100));
        log.restore((0..12).map(report));
        assert_eq!(log.len(), 10);
        assert_eq!(log.snapshot()[0], report(2));
    }
}
