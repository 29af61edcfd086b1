use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event severity, from harmless (s0) to life-threatening (s3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    S0,
    S1,
    S2,
    S3,
}

impl Severity {
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::S0 => "s0",
            Severity::S1 => "s1",
            Severity::S2 => "s2",
            Severity::S3 => "s3",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "s0" => Some(Severity::S0),
            "s1" => Some(Severity::S1),
            "s2" => Some(Severity::S2),
            "s3" => Some(Severity::S3),
            _ => None,
        }
    }

    /// s2 and s3 call for protection and are reported.
    pub fn is_high(&self) -> bool {
        matches!(self, Severity::S2 | Severity::S3)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRollResult {
    pub timestamp: DateTime<Utc>,
    pub original: Severity,
    pub final_severity: Severity,
    pub consumed_reserve: f64,
    pub consumed_buffer: f64,
    pub downgraded_by_cooldown: bool,
    pub concealment_applied: bool,
    pub protected: bool,
    pub defense_charge_used: bool,
    /// Set only when this roll opened a rescue window.
    pub rescue_deadline: Option<DateTime<Utc>>,
}

impl fmt::Display for EventRollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "orig={} final={}", self.original, self.final_severity)?;
        if self.concealment_applied {
            write!(f, " concealed")?;
        }
        if self.downgraded_by_cooldown {
            write!(f, " downgraded-limit")?;
        }
        if self.protected {
            write!(f, " protected")?;
        }
        if self.consumed_reserve > 0.0 {
            write!(f, " reserve-{}", self.consumed_reserve)?;
        }
        if self.consumed_buffer > 0.0 {
            write!(f, " buffer-{}", self.consumed_buffer)?;
        }
        if self.defense_charge_used {
            write!(f, " defense")?;
        }
        if let Some(deadline) = self.rescue_deadline {
            write!(f, " rescue-deadline={}", deadline.to_rfc3339())?;
        }
        Ok(())
    }
}

/// Persisted summary of one high-severity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReport {
    pub timestamp: DateTime<Utc>,
    pub original: Severity,
    #[serde(rename = "final")]
    pub final_severity: Severity,
    pub rescue_deadline: Option<DateTime<Utc>>,
}

impl From<&EventRollResult> for EventReport {
    fn from(result: &EventRollResult) -> Self {
        Self {
            timestamp: result.timestamp,
            original: result.original,
            final_severity: result.final_severity,
            rescue_deadline: result.rescue_deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_severity_tags() {
        for s in [Severity::S0, Severity::S1, Severity::S2, Severity::S3] {
            assert_eq!(Severity::from_tag(s.tag()), Some(s));
        }
        assert!(Severity::S2.is_high());
        assert!(!Severity::S1.is_high());
    }

    #[test]
    fn test_report_json_field_names() {
        let report = EventReport {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            original: Severity::S3,
            final_severity: Severity::S2,
            rescue_deadline: None,
        };
        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["original"], "s3");
        assert_eq!(value["final"], "s2");
        assert!(value["rescueDeadline"].is_null());
    }
}
