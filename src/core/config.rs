//! Kernel configuration.
//!
//! Loaded once from a JSON document; every section falls back to its defaults
//! when absent so a partial file is valid.

use super::constants::*;
use super::error::ConfigError;
use crate::augury::AuguryPricing;
use crate::gacha::GachaConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Relative weights of the four event severities before luck scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub s0: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            s0: 0.6,
            s1: 0.25,
            s2: 0.12,
            s3: 0.03,
        }
    }
}

impl SeverityWeights {
    pub fn total(&self) -> f64 {
        self.s0 + self.s1 + self.s2 + self.s3
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventConfig {
    pub weights: SeverityWeights,
    pub rescue_hours: i64,
    pub s3_cooldown_hours: i64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            weights: SeverityWeights::default(),
            rescue_hours: DEFAULT_RESCUE_HOURS,
            s3_cooldown_hours: DEFAULT_S3_COOLDOWN_HOURS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopConfig {
    pub vip_rate: f64,
    pub ledger_penalty_rate: f64,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            vip_rate: DEFAULT_VIP_RATE,
            ledger_penalty_rate: DEFAULT_LEDGER_PENALTY_RATE,
        }
    }
}

/// Starting economy for a fresh save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeritConfig {
    pub cap: f64,
    pub daily_grant: f64,
}

impl Default for MeritConfig {
    fn default() -> Self {
        Self {
            cap: DEFAULT_MERIT_CAP,
            daily_grant: DEFAULT_DAILY_GRANT,
        }
    }
}

/// Which persistence backend the kernel writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    File { path: PathBuf },
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KernelConfig {
    pub event: EventConfig,
    pub shop: ShopConfig,
    pub gacha: GachaConfig,
    pub augury: AuguryPricing,
    pub merit: MeritConfig,
    pub report_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            event: EventConfig::default(),
            shop: ShopConfig::default(),
            gacha: GachaConfig::default(),
            augury: AuguryPricing::default(),
            merit: MeritConfig::default(),
            report_capacity: DEFAULT_REPORT_CAPACITY,
        }
    }
}

impl KernelConfig {
    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: KernelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.event.weights;
        if [w.s0, w.s1, w.s2, w.s3].iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(ConfigError::Invalid(
                "severity weights must be finite and non-negative".to_string(),
            ));
        }
        if w.total() <= 0.0 {
            return Err(ConfigError::Invalid(
                "severity weights must not all be zero".to_string(),
            ));
        }
        let windows = 1..=MAX_EVENT_WINDOW_HOURS;
        if !windows.contains(&self.event.rescue_hours) || !windows.contains(&self.event.s3_cooldown_hours) {
            return Err(ConfigError::Invalid(format!(
                "rescueHours and s3CooldownHours must be between 1 and {MAX_EVENT_WINDOW_HOURS}"
            )));
        }
        if self.shop.vip_rate <= 0.0 || self.shop.ledger_penalty_rate < 0.0 {
            return Err(ConfigError::Invalid(
                "vipRate must be positive and ledgerPenaltyRate non-negative".to_string(),
            ));
        }
        if self.merit.cap < 1.0 || self.merit.daily_grant < 0.0 {
            return Err(ConfigError::Invalid(
                "merit cap must be at least 1 and daily grant non-negative".to_string(),
            ));
        }
        self.gacha.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
