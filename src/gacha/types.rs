use crate::core::constants::{
    DEFAULT_EPIC_PITY, DEFAULT_LEGENDARY_PITY, DEFAULT_SOFT_PITY_SLOPE, DEFAULT_SOFT_PITY_START,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common = 0,
    Rare = 1,
    Epic = 2,
    Legendary = 3,
}

impl Rarity {
    /// Lowercase tag used in save files and database rows.
    pub fn tag(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "common" => Some(Rarity::Common),
            "rare" => Some(Rarity::Rare),
            "epic" => Some(Rarity::Epic),
            "legendary" => Some(Rarity::Legendary),
            _ => None,
        }
    }

    /// The tier above this one; legendary stays legendary.
    pub fn next(&self) -> Rarity {
        match self {
            Rarity::Common => Rarity::Rare,
            Rarity::Rare => Rarity::Epic,
            Rarity::Epic | Rarity::Legendary => Rarity::Legendary,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityWeight {
    pub rarity: Rarity,
    pub weight: f64,
}

impl RarityWeight {
    pub fn new(rarity: Rarity, weight: f64) -> Self {
        Self { rarity, weight }
    }
}

/// Weight table and pity thresholds. Table order decides ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GachaConfig {
    pub rarities: Vec<RarityWeight>,
    pub epic_pity: u32,
    pub legendary_pity: u32,
    pub soft_pity_start: u32,
    pub soft_pity_slope: f64,
}

impl Default for GachaConfig {
    fn default() -> Self {
        Self {
            rarities: vec![
                RarityWeight::new(Rarity::Common, 82.0),
                RarityWeight::new(Rarity::Rare, 15.0),
                RarityWeight::new(Rarity::Epic, 2.7),
                RarityWeight::new(Rarity::Legendary, 0.3),
            ],
            epic_pity: DEFAULT_EPIC_PITY,
            legendary_pity: DEFAULT_LEGENDARY_PITY,
            soft_pity_start: DEFAULT_SOFT_PITY_START,
            soft_pity_slope: DEFAULT_SOFT_PITY_SLOPE,
        }
    }
}

impl GachaConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.rarities.is_empty() {
            return Err("gacha rarity table is empty".to_string());
        }
        if self.rarities.iter().any(|r| r.weight < 0.0 || !r.weight.is_finite()) {
            return Err("gacha weights must be finite and non-negative".to_string());
        }
        if self.epic_pity == 0 || self.legendary_pity == 0 {
            return Err("pity thresholds must be at least 1".to_string());
        }
        if self.soft_pity_slope < 0.0 {
            return Err("soft pity slope must be non-negative".to_string());
        }
        Ok(())
    }

    /// Lowest rarity present in the table, used as the degenerate fallback.
    pub fn lowest_rarity(&self) -> Rarity {
        self.rarities
            .iter()
            .map(|r| r.rarity)
            .min()
            .unwrap_or(Rarity::Common)
    }
}

/// Why a pull was forced instead of drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PityTrigger {
    EpicHardPity,
    LegendaryHardPity,
    /// The last pull of a batch was lifted off the lowest tier.
    BatchFloor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GachaOutcome {
    pub rarity: Rarity,
    /// Pulls since the last epic-or-better, after this pull.
    pub pity: u32,
    /// Pulls since the last legendary, after this pull.
    pub legendary_pity: u32,
    pub trigger: Option<PityTrigger>,
}

impl fmt::Display for GachaOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rarity={} pity={} legendaryPity={}",
            self.rarity, self.pity, self.legendary_pity
        )
    }
}
