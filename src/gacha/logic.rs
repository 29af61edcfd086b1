use super::types::*;
use crate::core::constants::TEN_PULL_SIZE;
use rand::Rng;
use tracing::debug;

/// Weighted rarity roller with soft pity, hard pity and a ten-pull floor.
///
/// Pity counters live inside the engine. They can only be observed through
/// outcomes and `pity()`, and are restored from a save with `restore`.
#[derive(Debug, Clone)]
pub struct GachaEngine {
    config: GachaConfig,
    pulls_since_epic: u32,
    pulls_since_legendary: u32,
}

impl GachaEngine {
    pub fn new(config: GachaConfig) -> Self {
        Self::restore(config, 0, 0)
    }

    /// Rebuilds an engine from the counters stored in a save.
    pub fn restore(config: GachaConfig, pulls_since_epic: u32, pulls_since_legendary: u32) -> Self {
        Self {
            config,
            pulls_since_epic,
            pulls_since_legendary,
        }
    }

    pub fn config(&self) -> &GachaConfig {
        &self.config
    }

    /// `(pulls_since_epic, pulls_since_legendary)`
    pub fn pity(&self) -> (u32, u32) {
        (self.pulls_since_epic, self.pulls_since_legendary)
    }

    pub fn single_pull<R: Rng>(&mut self, rng: &mut R) -> GachaOutcome {
        self.pulls_since_epic += 1;
        self.pulls_since_legendary += 1;

        let (rarity, trigger) = self.roll_rarity(rng);
        if rarity >= Rarity::Epic {
            self.pulls_since_epic = 0;
        }
        if rarity == Rarity::Legendary {
            self.pulls_since_legendary = 0;
        }

        GachaOutcome {
            rarity,
            pity: self.pulls_since_epic,
            legendary_pity: self.pulls_since_legendary,
            trigger,
        }
    }

    /// Ten independent pulls. If the tenth lands on the lowest tier it is
    /// lifted one tier and the epic counter gives back one pull.
    ///
    /// The give-back mirrors the shipped behaviour; it is not equivalent to
    /// rerolling the tenth pull and can under-count pity.
    pub fn ten_pull<R: Rng>(&mut self, rng: &mut R) -> Vec<GachaOutcome> {
        let lowest = self.config.lowest_rarity();
        let mut results = Vec::with_capacity(TEN_PULL_SIZE);

        for i in 0..TEN_PULL_SIZE {
            let mut outcome = self.single_pull(rng);
            if i == TEN_PULL_SIZE - 1 && outcome.rarity == lowest {
                self.pulls_since_epic = self.pulls_since_epic.saturating_sub(1);
                outcome = GachaOutcome {
                    rarity: lowest.next(),
                    pity: self.pulls_since_epic,
                    legendary_pity: outcome.legendary_pity,
                    trigger: Some(PityTrigger::BatchFloor),
                };
                debug!(rarity = %outcome.rarity, "ten-pull floor applied");
            }
            results.push(outcome);
        }

        results
    }

    fn roll_rarity<R: Rng>(&self, rng: &mut R) -> (Rarity, Option<PityTrigger>) {
        if self.pulls_since_epic >= self.config.epic_pity.saturating_sub(1) {
            debug!(pulls = self.pulls_since_epic, "epic hard pity");
            return (Rarity::Epic, Some(PityTrigger::EpicHardPity));
        }
        if self.pulls_since_legendary >= self.config.legendary_pity.saturating_sub(1) {
            debug!(pulls = self.pulls_since_legendary, "legendary hard pity");
            return (Rarity::Legendary, Some(PityTrigger::LegendaryHardPity));
        }

        let weights = self.adjusted_weights();
        let total: f64 = weights.iter().map(|w| w.weight).sum();
        if total <= 0.0 || !total.is_finite() {
            return (self.config.lowest_rarity(), None);
        }

        let draw = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for entry in &weights {
            cumulative += entry.weight;
            if draw < cumulative {
                return (entry.rarity, None);
            }
        }

        (self.config.lowest_rarity(), None)
    }

    /// Base weights with the legendary entry boosted once soft pity starts.
    fn adjusted_weights(&self) -> Vec<RarityWeight> {
        let mut weights = self.config.rarities.clone();
        if self.pulls_since_legendary >= self.config.soft_pity_start {
            let extra = (self.pulls_since_legendary - self.config.soft_pity_start) as f64
                * self.config.soft_pity_slope;
            if let Some(entry) = weights.iter_mut().find(|w| w.rarity == Rarity::Legendary) {
                entry.weight += extra.max(0.0);
            }
        }
        weights
    }
}
