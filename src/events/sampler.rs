use super::types::Severity;
use crate::core::config::SeverityWeights;
use crate::economy::LuckScore;
use rand::{Rng, RngCore};

/// Chooses the base severity of an event before any mitigation.
pub trait SeveritySampler: Send + Sync {
    fn sample(&self, luck: LuckScore, rng: &mut dyn RngCore) -> Severity;
}

/// Weighted table; luck scales s0 up and s3 down (or the reverse).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightedSeverity {
    pub weights: SeverityWeights,
}

impl WeightedSeverity {
    pub fn new(weights: SeverityWeights) -> Self {
        Self { weights }
    }

    pub fn scaled(&self, luck: LuckScore) -> [(Severity, f64); 4] {
        [
            (Severity::S0, self.weights.s0 * luck.good_multiplier()),
            (Severity::S1, self.weights.s1),
            (Severity::S2, self.weights.s2),
            (Severity::S3, self.weights.s3 * luck.bad_multiplier()),
        ]
    }
}

impl SeveritySampler for WeightedSeverity {
    fn sample(&self, luck: LuckScore, rng: &mut dyn RngCore) -> Severity {
        let table = self.scaled(luck);
        let total: f64 = table.iter().map(|(_, w)| w).sum();
        if total <= 0.0 || !total.is_finite() {
            return Severity::S0;
        }

        let draw = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (severity, weight) in table {
            cumulative += weight;
            if draw < cumulative {
                return severity;
            }
        }
        Severity::S0
    }
}

/// Always the same severity. Scripted events and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSeverity(pub Severity);

impl SeveritySampler for FixedSeverity {
    fn sample(&self, _luck: LuckScore, _rng: &mut dyn RngCore) -> Severity {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_draw_picks_first_bucket() {
        let sampler = WeightedSeverity::default();
        let mut rng = StepRng::new(0, 0);
        assert_eq!(sampler.sample(LuckScore::clamped(0.0), &mut rng), Severity::S0);
    }

    #[test]
    fn test_luck_scales_extremes() {
        let sampler = WeightedSeverity::default();
        let good = sampler.scaled(LuckScore::clamped(50.0));
        assert!((good[0].1 - 1.2).abs() < 1e-9);
        assert!((good[3].1 - 0.015).abs() < 1e-9);
        let bad = sampler.scaled(LuckScore::clamped(-50.0));
        assert!((bad[3].1 - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_weights_fall_back_to_s0() {
        let sampler = WeightedSeverity::new(SeverityWeights {
            s0: 0.0,
            s1: 0.0,
            s2: 0.0,
            s3: 0.0,
        });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(sampler.sample(LuckScore::default(), &mut rng), Severity::S0);
    }

    #[test]
    fn test_bad_luck_raises_s3_frequency() {
        let sampler = WeightedSeverity::default();
        let count_s3 = |luck: f64| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            (0..4000)
                .filter(|_| sampler.sample(LuckScore::clamped(luck), &mut rng) == Severity::S3)
                .count()
        };
        assert!(count_s3(-100.0) > count_s3(100.0));
    }

    #[test]
    fn test_fixed_severity() {
        let mut rng = StepRng::new(0, 1);
        assert_eq!(FixedSeverity(Severity::S3).sample(LuckScore::default(), &mut rng), Severity::S3);
    }
}
