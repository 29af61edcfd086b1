use super::types::*;
use crate::core::config::ShopConfig;
use crate::core::constants::MERIT_EPSILON;
use crate::economy::SpendOutcome;
use tracing::debug;

/// Settles purchases across merit and coupons.
///
/// Coupons never create debt. A coupon amount `c` settles `c / vip_rate` of
/// the cost; merit covers the rest and may dip to the debt limit.
#[derive(Debug, Clone, Default)]
pub struct ShopService {
    config: ShopConfig,
}

impl ShopService {
    pub fn new(config: ShopConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn purchase(&self, cost: f64, prefer_coupons: bool, wallet: &mut Wallet) -> PurchaseOutcome {
        if cost < 0.0 || !cost.is_finite() {
            return PurchaseOutcome::InvalidAmount;
        }
        if wallet.vip_rate <= 0.0 {
            wallet.vip_rate = self.config.vip_rate;
        }
        let rate = wallet.vip_rate;
        if rate <= 0.0 || !rate.is_finite() {
            return PurchaseOutcome::InvalidAmount;
        }
        let capacity = wallet.merit_capacity();

        let (merit, coupons) = if prefer_coupons {
            let mut coupons = wallet.coupons.min(cost * rate);
            let merit = cost - coupons / rate;
            if merit > capacity {
                let extra = (wallet.coupons - coupons).min((merit - capacity) * rate);
                coupons += extra.max(0.0);
            }
            ((cost - coupons / rate).max(0.0), coupons)
        } else if cost > capacity {
            // Merit goes exactly to the debt limit; coupons cover the rest.
            let needed = (cost - capacity) * rate;
            if needed > wallet.coupons + MERIT_EPSILON {
                return PurchaseOutcome::InsufficientCoupons;
            }
            (capacity, needed.min(wallet.coupons))
        } else {
            (cost, 0.0)
        };

        if merit > capacity + MERIT_EPSILON {
            return PurchaseOutcome::DebtLimitReached {
                current: wallet.merit.balance(),
                limit: wallet.merit.debt_limit(),
            };
        }

        if merit > 0.0 {
            match wallet.merit.spend(merit) {
                SpendOutcome::Success { .. } => {}
                SpendOutcome::DebtLimitReached { current, limit } => {
                    return PurchaseOutcome::DebtLimitReached { current, limit }
                }
                SpendOutcome::InvalidAmount => return PurchaseOutcome::InvalidAmount,
            }
        }
        wallet.coupons -= coupons;

        let ledger_penalty = coupons * self.config.ledger_penalty_rate;
        debug!(cost, merit, coupons, ledger_penalty, "purchase settled");
        PurchaseOutcome::Success {
            spent_merit: merit,
            spent_coupons: coupons,
            ledger_penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::MeritState;

    fn wallet(balance: f64, cap: f64, daily: f64, coupons: f64, vip: f64) -> Wallet {
        Wallet::new(MeritState::new(balance, cap, daily), coupons, vip)
    }

    #[test]
    fn test_coupons_cover_purchase_when_preferred() {
        let mut w = wallet(0.0, 50.0, 100.0, 100.0, 1.0);
        let outcome = ShopService::default().purchase(30.0, true, &mut w);
        assert_eq!(
            outcome,
            PurchaseOutcome::Success {
                spent_merit: 0.0,
                spent_coupons: 30.0,
                ledger_penalty: 30.0 * 0.02
            }
        );
        assert_eq!(w.merit.balance(), 0.0);
        assert_eq!(w.coupons, 70.0);
    }

    #[test]
    fn test_coupons_work_while_in_debt() {
        let mut w = wallet(-40.0, 100.0, 50.0, 100.0, 1.0);
        let outcome = ShopService::default().purchase(50.0, true, &mut w);
        match outcome {
            PurchaseOutcome::Success {
                spent_merit,
                spent_coupons,
                ..
            } => {
                assert_eq!(spent_merit, 0.0);
                assert_eq!(spent_coupons, 50.0);
            }
            other => panic!("expected success, got {other}"),
        }
        assert_eq!(w.merit.balance(), -40.0);
    }

    #[test]
    fn test_merit_first_tops_up_with_coupons() {
        // capacity = 0 - (-50) = 50; the other 50 comes from coupons.
        let mut w = wallet(0.0, 100.0, 50.0, 100.0, 1.0);
        let outcome = ShopService::default().purchase(100.0, false, &mut w);
        assert_eq!(
            outcome,
            PurchaseOutcome::Success {
                spent_merit: 50.0,
                spent_coupons: 50.0,
                ledger_penalty: 50.0 * 0.02
            }
        );
        assert_eq!(w.merit.balance(), -50.0);
    }

    #[test]
    fn test_merit_first_at_debt_limit_with_ample_coupons() {
        let shop = ShopService::default();
        for cost in 1..=500 {
            let mut w = wallet(-120.0, 1000.0, 120.0, 1000.0, 0.8);
            let outcome = shop.purchase(cost as f64, false, &mut w);
            assert!(outcome.is_success(), "cost={cost}: {outcome}");
            assert!(w.merit.balance() >= w.merit.debt_limit());
        }

        for rate in [0.01, 0.07, 0.33, 0.8, 1.0] {
            let mut w = wallet(3.7, 1000.0, 120.0, 1000.0, rate);
            let outcome = shop.purchase(181.3, false, &mut w);
            assert!(outcome.is_success(), "rate={rate}: {outcome}");
            assert!((w.merit.balance() - w.merit.debt_limit()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_merit_first_without_coupons_fails() {
        let mut w = wallet(0.0, 100.0, 50.0, 0.0, 1.0);
        assert_eq!(
            ShopService::default().purchase(100.0, false, &mut w),
            PurchaseOutcome::InsufficientCoupons
        );
        assert_eq!(w.merit.balance(), 0.0);
    }

    #[test]
    fn test_prefer_coupons_runs_out_then_debt_limit() {
        let mut w = wallet(0.0, 100.0, 50.0, 10.0, 1.0);
        let outcome = ShopService::default().purchase(100.0, true, &mut w);
        assert_eq!(
            outcome,
            PurchaseOutcome::DebtLimitReached {
                current: 0.0,
                limit: -50.0
            }
        );
        assert_eq!(w.coupons, 10.0);
    }

    #[test]
    fn test_vip_discount_applies() {
        let mut w = wallet(0.0, 100.0, 50.0, 100.0, 0.8);
        let outcome = ShopService::default().purchase(50.0, true, &mut w);
        assert_eq!(
            outcome,
            PurchaseOutcome::Success {
                spent_merit: 0.0,
                spent_coupons: 40.0,
                ledger_penalty: 40.0 * 0.02
            }
        );
    }

    #[test]
    fn test_zero_vip_rate_uses_config_default() {
        let mut w = wallet(0.0, 100.0, 50.0, 100.0, 0.0);
        ShopService::default().purchase(10.0, true, &mut w);
        assert_eq!(w.vip_rate, 0.8);
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut w = wallet(0.0, 100.0, 50.0, 100.0, 1.0);
        assert_eq!(
            ShopService::default().purchase(-1.0, true, &mut w),
            PurchaseOutcome::InvalidAmount
        );
        assert_eq!(
            ShopService::default().purchase(f64::NAN, false, &mut w),
            PurchaseOutcome::InvalidAmount
        );
    }

    #[test]
    fn test_merit_only_within_capacity() {
        let mut w = wallet(100.0, 1000.0, 120.0, 0.0, 1.0);
        let outcome = ShopService::default().purchase(90.0, false, &mut w);
        assert_eq!(
            outcome,
            PurchaseOutcome::Success {
                spent_merit: 90.0,
                spent_coupons: 0.0,
                ledger_penalty: 0.0
            }
        );
        assert_eq!(w.merit.balance(), 10.0);
    }
}
