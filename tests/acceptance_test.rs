//! Integration test: end-to-end kernel behaviour
//!
//! Drives the kernel the way a presentation layer would: snapshot in,
//! snapshot plus outcome out, with a hand-driven clock and fixed RNG streams.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fate::economy::{effective_luck, BacklashState, LuckScore, MeritState};
use fate::events::{FixedSeverity, Severity};
use fate::gacha::{GachaConfig, GachaEngine, Rarity, RarityWeight};
use fate::shop::{PurchaseOutcome, ShopService, Wallet};
use fate::time::{Clock, GrantStatus, ManualClock};
use fate::{GameKernel, KernelConfig};
use rand::rngs::mock::StepRng;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 7, 30, 0).unwrap()
}

fn kernel() -> GameKernel<ManualClock> {
    GameKernel::with_clock(KernelConfig::default(), ManualClock::new(start()))
}

/// Seven consecutive days pay seven grants
#[test]
fn test_week_of_daily_grants() {
    let mut k = kernel();
    let mut state = k.new_game();

    for day in 0..7 {
        let (next, status) = k.grant_daily(state).into_parts();
        assert!(
            matches!(status, GrantStatus::Granted { days: 1, .. }),
            "day {day}: {status}"
        );
        state = next;

        let (next, repeat) = k.grant_daily(state).into_parts();
        assert_eq!(repeat, GrantStatus::AlreadyClaimed);
        state = next;

        k.clock_mut().advance(Duration::days(1));
    }

    assert_eq!(state.player.merit.balance(), 840.0);
}

/// A wall clock wound back never pays and leaves the snapshot untouched
#[test]
fn test_clock_rollback_is_rejected() {
    let mut k = kernel();
    let (state, _) = k.grant_daily(k.new_game()).into_parts();

    k.clock_mut().advance(Duration::days(1));
    let (state, status) = k.grant_daily(state).into_parts();
    assert!(matches!(status, GrantStatus::Granted { .. }));
    let before = state.clone();

    let wound_back = k.clock().wall_now() - Duration::days(3);
    k.clock_mut().set_wall(wound_back);
    let (after, status) = k.grant_daily(state).into_parts();
    assert_eq!(status, GrantStatus::BackwardTimeDetected);
    assert_eq!(after, before);
}

/// Days missed while offline are paid on the next claim
#[test]
fn test_missed_days_are_caught_up() {
    let mut k = kernel();
    let (state, _) = k.grant_daily(k.new_game()).into_parts();

    k.clock_mut().advance(Duration::days(4));
    let (state, status) = k.grant_daily(state).into_parts();
    assert_eq!(
        status,
        GrantStatus::Granted {
            days: 4,
            total_granted: 480.0,
            total_overflow: 0.0
        }
    );
    assert_eq!(state.player.merit.balance(), 600.0);
}

#[test]
fn test_shop_debt_limit_and_coupon_top_up() {
    let shop = ShopService::default();

    // Merit alone cannot cover 100 with a debt limit of -50.
    let mut wallet = Wallet::new(MeritState::new(0.0, 100.0, 50.0), 0.0, 1.0);
    assert_eq!(shop.purchase(100.0, false, &mut wallet), PurchaseOutcome::InsufficientCoupons);
    assert_eq!(wallet.merit.balance(), 0.0);

    // Preferred coupons make up the difference.
    let mut wallet = Wallet::new(MeritState::new(0.0, 100.0, 50.0), 100.0, 1.0);
    assert!(shop.purchase(100.0, true, &mut wallet).is_success());
    assert!(wallet.merit.balance() >= wallet.merit.debt_limit());

    // In debt, a coupon-first purchase at rate 1.0 spends only coupons.
    let mut wallet = Wallet::new(MeritState::new(-40.0, 100.0, 50.0), 80.0, 1.0);
    let outcome = shop.purchase(50.0, true, &mut wallet);
    match outcome {
        PurchaseOutcome::Success {
            spent_merit,
            spent_coupons,
            ..
        } => {
            assert_eq!(spent_coupons, 50.0);
            assert_eq!(spent_merit, 0.0);
        }
        other => panic!("expected success, got {other}"),
    }
    assert_eq!(wallet.merit.balance(), -40.0);
    assert_eq!(wallet.coupons, 30.0);
}

#[test]
fn test_backlash_penalty_curve() {
    for points in 0..20 {
        let backlash = BacklashState::new(points);
        let expected = (5.0 * points as f64).min(30.0);
        assert_eq!(backlash.luck_penalty(), expected, "points={points}");
    }
    assert_eq!(BacklashState::new(10).luck_penalty(), 30.0);

    let base = LuckScore::clamped(-85.0);
    assert_eq!(BacklashState::new(10).effective_luck(base).value(), -100.0);
}

#[test]
fn test_legendary_by_tenth_pull_on_zero_stream() {
    let config = GachaConfig {
        rarities: vec![
            RarityWeight::new(Rarity::Common, 97.0),
            RarityWeight::new(Rarity::Rare, 3.0),
            RarityWeight::new(Rarity::Legendary, 0.0),
        ],
        epic_pity: 10,
        legendary_pity: 10,
        soft_pity_start: 100,
        soft_pity_slope: 0.0,
    };
    let mut engine = GachaEngine::new(config);
    let mut rng = StepRng::new(0, 0);

    let first_legendary = (1..=10).find(|_| engine.single_pull(&mut rng).rarity == Rarity::Legendary);
    assert!(first_legendary.is_some_and(|n| n <= 10));
}

#[test]
fn test_ten_pull_floor_on_common_only_table() {
    let mut config = KernelConfig::default();
    config.gacha = GachaConfig {
        rarities: vec![
            RarityWeight::new(Rarity::Common, 1.0),
            RarityWeight::new(Rarity::Rare, 0.0),
            RarityWeight::new(Rarity::Epic, 0.0),
            RarityWeight::new(Rarity::Legendary, 0.0),
        ],
        epic_pity: 100,
        legendary_pity: 100,
        soft_pity_start: 100,
        soft_pity_slope: 0.0,
    };
    let mut k = GameKernel::with_clock(config, ManualClock::new(start()));
    let mut state = k.new_game();
    state.player.merit = MeritState::new(500.0, 1000.0, 120.0);

    let mut rng = StepRng::new(0, 0);
    let (state, outcome) = k.ten_pull(state, &mut rng).into_parts();
    let results = outcome.results();
    assert_eq!(results.len(), 10);
    assert!(results.iter().any(|r| r.rarity != Rarity::Common));
    assert!(state.inventory.iter().any(|item| item.rarity == Rarity::Rare));
}

/// A day of forced s3 rolls opens at most one rescue window
#[test]
fn test_forced_s3_day_has_one_unprotected_s3() {
    let mut k = kernel().with_sampler(Box::new(FixedSeverity(Severity::S3)));
    let mut state = k.new_game();
    state.player.merit = MeritState::new(300.0, 1000.0, 120.0).with_pools(130.0, 90.0);

    let mut rng = StepRng::new(0, 0);
    let (state, results) = k.simulate_offline(state, 24, &mut rng).into_parts();

    let unprotected: Vec<_> = results
        .iter()
        .filter(|r| r.final_severity == Severity::S3 && !r.protected)
        .collect();
    assert!(unprotected.len() <= 1);
    assert!(unprotected.iter().all(|r| r.rescue_deadline.is_some()));
    assert!(results
        .iter()
        .filter(|r| r.final_severity == Severity::S3)
        .count()
        <= 1);
    assert!(state.player.reserve < 130.0);
}

/// Concealment at 0.3 with a 0.5 roll turns forced s3s into s1s
#[test]
fn test_concealment_reduces_high_severity_share() {
    let half = StepRng::new(1 << 63, 0);

    let mut baseline = kernel().with_sampler(Box::new(FixedSeverity(Severity::S3)));
    let (_, plain) = baseline
        .simulate_offline(baseline.new_game(), 12, &mut half.clone())
        .into_parts();

    let mut concealed = kernel().with_sampler(Box::new(FixedSeverity(Severity::S3)));
    let state = concealed.new_game();
    let (state, _) = concealed.activate_concealment(state, 0.3, None).into_parts();
    let (_, hidden) = concealed
        .simulate_offline(state, 12, &mut half.clone())
        .into_parts();

    let high = |results: &[fate::events::EventRollResult]| {
        results.iter().filter(|r| r.final_severity.is_high()).count()
    };
    assert_eq!(high(&plain), 12);
    assert!(high(&hidden) < high(&plain));
    assert!(hidden.iter().all(|r| r.concealment_applied));
}

/// Luck in every returned snapshot is the merit curve minus backlash
#[test]
fn test_luck_is_always_recomputed() {
    let mut k = kernel();
    let mut state = k.new_game();
    state.player.merit = MeritState::new(250.0, 1000.0, 120.0);
    state.player.luck = LuckScore::clamped(99.0);

    let (state, _) = k.perform_augury(state).into_parts();
    let (state, _) = k.perform_augury(state).into_parts();
    assert_eq!(state.player.backlash.points(), 1);
    assert_eq!(
        state.player.luck,
        effective_luck(&state.player.merit, &state.player.backlash)
    );
}
