use super::types::*;
use crate::augury::{AuguryOutcome, AuguryService};
use crate::core::config::KernelConfig;
use crate::core::constants::{DAILY_GRANT_TIMER_KEY, SAVE_SCHEMA_VERSION, SINGLE_PULL_COST, TEN_PULL_COST};
use crate::core::error::{SaveError, SaveResult};
use crate::economy::{effective_luck, MeritState, SpendOutcome};
use crate::events::{EventEngine, EventRollResult, SeveritySampler};
use crate::gacha::{GachaEngine, GachaOutcome};
use crate::inventory::{Inventory, InventoryAddResult, InventoryItem};
use crate::protection::{ConcealmentService, ConcealmentState, DefenseService};
use crate::save::{PersistenceManager, SaveState};
use crate::shop::{PaymentDebugService, PaymentResult, PurchaseOutcome, ShopService, Wallet};
use crate::time::{Calendar, Clock, DailyRewardService, GrantStatus, SystemClock};
use chrono::Duration;
use rand::Rng;
use tracing::{debug, info};
use uuid::Builder;

/// Public operation surface of the simulation.
///
/// The kernel owns the stateful engines (pity counters, s3 timestamps,
/// concealment, the report log, the daily grant timer, the inventory). Each
/// operation takes the caller's snapshot by value and hands back the updated
/// snapshot with those engine states copied in and luck recomputed.
///
/// Operations are not atomic across components: a purchase that succeeds is
/// reflected in the returned snapshot whether or not the following save does.
pub struct GameKernel<C: Clock = SystemClock> {
    config: KernelConfig,
    clock: C,
    calendar: Calendar,
    events: EventEngine,
    gacha: GachaEngine,
    daily: DailyRewardService,
    augury: AuguryService,
    augury_day: Option<i64>,
    shop: ShopService,
    payments: PaymentDebugService,
    inventory: Inventory,
    persistence: Option<PersistenceManager>,
}

impl GameKernel<SystemClock> {
    pub fn new(config: KernelConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> GameKernel<C> {
    pub fn with_clock(config: KernelConfig, clock: C) -> Self {
        let calendar = Calendar::utc();
        Self {
            events: EventEngine::new(config.event.clone(), config.report_capacity),
            gacha: GachaEngine::new(config.gacha.clone()),
            daily: DailyRewardService::new(calendar),
            augury: AuguryService::new(config.augury),
            augury_day: None,
            shop: ShopService::new(config.shop.clone()),
            payments: PaymentDebugService::default(),
            inventory: Inventory::new(),
            persistence: None,
            calendar,
            clock,
            config,
        }
    }

    /// Builds a kernel whose engines continue from `state`.
    pub fn from_state(config: KernelConfig, clock: C, state: &SaveState) -> Self {
        let mut kernel = Self::with_clock(config, clock);
        kernel.restore(state);
        kernel
    }

    /// Day boundaries for daily grants and augury resets.
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self.daily = DailyRewardService::restore(calendar, self.daily.last_grant());
        self
    }

    pub fn with_persistence(mut self, persistence: PersistenceManager) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_sampler(mut self, sampler: Box<dyn SeveritySampler>) -> Self {
        self.events.set_sampler(sampler);
        self
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn events(&self) -> &EventEngine {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventEngine {
        &mut self.events
    }

    pub fn gacha(&self) -> &GachaEngine {
        &self.gacha
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn payments_mut(&mut self) -> &mut PaymentDebugService {
        &mut self.payments
    }

    /// A fresh snapshot using the configured merit cap and daily grant.
    pub fn new_game(&self) -> SaveState {
        let mut state = SaveState::default();
        state.player.merit = MeritState::new(0.0, self.config.merit.cap, self.config.merit.daily_grant);
        state.shop.vip_rate = self.config.shop.vip_rate;
        state.player.luck = effective_luck(&state.player.merit, &state.player.backlash);
        state
    }

    /// Reloads engine state from a snapshot. Report capacity and weights
    /// still come from the kernel config.
    pub fn restore(&mut self, state: &SaveState) {
        let player = &state.player;
        let world = &state.world;

        self.gacha = GachaEngine::restore(self.config.gacha.clone(), player.gacha_pity, player.legendary_pity);
        self.events.restore(world.last_s3_date, world.rescue_deadline);
        *self.events.concealment_mut() = ConcealmentService::restore(world.concealment);
        *self.events.defense_mut() = DefenseService::new(world.defense_charges);
        self.events.reports_mut().restore(world.reports.iter().copied());
        self.daily = DailyRewardService::restore(
            self.calendar,
            world.event_cooldowns.get(DAILY_GRANT_TIMER_KEY).copied(),
        );
        self.inventory = Inventory::restore(state.inventory.iter().cloned());
        debug!(
            pity = player.gacha_pity,
            legendary_pity = player.legendary_pity,
            items = state.inventory.len(),
            "kernel restored"
        );
    }

    pub fn grant_daily(&mut self, mut state: SaveState) -> Transition<GrantStatus> {
        let wall = self.clock.wall_now();
        let monotonic = self.clock.monotonic_now();
        let status = self.daily.attempt_grant(wall, monotonic, &mut state.player.merit);
        self.settle(state, status)
    }

    pub fn spend(&mut self, mut state: SaveState, amount: f64) -> Transition<SpendOutcome> {
        let outcome = state.player.merit.spend(amount);
        self.settle(state, outcome)
    }

    pub fn purchase(&mut self, mut state: SaveState, cost: f64, prefer_coupons: bool) -> Transition<PurchaseOutcome> {
        let outcome = self.charge(&mut state, cost, prefer_coupons);
        info!(cost, prefer_coupons, %outcome, "purchase");
        self.settle(state, outcome)
    }

    /// Adds coupons through the debug payment stub.
    pub fn top_up_coupons(&mut self, mut state: SaveState, amount: f64) -> Transition<PaymentResult> {
        let outcome = self.payments.process(amount);
        if outcome == PaymentResult::Success {
            state.shop.coupons += amount;
        }
        self.settle(state, outcome)
    }

    pub fn single_pull<R: Rng>(&mut self, state: SaveState, rng: &mut R) -> Transition<PullOutcome> {
        self.pull(state, SINGLE_PULL_COST, rng, |gacha, rng| vec![gacha.single_pull(rng)])
    }

    pub fn ten_pull<R: Rng>(&mut self, state: SaveState, rng: &mut R) -> Transition<PullOutcome> {
        self.pull(state, TEN_PULL_COST, rng, |gacha, rng| gacha.ten_pull(rng))
    }

    /// The first reading of each calendar day is free.
    pub fn perform_augury(&mut self, mut state: SaveState) -> Transition<AuguryOutcome> {
        let today = self.calendar.day_ordinal(self.clock.wall_now());
        if self.augury_day != Some(today) {
            self.augury.reset_daily();
            self.augury_day = Some(today);
        }
        let outcome = self.augury.perform(&mut state.player.backlash);
        self.settle(state, outcome)
    }

    /// Returns the backlash points left.
    pub fn cleanse_backlash(&mut self, mut state: SaveState, amount: u32) -> Transition<u32> {
        let left = state.player.backlash.cleanse(amount);
        self.settle(state, left)
    }

    /// `duration: None` keeps concealment on until it is deactivated.
    pub fn activate_concealment(
        &mut self,
        state: SaveState,
        multiplier: f64,
        duration: Option<Duration>,
    ) -> Transition<ConcealmentState> {
        let now = self.clock.wall_now();
        self.events.concealment_mut().activate(multiplier, duration, now);
        let current = self.events.concealment().state();
        self.settle(state, current)
    }

    /// Returns the charges now held.
    pub fn add_defense_charges(&mut self, state: SaveState, amount: u32) -> Transition<u32> {
        self.events.defense_mut().add_charges(amount);
        let charges = self.events.defense().charges();
        info!(amount, charges, "defense charges added");
        self.settle(state, charges)
    }

    pub fn deactivate_concealment(&mut self, state: SaveState) -> Transition<ConcealmentState> {
        self.events.concealment_mut().deactivate();
        self.settle(state, ConcealmentState::Inactive)
    }

    pub fn roll_event<R: Rng>(&mut self, mut state: SaveState, rng: &mut R) -> Transition<EventRollResult> {
        let luck = effective_luck(&state.player.merit, &state.player.backlash);
        let now = self.clock.wall_now();
        let result = self.events.roll_event(now, luck, &mut state.player.merit, rng);
        self.settle(state, result)
    }

    /// Replays the `hours` hours leading up to now, one event per hour.
    pub fn simulate_offline<R: Rng>(
        &mut self,
        mut state: SaveState,
        hours: u32,
        rng: &mut R,
    ) -> Transition<Vec<EventRollResult>> {
        let luck = effective_luck(&state.player.merit, &state.player.backlash);
        let start = self.clock.wall_now() - Duration::hours(i64::from(hours));
        let results = self
            .events
            .simulate_offline(start, hours, luck, &mut state.player.merit, rng);
        info!(hours, rolled = results.len(), "offline events simulated");
        self.settle(state, results)
    }

    pub fn add_inventory_item(&mut self, state: SaveState, item: InventoryItem) -> Transition<InventoryAddResult> {
        let outcome = self.inventory.add(item);
        self.settle(state, outcome)
    }

    /// Returns how many items were actually removed.
    pub fn remove_inventory_item(&mut self, state: SaveState, id: &str, count: u32) -> Transition<u32> {
        let removed = self.inventory.remove(id, count);
        self.settle(state, removed)
    }

    pub async fn save(&self, state: &SaveState) -> SaveResult<()> {
        let persistence = self
            .persistence
            .as_ref()
            .ok_or_else(|| SaveError::SaveFailed("no storage configured".to_string()))?;
        persistence.save(state.clone()).await
    }

    /// Loads the stored snapshot and continues the engines from it.
    pub async fn load(&mut self) -> SaveResult<SaveState> {
        let persistence = self
            .persistence
            .clone()
            .ok_or_else(|| SaveError::LoadFailed("no storage configured".to_string()))?;
        let mut state = persistence.load().await?;
        self.restore(&state);
        state.player.luck = effective_luck(&state.player.merit, &state.player.backlash);
        Ok(state)
    }

    fn charge(&self, state: &mut SaveState, cost: f64, prefer_coupons: bool) -> PurchaseOutcome {
        let mut wallet = Wallet::new(state.player.merit.clone(), state.shop.coupons, state.shop.vip_rate);
        let outcome = self.shop.purchase(cost, prefer_coupons, &mut wallet);
        state.player.merit = wallet.merit;
        state.shop.coupons = wallet.coupons;
        outcome
    }

    fn pull<R, F>(&mut self, mut state: SaveState, cost: f64, rng: &mut R, roll: F) -> Transition<PullOutcome>
    where
        R: Rng,
        F: FnOnce(&mut GachaEngine, &mut R) -> Vec<GachaOutcome>,
    {
        let payment = self.charge(&mut state, cost, false);
        if !payment.is_success() {
            debug!(%payment, "pull declined");
            return self.settle(state, PullOutcome::PaymentDeclined(payment));
        }

        let results = roll(&mut self.gacha, rng);
        let item_ids = results
            .iter()
            .map(|result| {
                let tag = Builder::from_random_bytes(rng.gen()).into_uuid().simple().to_string();
                let id = format!("item-{}-{}", result.rarity.tag(), &tag[..8]);
                self.inventory.add(InventoryItem::new(id.clone(), result.rarity, 1));
                id
            })
            .collect();

        self.settle(
            state,
            PullOutcome::Pulled {
                results,
                item_ids,
                payment,
            },
        )
    }

    /// Copies engine state into the snapshot and recomputes luck.
    fn settle<T>(&mut self, mut state: SaveState, outcome: T) -> Transition<T> {
        let now = self.clock.wall_now();
        let concealment = self.events.concealment_mut();
        concealment.current_multiplier(now);

        let player = &mut state.player;
        let (pity, legendary_pity) = self.gacha.pity();
        player.gacha_pity = pity;
        player.legendary_pity = legendary_pity;
        player.luck = effective_luck(&player.merit, &player.backlash);
        player.sync_pools();

        let world = &mut state.world;
        world.last_s3_date = self.events.last_s3();
        world.rescue_deadline = self.events.pending_rescue_deadline();
        world.concealment = self.events.concealment().state();
        world.defense_charges = self.events.defense().charges();
        world.reports = self.events.reports().snapshot();
        match self.daily.last_grant() {
            Some(at) => {
                world.event_cooldowns.insert(DAILY_GRANT_TIMER_KEY.to_string(), at);
            }
            None => {
                world.event_cooldowns.remove(DAILY_GRANT_TIMER_KEY);
            }
        }

        state.inventory = self.inventory.snapshot();
        state.schema_version = SAVE_SCHEMA_VERSION;
        Transition::new(state, outcome)
    }
}
