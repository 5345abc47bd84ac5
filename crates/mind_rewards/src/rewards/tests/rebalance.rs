use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use chrono::{DateTime, Duration, Utc};
use mind_rewards_proto::{NewRewardRecord, RebalanceDecision};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::super::*;
use super::{fixture_config, harness, start_time, steps};

fn seed(ledger: &mut InMemoryLedger, key: &str, amount: u64, at: DateTime<Utc>) {
    ledger
        .import_reward(NewRewardRecord {
            user_id: "user-2".to_string(),
            action_id: "steps".to_string(),
            mind_amount: amount,
            idempotency_key: key.to_string(),
            metadata: None,
            timestamp: at,
        })
        .expect("seed reward");
}

/// Seeds history so the monthly target is exactly `target` with one month
/// left and `recent` MIND emitted inside the window.
fn seed_emission(ledger: &mut InMemoryLedger, target: u64, recent: u64) {
    let supply = 2_000_000_000u64;
    seed(
        ledger,
        "history",
        supply - target - recent,
        start_time() - Duration::days(90),
    );
    seed(ledger, "recent", recent, start_time() - Duration::days(3));
}

fn one_month_config() -> RewardConfig {
    let mut config = fixture_config();
    config.auto_rebalance.remaining_pool_months = 1;
    config
}

#[test]
fn hot_emission_scales_down_and_persists() {
    let mut h = harness(one_month_config());
    seed_emission(&mut h.ledger, 100, 120);

    let coefficient = h
        .engine
        .execute_monthly_rebalance(&h.ledger)
        .expect("rebalance");

    assert_eq!(coefficient, dec!(0.8333));
    assert_eq!(h.engine.config_version(), 2);
    assert_eq!(h.engine.config_snapshot().rebalance_coefficient, dec!(0.8333));
    assert_eq!(h.engine.store().save_count(), 1);
    assert_eq!(
        h.engine
            .store()
            .stored()
            .map(|config| config.rebalance_coefficient),
        Some(dec!(0.8333))
    );

    let outcome = h
        .engine
        .process_event(&mut h.ledger, &steps("user-1", "k-1", 2000.0))
        .expect("process");
    assert_eq!(
        outcome,
        EventOutcome::Credited { mind_amount: 8 }
    );
}

#[test]
fn emission_inside_band_does_not_save() {
    let mut h = harness(one_month_config());
    seed_emission(&mut h.ledger, 100, 105);

    let report = h
        .engine
        .execute_monthly_rebalance_report(&h.ledger)
        .expect("rebalance");

    assert_eq!(report.decision, RebalanceDecision::Unchanged);
    assert_eq!(report.actual_emission, dec!(105));
    assert_eq!(report.target_emission, Some(dec!(100)));
    assert_eq!(report.new_coefficient, Decimal::ONE);
    assert_eq!(h.engine.config_version(), 1);
    assert_eq!(h.engine.store().save_count(), 0);
}

#[test]
fn cold_emission_scales_back_up_to_baseline() {
    let mut config = one_month_config();
    config.rebalance_coefficient = dec!(0.6);
    let mut h = harness(config);
    seed_emission(&mut h.ledger, 100, 40);

    let report = h
        .engine
        .execute_monthly_rebalance_report(&h.ledger)
        .expect("rebalance");
    assert_eq!(report.decision, RebalanceDecision::ScaleUp);
    assert_eq!(report.previous_coefficient, dec!(0.6));
    assert_eq!(report.new_coefficient, Decimal::ONE);
    assert_eq!(h.engine.store().save_count(), 1);
}

#[test]
fn window_is_inclusive_of_its_start() {
    let mut h = harness(one_month_config());
    seed(&mut h.ledger, "edge", 120, start_time() - Duration::days(30));
    seed(&mut h.ledger, "outside", 999, start_time() - Duration::days(31));

    let report = h
        .engine
        .execute_monthly_rebalance_report(&h.ledger)
        .expect("rebalance");
    assert_eq!(report.actual_emission, dec!(120));
}

#[test]
fn disabled_or_exhausted_schedule_returns_current_coefficient() {
    let mut config = one_month_config();
    config.auto_rebalance.enabled = false;
    config.rebalance_coefficient = dec!(0.7);
    let mut h = harness(config);
    seed_emission(&mut h.ledger, 100, 500);
    assert_eq!(
        h.engine
            .execute_monthly_rebalance(&h.ledger)
            .expect("disabled"),
        dec!(0.7)
    );

    let mut config = one_month_config();
    config.auto_rebalance.remaining_pool_months = 0;
    let mut h = harness(config);
    seed_emission(&mut h.ledger, 100, 500);
    let report = h
        .engine
        .execute_monthly_rebalance_report(&h.ledger)
        .expect("no months");
    assert_eq!(report.decision, RebalanceDecision::NoPoolMonths);
    assert_eq!(report.new_coefficient, Decimal::ONE);
    assert_eq!(h.engine.store().save_count(), 0);
}

#[test]
fn reload_picks_up_store_changes() {
    let h = harness(fixture_config());
    let mut edited = fixture_config();
    edited.rebalance_coefficient = dec!(0.5);
    h.engine.store().replace(edited);

    assert_eq!(h.engine.reload_config().expect("reload"), 2);
    assert_eq!(h.engine.config_snapshot().rebalance_coefficient, dec!(0.5));
}

#[test]
fn engine_requires_a_rule_document() {
    let result = RewardEngine::new(MemoryRuleStore::empty());
    assert!(matches!(result, Err(RewardError::ConfigMissing { .. })));
}

/// Rule store whose `save` parks until the test releases it.
struct GatedStore {
    inner: MemoryRuleStore,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl RuleStore for GatedStore {
    fn load(&self) -> Result<RewardConfig, RewardError> {
        self.inner.load()
    }

    fn save(&self, config: &RewardConfig) -> Result<(), RewardError> {
        let _ = self
            .entered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .send(());
        let _ = self
            .release
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .recv();
        self.inner.save(config)
    }
}

#[test]
fn config_readers_proceed_while_rebalance_saves() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = GatedStore {
        inner: MemoryRuleStore::new(one_month_config()),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let clock = Arc::new(FixedClock::new(start_time()));
    let engine = RewardEngine::with_clock(store, clock.clone()).expect("engine");
    let mut ledger = InMemoryLedger::with_clock(clock);
    seed_emission(&mut ledger, 100, 120);

    thread::scope(|scope| {
        let rebalance = scope.spawn(|| engine.execute_monthly_rebalance(&ledger));
        entered_rx.recv().expect("save started");

        assert_eq!(engine.config_snapshot().rebalance_coefficient, Decimal::ONE);
        assert_eq!(engine.config_version(), 1);

        release_tx.send(()).expect("release save");
        let coefficient = rebalance.join().expect("join").expect("rebalance");
        assert_eq!(coefficient, dec!(0.8333));
    });

    assert_eq!(engine.config_version(), 2);
    assert_eq!(engine.config_snapshot().rebalance_coefficient, dec!(0.8333));
}
