//! Tests for the milestone detector
//!
//! Covers tier classification, the exactly-once guarantee across both entry
//! points, and payoff confirmation/reminders.

use chrono::{TimeZone, Utc};
use debt_payoff_core::core::clock::{Clock, ManualClock};
use debt_payoff_core::core::config::{DetectorConfig, OutboxConfig, RecorderConfig};
use debt_payoff_core::ledger::{BalanceChangeRecorder, ZeroBalanceSignals};
use debt_payoff_core::milestones::MilestoneDetector;
use debt_payoff_core::models::{ChangeType, Debt, DebtState, MilestoneType};
use debt_payoff_core::notifications::{NotificationEvent, NotificationOutbox, RecordingDispatcher};
use debt_payoff_core::store::{DebtStore, InMemoryStore, MilestoneStore};
use std::sync::{Arc, Barrier};
use std::thread;

struct Harness {
    store: Arc<InMemoryStore>,
    recorder: Arc<BalanceChangeRecorder>,
    detector: Arc<MilestoneDetector>,
    outbox: Arc<NotificationOutbox>,
}

impl Harness {
    fn new(auto_confirm_payoff: bool) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let outbox = Arc::new(NotificationOutbox::new(&OutboxConfig::default()));
        let recorder = Arc::new(BalanceChangeRecorder::new(
            store.clone(),
            clock.clone(),
            Arc::new(ZeroBalanceSignals::new()),
            &RecorderConfig::default(),
        ));
        let detector = Arc::new(MilestoneDetector::new(
            store.clone(),
            store.clone(),
            recorder.clone(),
            outbox.clone(),
            clock,
            &DetectorConfig {
                auto_confirm_payoff,
            },
        ));
        Self {
            store,
            recorder,
            detector,
            outbox,
        }
    }

    fn add(&self, id: &str, user: &str, balance: i64) {
        let debt = Debt::new(id, user, id, balance, 1_500, 1_000, Utc::now()).unwrap();
        self.store.insert_debt(debt).unwrap();
    }

    fn pay_off(&self, id: &str) {
        let balance = self.store.get_debt(id).unwrap().unwrap().balance();
        self.recorder
            .record_change(id, balance, ChangeType::Payment, None)
            .unwrap();
    }

    fn earned(&self, user: &str) -> Vec<MilestoneType> {
        self.store
            .milestones_for_user(user)
            .unwrap()
            .into_iter()
            .map(|r| r.milestone_type)
            .collect()
    }
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_tiers_awarded_as_progress_grows() {
    let h = Harness::new(true);
    for id in ["a", "b", "c", "d"] {
        h.add(id, "u1", 10_000);
    }

    h.pay_off("a");
    let report = h.detector.process_signals();
    let kinds: Vec<_> = report.milestones_awarded.iter().map(|m| m.milestone_type).collect();
    assert_eq!(kinds, vec![MilestoneType::FirstDebtPaid, MilestoneType::Pct25]);

    h.pay_off("b");
    let kinds: Vec<_> = h
        .detector
        .process_signals()
        .milestones_awarded
        .iter()
        .map(|m| m.milestone_type)
        .collect();
    assert_eq!(kinds, vec![MilestoneType::Pct50]);

    h.pay_off("c");
    h.detector.process_signals();
    h.pay_off("d");
    h.detector.process_signals();

    assert_eq!(
        h.earned("u1"),
        vec![
            MilestoneType::FirstDebtPaid,
            MilestoneType::Pct25,
            MilestoneType::Pct50,
            MilestoneType::Pct75,
            MilestoneType::DebtFree,
        ]
    );
}

#[test]
fn test_jump_awards_only_highest_tier() {
    let h = Harness::new(true);
    h.add("small", "u1", 10_000);
    h.add("large", "u1", 30_000);

    h.pay_off("large");
    h.detector.process_signals();

    // 75% in one step: lower tiers are skipped
    assert_eq!(
        h.earned("u1"),
        vec![MilestoneType::FirstDebtPaid, MilestoneType::Pct75]
    );
}

#[test]
fn test_progress_uses_original_balance() {
    let h = Harness::new(true);
    h.add("a", "u1", 25_000);
    h.add("b", "u1", 75_000);

    // Paying most of b does not move progress; only payoffs count
    h.recorder
        .record_change("b", 70_000, ChangeType::Payment, None)
        .unwrap();
    h.pay_off("a");
    h.detector.process_signals();

    assert_eq!(
        h.earned("u1"),
        vec![MilestoneType::FirstDebtPaid, MilestoneType::Pct25]
    );
}

#[test]
fn test_deactivated_debts_are_ignored() {
    let h = Harness::new(true);
    h.add("a", "u1", 10_000);
    h.add("gone", "u1", 90_000);
    h.recorder.deactivate("gone").unwrap();

    h.pay_off("a");
    h.detector.process_signals();

    assert!(h.earned("u1").contains(&MilestoneType::DebtFree));
}

#[test]
fn test_users_are_independent() {
    let h = Harness::new(true);
    h.add("a1", "alice", 10_000);
    h.add("b1", "bob", 10_000);
    h.add("b2", "bob", 10_000);

    h.pay_off("a1");
    h.pay_off("b1");
    h.detector.process_signals();

    assert!(h.earned("alice").contains(&MilestoneType::DebtFree));
    assert_eq!(
        h.earned("bob"),
        vec![MilestoneType::FirstDebtPaid, MilestoneType::Pct50]
    );
}

// ============================================================================
// Exactly once
// ============================================================================

#[test]
fn test_both_entry_points_emit_each_milestone_once() {
    let h = Harness::new(true);
    h.add("a", "u1", 10_000);
    h.add("b", "u1", 10_000);

    h.pay_off("a");
    h.detector.process_signals();
    // Periodic pass after the inline pass finds nothing left to do
    let scan = h.detector.scan_pending().unwrap();
    assert!(scan.milestones_awarded.is_empty());
    assert_eq!(scan.debts_processed, 0);

    // Re-running a processed debt is a no-op
    let again = h.detector.process_debt("a").unwrap();
    assert!(again.milestones_awarded.is_empty());

    let dispatcher = RecordingDispatcher::new();
    h.outbox.flush(&dispatcher);
    assert_eq!(dispatcher.milestone_count("u1", MilestoneType::FirstDebtPaid), 1);
    assert_eq!(dispatcher.milestone_count("u1", MilestoneType::Pct50), 1);
}

#[test]
fn test_scan_recovers_missed_signal() {
    let h = Harness::new(true);
    h.add("a", "u1", 10_000);
    h.pay_off("a");

    // Inline path lost (e.g. process restarted before draining)
    h.recorder.signals().drain();

    let report = h.detector.scan_pending().unwrap();
    assert_eq!(report.debts_processed, 1);
    assert_eq!(report.payoffs_confirmed, 1);
    assert_eq!(
        h.earned("u1"),
        vec![MilestoneType::FirstDebtPaid, MilestoneType::DebtFree]
    );
    assert!(h.store.pending_zero_balance().unwrap().is_empty());
}

#[test]
fn test_racing_inline_and_periodic_passes() {
    let h = Arc::new(Harness::new(true));
    for i in 0..6 {
        h.add(&format!("d{}", i), "u1", 10_000);
    }
    for i in 0..6 {
        h.pay_off(&format!("d{}", i));
    }

    let barrier = Arc::new(Barrier::new(3));
    let inline = {
        let h = Arc::clone(&h);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            h.detector.process_signals();
        })
    };
    let scanners: Vec<_> = (0..2)
        .map(|_| {
            let h = Arc::clone(&h);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                h.detector.scan_pending().unwrap();
            })
        })
        .collect();
    inline.join().unwrap();
    for s in scanners {
        s.join().unwrap();
    }

    let dispatcher = RecordingDispatcher::new();
    h.outbox.flush(&dispatcher);
    for kind in [MilestoneType::FirstDebtPaid, MilestoneType::DebtFree] {
        assert_eq!(dispatcher.milestone_count("u1", kind), 1, "{}", kind);
    }
    assert!(h.earned("u1").contains(&MilestoneType::DebtFree));
    for i in 0..6 {
        let debt = h.store.get_debt(&format!("d{}", i)).unwrap().unwrap();
        assert_eq!(debt.state(), DebtState::PaidOff);
        assert!(debt.milestones_processed_at().is_some());
    }
}

// ============================================================================
// Confirmation and reminders
// ============================================================================

#[test]
fn test_auto_confirm_closes_debt() {
    let h = Harness::new(true);
    h.add("a", "u1", 10_000);
    h.pay_off("a");

    let report = h.detector.process_signals();
    assert_eq!(report.payoffs_confirmed, 1);
    assert_eq!(report.reminders_queued, 0);
    assert_eq!(
        h.store.get_debt("a").unwrap().unwrap().state(),
        DebtState::PaidOff
    );
}

#[test]
fn test_manual_confirm_queues_one_reminder() {
    let h = Harness::new(false);
    h.add("a", "u1", 10_000);
    h.add("b", "u1", 10_000);
    h.pay_off("a");

    let report = h.detector.process_signals();
    assert_eq!(report.payoffs_confirmed, 0);
    assert_eq!(report.reminders_queued, 1);
    assert_eq!(
        h.store.get_debt("a").unwrap().unwrap().state(),
        DebtState::ZeroBalanceDetected
    );

    // Still counts as paid for progress, but no second reminder
    let scan = h.detector.scan_pending().unwrap();
    assert_eq!(scan.reminders_queued, 0);

    let dispatcher = RecordingDispatcher::new();
    h.outbox.flush(&dispatcher);
    let reminders = dispatcher
        .delivered()
        .into_iter()
        .filter(|e| matches!(e, NotificationEvent::PayoffReminder { debt_id } if debt_id == "a"))
        .count();
    assert_eq!(reminders, 1);
    assert_eq!(dispatcher.milestone_count("u1", MilestoneType::Pct50), 1);
}
