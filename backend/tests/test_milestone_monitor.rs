//! Tests for the periodic milestone monitor
//!
//! Time is virtual: a ManualClock decides when scans are due.

use chrono::{Duration, TimeZone, Utc};
use debt_payoff_core::core::clock::{Clock, ManualClock};
use debt_payoff_core::core::config::{DetectorConfig, OutboxConfig, RecorderConfig};
use debt_payoff_core::ledger::{BalanceChangeRecorder, ZeroBalanceSignals};
use debt_payoff_core::milestones::{MilestoneDetector, MilestoneMonitor};
use debt_payoff_core::models::{ChangeType, Debt, MilestoneType};
use debt_payoff_core::notifications::{
    DispatchError, MilestonePayload, NotificationDispatcher, NotificationOutbox,
    RecordingDispatcher,
};
use debt_payoff_core::store::{DebtStore, InMemoryStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration as StdDuration, Instant};

struct Setup {
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
    recorder: Arc<BalanceChangeRecorder>,
    monitor: Arc<MilestoneMonitor>,
}

fn setup(dispatcher: Arc<dyn NotificationDispatcher>, interval: Duration) -> Setup {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
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
        clock.clone(),
        &DetectorConfig::default(),
    ));
    let monitor = Arc::new(MilestoneMonitor::new(
        detector,
        outbox,
        dispatcher,
        clock.clone(),
        interval,
    ));
    Setup {
        store,
        clock,
        recorder,
        monitor,
    }
}

impl Setup {
    /// Pay off a debt without running the inline detector path
    fn zero_debt(&self, id: &str) {
        let debt = Debt::new(id, "u1", id, 10_000, 0, 500, Utc::now()).unwrap();
        self.store.insert_debt(debt).unwrap();
        self.recorder
            .record_change(id, 10_000, ChangeType::Payment, None)
            .unwrap();
        self.recorder.signals().drain();
    }
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + StdDuration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(StdDuration::from_millis(2));
    }
}

// ============================================================================
// Timer
// ============================================================================

#[test]
fn test_poll_runs_only_when_due() {
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let s = setup(dispatcher.clone(), Duration::minutes(5));
    s.zero_debt("a");

    assert!(s.monitor.poll().unwrap().is_none(), "not started");

    s.monitor.start();
    let first_due = s.monitor.next_due().unwrap();
    assert_eq!(first_due, s.clock.now() + Duration::minutes(5));
    assert!(s.monitor.poll().unwrap().is_none());

    s.clock.advance(Duration::seconds(299));
    assert!(s.monitor.poll().unwrap().is_none());

    s.clock.advance(Duration::seconds(1));
    let run = s.monitor.poll().unwrap().expect("scan due");
    assert_eq!(run.scan.debts_processed, 1);
    assert_eq!(run.flush.delivered, 2);
    assert_eq!(dispatcher.milestone_count("u1", MilestoneType::DebtFree), 1);

    // Re-armed one interval after the scan
    assert_eq!(s.monitor.next_due(), Some(s.clock.now() + Duration::minutes(5)));
}

#[test]
fn test_start_is_idempotent() {
    let s = setup(Arc::new(RecordingDispatcher::new()), Duration::minutes(5));
    s.monitor.start();
    let due = s.monitor.next_due();

    s.clock.advance(Duration::minutes(2));
    s.monitor.start();
    assert_eq!(s.monitor.next_due(), due);
}

#[test]
fn test_stop_disarms_timer() {
    let s = setup(Arc::new(RecordingDispatcher::new()), Duration::minutes(5));
    s.zero_debt("a");
    s.monitor.start();
    assert!(s.monitor.is_running());

    s.monitor.stop();
    assert!(!s.monitor.is_running());

    s.clock.advance(Duration::hours(1));
    assert!(s.monitor.poll().unwrap().is_none());
    assert_eq!(s.store.pending_zero_balance().unwrap().len(), 1);
}

#[test]
fn test_empty_scan_still_reports() {
    let s = setup(Arc::new(RecordingDispatcher::new()), Duration::minutes(5));
    let run = s.monitor.run_now().unwrap().expect("not busy");
    assert_eq!(run.scan.debts_processed, 0);
    assert_eq!(run.flush.delivered, 0);
    assert_eq!(run.started_at, s.clock.now());
}

// ============================================================================
// Single flight
// ============================================================================

/// Blocks every delivery until the gate opens
#[derive(Default)]
struct GatedDispatcher {
    entered: AtomicBool,
    open: Mutex<bool>,
    cond: Condvar,
}

impl GatedDispatcher {
    fn wait_for_gate(&self) {
        self.entered.store(true, Ordering::SeqCst);
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cond.wait(open).unwrap();
        }
    }

    fn release(&self) {
        *self.open.lock().unwrap() = true;
        self.cond.notify_all();
    }
}

impl NotificationDispatcher for GatedDispatcher {
    fn trigger_milestone(
        &self,
        _user_id: &str,
        _milestone_type: MilestoneType,
        _payload: &MilestonePayload,
    ) -> Result<(), DispatchError> {
        self.wait_for_gate();
        Ok(())
    }

    fn trigger_payoff_reminder(&self, _debt_id: &str) -> Result<(), DispatchError> {
        self.wait_for_gate();
        Ok(())
    }
}

#[test]
fn test_overlapping_scan_is_skipped() {
    let gate = Arc::new(GatedDispatcher::default());
    let s = setup(gate.clone(), Duration::minutes(5));
    s.zero_debt("a");

    let monitor = Arc::clone(&s.monitor);
    let first = thread::spawn(move || monitor.run_now());

    wait_until("first scan to reach the dispatcher", || {
        gate.entered.load(Ordering::SeqCst)
    });
    assert!(s.monitor.is_scanning());
    assert!(s.monitor.run_now().unwrap().is_none());

    gate.release();
    let run = first.join().unwrap().unwrap().expect("first scan ran");
    assert_eq!(run.scan.debts_processed, 1);
    assert!(!s.monitor.is_scanning());

    // Flag cleared: the next scan runs (and finds nothing)
    let next = s.monitor.run_now().unwrap().expect("not busy");
    assert_eq!(next.scan.debts_processed, 0);
}

// ============================================================================
// Background thread
// ============================================================================

#[test]
fn test_spawned_monitor_processes_and_shuts_down() {
    let dispatcher = Arc::new(RecordingDispatcher::new());
    // Zero interval: every poll is due
    let s = setup(dispatcher.clone(), Duration::zero());
    s.zero_debt("a");

    let handle = s.monitor.spawn(StdDuration::from_millis(5));
    assert!(handle.monitor().is_running());

    wait_until("background scan", || {
        dispatcher.milestone_count("u1", MilestoneType::DebtFree) == 1
    });

    handle.shutdown();
    assert!(!s.monitor.is_running());
    assert!(s.store.pending_zero_balance().unwrap().is_empty());
}
