//! Periodic milestone monitor
//!
//! An explicit scheduler object: it owns no global state and reads time only
//! through the injected [`Clock`], so tests drive it with a `ManualClock`.
//!
//! ```text
//! start()  arm timer, next_due = now + interval
//! poll()   if armed and now >= next_due: scan, flush outbox, re-arm
//! stop()   disarm; an in-flight scan still finishes
//! ```
//!
//! Overlapping scans are prevented by a single-flight flag: a `poll` or
//! `run_now` that finds a scan in progress returns `Ok(None)` immediately.

use super::detector::{DetectorError, MilestoneDetector, ScanReport};
use crate::core::clock::Clock;
use crate::notifications::{FlushReport, NotificationDispatcher, NotificationOutbox};
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// One completed monitor run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorRun {
    pub started_at: DateTime<Utc>,
    pub scan: ScanReport,
    pub flush: FlushReport,
}

/// Clears the single-flight flag when a scan ends, even by panic
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Timer-driven detector runner
pub struct MilestoneMonitor {
    detector: Arc<MilestoneDetector>,
    outbox: Arc<NotificationOutbox>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    /// None = stopped
    next_due: Mutex<Option<DateTime<Utc>>>,
    scanning: AtomicBool,
}

impl MilestoneMonitor {
    pub fn new(
        detector: Arc<MilestoneDetector>,
        outbox: Arc<NotificationOutbox>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            detector,
            outbox,
            dispatcher,
            clock,
            interval,
            next_due: Mutex::new(None),
            scanning: AtomicBool::new(false),
        }
    }

    /// Arm the timer. No-op when already running.
    pub fn start(&self) {
        let mut next_due = self.next_due.lock().unwrap_or_else(|e| e.into_inner());
        if next_due.is_none() {
            let due = self.clock.now() + self.interval;
            log::debug!("milestone monitor started, first scan due {}", due);
            *next_due = Some(due);
        }
    }

    /// Disarm the timer
    pub fn stop(&self) {
        let mut next_due = self.next_due.lock().unwrap_or_else(|e| e.into_inner());
        if next_due.take().is_some() {
            log::debug!("milestone monitor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// When the next scan is due, if armed
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        *self.next_due.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A scan is in progress
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Run a scan if the timer is armed and due
    ///
    /// Returns `Ok(None)` when nothing was due or another scan holds the
    /// single-flight flag.
    pub fn poll(&self) -> Result<Option<MonitorRun>, DetectorError> {
        let now = self.clock.now();
        let due = matches!(self.next_due(), Some(at) if now >= at);
        if !due {
            return Ok(None);
        }

        let result = self.run_now();

        // Re-arm from the end of the scan unless stopped meanwhile
        if !matches!(result, Ok(None)) {
            let mut next_due = self.next_due.lock().unwrap_or_else(|e| e.into_inner());
            if next_due.is_some() {
                *next_due = Some(self.clock.now() + self.interval);
            }
        }
        result
    }

    /// Scan immediately, ignoring the timer but honouring single-flight
    pub fn run_now(&self) -> Result<Option<MonitorRun>, DetectorError> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("milestone scan already in flight, skipping");
            return Ok(None);
        }
        let _guard = ScanGuard(&self.scanning);

        let started_at = self.clock.now();
        let scan = self.detector.scan_pending()?;
        let flush = self.outbox.flush(self.dispatcher.as_ref());

        if scan.debts_processed > 0 || flush.dropped > 0 {
            log::info!(
                "milestone scan: {} debts, {} milestones, {} delivered, {} dropped",
                scan.debts_processed,
                scan.milestones_awarded.len(),
                flush.delivered,
                flush.dropped
            );
        }

        Ok(Some(MonitorRun {
            started_at,
            scan,
            flush,
        }))
    }

    /// Arm the timer and drive [`poll`](Self::poll) from a background thread
    ///
    /// The thread wakes every `poll_every` of real time; whether a scan runs
    /// is still decided by the injected clock.
    pub fn spawn(self: &Arc<Self>, poll_every: std::time::Duration) -> MonitorHandle {
        self.start();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let monitor = Arc::clone(self);

        let join = thread::spawn(move || loop {
            match stop_rx.recv_timeout(poll_every) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(err) = monitor.poll() {
                        log::error!("milestone monitor scan failed: {}", err);
                    }
                }
            }
        });

        MonitorHandle {
            monitor: Arc::clone(self),
            stop_tx: Some(stop_tx),
            join: Some(join),
        }
    }
}

/// Owner of a spawned monitor thread
///
/// Dropping the handle stops the monitor and waits for the thread.
pub struct MonitorHandle {
    monitor: Arc<MilestoneMonitor>,
    stop_tx: Option<mpsc::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn monitor(&self) -> &Arc<MilestoneMonitor> {
        &self.monitor
    }

    /// Stop the timer and wait for the thread; an in-flight scan completes
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.monitor.stop();
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("milestone monitor thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
