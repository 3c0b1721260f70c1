//! Best-effort notification outbox
//!
//! State changes enqueue events here and return. Delivery happens on
//! [`NotificationOutbox::flush`], which never reports an error to the
//! state-changing caller: failed events are logged, retried on the next flush
//! and dropped after `max_attempts`.

use super::dispatcher::{deliver, NotificationDispatcher, NotificationEvent};
use crate::core::config::OutboxConfig;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Pending {
    event: NotificationEvent,
    attempts: u32,
}

/// Counts from one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    /// Failed this time, kept for the next flush
    pub retried: usize,
    /// Failed for the last allowed time, discarded
    pub dropped: usize,
}

/// Queue of events awaiting delivery
#[derive(Debug)]
pub struct NotificationOutbox {
    pending: Mutex<VecDeque<Pending>>,
    max_attempts: u32,
}

impl NotificationOutbox {
    pub fn new(config: &OutboxConfig) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Queue an event for delivery
    pub fn enqueue(&self, event: NotificationEvent) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.push_back(Pending { event, attempts: 0 });
    }

    /// Events waiting for delivery
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Try to deliver everything currently queued
    ///
    /// Events enqueued while a flush is running wait for the next one.
    pub fn flush(&self, dispatcher: &dyn NotificationDispatcher) -> FlushReport {
        let batch: Vec<Pending> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.drain(..).collect()
        };

        let mut report = FlushReport::default();
        let mut requeue = Vec::new();

        for mut item in batch {
            item.attempts += 1;
            match deliver(dispatcher, &item.event) {
                Ok(()) => report.delivered += 1,
                Err(err) if item.attempts < self.max_attempts => {
                    log::warn!(
                        "notification delivery failed (attempt {}/{}), will retry: {}",
                        item.attempts,
                        self.max_attempts,
                        err
                    );
                    report.retried += 1;
                    requeue.push(item);
                }
                Err(err) => {
                    log::error!(
                        "dropping notification after {} attempts: {} ({:?})",
                        item.attempts,
                        err,
                        item.event
                    );
                    report.dropped += 1;
                }
            }
        }

        if !requeue.is_empty() {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            for item in requeue.into_iter().rev() {
                pending.push_front(item);
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MilestoneType;
    use crate::notifications::dispatcher::{DispatchError, MilestonePayload, RecordingDispatcher};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls, then succeeds
    struct FlakyDispatcher {
        failures: usize,
        calls: AtomicUsize,
    }

    impl NotificationDispatcher for FlakyDispatcher {
        fn trigger_milestone(
            &self,
            _user_id: &str,
            _milestone_type: MilestoneType,
            _payload: &MilestonePayload,
        ) -> Result<(), DispatchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(DispatchError("smtp down".to_string()))
            } else {
                Ok(())
            }
        }

        fn trigger_payoff_reminder(&self, _debt_id: &str) -> Result<(), DispatchError> {
            Err(DispatchError("sms down".to_string()))
        }
    }

    fn milestone_event() -> NotificationEvent {
        NotificationEvent::Milestone {
            user_id: "u1".to_string(),
            milestone_type: MilestoneType::FirstDebtPaid,
            payload: MilestonePayload {
                debt_id: "d1".to_string(),
                debt_name: "Card".to_string(),
                progress_bps: 2_000,
                paid_original_total: 20_000,
                original_total: 100_000,
            },
        }
    }

    #[test]
    fn test_flush_delivers_and_empties() {
        let outbox = NotificationOutbox::new(&OutboxConfig::default());
        let dispatcher = RecordingDispatcher::new();
        outbox.enqueue(milestone_event());
        outbox.enqueue(NotificationEvent::PayoffReminder {
            debt_id: "d1".to_string(),
        });

        let report = outbox.flush(&dispatcher);
        assert_eq!(report.delivered, 2);
        assert!(outbox.is_empty());
        assert_eq!(dispatcher.delivered().len(), 2);
    }

    #[test]
    fn test_failed_delivery_retried_then_succeeds() {
        let outbox = NotificationOutbox::new(&OutboxConfig { max_attempts: 3 });
        let dispatcher = FlakyDispatcher {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        outbox.enqueue(milestone_event());

        let first = outbox.flush(&dispatcher);
        assert_eq!(first.retried, 1);
        assert_eq!(outbox.len(), 1);

        let second = outbox.flush(&dispatcher);
        assert_eq!(second.delivered, 1);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_event_dropped_after_max_attempts() {
        let outbox = NotificationOutbox::new(&OutboxConfig { max_attempts: 2 });
        let dispatcher = FlakyDispatcher {
            failures: 0,
            calls: AtomicUsize::new(0),
        };
        outbox.enqueue(NotificationEvent::PayoffReminder {
            debt_id: "d1".to_string(),
        });

        assert_eq!(outbox.flush(&dispatcher).retried, 1);
        assert_eq!(outbox.flush(&dispatcher).dropped, 1);
        assert!(outbox.is_empty());
    }
}
