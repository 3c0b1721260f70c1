//! Notification dispatcher collaborator
//!
//! Delivery (email, SMS, templating) happens outside the engine. The engine
//! only defines the event shapes and calls the dispatcher at most once per
//! event.

use crate::models::MilestoneType;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// Delivery failure reported by a dispatcher
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Context sent with a milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestonePayload {
    /// Debt whose payoff earned the milestone
    pub debt_id: String,
    pub debt_name: String,
    /// Paid-off share of the user's original debt, basis points
    pub progress_bps: i64,
    /// Σ original balance of paid debts (cents)
    pub paid_original_total: i64,
    /// Σ original balance of all debts (cents)
    pub original_total: i64,
}

/// Event handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    Milestone {
        user_id: String,
        milestone_type: MilestoneType,
        payload: MilestonePayload,
    },
    PayoffReminder {
        debt_id: String,
    },
}

/// Delivery side of notifications
pub trait NotificationDispatcher: Send + Sync {
    fn trigger_milestone(
        &self,
        user_id: &str,
        milestone_type: MilestoneType,
        payload: &MilestonePayload,
    ) -> Result<(), DispatchError>;

    fn trigger_payoff_reminder(&self, debt_id: &str) -> Result<(), DispatchError>;
}

/// Route an event to the matching dispatcher call
pub fn deliver(
    dispatcher: &dyn NotificationDispatcher,
    event: &NotificationEvent,
) -> Result<(), DispatchError> {
    match event {
        NotificationEvent::Milestone {
            user_id,
            milestone_type,
            payload,
        } => dispatcher.trigger_milestone(user_id, *milestone_type, payload),
        NotificationEvent::PayoffReminder { debt_id } => {
            dispatcher.trigger_payoff_reminder(debt_id)
        }
    }
}

/// Dispatcher that only logs; the default when no transport is wired
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn trigger_milestone(
        &self,
        user_id: &str,
        milestone_type: MilestoneType,
        payload: &MilestonePayload,
    ) -> Result<(), DispatchError> {
        log::info!(
            "milestone {} for user {} (debt {}, progress {} bps)",
            milestone_type,
            user_id,
            payload.debt_id,
            payload.progress_bps
        );
        Ok(())
    }

    fn trigger_payoff_reminder(&self, debt_id: &str) -> Result<(), DispatchError> {
        log::info!("payoff reminder for debt {}", debt_id);
        Ok(())
    }
}

/// Dispatcher that records every delivered event, for tests and dry runs
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    delivered: Mutex<Vec<NotificationEvent>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order
    pub fn delivered(&self) -> Vec<NotificationEvent> {
        self.delivered
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Delivered milestones of one type for one user
    pub fn milestone_count(&self, user_id: &str, milestone_type: MilestoneType) -> usize {
        self.delivered()
            .iter()
            .filter(|e| {
                matches!(e, NotificationEvent::Milestone { user_id: u, milestone_type: m, .. }
                    if u == user_id && *m == milestone_type)
            })
            .count()
    }

    fn push(&self, event: NotificationEvent) -> Result<(), DispatchError> {
        self.delivered
            .lock()
            .map_err(|_| DispatchError("recording dispatcher poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn trigger_milestone(
        &self,
        user_id: &str,
        milestone_type: MilestoneType,
        payload: &MilestonePayload,
    ) -> Result<(), DispatchError> {
        self.push(NotificationEvent::Milestone {
            user_id: user_id.to_string(),
            milestone_type,
            payload: payload.clone(),
        })
    }

    fn trigger_payoff_reminder(&self, debt_id: &str) -> Result<(), DispatchError> {
        self.push(NotificationEvent::PayoffReminder {
            debt_id: debt_id.to_string(),
        })
    }
}
