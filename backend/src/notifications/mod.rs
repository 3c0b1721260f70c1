//! Notifications
//!
//! Two separate failure domains: the state change that earned an event must
//! succeed or fail on its own; delivery of the event is best-effort through
//! the [`NotificationOutbox`].

pub mod dispatcher;
pub mod outbox;

pub use dispatcher::{
    DispatchError, LogDispatcher, MilestonePayload, NotificationDispatcher, NotificationEvent,
    RecordingDispatcher,
};
pub use outbox::{FlushReport, NotificationOutbox};
