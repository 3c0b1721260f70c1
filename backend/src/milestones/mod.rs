//! Milestone detection
//!
//! - **progress**: aggregate progress and tier classification
//! - **detector**: awards milestones for zeroed debts (inline + periodic)
//! - **monitor**: clock-driven scheduler for the periodic pass
//!
//! # Critical Invariants
//!
//! 1. At most one record and one notification per `(user, milestone type)`
//! 2. At most one payoff reminder per debt
//! 3. A failed notification never undoes a recorded balance change

pub mod detector;
pub mod monitor;
pub mod progress;

pub use detector::{AwardedMilestone, DetectorError, MilestoneDetector, ScanReport};
pub use monitor::{MilestoneMonitor, MonitorHandle, MonitorRun};
pub use progress::Progress;
