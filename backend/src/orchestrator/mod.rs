//! Orchestrator - the engine that ties planning, recording and milestones together
//!
//! See `engine.rs` for the full implementation.

pub mod engine;

pub use engine::{DebtEngine, EngineError, NewDebt};
