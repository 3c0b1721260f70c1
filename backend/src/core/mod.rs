//! Core primitives shared by every engine component
//!
//! - **money**: fixed-point cents arithmetic and interest accrual
//! - **clock**: injectable wall clock (system or virtual)
//! - **config**: engine configuration loaded from JSON

pub mod clock;
pub mod config;
pub mod money;
