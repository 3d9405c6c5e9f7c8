//! Live paper trading of the dynamic-range strategy.
//!
//! This crate provides:
//! - [`trader::PaperTrader`]: polls the latest candle on a fixed interval and
//!   drives the position state machine
//! - [`report`]: status-row console output and a CSV tick journal

/// Prelude module for convenient imports.
pub mod prelude;

/// Tick report sinks.
pub mod report;
/// Paper-trading loop.
pub mod trader;
