//! Strategy simulation for dynamic-range concentrated liquidity.
//!
//! Provides the position state machine and the models and front ends built
//! on it:
//! - [`state_machine`]: searching / in-position bookkeeping per tick
//! - [`fee_model`], [`liquidity`], [`volume`]: heuristic fee estimates
//! - [`backtest`]: rolling replay over historical candles
//! - [`monthly`], [`hourly`]: fee-profit analyses

pub mod backtest;
pub mod config;
pub mod event;
pub mod fee_model;
pub mod hourly;
pub mod liquidity;
pub mod monthly;
pub mod prelude;
pub mod state;
pub mod state_machine;
pub mod volume;
