//! Domain types and math for dynamic-range concentrated liquidity simulation.
//!
//! This crate holds everything that is pure calculation:
//! - value objects (`Price`, `PriceRange`)
//! - entities (`PriceCandle`, `Position`, `TradingPair`)
//! - statistics and the volatility-based range calculator
//! - impermanent loss, fee and exit PnL metrics

/// Entities with identity or structure beyond a single value.
pub mod entities;
/// Enumerations shared across crates.
pub mod enums;
/// Domain error type.
pub mod error;
/// Statistics and range math.
pub mod math;
/// Performance metrics.
pub mod metrics;
/// Immutable value objects.
pub mod value_objects;

pub use error::{DomainError, DomainResult};
