//! Market data access: exchange REST providers, a fallback chain, CSV
//! candle files and synthetic cross-rate resolution.

/// CSV candle files for offline replay.
pub mod csv_store;
/// Exchange providers.
pub mod providers;
/// Direct or USDT-routed price history.
pub mod synthetic;

pub use providers::{Interval, MarketDataProvider};
