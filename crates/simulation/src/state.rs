//! Market observations fed into the simulation.

use chrono::{DateTime, Datelike, Utc, Weekday};
use range_lp_domain::entities::PriceCandle;
use range_lp_domain::value_objects::price::Price;
use rust_decimal::Decimal;

/// What the strategy sees on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSnapshot {
    /// Observation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Price used for range checks and valuation.
    pub price: Price,
    /// Base-asset volume traded during the tick.
    pub volume: Decimal,
}

impl MarketSnapshot {
    /// Creates a new snapshot.
    #[must_use]
    pub fn new(timestamp: i64, price: Price, volume: Decimal) -> Self {
        Self {
            timestamp,
            price,
            volume,
        }
    }

    /// Snapshot at the candle close.
    #[must_use]
    pub fn from_close(candle: &PriceCandle) -> Self {
        Self::new(candle.open_time, candle.close, candle.volume)
    }

    /// Snapshot at the candle's typical price.
    #[must_use]
    pub fn from_typical(candle: &PriceCandle) -> Self {
        Self::new(candle.open_time, candle.typical_price(), candle.volume)
    }

    /// Volume converted to USD at the snapshot price.
    #[must_use]
    pub fn volume_usd(&self) -> Decimal {
        self.volume * self.price.value
    }

    /// UTC datetime of the observation; the epoch if out of range.
    #[must_use]
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// Day of month (1-31).
    #[must_use]
    pub fn day_of_month(&self) -> u32 {
        self.datetime().day()
    }

    /// Saturday or Sunday in UTC.
    #[must_use]
    pub fn is_weekend(&self) -> bool {
        matches!(self.datetime().weekday(), Weekday::Sat | Weekday::Sun)
    }
}
