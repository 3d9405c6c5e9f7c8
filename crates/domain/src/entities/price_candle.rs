use crate::value_objects::price::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar. `volume` is denominated in the base asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCandle {
    /// Bar open time in milliseconds since the Unix epoch.
    pub open_time: i64,

    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,

    pub volume: Decimal,
}

impl PriceCandle {
    pub fn new(
        open_time: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            open_time,
            open: Price::new(open),
            high: Price::new(high),
            low: Price::new(low),
            close: Price::new(close),
            volume,
        }
    }

    /// Execution price proxy `(high + low + 2 * close) / 4`.
    pub fn typical_price(&self) -> Price {
        let sum = self.high.value + self.low.value + Decimal::TWO * self.close.value;
        Price::new(sum / Decimal::from(4))
    }

    /// Volume converted to the quote asset at the close.
    pub fn quote_volume(&self) -> Decimal {
        self.volume * self.close.value
    }

    pub fn open_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.open_time)
    }
}
