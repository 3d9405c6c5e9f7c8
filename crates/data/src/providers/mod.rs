//! Market data providers.

pub mod binance;
pub mod fallback;
pub mod kucoin;

pub use binance::BinanceProvider;
pub use fallback::FallbackProvider;
pub use kucoin::KucoinProvider;

use anyhow::{Result, bail};
use async_trait::async_trait;
use range_lp_domain::entities::{PriceCandle, TradingPair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle interval supported by the providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Minute1,
    Hour1,
}

impl Interval {
    /// Interval length in milliseconds.
    #[must_use]
    pub fn millis(self) -> i64 {
        match self {
            Self::Minute1 => 60_000,
            Self::Hour1 => 3_600_000,
        }
    }

    /// Binance `interval` parameter.
    #[must_use]
    pub fn binance_code(self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Hour1 => "1h",
        }
    }

    /// KuCoin `type` parameter.
    #[must_use]
    pub fn kucoin_code(self) -> &'static str {
        match self {
            Self::Minute1 => "1min",
            Self::Hour1 => "1hour",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binance_code())
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1m" => Ok(Self::Minute1),
            "1h" => Ok(Self::Hour1),
            other => bail!("unsupported interval `{other}`, expected 1m or 1h"),
        }
    }
}

/// Trait for fetching OHLCV data from an exchange.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Candles with `start_ms <= open_time < end_ms`, oldest first.
    ///
    /// Wrapped tokens in `pair` are mapped to exchange tickers by the provider.
    async fn get_candles(
        &self,
        pair: &TradingPair,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<PriceCandle>>;

    /// The most recent completed candle.
    async fn latest_candle(&self, pair: &TradingPair, interval: Interval) -> Result<PriceCandle>;

    /// Quote-currency volume over a window, summed from hourly candles.
    async fn quote_volume(&self, pair: &TradingPair, start_ms: i64, end_ms: i64) -> Result<Decimal> {
        let candles = self.get_candles(pair, Interval::Hour1, start_ms, end_ms).await?;
        Ok(candles.iter().map(PriceCandle::quote_volume).sum())
    }
}

/// Parses a decimal encoded as a JSON string or number.
pub(crate) fn json_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_codes() {
        assert_eq!("1h".parse::<Interval>().unwrap(), Interval::Hour1);
        assert_eq!(Interval::Minute1.kucoin_code(), "1min");
        assert_eq!(Interval::Hour1.millis(), 3_600_000);
        assert!("5m".parse::<Interval>().is_err());
    }
}
