//! Tries a chain of providers in order until one returns data.

use super::{Interval, MarketDataProvider};
use anyhow::{Result, bail};
use async_trait::async_trait;
use range_lp_domain::entities::{PriceCandle, TradingPair};
use tracing::{info, warn};

/// A provider that delegates to the first member with data.
pub struct FallbackProvider {
    providers: Vec<Box<dyn MarketDataProvider>>,
}

impl FallbackProvider {
    #[must_use]
    pub fn new(providers: Vec<Box<dyn MarketDataProvider>>) -> Self {
        Self { providers }
    }

    /// Names of the chained providers, in order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl MarketDataProvider for FallbackProvider {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn get_candles(
        &self,
        pair: &TradingPair,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<PriceCandle>> {
        for provider in &self.providers {
            match provider.get_candles(pair, interval, start_ms, end_ms).await {
                Ok(candles) if !candles.is_empty() => {
                    info!(provider = provider.name(), pair = %pair, count = candles.len(), "History found");
                    return Ok(candles);
                }
                Ok(_) => {
                    warn!(provider = provider.name(), pair = %pair, "No candles, trying next provider");
                }
                Err(e) => {
                    warn!(provider = provider.name(), pair = %pair, error = %e, "Fetch failed, trying next provider");
                }
            }
        }
        bail!("no provider had candles for {pair}")
    }

    async fn latest_candle(&self, pair: &TradingPair, interval: Interval) -> Result<PriceCandle> {
        for provider in &self.providers {
            match provider.latest_candle(pair, interval).await {
                Ok(candle) => return Ok(candle),
                Err(e) => {
                    warn!(provider = provider.name(), pair = %pair, error = %e, "Latest candle failed, trying next provider");
                }
            }
        }
        bail!("no provider had a latest candle for {pair}")
    }
}
