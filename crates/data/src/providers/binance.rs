//! Binance spot klines over REST.

use super::{Interval, MarketDataProvider, json_decimal};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use range_lp_domain::entities::{PriceCandle, TradingPair};
use std::time::Duration;
use tracing::{debug, info};

const BINANCE_REST_URL: &str = "https://api.binance.com";
const PAGE_LIMIT: usize = 1000;
/// Pause between paginated requests.
const PAGE_PAUSE: Duration = Duration::from_millis(250);

/// Binance public market data client.
#[derive(Debug, Clone)]
pub struct BinanceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceProvider {
    /// Creates a client against the public Binance API.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_base_url(BINANCE_REST_URL)
    }

    /// Creates a client against a custom base URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn symbol(pair: &TradingPair) -> String {
        pair.to_exchange_pair().joined("")
    }

    async fn fetch_page(&self, query: &[(&str, String)]) -> Result<Vec<PriceCandle>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .context("Failed to fetch klines from Binance")?;

        if !response.status().is_success() {
            bail!("Binance API returned error: {}", response.status());
        }

        let body = response
            .text()
            .await
            .context("Failed to read Binance klines response")?;
        parse_klines(&body)
    }
}

/// Parses a klines payload: `[[open_time, "open", "high", "low", "close", "volume", ...], ...]`.
///
/// # Errors
/// Returns an error if the body is not a klines array or a row is malformed.
pub fn parse_klines(body: &str) -> Result<Vec<PriceCandle>> {
    let rows: Vec<Vec<serde_json::Value>> =
        serde_json::from_str(body).context("Failed to parse Binance klines response")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let field = |idx: usize| {
                row.get(idx)
                    .and_then(json_decimal)
                    .ok_or_else(|| anyhow!("kline {i}: bad field {idx}"))
            };
            let open_time = row
                .first()
                .and_then(serde_json::Value::as_i64)
                .ok_or_else(|| anyhow!("kline {i}: missing open time"))?;
            Ok(PriceCandle::new(
                open_time,
                field(1)?,
                field(2)?,
                field(3)?,
                field(4)?,
                field(5)?,
            ))
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    async fn get_candles(
        &self,
        pair: &TradingPair,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<PriceCandle>> {
        let symbol = Self::symbol(pair);
        info!(symbol = %symbol, interval = %interval, start_ms, end_ms, "Fetching candles from Binance");

        let mut candles = Vec::new();
        let mut since = start_ms;
        while since < end_ms {
            let page = self
                .fetch_page(&[
                    ("symbol", symbol.clone()),
                    ("interval", interval.binance_code().to_string()),
                    ("startTime", since.to_string()),
                    ("endTime", (end_ms - 1).to_string()),
                    ("limit", PAGE_LIMIT.to_string()),
                ])
                .await?;

            let Some(last) = page.last() else {
                break;
            };
            since = last.open_time + 1;
            let full_page = page.len() >= PAGE_LIMIT;
            candles.extend(page.into_iter().filter(|c| c.open_time < end_ms));
            debug!(symbol = %symbol, fetched = candles.len(), "Binance page");

            if !full_page {
                break;
            }
            tokio::time::sleep(PAGE_PAUSE).await;
        }

        info!(symbol = %symbol, count = candles.len(), "Candles fetched");
        Ok(candles)
    }

    async fn latest_candle(&self, pair: &TradingPair, interval: Interval) -> Result<PriceCandle> {
        // with limit=2 the first row is the last completed candle
        let page = self
            .fetch_page(&[
                ("symbol", Self::symbol(pair)),
                ("interval", interval.binance_code().to_string()),
                ("limit", "2".to_string()),
            ])
            .await?;
        page.into_iter()
            .next()
            .ok_or_else(|| anyhow!("Binance returned no candles for {pair}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const KLINES: &str = r#"[
        [1710720000000, "3500.10", "3520.00", "3490.50", "3510.25", "1234.5", 1710723599999, "4331000.1", 100, "600.0", "2100000.0", "0"],
        [1710723600000, "3510.25", "3530.00", "3505.00", "3525.00", "987.25", 1710727199999, "3480000.0", 90, "500.0", "1760000.0", "0"]
    ]"#;

    #[test]
    fn test_parse_klines() {
        let candles = parse_klines(KLINES).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1_710_720_000_000);
        assert_eq!(candles[0].close.value, dec!(3510.25));
        assert_eq!(candles[1].high.value, dec!(3530.00));
        assert_eq!(candles[1].volume, dec!(987.25));
    }

    #[test]
    fn test_parse_klines_rejects_malformed_row() {
        let err = parse_klines(r#"[[1710720000000, "1", "2"]]"#).unwrap_err();
        assert!(err.to_string().contains("kline 0"));
        assert!(parse_klines(r#"{"code": -1121, "msg": "Invalid symbol."}"#).is_err());
    }

    #[test]
    fn test_symbol_unwraps_tokens() {
        let pair: TradingPair = "WETH/USDT".parse().unwrap();
        assert_eq!(BinanceProvider::symbol(&pair), "ETHUSDT");
    }

    #[test]
    fn test_empty_payload() {
        assert!(parse_klines("[]").unwrap().is_empty());
    }
}
