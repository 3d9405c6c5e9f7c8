//! KuCoin spot candles over REST.

use super::{Interval, MarketDataProvider, json_decimal};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use range_lp_domain::entities::{PriceCandle, TradingPair};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

const KUCOIN_REST_URL: &str = "https://api.kucoin.com";
const PAGE_LIMIT: i64 = 1500;
const SUCCESS_CODE: &str = "200000";

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Vec<Vec<serde_json::Value>>,
}

/// KuCoin public market data client.
#[derive(Debug, Clone)]
pub struct KucoinProvider {
    client: reqwest::Client,
    base_url: String,
    page_pause: Duration,
}

impl KucoinProvider {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_base_url(KUCOIN_REST_URL)
    }

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
            page_pause: Duration::from_millis(350),
        })
    }

    fn symbol(pair: &TradingPair) -> String {
        pair.to_exchange_pair().joined("-")
    }

    async fn fetch_window(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<PriceCandle>> {
        let url = format!("{}/api/v1/market/candles", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("type", interval.kucoin_code().to_string()),
                ("symbol", symbol.to_string()),
                ("startAt", (start_ms / 1000).to_string()),
                ("endAt", (end_ms / 1000).to_string()),
            ])
            .send()
            .await
            .context("Failed to fetch candles from KuCoin")?;

        if !response.status().is_success() {
            bail!("KuCoin API returned error: {}", response.status());
        }
        let body = response
            .text()
            .await
            .context("Failed to read KuCoin candles response")?;
        parse_candles(&body)
    }
}

/// Parses a candles payload. KuCoin rows are
/// `["time_secs", "open", "close", "high", "low", "volume", "turnover"]`,
/// newest first; the result is oldest first.
///
/// # Errors
/// Returns an error on a non-success code or a malformed row.
pub fn parse_candles(body: &str) -> Result<Vec<PriceCandle>> {
    let response: CandlesResponse =
        serde_json::from_str(body).context("Failed to parse KuCoin candles response")?;
    if response.code != SUCCESS_CODE {
        bail!(
            "KuCoin API error {}: {}",
            response.code,
            response.msg.unwrap_or_default()
        );
    }

    let mut candles = response
        .data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let field = |idx: usize| {
                row.get(idx)
                    .and_then(json_decimal)
                    .ok_or_else(|| anyhow!("candle {i}: bad field {idx}"))
            };
            let open_secs = row
                .first()
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| anyhow!("candle {i}: bad open time"))?;
            Ok(PriceCandle::new(
                open_secs * 1000,
                field(1)?,
                field(3)?,
                field(4)?,
                field(2)?,
                field(5)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    candles.sort_by_key(|c| c.open_time);
    Ok(candles)
}

#[async_trait]
impl MarketDataProvider for KucoinProvider {
    fn name(&self) -> &str {
        "kucoin"
    }

    async fn get_candles(
        &self,
        pair: &TradingPair,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<PriceCandle>> {
        let symbol = Self::symbol(pair);
        info!(symbol = %symbol, interval = %interval, start_ms, end_ms, "Fetching candles from KuCoin");

        let chunk = PAGE_LIMIT * interval.millis();
        let mut candles = Vec::new();
        let mut window_start = start_ms;
        while window_start < end_ms {
            let window_end = (window_start + chunk).min(end_ms);
            let page = self
                .fetch_window(&symbol, interval, window_start, window_end)
                .await?;
            candles.extend(
                page.into_iter()
                    .filter(|c| c.open_time >= window_start && c.open_time < window_end),
            );
            window_start = window_end;
            if window_start < end_ms {
                tokio::time::sleep(self.page_pause).await;
            }
        }

        candles.dedup_by_key(|c| c.open_time);
        info!(symbol = %symbol, count = candles.len(), "Candles fetched");
        Ok(candles)
    }

    async fn latest_candle(&self, pair: &TradingPair, interval: Interval) -> Result<PriceCandle> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let page = self
            .fetch_window(&Self::symbol(pair), interval, now_ms - 3 * interval.millis(), now_ms)
            .await?;
        // the newest row is still forming
        let completed = page.len().saturating_sub(1);
        page.into_iter()
            .take(completed)
            .last()
            .ok_or_else(|| anyhow!("KuCoin returned no completed candles for {pair}"))
    }
}
