//! Close-price history for a pair, direct or through USDT legs.
//!
//! Tier 1 asks for the pair itself. If no provider lists it, tier 2 builds a
//! synthetic cross rate `BASE/USDT ÷ QUOTE/USDT`.

use crate::providers::{Interval, MarketDataProvider};
use anyhow::{Context, Result, bail};
use range_lp_domain::entities::TradingPair;
use range_lp_domain::math::synthetic::synthetic_ratio_series;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Where a resolved history came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySource {
    /// The pair's own market.
    Direct,
    /// Ratio of two USDT markets.
    SyntheticViaUsdt {
        base_leg: TradingPair,
        quote_leg: TradingPair,
    },
}

/// Close prices for a pair, oldest first.
#[derive(Debug, Clone)]
pub struct ResolvedHistory {
    pub closes: Vec<Decimal>,
    pub source: HistorySource,
}

/// Resolves close-price history for `pair`, falling back to a synthetic series.
///
/// # Errors
/// Fails if neither the direct market nor both USDT legs have data, or if a
/// quote-leg price is zero.
pub async fn resolve_close_history(
    provider: &dyn MarketDataProvider,
    pair: &TradingPair,
    interval: Interval,
    start_ms: i64,
    end_ms: i64,
) -> Result<ResolvedHistory> {
    match provider.get_candles(pair, interval, start_ms, end_ms).await {
        Ok(candles) if !candles.is_empty() => {
            return Ok(ResolvedHistory {
                closes: candles.iter().map(|c| c.close.value).collect(),
                source: HistorySource::Direct,
            });
        }
        Ok(_) => warn!(pair = %pair, "No direct history"),
        Err(e) => warn!(pair = %pair, error = %e, "Direct history failed"),
    }

    let base_leg = TradingPair::usdt_leg(&pair.base);
    let quote_leg = TradingPair::usdt_leg(&pair.quote);
    if quote_leg.base == "USDT" {
        bail!("no history for {pair} and its quote is already USDT");
    }
    info!(pair = %pair, base_leg = %base_leg, quote_leg = %quote_leg, "Building synthetic history");

    let base = provider
        .get_candles(&base_leg, interval, start_ms, end_ms)
        .await
        .with_context(|| format!("no history for {base_leg}"))?;
    let quote = provider
        .get_candles(&quote_leg, interval, start_ms, end_ms)
        .await
        .with_context(|| format!("no history for {quote_leg}"))?;

    let base_closes: Vec<Decimal> = base.iter().map(|c| c.close.value).collect();
    let quote_closes: Vec<Decimal> = quote.iter().map(|c| c.close.value).collect();
    let closes = synthetic_ratio_series(&base_closes, &quote_closes)
        .with_context(|| format!("cannot build {pair} from {base_leg} and {quote_leg}"))?;

    Ok(ResolvedHistory {
        closes,
        source: HistorySource::SyntheticViaUsdt {
            base_leg,
            quote_leg,
        },
    })
}
