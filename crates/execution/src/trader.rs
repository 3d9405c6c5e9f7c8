//! Paper trader: the live polling loop around the position state machine.

use crate::report::ReportSink;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use range_lp_data::synthetic::{HistorySource, resolve_close_history};
use range_lp_data::{Interval, MarketDataProvider};
use range_lp_domain::entities::{PriceCandle, TradingPair};
use range_lp_domain::enums::StrategyState;
use range_lp_domain::math::RangeEstimate;
use range_lp_domain::value_objects::price::Price;
use range_lp_domain::value_objects::price_range::PriceRange;
use range_lp_simulation::backtest::RangePolicy;
use range_lp_simulation::config::StrategyConfig;
use range_lp_simulation::fee_model::build_fee_model;
use range_lp_simulation::state::MarketSnapshot;
use range_lp_simulation::state_machine::{PositionStateMachine, StrategyTotals, TickReport};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// Outcome of a paper-trading session.
#[derive(Debug, Clone)]
pub struct TraderSummary {
    /// Ticks that produced a report.
    pub ticks: u64,
    /// Ticks skipped because of an error.
    pub failed_ticks: u64,
    pub totals: StrategyTotals,
    pub cash: Decimal,
}

/// Polls the latest one-minute candle and feeds it to the state machine.
///
/// While searching, the range is rebuilt from the trailing lookback history
/// before every tick unless the policy is [`RangePolicy::Fixed`].
pub struct PaperTrader {
    provider: Arc<dyn MarketDataProvider>,
    pair: TradingPair,
    source: HistorySource,
    machine: PositionStateMachine,
    sinks: Vec<Box<dyn ReportSink>>,
    policy: RangePolicy,
    poll_interval: Duration,
    ticks: u64,
    failed_ticks: u64,
}

/// Computes a range from the `lookback` hourly closes ending at `now_ms`.
async fn lookback_range(
    provider: &dyn MarketDataProvider,
    pair: &TradingPair,
    config: &StrategyConfig,
    now_ms: i64,
) -> Result<(RangeEstimate, HistorySource)> {
    let lookback = config.lookback;
    let span = i64::try_from(lookback)
        .ok()
        .and_then(|n| Interval::Hour1.millis().checked_mul(n))
        .context("lookback window too large")?;
    let start_ms = now_ms
        .checked_sub(span)
        .context("lookback window starts before the epoch range")?;

    let history = resolve_close_history(provider, pair, Interval::Hour1, start_ms, now_ms)
        .await
        .with_context(|| format!("could not load lookback history for {pair}"))?;
    if history.closes.is_empty() {
        bail!("lookback history for {pair} is empty");
    }

    let window = &history.closes[history.closes.len().saturating_sub(lookback)..];
    let estimate = config
        .range_calculator()
        .calculate(window)
        .context("failed to compute trading range")?;
    Ok((estimate, history.source))
}

/// Snapshot for a pair quoted through two USDT legs.
///
/// The price is the ratio of the closes. The volume is the base leg's volume
/// in base-asset units, so `volume_usd()` yields the base leg's notional
/// expressed in the quote asset. Trades on the direct cross are not observed.
fn synthetic_snapshot(base: &PriceCandle, quote: &PriceCandle) -> Result<MarketSnapshot> {
    if !quote.close.is_positive() {
        bail!("quote leg returned a non-positive price");
    }
    let price = Price::new(base.close.value / quote.close.value);
    Ok(MarketSnapshot::new(base.open_time, price, base.volume))
}

impl PaperTrader {
    /// Fetches `lookback` hours of history ending at `now_ms` and computes
    /// the trading range.
    ///
    /// # Errors
    /// Fails on invalid configuration, when no history can be obtained, or
    /// when the range cannot be computed. All of these are fatal.
    pub async fn initialize(
        provider: Arc<dyn MarketDataProvider>,
        pair: TradingPair,
        config: StrategyConfig,
        now_ms: i64,
    ) -> Result<Self> {
        config.validate().context("invalid strategy configuration")?;

        let (estimate, source) =
            lookback_range(provider.as_ref(), &pair, &config, now_ms).await?;
        info!(
            pair = %pair,
            samples = estimate.samples,
            mean = %estimate.mean,
            fallback = estimate.used_fallback,
            range = %estimate.range,
            "New range calculated"
        );

        let fee_model = build_fee_model(
            config.fee_model,
            config.fee_tier,
            config.fee_estimate_scalar,
            config.pool_tvl_usd,
            None,
        );
        let poll_interval = Duration::from_secs(config.poll_interval_secs);
        let mut machine = PositionStateMachine::new(config, fee_model)?;
        machine.set_search_range(estimate.range);

        Ok(Self {
            provider,
            pair,
            source,
            machine,
            sinks: Vec::new(),
            policy: RangePolicy::default(),
            poll_interval,
            ticks: 0,
            failed_ticks: 0,
        })
    }

    /// Adds a sink that receives every tick report.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    pub fn range(&self) -> Option<PriceRange> {
        self.machine.search_range()
    }

    pub fn source(&self) -> &HistorySource {
        &self.source
    }

    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    pub fn machine(&self) -> &PositionStateMachine {
        &self.machine
    }

    /// Rebuilds the searching range; a failure keeps the previous one.
    async fn refresh_range(&mut self, now_ms: i64) {
        let result =
            lookback_range(self.provider.as_ref(), &self.pair, self.machine.config(), now_ms)
                .await;
        match result {
            Ok((estimate, source)) => {
                if self.machine.search_range() != Some(estimate.range) {
                    info!(
                        pair = %self.pair,
                        mean = %estimate.mean,
                        fallback = estimate.used_fallback,
                        range = %estimate.range,
                        "New range calculated"
                    );
                }
                self.machine.set_search_range(estimate.range);
                self.source = source;
            }
            Err(e) => {
                warn!(error = %e, "Range recompute failed, keeping previous range");
            }
        }
    }

    /// Latest observation, built from USDT legs when the history was synthetic.
    async fn latest_snapshot(&self) -> Result<MarketSnapshot> {
        match &self.source {
            HistorySource::Direct => {
                let candle = self
                    .provider
                    .latest_candle(&self.pair, Interval::Minute1)
                    .await?;
                Ok(MarketSnapshot::from_close(&candle))
            }
            HistorySource::SyntheticViaUsdt {
                base_leg,
                quote_leg,
            } => {
                let base = self
                    .provider
                    .latest_candle(base_leg, Interval::Minute1)
                    .await?;
                let quote = self
                    .provider
                    .latest_candle(quote_leg, Interval::Minute1)
                    .await?;
                synthetic_snapshot(&base, &quote)
                    .with_context(|| format!("could not price {base_leg} in {quote_leg}"))
            }
        }
    }

    /// Runs one polling iteration and hands the report to every sink.
    ///
    /// # Errors
    /// Fails if the market data fetch, the state machine or a sink fails.
    /// The machine state is unchanged when the fetch or the tick fails.
    pub async fn tick(&mut self) -> Result<TickReport> {
        if self.policy == RangePolicy::RecomputeWhileSearching
            && self.machine.state() == StrategyState::Searching
        {
            self.refresh_range(Utc::now().timestamp_millis()).await;
        }
        let snapshot = self
            .latest_snapshot()
            .await
            .with_context(|| format!("could not fetch market data for {}", self.pair))?;
        let report = self.machine.on_tick(&snapshot)?;
        self.ticks += 1;

        debug!(
            status = %report.status,
            price = %report.price,
            pnl = %report.total_pnl,
            "Tick processed"
        );
        for sink in &mut self.sinks {
            sink.on_report(&report)?;
        }
        Ok(report)
    }

    /// Polls until Ctrl-C.
    ///
    /// # Errors
    /// Only setup errors propagate; tick failures are logged and retried on
    /// the next interval.
    pub async fn run(&mut self) -> Result<TraderSummary> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Polls until `shutdown` completes.
    ///
    /// # Errors
    /// Currently never fails; the signature leaves room for fatal conditions.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<TraderSummary>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.poll_interval);
        tokio::pin!(shutdown);

        info!(
            pair = %self.pair,
            interval_secs = self.poll_interval.as_secs(),
            "Starting paper trader"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        self.failed_ticks += 1;
                        error!(error = %e, "Tick failed, retrying next interval");
                    }
                }
            }
        }

        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            failed = summary.failed_ticks,
            cash = %summary.cash,
            realized_pnl = %summary.totals.realized_pnl,
            "Paper trader stopped"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> TraderSummary {
        TraderSummary {
            ticks: self.ticks,
            failed_ticks: self.failed_ticks,
            totals: self.machine.totals().clone(),
            cash: self.machine.cash(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use range_lp_domain::entities::PriceCandle;
    use range_lp_domain::enums::{StrategyState, TickStatus};
    use range_lp_simulation::fee_model::FeeModelKind;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Hourly history per symbol plus a queue of "latest" closes.
    #[derive(Default)]
    struct Scripted {
        history: Mutex<HashMap<String, Vec<Decimal>>>,
        latest: Mutex<HashMap<String, VecDeque<Decimal>>>,
    }

    impl Scripted {
        fn with_history(self, symbol: &str, closes: &[Decimal]) -> Self {
            self.set_history(symbol, closes);
            self
        }

        fn set_history(&self, symbol: &str, closes: &[Decimal]) {
            self.history
                .lock()
                .unwrap()
                .insert(symbol.to_string(), closes.to_vec());
        }

        fn with_latest(self, symbol: &str, closes: &[Decimal]) -> Self {
            self.latest
                .lock()
                .unwrap()
                .insert(symbol.to_string(), closes.iter().copied().collect());
            self
        }
    }

    fn candle(ts: i64, close: Decimal) -> PriceCandle {
        PriceCandle::new(ts, close, close, close, close, dec!(10))
    }

    #[async_trait]
    impl MarketDataProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn get_candles(
            &self,
            pair: &TradingPair,
            _: Interval,
            _: i64,
            _: i64,
        ) -> Result<Vec<PriceCandle>> {
            Ok(self
                .history
                .lock()
                .unwrap()
                .get(&pair.to_exchange_pair().to_string())
                .map(|closes| {
                    closes
                        .iter()
                        .enumerate()
                        .map(|(i, c)| candle(i as i64, *c))
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn latest_candle(&self, pair: &TradingPair, _: Interval) -> Result<PriceCandle> {
            let mut latest = self.latest.lock().unwrap();
            latest
                .get_mut(&pair.to_exchange_pair().to_string())
                .and_then(VecDeque::pop_front)
                .map(|c| candle(0, c))
                .ok_or_else(|| anyhow!("no data"))
        }
    }

    struct Recorder(Arc<Mutex<Vec<TickReport>>>);

    impl ReportSink for Recorder {
        fn on_report(&mut self, report: &TickReport) -> Result<()> {
            self.0.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn config() -> StrategyConfig {
        StrategyConfig {
            fee_model: FeeModelKind::ActivityShare,
            poll_interval_secs: 1,
            ..StrategyConfig::default()
        }
    }

    async fn init_trader(provider: Scripted) -> PaperTrader {
        PaperTrader::initialize(
            Arc::new(provider),
            "ETH/USDT".parse().unwrap(),
            config(),
            1_000_000,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_computes_range() {
        let provider = Scripted::default().with_history("ETH/USDT", &[dec!(90), dec!(100), dec!(102)]);
        let trader = init_trader(provider).await;

        let range = trader.range().unwrap();
        // trailing two closes: mean 101
        assert!(range.contains(Price::new(dec!(101))));
        assert!(!range.contains(Price::new(dec!(95))));
        assert_eq!(trader.source(), &HistorySource::Direct);
    }

    #[tokio::test]
    async fn test_initialize_without_history_is_fatal() {
        let result = PaperTrader::initialize(
            Arc::new(Scripted::default()),
            "ETH/USDT".parse().unwrap(),
            config(),
            1_000_000,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ticks_drive_state_machine() {
        let provider = Scripted::default()
            .with_history("ETH/USDT", &[dec!(100), dec!(102)])
            .with_latest("ETH/USDT", &[dec!(95), dec!(101), dec!(102), dec!(120)]);
        let reports = Arc::new(Mutex::new(Vec::new()));
        let mut trader = init_trader(provider)
            .await
            .with_sink(Box::new(Recorder(reports.clone())));

        assert_eq!(trader.tick().await.unwrap().status, TickStatus::OutOfRange);
        assert_eq!(trader.tick().await.unwrap().status, TickStatus::PositionOpened);
        assert_eq!(trader.machine().state(), StrategyState::InPosition);
        assert_eq!(trader.tick().await.unwrap().status, TickStatus::InRange);
        assert_eq!(trader.tick().await.unwrap().status, TickStatus::Exited);
        assert_eq!(trader.machine().state(), StrategyState::Searching);

        assert_eq!(reports.lock().unwrap().len(), 4);
        let summary = trader.summary();
        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.totals.positions_opened, 1);
        assert_eq!(summary.totals.positions_closed, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_state_unchanged() {
        let provider = Scripted::default()
            .with_history("ETH/USDT", &[dec!(100), dec!(102)])
            .with_latest("ETH/USDT", &[dec!(101)]);
        let mut trader = init_trader(provider).await;

        trader.tick().await.unwrap();
        let cash = trader.machine().cash();
        assert!(trader.tick().await.is_err());
        assert_eq!(trader.machine().cash(), cash);
        assert_eq!(trader.machine().state(), StrategyState::InPosition);
    }

    #[tokio::test]
    async fn test_synthetic_pair_uses_usdt_legs() {
        let provider = Scripted::default()
            .with_history("BNB/USDT", &[dec!(600), dec!(606)])
            .with_history("ETH/USDT", &[dec!(3000), dec!(3000)])
            .with_latest("BNB/USDT", &[dec!(603)])
            .with_latest("ETH/USDT", &[dec!(3000)]);
        let mut trader = PaperTrader::initialize(
            Arc::new(provider),
            "WBNB/WETH".parse().unwrap(),
            config(),
            1_000_000,
        )
        .await
        .unwrap();

        assert!(matches!(
            trader.source(),
            HistorySource::SyntheticViaUsdt { .. }
        ));
        let report = trader.tick().await.unwrap();
        assert_eq!(report.price.value, dec!(0.201));
        assert_eq!(report.status, TickStatus::PositionOpened);
    }

    #[tokio::test]
    async fn test_searching_range_follows_history() {
        let provider = Arc::new(
            Scripted::default()
                .with_history("ETH/USDT", &[dec!(100), dec!(102)])
                .with_latest("ETH/USDT", &[dec!(101), dec!(120), dec!(120), dec!(120)]),
        );
        let shared: Arc<dyn MarketDataProvider> = provider.clone();
        let mut trader =
            PaperTrader::initialize(shared, "ETH/USDT".parse().unwrap(), config(), 1_000_000)
                .await
                .unwrap();
        assert_eq!(trader.policy(), RangePolicy::RecomputeWhileSearching);

        assert_eq!(trader.tick().await.unwrap().status, TickStatus::PositionOpened);
        assert_eq!(trader.tick().await.unwrap().status, TickStatus::Exited);
        assert_eq!(trader.tick().await.unwrap().status, TickStatus::OutOfRange);

        // the market settles around 120
        provider.set_history("ETH/USDT", &[dec!(120), dec!(120)]);
        assert_eq!(trader.tick().await.unwrap().status, TickStatus::PositionOpened);
        assert!(trader.range().unwrap().contains(Price::new(dec!(120))));
        assert_eq!(trader.summary().totals.positions_opened, 2);
    }

    #[tokio::test]
    async fn test_fixed_policy_keeps_initial_range() {
        let provider = Arc::new(
            Scripted::default()
                .with_history("ETH/USDT", &[dec!(100), dec!(102)])
                .with_latest("ETH/USDT", &[dec!(120)]),
        );
        let shared: Arc<dyn MarketDataProvider> = provider.clone();
        let mut trader =
            PaperTrader::initialize(shared, "ETH/USDT".parse().unwrap(), config(), 1_000_000)
                .await
                .unwrap()
                .with_policy(RangePolicy::Fixed);
        let initial = trader.range();

        provider.set_history("ETH/USDT", &[dec!(120), dec!(120)]);
        assert_eq!(trader.tick().await.unwrap().status, TickStatus::OutOfRange);
        assert_eq!(trader.range(), initial);
    }

    #[tokio::test]
    async fn test_failed_recompute_keeps_previous_range() {
        let provider = Arc::new(
            Scripted::default()
                .with_history("ETH/USDT", &[dec!(100), dec!(102)])
                .with_latest("ETH/USDT", &[dec!(101)]),
        );
        let shared: Arc<dyn MarketDataProvider> = provider.clone();
        let mut trader =
            PaperTrader::initialize(shared, "ETH/USDT".parse().unwrap(), config(), 1_000_000)
                .await
                .unwrap();
        let initial = trader.range();

        provider.set_history("ETH/USDT", &[]);
        assert_eq!(trader.tick().await.unwrap().status, TickStatus::PositionOpened);
        assert_eq!(trader.range(), initial);
    }

    #[test]
    fn test_synthetic_snapshot_volume_in_quote_units() {
        let base = PriceCandle::new(0, dec!(603), dec!(603), dec!(603), dec!(603), dec!(10));
        let quote = candle(0, dec!(3000));
        let snapshot = synthetic_snapshot(&base, &quote).unwrap();

        assert_eq!(snapshot.price.value, dec!(0.201));
        assert_eq!(snapshot.volume, dec!(10));
        // 10 BNB at 603 USDT, expressed in ETH at 3000 USDT
        assert_eq!(snapshot.volume_usd(), dec!(2.01));

        let zero = candle(0, Decimal::ZERO);
        assert!(synthetic_snapshot(&base, &zero).is_err());
    }

    #[tokio::test]
    async fn test_run_until_counts_failures_and_stops() {
        let provider = Scripted::default().with_history("ETH/USDT", &[dec!(100), dec!(102)]);
        let mut trader = init_trader(provider).await;

        let summary = trader
            .run_until(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.failed_ticks, 1);
        assert_eq!(summary.cash, dec!(1000));
    }
}
