//! Command line interface for the dynamic-range liquidity simulator.
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use range_lp_data::csv_store::{read_candles, write_candles};
use range_lp_data::providers::{BinanceProvider, FallbackProvider, KucoinProvider};
use range_lp_data::synthetic::resolve_close_history;
use range_lp_data::{Interval, MarketDataProvider};
use range_lp_domain::entities::{PriceCandle, TradingPair};
use range_lp_domain::metrics::{ExitInputs, estimate_exit};
use range_lp_domain::value_objects::price::Price;
use range_lp_domain::value_objects::price_range::PriceRange;
use range_lp_execution::prelude::*;
use range_lp_simulation::prelude::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod output;
mod settings;

use settings::{AppConfig, ProviderKind, StrategyOverrides};

/// Longest history a single command will request, about ten years.
const MAX_HISTORY_DAYS: i64 = 3650;
const DAY_MS: i64 = 86_400_000;

#[derive(Parser)]
#[command(name = "range-lp")]
#[command(about = "Dynamic-range concentrated liquidity simulator", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "RANGE_LP_CONFIG")]
    config: Option<PathBuf>,

    /// Trading pair, e.g. ETH/USDT or WBNB/WETH
    #[arg(short, long, global = true)]
    pair: Option<String>,

    /// Market data providers in fallback order
    #[arg(long, value_enum, value_delimiter = ',', global = true)]
    providers: Option<Vec<ProviderKind>>,

    #[command(flatten)]
    overrides: StrategyOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the dynamic range from recent hourly closes
    Range {
        /// Read candles from a CSV file instead of the exchange
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Download candles to a CSV file
    Fetch {
        #[arg(short, long, default_value = "1h")]
        interval: Interval,

        /// Days of history
        #[arg(short, long, default_value_t = 30,
              value_parser = clap::value_parser!(i64).range(1..=MAX_HISTORY_DAYS))]
        days: i64,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Replay hourly candles through the position state machine
    Backtest {
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Days of history when fetching from the exchange
        #[arg(short, long, default_value_t = 30,
              value_parser = clap::value_parser!(i64).range(1..=MAX_HISTORY_DAYS))]
        days: i64,

        #[arg(long, value_enum, default_value_t = PolicyArg::Recompute)]
        policy: PolicyArg,

        /// Seed for the liquidity noise
        #[arg(long)]
        seed: Option<u64>,

        /// Append every tick to this CSV journal
        #[arg(long)]
        journal: Option<PathBuf>,
    },
    /// Monthly fee profit with a per-month dynamic range
    Monthly {
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(short, long, default_value_t = 6,
              value_parser = clap::value_parser!(i64).range(1..=MAX_HISTORY_DAYS / 31))]
        months: i64,

        /// Pool TVL in USD at the middle of each month's range
        #[arg(long)]
        base_tvl: Option<Decimal>,
    },
    /// Average hourly fee profit for a fixed range over the last N days
    Hourly {
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long)]
        low: Decimal,

        #[arg(long)]
        high: Decimal,

        /// Price where pool liquidity peaks (default: range midpoint)
        #[arg(long)]
        pivot: Option<Decimal>,

        #[arg(short, long, default_value_t = 7,
              value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PERIOD_DAYS)))]
        days: u32,

        /// Pool TVL in USD at the pivot
        #[arg(long)]
        base_tvl: Option<Decimal>,
    },
    /// Estimate fees, IL and PnL for exiting a position now
    ExitEstimate {
        #[arg(long)]
        entry_price: Decimal,

        /// Exit price (default: latest close)
        #[arg(long)]
        exit_price: Option<Decimal>,

        /// Hours the position was held
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_HISTORY_DAYS * 24))]
        hours: i64,

        /// Pool TVL in USD
        #[arg(long, default_value = "20000000")]
        tvl: Decimal,
    },
    /// Paper-trade the strategy against live prices until Ctrl-C
    Paper {
        /// Append every tick to this CSV journal
        #[arg(long)]
        journal: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = PolicyArg::Recompute)]
        policy: PolicyArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Keep the first range for the whole replay
    Fixed,
    /// Recompute the range on every searching tick
    Recompute,
}

impl From<PolicyArg> for RangePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Fixed => Self::Fixed,
            PolicyArg::Recompute => Self::RecomputeWhileSearching,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut app = AppConfig::load(cli.config.as_deref())?;
    if let Some(pair) = &cli.pair {
        app.market.pair = pair.clone();
    }
    if let Some(providers) = &cli.providers {
        app.market.providers = providers.clone();
    }
    cli.overrides.apply(&mut app.strategy);
    app.strategy
        .validate()
        .context("invalid strategy configuration")?;

    let pair: TradingPair = app.market.pair.parse()?;
    let strategy = app.strategy;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let hour_ms = Interval::Hour1.millis();

    match cli.command {
        Commands::Range { csv } => {
            let closes: Vec<Decimal> = match csv {
                Some(path) => read_candles(&path)?
                    .iter()
                    .map(|c| c.close.value)
                    .collect(),
                None => {
                    let provider = build_provider(&app.market.providers)?;
                    let lookback = i64::try_from(strategy.lookback)?;
                    let start = window_start(now_ms, hour_ms, lookback)?;
                    resolve_close_history(provider.as_ref(), &pair, Interval::Hour1, start, now_ms)
                        .await?
                        .closes
                }
            };
            let window = &closes[closes.len().saturating_sub(strategy.lookback)..];
            let estimate = strategy.range_calculator().calculate(window)?;
            output::print_range(&pair, &estimate);
        }
        Commands::Fetch {
            interval,
            days,
            out,
        } => {
            let provider = build_provider(&app.market.providers)?;
            let candles = provider
                .get_candles(&pair, interval, window_start(now_ms, DAY_MS, days)?, now_ms)
                .await?;
            write_candles(&out, &candles)?;
            println!("Saved {} candles for {} to {}", candles.len(), pair, out.display());
        }
        Commands::Backtest {
            csv,
            days,
            policy,
            seed,
            journal,
        } => {
            let candles =
                load_candles(csv.as_deref(), &app.market.providers, &pair, days, now_ms).await?;
            let fee_model = build_fee_model(
                strategy.fee_model,
                strategy.fee_tier,
                strategy.fee_estimate_scalar,
                strategy.pool_tvl_usd,
                seed,
            );
            let capital = strategy.capital_usd;
            let result = Backtest::new(strategy)
                .with_policy(policy.into())
                .run(&candles, fee_model)?;

            if let Some(path) = journal {
                let mut journal = TickJournal::open(&path)?;
                for report in &result.reports {
                    journal.on_report(report)?;
                }
                info!(path = %path.display(), rows = result.reports.len(), "Journal written");
            }
            output::print_backtest(&result.summary, capital);
        }
        Commands::Monthly {
            csv,
            months,
            base_tvl,
        } => {
            // a few extra days so the first month is complete
            let days = months
                .checked_mul(30)
                .and_then(|d| d.checked_add(5))
                .context("too many months")?;
            let candles =
                load_candles(csv.as_deref(), &app.market.providers, &pair, days, now_ms).await?;
            let mut analysis = MonthlyAnalysis::new(
                strategy.capital_usd,
                strategy.fee_tier,
                strategy.range_calculator(),
            );
            if let Some(tvl) = base_tvl {
                analysis = analysis.with_base_tvl(tvl);
            }
            let report = analysis.run(&candles)?;
            output::print_monthly(&report);
        }
        Commands::Hourly {
            csv,
            low,
            high,
            pivot,
            days,
            base_tvl,
        } => {
            let range = PriceRange::try_new(Price::new(low), Price::new(high))?;
            let candles = load_candles(
                csv.as_deref(),
                &app.market.providers,
                &pair,
                i64::from(days),
                now_ms,
            )
            .await?;
            let mut analysis = HourlyAnalysis::new(strategy.capital_usd, strategy.fee_tier, range)
                .with_days(days);
            if let Some(pivot) = pivot {
                analysis = analysis.with_pivot(Price::new(pivot));
            }
            if let Some(tvl) = base_tvl {
                analysis = analysis.with_base_tvl(tvl);
            }
            output::print_hourly(&analysis.run(&candles)?);
        }
        Commands::ExitEstimate {
            entry_price,
            exit_price,
            hours,
            tvl,
        } => {
            let provider = build_provider(&app.market.providers)?;
            let exit_price = match exit_price {
                Some(price) => price,
                None => {
                    provider
                        .latest_candle(&pair, Interval::Minute1)
                        .await?
                        .close
                        .value
                }
            };
            // whole hours plus the current one
            let start = window_start(now_ms, hour_ms, hours.saturating_add(1))?;
            let quote_volume_usd = provider.quote_volume(&pair, start, now_ms).await?;

            let inputs = ExitInputs {
                capital_usd: strategy.capital_usd,
                entry_price,
                exit_price,
                quote_volume_usd,
                fee_tier: strategy.fee_tier,
                pool_tvl_usd: tvl,
            };
            let estimate = estimate_exit(&inputs)?;
            output::print_exit(&inputs, &estimate);
        }
        Commands::Paper { journal, policy } => {
            let provider = build_provider(&app.market.providers)?;
            let mut trader = PaperTrader::initialize(provider, pair, strategy, now_ms)
                .await?
                .with_policy(policy.into())
                .with_sink(Box::new(ConsoleReporter::stdout()));
            if let Some(path) = journal {
                trader = trader.with_sink(Box::new(TickJournal::open(path)?));
            }
            let summary = trader.run().await?;
            println!(
                "Stopped after {} ticks ({} failed). Cash: {}, realized PnL: {}",
                summary.ticks,
                summary.failed_ticks,
                output::usd(summary.cash),
                output::usd(summary.totals.realized_pnl)
            );
        }
    }

    Ok(())
}

/// Start of a window of `count` spans of `span_ms` that ends at `end_ms`.
fn window_start(end_ms: i64, span_ms: i64, count: i64) -> Result<i64> {
    span_ms
        .checked_mul(count)
        .and_then(|len| end_ms.checked_sub(len))
        .with_context(|| format!("a window of {count} x {span_ms} ms does not fit before {end_ms}"))
}

fn build_provider(kinds: &[ProviderKind]) -> Result<Arc<dyn MarketDataProvider>> {
    if kinds.is_empty() {
        bail!("no market data providers configured");
    }
    let mut providers: Vec<Box<dyn MarketDataProvider>> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        match kind {
            ProviderKind::Kucoin => providers.push(Box::new(KucoinProvider::new()?)),
            ProviderKind::Binance => providers.push(Box::new(BinanceProvider::new()?)),
        }
    }
    let chain = FallbackProvider::new(providers);
    info!(providers = ?chain.names(), "Market data chain ready");
    Ok(Arc::new(chain))
}

async fn load_candles(
    csv: Option<&Path>,
    kinds: &[ProviderKind],
    pair: &TradingPair,
    days: i64,
    now_ms: i64,
) -> Result<Vec<PriceCandle>> {
    let candles = match csv {
        Some(path) => read_candles(path)?,
        None => {
            let provider = build_provider(kinds)?;
            let start = window_start(now_ms, DAY_MS, days)?;
            provider
                .get_candles(pair, Interval::Hour1, start, now_ms)
                .await?
        }
    };
    if candles.is_empty() {
        bail!("no candles found for {pair}");
    }
    info!(pair = %pair, count = candles.len(), "Candles loaded");
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start() {
        assert_eq!(window_start(10 * DAY_MS, DAY_MS, 3).unwrap(), 7 * DAY_MS);
        assert!(window_start(0, DAY_MS, i64::MAX).is_err());
        assert!(window_start(i64::MIN + 1, DAY_MS, 1).is_err());
    }

    #[test]
    fn test_history_bounds_are_enforced() {
        for days in ["0", "-5", "3651", "9223372036854775807"] {
            let parsed = Cli::try_parse_from(["range-lp", "backtest", "--days", days]);
            assert!(parsed.is_err(), "{days} should be rejected");
        }
        assert!(Cli::try_parse_from(["range-lp", "fetch", "--days", "3650", "--out", "x.csv"]).is_ok());
        assert!(Cli::try_parse_from(["range-lp", "monthly", "--months", "1000"]).is_err());
        assert!(
            Cli::try_parse_from(["range-lp", "hourly", "--low", "1", "--high", "2", "--days", "366"])
                .is_err()
        );
    }

    #[test]
    fn test_paper_policy_flag() {
        let cli = Cli::try_parse_from(["range-lp", "paper", "--policy", "fixed"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Paper {
                policy: PolicyArg::Fixed,
                ..
            }
        ));
    }
}
