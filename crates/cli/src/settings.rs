//! Layered configuration: defaults, optional file, `RANGE_LP__*` environment,
//! then command-line flags.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use config::{Config, Environment, File};
use range_lp_domain::math::StdDevKind;
use range_lp_simulation::config::StrategyConfig;
use range_lp_simulation::fee_model::FeeModelKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Exchanges the market-data chain can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Kucoin,
    Binance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Pair such as `ETH/USDT` or `WBNB/WETH`.
    pub pair: String,
    /// Providers tried in order.
    pub providers: Vec<ProviderKind>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            pair: "ETH/USDT".to_string(),
            providers: vec![ProviderKind::Kucoin, ProviderKind::Binance],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub strategy: StrategyConfig,
}

impl AppConfig {
    /// Loads the optional file, then `RANGE_LP__SECTION__KEY` variables.
    ///
    /// # Errors
    /// Fails if the file is missing or malformed, or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, Environment::with_prefix("RANGE_LP").separator("__"))
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeeModelArg {
    /// Pro-rata share of pool TVL.
    PoolShare,
    /// Scaled share of recent volume, capped per tick.
    ActivityShare,
}

impl From<FeeModelArg> for FeeModelKind {
    fn from(arg: FeeModelArg) -> Self {
        match arg {
            FeeModelArg::PoolShare => Self::PoolShare,
            FeeModelArg::ActivityShare => Self::ActivityShare,
        }
    }
}

/// Strategy flags that override the loaded configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct StrategyOverrides {
    /// Starting capital in USD
    #[arg(long, global = true)]
    pub capital: Option<Decimal>,

    /// Pool fee tier as a fraction (0.0005 = 0.05%)
    #[arg(long, global = true)]
    pub fee_tier: Option<Decimal>,

    /// Number of hourly closes used for the range
    #[arg(long, global = true)]
    pub lookback: Option<usize>,

    /// Volatility multiplier k in mean ± k·stddev
    #[arg(short = 'k', long, global = true)]
    pub volatility_multiplier: Option<Decimal>,

    /// Fallback half-width as a fraction of the mean
    #[arg(long, global = true)]
    pub fallback_pct: Option<Decimal>,

    /// Use the population standard deviation instead of the sample one
    #[arg(long, global = true)]
    pub population: bool,

    /// Simulated gas per entry or exit, in USD
    #[arg(long, global = true)]
    pub gas: Option<Decimal>,

    #[arg(long, value_enum, global = true)]
    pub fee_model: Option<FeeModelArg>,

    /// Paper-trading poll interval in seconds
    #[arg(long, global = true)]
    pub poll_secs: Option<u64>,
}

impl StrategyOverrides {
    pub fn apply(&self, config: &mut StrategyConfig) {
        if let Some(v) = self.capital {
            config.capital_usd = v;
        }
        if let Some(v) = self.fee_tier {
            config.fee_tier = v;
        }
        if let Some(v) = self.lookback {
            config.lookback = v;
        }
        if let Some(v) = self.volatility_multiplier {
            config.volatility_multiplier = v;
        }
        if let Some(v) = self.fallback_pct {
            config.fallback_volatility_pct = v;
        }
        if self.population {
            config.std_dev_kind = StdDevKind::Population;
        }
        if let Some(v) = self.gas {
            config.gas_fee_usd = v;
        }
        if let Some(v) = self.fee_model {
            config.fee_model = v.into();
        }
        if let Some(v) = self.poll_secs {
            config.poll_interval_secs = v;
        }
    }
}
