//! Strategy parameters shared by every front end.
//!
//! All fields have defaults so a partial config file (or none at all) is
//! enough to run.

use crate::fee_model::FeeModelKind;
use range_lp_domain::math::{DynamicRangeCalculator, StdDevKind};
use range_lp_domain::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tunable strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Pool fee tier as a fraction (0.0005 = 0.05%).
    pub fee_tier: Decimal,
    /// Starting cash in USD.
    pub capital_usd: Decimal,
    /// Fraction of available cash invested on each entry.
    pub investment_fraction: Decimal,
    /// Number of candles used to compute the range.
    pub lookback: usize,
    /// Range half-width in standard deviations.
    pub volatility_multiplier: Decimal,
    /// Stddev substitute as a fraction of the mean when volatility is zero.
    pub fallback_volatility_pct: Decimal,
    /// Sample or population standard deviation.
    pub std_dev_kind: StdDevKind,
    /// Simulated transaction cost charged at entry and at exit.
    pub gas_fee_usd: Decimal,
    /// In-range ticks with IL (percent) below this carry an alert.
    pub il_alert_threshold_pct: Decimal,
    /// Which per-tick fee estimate to use.
    pub fee_model: FeeModelKind,
    /// Scales the activity-share fee estimate.
    pub fee_estimate_scalar: Decimal,
    /// Base pool TVL for the pool-share fee estimate.
    pub pool_tvl_usd: Decimal,
    /// Paper trading poll interval.
    pub poll_interval_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fee_tier: Decimal::new(5, 4),
            capital_usd: Decimal::from(1000),
            investment_fraction: Decimal::new(5, 1),
            lookback: 2,
            volatility_multiplier: Decimal::new(15, 1),
            fallback_volatility_pct: Decimal::new(5, 2),
            std_dev_kind: StdDevKind::Sample,
            gas_fee_usd: Decimal::new(1, 1),
            il_alert_threshold_pct: Decimal::new(-2, 0),
            fee_model: FeeModelKind::PoolShare,
            fee_estimate_scalar: Decimal::new(1, 1),
            pool_tvl_usd: Decimal::from(50_000_000),
            poll_interval_secs: 30,
        }
    }
}

impl StrategyConfig {
    /// Range calculator configured from these parameters.
    #[must_use]
    pub fn range_calculator(&self) -> DynamicRangeCalculator {
        DynamicRangeCalculator::new(self.volatility_multiplier)
            .with_fallback_pct(self.fallback_volatility_pct)
            .with_std_dev_kind(self.std_dev_kind)
    }

    /// Rejects values the simulation cannot work with.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> DomainResult<()> {
        self.range_calculator().validate()?;

        if self.fee_tier.is_sign_negative() || self.fee_tier >= Decimal::ONE {
            return Err(DomainError::invalid("fee_tier", "must be in [0, 1)"));
        }
        if self.capital_usd <= Decimal::ZERO {
            return Err(DomainError::invalid("capital_usd", "must be positive"));
        }
        if self.investment_fraction <= Decimal::ZERO || self.investment_fraction > Decimal::ONE {
            return Err(DomainError::invalid(
                "investment_fraction",
                "must be in (0, 1]",
            ));
        }
        if self.lookback == 0 {
            return Err(DomainError::invalid("lookback", "must be at least 1"));
        }
        if self.gas_fee_usd.is_sign_negative() {
            return Err(DomainError::invalid("gas_fee_usd", "must not be negative"));
        }
        if self.fee_estimate_scalar.is_sign_negative() {
            return Err(DomainError::invalid(
                "fee_estimate_scalar",
                "must not be negative",
            ));
        }
        if self.pool_tvl_usd <= Decimal::ZERO {
            return Err(DomainError::invalid("pool_tvl_usd", "must be positive"));
        }
        if self.poll_interval_secs == 0 {
            return Err(DomainError::invalid("poll_interval_secs", "must be at least 1"));
        }
        Ok(())
    }
}
