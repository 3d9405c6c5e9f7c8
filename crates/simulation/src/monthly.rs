//! Monthly profit analysis with a per-month dynamic range.
//!
//! Candles are grouped by UTC calendar month. Each month gets its own range
//! from that month's closes, then every candle whose typical price falls
//! inside the range earns the position's share of routed volume.

use crate::fee_model::{FeeModel, PoolShareFee};
use crate::liquidity::RangePositionLiquidity;
use crate::state::MarketSnapshot;
use crate::volume::SinusoidalVolume;
use chrono::Datelike;
use range_lp_domain::entities::PriceCandle;
use range_lp_domain::math::DynamicRangeCalculator;
use range_lp_domain::value_objects::price_range::PriceRange;
use range_lp_domain::{DomainError, DomainResult};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// One month of results.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    /// `YYYY-MM`.
    pub month: String,
    pub profit: Decimal,
    /// Candles whose typical price was inside the range.
    pub active_hours: usize,
    pub total_hours: usize,
    /// `active / total · 100`, one decimal place.
    pub in_range_pct: Decimal,
    pub range: PriceRange,
}

/// All months plus aggregate figures.
#[derive(Debug, Clone, Default)]
pub struct MonthlyReport {
    pub rows: Vec<MonthlyRow>,
}

impl MonthlyReport {
    #[must_use]
    pub fn total_profit(&self) -> Decimal {
        self.rows.iter().map(|r| r.profit).sum()
    }

    /// The most profitable month, if any.
    #[must_use]
    pub fn best_month(&self) -> Option<&MonthlyRow> {
        self.rows.iter().max_by(|a, b| a.profit.cmp(&b.profit))
    }

    #[must_use]
    pub fn average_profit(&self) -> Decimal {
        if self.rows.is_empty() {
            return Decimal::ZERO;
        }
        self.total_profit() / Decimal::from(self.rows.len())
    }
}

/// Monthly analysis parameters.
#[derive(Debug, Clone)]
pub struct MonthlyAnalysis {
    pub capital_usd: Decimal,
    pub fee_tier: Decimal,
    pub calculator: DynamicRangeCalculator,
    /// TVL at the middle of the range.
    pub base_tvl_usd: Decimal,
}

impl MonthlyAnalysis {
    #[must_use]
    pub fn new(capital_usd: Decimal, fee_tier: Decimal, calculator: DynamicRangeCalculator) -> Self {
        Self {
            capital_usd,
            fee_tier,
            calculator,
            base_tvl_usd: Decimal::from(25_000_000),
        }
    }

    #[must_use]
    pub fn with_base_tvl(mut self, base_tvl_usd: Decimal) -> Self {
        self.base_tvl_usd = base_tvl_usd;
        self
    }

    /// Runs the analysis; months come out in calendar order.
    ///
    /// # Errors
    /// Fails on candles with unrepresentable timestamps or if a month's
    /// range cannot be computed.
    pub fn run(&self, candles: &[PriceCandle]) -> DomainResult<MonthlyReport> {
        let mut months: BTreeMap<(i32, u32), Vec<&PriceCandle>> = BTreeMap::new();
        for candle in candles {
            let dt = candle.open_datetime().ok_or_else(|| {
                DomainError::invalid("open_time", format!("{} is out of range", candle.open_time))
            })?;
            months.entry((dt.year(), dt.month())).or_default().push(candle);
        }

        let mut rows = Vec::with_capacity(months.len());
        for ((year, month), month_candles) in months {
            let closes: Vec<Decimal> = month_candles.iter().map(|c| c.close.value).collect();
            let range = self.calculator.calculate(&closes)?.range;

            let mut fees = PoolShareFee::new(
                self.fee_tier,
                RangePositionLiquidity::new(self.base_tvl_usd, range),
                SinusoidalVolume::default(),
            );

            let mut profit = Decimal::ZERO;
            let mut active_hours = 0;
            for candle in &month_candles {
                let snapshot = MarketSnapshot::from_typical(candle);
                if range.contains(snapshot.price) {
                    profit += fees.estimate(self.capital_usd, &snapshot)?;
                    active_hours += 1;
                }
            }

            let total_hours = month_candles.len();
            let in_range_pct = (Decimal::from(active_hours) * Decimal::ONE_HUNDRED
                / Decimal::from(total_hours))
            .round_dp(1);

            debug!(year, month, profit = %profit, active_hours, "month analysed");
            rows.push(MonthlyRow {
                month: format!("{year:04}-{month:02}"),
                profit,
                active_hours,
                total_hours,
                in_range_pct,
                range,
            });
        }

        Ok(MonthlyReport { rows })
    }
}
