//! Average hourly fee profit for a fixed range over trailing periods.
//!
//! For each period of the last 1..=N days, hours whose typical price is in
//! the range earn a share of routed volume; liquidity peaks at a pivot price
//! and volume dips on weekends.

use crate::fee_model::{FeeModel, PoolShareFee};
use crate::liquidity::PeakedLiquidity;
use crate::state::MarketSnapshot;
use crate::volume::WeekdayVolume;
use range_lp_domain::entities::PriceCandle;
use range_lp_domain::value_objects::price::Price;
use range_lp_domain::value_objects::price_range::PriceRange;
use range_lp_domain::{DomainError, DomainResult};
use rust_decimal::Decimal;

const DAY_MS: i64 = 86_400_000;
/// Longest trailing period accepted, one year.
pub const MAX_PERIOD_DAYS: u32 = 365;

/// Result for one trailing period.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRow {
    /// Period length in days.
    pub days: u32,
    /// Mean fee profit over in-range hours, zero if none.
    pub avg_hourly_profit: Decimal,
    pub active_hours: usize,
    /// Lowest low in the period.
    pub low: Price,
    /// Highest high in the period.
    pub high: Price,
}

/// Fixed-range hourly profit estimator.
#[derive(Debug, Clone)]
pub struct HourlyAnalysis {
    pub capital_usd: Decimal,
    pub fee_tier: Decimal,
    pub range: PriceRange,
    /// Price of peak liquidity; defaults to the range midpoint.
    pub pivot: Price,
    pub base_tvl_usd: Decimal,
    /// Longest period analysed.
    pub days: u32,
}

impl HourlyAnalysis {
    #[must_use]
    pub fn new(capital_usd: Decimal, fee_tier: Decimal, range: PriceRange) -> Self {
        Self {
            capital_usd,
            fee_tier,
            pivot: range.midpoint(),
            range,
            base_tvl_usd: Decimal::from(25_000_000),
            days: 7,
        }
    }

    #[must_use]
    pub fn with_pivot(mut self, pivot: Price) -> Self {
        self.pivot = pivot;
        self
    }

    #[must_use]
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    #[must_use]
    pub fn with_base_tvl(mut self, base_tvl_usd: Decimal) -> Self {
        self.base_tvl_usd = base_tvl_usd;
        self
    }

    /// One row per period, shortest first. Periods end at the last candle.
    ///
    /// # Errors
    /// Fails on empty input, a period outside `1..=MAX_PERIOD_DAYS`, or a pivot
    /// outside the range.
    pub fn run(&self, candles: &[PriceCandle]) -> DomainResult<Vec<HourlyRow>> {
        let last = candles.last().ok_or(DomainError::EmptyWindow)?;
        if !(1..=MAX_PERIOD_DAYS).contains(&self.days) {
            return Err(DomainError::invalid(
                "days",
                format!("must be between 1 and {MAX_PERIOD_DAYS}, got {}", self.days),
            ));
        }

        let mut fees = PoolShareFee::new(
            self.fee_tier,
            PeakedLiquidity::new(self.base_tvl_usd, self.range, self.pivot)?,
            WeekdayVolume::default(),
        );

        let mut rows = Vec::new();
        for days in 1..=self.days {
            let cutoff = last.open_time - i64::from(days) * DAY_MS;
            let window: Vec<&PriceCandle> =
                candles.iter().filter(|c| c.open_time > cutoff).collect();

            let mut hourly = Vec::new();
            for candle in &window {
                let snapshot = MarketSnapshot::from_typical(candle);
                if self.range.contains(snapshot.price) {
                    hourly.push(fees.estimate(self.capital_usd, &snapshot)?);
                }
            }

            let avg_hourly_profit = if hourly.is_empty() {
                Decimal::ZERO
            } else {
                hourly.iter().sum::<Decimal>() / Decimal::from(hourly.len())
            };
            // the window always holds at least the last candle
            let low = window.iter().map(|c| c.low).min().unwrap_or(last.low);
            let high = window.iter().map(|c| c.high).max().unwrap_or(last.high);

            rows.push(HourlyRow {
                days,
                avg_hourly_profit,
                active_hours: hourly.len(),
                low,
                high,
            });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // Monday 2024-03-18T00:00:00Z
    const START_MS: i64 = 1_710_720_000_000;
    const HOUR_MS: i64 = 3_600_000;

    fn range() -> PriceRange {
        PriceRange::new(Price::new(dec!(3000)), Price::new(dec!(3500)))
    }

    fn hours(n: i64, price: Decimal) -> Vec<PriceCandle> {
        (0..n)
            .map(|i| PriceCandle::new(START_MS + i * HOUR_MS, price, price, price, price, dec!(100)))
            .collect()
    }

    #[test]
    fn test_period_windows() {
        let analysis = HourlyAnalysis::new(dec!(10_000), dec!(0.0005), range())
            .with_pivot(Price::new(dec!(3200)))
            .with_days(3);
        let rows = analysis.run(&hours(72, dec!(3200))).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].days, 1);
        assert_eq!(rows[0].active_hours, 24);
        assert_eq!(rows[1].active_hours, 48);
        assert_eq!(rows[2].active_hours, 72);
        assert!(rows[0].avg_hourly_profit > Decimal::ZERO);
    }

    #[test]
    fn test_single_hour_profit() {
        let analysis = HourlyAnalysis::new(dec!(10_000), dec!(0.0005), range())
            .with_pivot(Price::new(dec!(3200)))
            .with_days(1);
        let rows = analysis.run(&hours(1, dec!(3200))).unwrap();
        // Monday the 18th: share = 0.20 + 0.05 * sin(9); tvl = 25M at the pivot
        // 10_000 / 25M * 320_000 * share * 0.0005 = 0.064 * share
        let expected = dec!(0.064) * (dec!(0.20) + dec!(0.05) * dec!(0.41211848524));
        assert!((rows[0].avg_hourly_profit - expected).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_out_of_range_hours_are_inactive() {
        let mut candles = hours(24, dec!(2800));
        candles.extend(
            hours(24, dec!(3100))
                .into_iter()
                .map(|mut c| {
                    c.open_time += 24 * HOUR_MS;
                    c
                }),
        );
        let rows = HourlyAnalysis::new(dec!(10_000), dec!(0.0005), range())
            .with_days(2)
            .run(&candles)
            .unwrap();
        assert_eq!(rows[0].active_hours, 24);
        assert_eq!(rows[1].active_hours, 24);
        assert_eq!(rows[1].low.value, dec!(2800));
        assert_eq!(rows[1].high.value, dec!(3100));
    }

    #[test]
    fn test_no_active_hours_is_zero() {
        let rows = HourlyAnalysis::new(dec!(10_000), dec!(0.0005), range())
            .with_days(1)
            .run(&hours(5, dec!(4000)))
            .unwrap();
        assert_eq!(rows[0].avg_hourly_profit, Decimal::ZERO);
        assert_eq!(rows[0].active_hours, 0);
    }

    #[test]
    fn test_base_tvl_scales_profit() {
        let candles = hours(1, dec!(3200));
        let default = HourlyAnalysis::new(dec!(10_000), dec!(0.0005), range())
            .with_pivot(Price::new(dec!(3200)))
            .with_days(1)
            .run(&candles)
            .unwrap();
        let thinner = HourlyAnalysis::new(dec!(10_000), dec!(0.0005), range())
            .with_pivot(Price::new(dec!(3200)))
            .with_days(1)
            .with_base_tvl(dec!(12_500_000))
            .run(&candles)
            .unwrap();
        let diff = thinner[0].avg_hourly_profit - default[0].avg_hourly_profit * dec!(2);
        assert!(diff.abs() < dec!(0.000000001));
    }

    #[test]
    fn test_period_bounds() {
        let candles = hours(1, dec!(3200));
        let analysis = HourlyAnalysis::new(dec!(1), dec!(0.0005), range());
        assert!(analysis.clone().with_days(0).run(&candles).is_err());
        assert!(analysis.clone().with_days(MAX_PERIOD_DAYS + 1).run(&candles).is_err());
        assert!(analysis.clone().with_days(u32::MAX).run(&candles).is_err());
        assert_eq!(analysis.with_days(MAX_PERIOD_DAYS).run(&candles).unwrap().len(), 365);
    }

    #[test]
    fn test_rejects_empty_and_bad_pivot() {
        let analysis = HourlyAnalysis::new(dec!(1), dec!(0.0005), range());
        assert_eq!(analysis.run(&[]).unwrap_err(), DomainError::EmptyWindow);

        let bad = analysis.with_pivot(Price::new(dec!(3000)));
        assert!(bad.run(&hours(1, dec!(3200))).is_err());
    }
}
