//! Pool TVL models.
//!
//! The simulator has no pool state, so total liquidity comes from one of a
//! few heuristics. All return USD.

use crate::state::MarketSnapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use range_lp_domain::value_objects::{price::Price, price_range::PriceRange};
use range_lp_domain::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Trait to model the total value locked in a pool.
pub trait LiquidityModel {
    /// Returns the pool TVL in USD at the given observation.
    fn tvl_usd(&mut self, snapshot: &MarketSnapshot) -> Decimal;
}

/// A simple model with constant TVL.
#[derive(Debug, Clone)]
pub struct ConstantLiquidity {
    /// The constant TVL in USD.
    pub tvl_usd: Decimal,
}

impl ConstantLiquidity {
    /// Creates a new ConstantLiquidity model.
    #[must_use]
    pub fn new(tvl_usd: Decimal) -> Self {
        Self { tvl_usd }
    }
}

impl LiquidityModel for ConstantLiquidity {
    fn tvl_usd(&mut self, _snapshot: &MarketSnapshot) -> Decimal {
        self.tvl_usd
    }
}

/// TVL that dips on weekends, with uniform noise on every call.
#[derive(Debug, Clone)]
pub struct WeekdayLiquidity {
    /// Weekday TVL before noise.
    pub base_tvl_usd: Decimal,
    /// Multiplier applied on Saturday and Sunday.
    pub weekend_multiplier: Decimal,
    /// Half-width of the noise band (0.05 gives ×0.95..×1.05).
    pub noise_pct: f64,
    rng: StdRng,
}

impl WeekdayLiquidity {
    /// Creates the model with an OS-seeded generator.
    #[must_use]
    pub fn new(base_tvl_usd: Decimal) -> Self {
        Self::with_rng(base_tvl_usd, StdRng::from_os_rng())
    }

    /// Creates the model with a fixed seed, for reproducible runs.
    #[must_use]
    pub fn seeded(base_tvl_usd: Decimal, seed: u64) -> Self {
        Self::with_rng(base_tvl_usd, StdRng::seed_from_u64(seed))
    }

    fn with_rng(base_tvl_usd: Decimal, rng: StdRng) -> Self {
        Self {
            base_tvl_usd,
            weekend_multiplier: Decimal::new(85, 2),
            noise_pct: 0.05,
            rng,
        }
    }

    /// Sets the noise band; zero disables noise.
    #[must_use]
    pub fn with_noise(mut self, noise_pct: f64) -> Self {
        self.noise_pct = noise_pct.abs();
        self
    }
}

impl LiquidityModel for WeekdayLiquidity {
    fn tvl_usd(&mut self, snapshot: &MarketSnapshot) -> Decimal {
        let multiplier = if snapshot.is_weekend() {
            self.weekend_multiplier
        } else {
            Decimal::ONE
        };
        let noise = if self.noise_pct > 0.0 {
            let n = self
                .rng
                .random_range((1.0 - self.noise_pct)..=(1.0 + self.noise_pct));
            Decimal::from_f64(n).unwrap_or(Decimal::ONE)
        } else {
            Decimal::ONE
        };
        self.base_tvl_usd * multiplier * noise
    }
}

/// TVL growing linearly across a range: 0.8 × base at the lower bound, 1.2 × base at the upper.
#[derive(Debug, Clone)]
pub struct RangePositionLiquidity {
    pub base_tvl_usd: Decimal,
    pub range: PriceRange,
}

impl RangePositionLiquidity {
    #[must_use]
    pub fn new(base_tvl_usd: Decimal, range: PriceRange) -> Self {
        Self {
            base_tvl_usd,
            range,
        }
    }
}

impl LiquidityModel for RangePositionLiquidity {
    fn tvl_usd(&mut self, snapshot: &MarketSnapshot) -> Decimal {
        let t = self.range.position_of(snapshot.price);
        self.base_tvl_usd * (Decimal::new(8, 1) + Decimal::new(4, 1) * t)
    }
}

/// TVL peaking at a pivot price: 0.8 × base at either bound, 1.0 × base at the pivot.
#[derive(Debug, Clone)]
pub struct PeakedLiquidity {
    pub base_tvl_usd: Decimal,
    pub range: PriceRange,
    pub pivot: Price,
}

impl PeakedLiquidity {
    /// # Errors
    /// Returns an error unless the pivot lies strictly inside the range.
    pub fn new(base_tvl_usd: Decimal, range: PriceRange, pivot: Price) -> DomainResult<Self> {
        if pivot.value <= range.lower_price.value || pivot.value >= range.upper_price.value {
            return Err(DomainError::invalid(
                "pivot",
                format!("{pivot} must lie strictly inside {range}"),
            ));
        }
        Ok(Self {
            base_tvl_usd,
            range,
            pivot,
        })
    }
}

impl LiquidityModel for PeakedLiquidity {
    fn tvl_usd(&mut self, snapshot: &MarketSnapshot) -> Decimal {
        let p = snapshot.price.value;
        let lower = self.range.lower_price.value;
        let upper = self.range.upper_price.value;
        let pivot = self.pivot.value;
        let step = Decimal::new(2, 1);

        let multiplier = if p < pivot {
            Decimal::new(8, 1) + step * (p - lower) / (pivot - lower)
        } else {
            Decimal::ONE - step * (p - pivot) / (upper - pivot)
        };
        self.base_tvl_usd * multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MONDAY_MS: i64 = 1_710_720_000_000;
    const SATURDAY_MS: i64 = 1_710_547_200_000;

    fn at(timestamp: i64, price: Decimal) -> MarketSnapshot {
        MarketSnapshot::new(timestamp, Price::new(price), dec!(1))
    }

    fn range() -> PriceRange {
        PriceRange::new(Price::new(dec!(3000)), Price::new(dec!(3500)))
    }

    #[test]
    fn test_constant_liquidity() {
        let mut model = ConstantLiquidity::new(dec!(1_000_000));
        assert_eq!(model.tvl_usd(&at(0, dec!(5))), dec!(1_000_000));
    }

    #[test]
    fn test_weekday_liquidity_without_noise() {
        let mut model = WeekdayLiquidity::seeded(dec!(50_000_000), 7).with_noise(0.0);
        assert_eq!(model.tvl_usd(&at(MONDAY_MS, dec!(1))), dec!(50_000_000));
        assert_eq!(model.tvl_usd(&at(SATURDAY_MS, dec!(1))), dec!(42_500_000));
    }

    #[test]
    fn test_weekday_liquidity_noise_band_and_seed() {
        let mut a = WeekdayLiquidity::seeded(dec!(50_000_000), 42);
        let mut b = WeekdayLiquidity::seeded(dec!(50_000_000), 42);
        for _ in 0..20 {
            let tvl = a.tvl_usd(&at(MONDAY_MS, dec!(1)));
            assert!(tvl >= dec!(47_500_000) && tvl <= dec!(52_500_000));
            assert_eq!(tvl, b.tvl_usd(&at(MONDAY_MS, dec!(1))));
        }
    }

    #[test]
    fn test_range_position_liquidity() {
        let mut model = RangePositionLiquidity::new(dec!(25_000_000), range());
        assert_eq!(model.tvl_usd(&at(0, dec!(3000))), dec!(20_000_000));
        assert_eq!(model.tvl_usd(&at(0, dec!(3250))), dec!(25_000_000));
        assert_eq!(model.tvl_usd(&at(0, dec!(3500))), dec!(30_000_000));
    }

    #[test]
    fn test_peaked_liquidity() {
        let mut model =
            PeakedLiquidity::new(dec!(25_000_000), range(), Price::new(dec!(3200))).unwrap();
        assert_eq!(model.tvl_usd(&at(0, dec!(3000))), dec!(20_000_000));
        assert_eq!(model.tvl_usd(&at(0, dec!(3200))), dec!(25_000_000));
        assert_eq!(model.tvl_usd(&at(0, dec!(3500))), dec!(20_000_000));
        assert_eq!(model.tvl_usd(&at(0, dec!(3100))), dec!(22_500_000));
    }

    #[test]
    fn test_peaked_rejects_pivot_on_bound() {
        assert!(PeakedLiquidity::new(dec!(1), range(), Price::new(dec!(3000))).is_err());
        assert!(PeakedLiquidity::new(dec!(1), range(), Price::new(dec!(4000))).is_err());
    }
}
