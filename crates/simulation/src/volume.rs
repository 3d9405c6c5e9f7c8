//! Share of centralized-exchange volume assumed to route through the pool.

use crate::state::MarketSnapshot;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Trait for modeling volume.
pub trait VolumeModel {
    /// Fraction of the observed CEX volume that trades in the pool.
    fn volume_share(&self, snapshot: &MarketSnapshot) -> Decimal;
}

/// Constant volume share.
#[derive(Debug, Clone)]
pub struct ConstantVolume {
    /// The constant share.
    pub share: Decimal,
}

impl ConstantVolume {
    /// Creates a new constant volume model.
    #[must_use]
    pub fn new(share: Decimal) -> Self {
        Self { share }
    }
}

impl Default for ConstantVolume {
    fn default() -> Self {
        Self::new(Decimal::ONE)
    }
}

impl VolumeModel for ConstantVolume {
    fn volume_share(&self, _snapshot: &MarketSnapshot) -> Decimal {
        self.share
    }
}

/// `base + amplitude · sin(day_of_month · frequency)`.
#[derive(Debug, Clone)]
pub struct SinusoidalVolume {
    pub base: Decimal,
    pub amplitude: Decimal,
    pub frequency: f64,
}

impl Default for SinusoidalVolume {
    fn default() -> Self {
        Self {
            base: Decimal::new(2, 1),
            amplitude: Decimal::new(1, 1),
            frequency: 0.5,
        }
    }
}

impl VolumeModel for SinusoidalVolume {
    fn volume_share(&self, snapshot: &MarketSnapshot) -> Decimal {
        self.base + self.amplitude * day_wave(snapshot.day_of_month(), self.frequency)
    }
}

/// Lower base share on weekends plus a day-of-month wave.
#[derive(Debug, Clone)]
pub struct WeekdayVolume {
    pub weekday_base: Decimal,
    pub weekend_base: Decimal,
    pub amplitude: Decimal,
    pub frequency: f64,
}

impl Default for WeekdayVolume {
    fn default() -> Self {
        Self {
            weekday_base: Decimal::new(20, 2),
            weekend_base: Decimal::new(15, 2),
            amplitude: Decimal::new(5, 2),
            frequency: 0.5,
        }
    }
}

impl VolumeModel for WeekdayVolume {
    fn volume_share(&self, snapshot: &MarketSnapshot) -> Decimal {
        let base = if snapshot.is_weekend() {
            self.weekend_base
        } else {
            self.weekday_base
        };
        base + self.amplitude * day_wave(snapshot.day_of_month(), self.frequency)
    }
}

fn day_wave(day: u32, frequency: f64) -> Decimal {
    Decimal::from_f64((f64::from(day) * frequency).sin()).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_lp_domain::value_objects::price::Price;
    use rust_decimal_macros::dec;

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.000001)
    }

    #[test]
    fn test_sinusoidal_volume() {
        // 2024-03-16: sin(8) = 0.989358
        let snapshot = MarketSnapshot::new(1_710_547_200_000, Price::new(dec!(1)), dec!(1));
        let share = SinusoidalVolume::default().volume_share(&snapshot);
        assert!(close(share, dec!(0.2989358)));
    }

    #[test]
    fn test_weekday_volume() {
        let model = WeekdayVolume::default();
        // Saturday 2024-03-16, sin(8) = 0.989358
        let saturday = MarketSnapshot::new(1_710_547_200_000, Price::new(dec!(1)), dec!(1));
        assert!(close(model.volume_share(&saturday), dec!(0.1994679)));
        // Monday 2024-03-18, sin(9) = 0.412118
        let monday = MarketSnapshot::new(1_710_720_000_000, Price::new(dec!(1)), dec!(1));
        assert!(close(model.volume_share(&monday), dec!(0.2206059)));
    }

    #[test]
    fn test_shares_stay_positive() {
        let model = SinusoidalVolume::default();
        for day in 1..=31u32 {
            let ts = 1_709_251_200_000 + i64::from(day - 1) * 86_400_000; // March 2024
            let snapshot = MarketSnapshot::new(ts, Price::new(dec!(1)), dec!(1));
            let share = model.volume_share(&snapshot);
            assert!(share >= dec!(0.1) && share <= dec!(0.3));
        }
    }
}
