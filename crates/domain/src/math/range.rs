//! Volatility-based liquidity range.
//!
//! `range = mean ± k · stddev` over a window of close prices, with a
//! percentage-of-mean fallback when the window has no measurable volatility.

use crate::error::{DomainError, DomainResult};
use crate::math::statistics::{self, StdDevKind};
use crate::value_objects::{price::Price, price_range::PriceRange};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Computes a price range from recent volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicRangeCalculator {
    /// Width in standard deviations on each side of the mean (k).
    pub volatility_multiplier: Decimal,
    /// Stddev substitute, as a fraction of the mean, when volatility is zero or undefined.
    pub fallback_volatility_pct: Decimal,
    /// Sample or population standard deviation.
    pub std_dev_kind: StdDevKind,
}

impl Default for DynamicRangeCalculator {
    fn default() -> Self {
        Self {
            volatility_multiplier: Decimal::new(15, 1), // 1.5
            fallback_volatility_pct: Decimal::new(5, 2), // 5%
            std_dev_kind: StdDevKind::Sample,
        }
    }
}

/// Result of a range calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeEstimate {
    /// Mean of the window.
    pub mean: Decimal,
    /// Standard deviation actually used (the fallback if it kicked in).
    pub std_dev: Decimal,
    /// Whether the fallback volatility was used.
    pub used_fallback: bool,
    /// Number of samples in the window.
    pub samples: usize,
    /// The resulting range.
    pub range: PriceRange,
}

impl DynamicRangeCalculator {
    /// Creates a calculator with the given multiplier and default fallback.
    #[must_use]
    pub fn new(volatility_multiplier: Decimal) -> Self {
        Self {
            volatility_multiplier,
            ..Self::default()
        }
    }

    /// Sets the fallback volatility percentage.
    #[must_use]
    pub fn with_fallback_pct(mut self, pct: Decimal) -> Self {
        self.fallback_volatility_pct = pct;
        self
    }

    /// Sets the standard deviation kind.
    #[must_use]
    pub fn with_std_dev_kind(mut self, kind: StdDevKind) -> Self {
        self.std_dev_kind = kind;
        self
    }

    /// Checks that the parameters are usable.
    ///
    /// # Errors
    /// Rejects a non-positive multiplier or fallback percentage.
    pub fn validate(&self) -> DomainResult<()> {
        if self.volatility_multiplier <= Decimal::ZERO {
            return Err(DomainError::invalid(
                "volatility_multiplier",
                format!("must be positive, got {}", self.volatility_multiplier),
            ));
        }
        if self.fallback_volatility_pct <= Decimal::ZERO {
            return Err(DomainError::invalid(
                "fallback_volatility_pct",
                format!("must be positive, got {}", self.fallback_volatility_pct),
            ));
        }
        Ok(())
    }

    /// Computes the range for a window of close prices.
    ///
    /// The lower bound is floored at zero.
    ///
    /// # Errors
    /// Returns an error for an empty window, a non-positive mean, or invalid parameters.
    pub fn calculate(&self, closes: &[Decimal]) -> DomainResult<RangeEstimate> {
        self.validate()?;
        let mean = statistics::mean(closes)?;
        if mean <= Decimal::ZERO {
            return Err(DomainError::NonPositivePrice(mean));
        }

        let (std_dev, used_fallback) = match statistics::std_dev(closes, self.std_dev_kind)? {
            Some(sd) if !sd.is_zero() => (sd, false),
            _ => (mean * self.fallback_volatility_pct, true),
        };

        let half_width = std_dev * self.volatility_multiplier;
        let lower = (mean - half_width).max(Decimal::ZERO);
        let upper = mean + half_width;

        Ok(RangeEstimate {
            mean,
            std_dev,
            used_fallback,
            samples: closes.len(),
            range: PriceRange::try_new(Price::new(lower), Price::new(upper))?,
        })
    }
}
