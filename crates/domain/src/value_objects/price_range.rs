use crate::error::{DomainError, DomainResult};
use crate::value_objects::price::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive price interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub lower_price: Price,
    pub upper_price: Price,
}

impl PriceRange {
    pub fn new(lower: Price, upper: Price) -> Self {
        Self {
            lower_price: lower,
            upper_price: upper,
        }
    }

    /// Builds a range, rejecting inverted or empty bounds.
    pub fn try_new(lower: Price, upper: Price) -> DomainResult<Self> {
        if lower.value >= upper.value {
            return Err(DomainError::InvalidRange {
                lower: lower.value,
                upper: upper.value,
            });
        }
        Ok(Self::new(lower, upper))
    }

    pub fn contains(&self, price: Price) -> bool {
        price.value >= self.lower_price.value && price.value <= self.upper_price.value
    }

    pub fn width(&self) -> Decimal {
        self.upper_price.value - self.lower_price.value
    }

    pub fn midpoint(&self) -> Price {
        Price::new((self.lower_price.value + self.upper_price.value) / Decimal::TWO)
    }

    /// Relative position of `price` inside the range, 0 at lower and 1 at upper.
    /// Not clamped; zero-width ranges return 0.
    pub fn position_of(&self, price: Price) -> Decimal {
        let width = self.width();
        if width.is_zero() {
            return Decimal::ZERO;
        }
        (price.value - self.lower_price.value) / width
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.lower_price, self.upper_price)
    }
}
