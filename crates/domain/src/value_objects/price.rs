use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price {
    pub value: Decimal,
}

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self { value }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // cross rates such as BNB/ETH sit well below 1
        if self.value.abs() < Decimal::ONE {
            write!(f, "${:.6}", self.value.round_dp(6))
        } else {
            write!(f, "${:.2}", self.value.round_dp(2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_precision() {
        assert_eq!(Price::new(dec!(3512.346)).to_string(), "$3512.35");
        assert_eq!(Price::new(dec!(0.2012346)).to_string(), "$0.201235");
    }
}
