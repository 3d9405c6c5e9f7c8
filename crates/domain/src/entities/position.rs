use crate::enums::PositionStatus;
use crate::error::{DomainError, DomainResult};
use crate::metrics::impermanent_loss::calculate_il_constant_product;
use crate::value_objects::{price::Price, price_range::PriceRange};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionId(pub Uuid);

impl PositionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PositionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A simulated concentrated liquidity position.
///
/// Token0 is the volatile base asset, token1 the quote asset (USD-like).
/// The range is frozen at entry; the strategy exits when price leaves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub range: PriceRange,
    pub entry_price: Price,

    pub token0_amount: Decimal,
    pub token1_amount: Decimal,

    pub initial_value_usd: Decimal,
    pub fees_earned_usd: Decimal,
    pub entry_gas_usd: Decimal,

    /// Entry time in milliseconds since the Unix epoch.
    pub opened_at: i64,
    pub status: PositionStatus,
}

impl Position {
    /// Opens a position by splitting `investment_usd` 50/50 at `entry_price`.
    ///
    /// # Errors
    /// Returns an error if the entry price is not positive or the investment is negative.
    pub fn open(
        range: PriceRange,
        entry_price: Price,
        investment_usd: Decimal,
        entry_gas_usd: Decimal,
        opened_at: i64,
    ) -> DomainResult<Self> {
        if !entry_price.is_positive() {
            return Err(DomainError::NonPositivePrice(entry_price.value));
        }
        if investment_usd.is_sign_negative() {
            return Err(DomainError::invalid(
                "investment_usd",
                "must not be negative",
            ));
        }

        let half = investment_usd / Decimal::TWO;
        Ok(Self {
            id: PositionId::new(),
            range,
            entry_price,
            token0_amount: half / entry_price.value,
            token1_amount: half,
            initial_value_usd: investment_usd,
            fees_earned_usd: Decimal::ZERO,
            entry_gas_usd,
            opened_at,
            status: PositionStatus::Open,
        })
    }

    /// Mark-to-market value of the held tokens, fees excluded.
    pub fn value_at(&self, price: Price) -> Decimal {
        self.token0_amount * price.value + self.token1_amount
    }

    /// Impermanent loss at `price` as a percentage (e.g. -5.72).
    ///
    /// # Errors
    /// Propagates errors from the IL formula for non-positive prices.
    pub fn il_pct_at(&self, price: Price) -> DomainResult<Decimal> {
        let il = calculate_il_constant_product(self.entry_price.value, price.value)?;
        Ok(il * Decimal::ONE_HUNDRED)
    }

    pub fn accrue_fees(&mut self, fees_usd: Decimal) {
        self.fees_earned_usd += fees_usd;
    }

    /// `(value - initial) + fees - gas` with `exit_gas_usd` charged on top of entry gas.
    pub fn pnl_at(&self, price: Price, exit_gas_usd: Decimal) -> Decimal {
        (self.value_at(price) - self.initial_value_usd) + self.fees_earned_usd
            - (self.entry_gas_usd + exit_gas_usd)
    }

    pub fn is_in_range(&self, price: Price) -> bool {
        self.range.contains(price)
    }

    pub fn close(&mut self) {
        self.status = PositionStatus::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn range() -> PriceRange {
        PriceRange::new(Price::new(dec!(90)), Price::new(dec!(110)))
    }

    #[test]
    fn test_open_splits_fifty_fifty() {
        let position =
            Position::open(range(), Price::new(dec!(100)), dec!(500), dec!(0.1), 0).unwrap();
        assert_eq!(position.token1_amount, dec!(250));
        assert_eq!(position.token0_amount, dec!(2.5));
        assert_eq!(position.value_at(Price::new(dec!(100))), dec!(500));
        assert_eq!(position.status, PositionStatus::Open);
    }

    #[test]
    fn test_open_rejects_zero_price() {
        let err = Position::open(range(), Price::new(dec!(0)), dec!(500), dec!(0), 0).unwrap_err();
        assert_eq!(err, DomainError::NonPositivePrice(dec!(0)));
    }

    #[test]
    fn test_pnl_includes_fees_and_gas() {
        let mut position =
            Position::open(range(), Price::new(dec!(100)), dec!(500), dec!(0.1), 0).unwrap();
        position.accrue_fees(dec!(1.5));
        // value at 104 = 2.5 * 104 + 250 = 510
        let pnl = position.pnl_at(Price::new(dec!(104)), dec!(0.1));
        assert_eq!(pnl, dec!(511.5) - dec!(500) - dec!(0.2));
    }

    #[test]
    fn test_il_zero_at_entry() {
        let position =
            Position::open(range(), Price::new(dec!(100)), dec!(500), dec!(0), 0).unwrap();
        assert_eq!(position.il_pct_at(Price::new(dec!(100))).unwrap(), Decimal::ZERO);
        assert!(position.il_pct_at(Price::new(dec!(105))).unwrap() < Decimal::ZERO);
    }
}
