//! Exit-time P&L estimate for a position closed after leaving its range.

use crate::error::{DomainError, DomainResult};
use crate::metrics::impermanent_loss::calculate_il_constant_product;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inputs to [`estimate_exit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitInputs {
    /// Capital deployed at entry, in USD.
    pub capital_usd: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    /// CEX quote volume (USD) traded while the position was held.
    pub quote_volume_usd: Decimal,
    /// Pool fee tier as a fraction (0.0005 for 0.05%).
    pub fee_tier: Decimal,
    /// Approximate pool TVL in USD.
    pub pool_tvl_usd: Decimal,
}

/// Result of [`estimate_exit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitEstimate {
    /// IL as a fraction.
    pub impermanent_loss: Decimal,
    pub estimated_fees_usd: Decimal,
    /// Value had the capital been held instead of provided.
    pub hodl_value_usd: Decimal,
    pub final_value_usd: Decimal,
    pub pnl_usd: Decimal,
}

/// `final = capital · r · (1 + IL) + fees`, with fees from the pool share of quote volume.
///
/// # Errors
/// Returns an error for non-positive prices or TVL.
pub fn estimate_exit(inputs: &ExitInputs) -> DomainResult<ExitEstimate> {
    if inputs.pool_tvl_usd <= Decimal::ZERO {
        return Err(DomainError::invalid("pool_tvl_usd", "must be positive"));
    }
    let impermanent_loss = calculate_il_constant_product(inputs.entry_price, inputs.exit_price)?;

    let pool_share = inputs.capital_usd / inputs.pool_tvl_usd;
    let estimated_fees_usd = inputs.quote_volume_usd * inputs.fee_tier * pool_share;

    let price_ratio = inputs.exit_price / inputs.entry_price;
    let hodl_value_usd = inputs.capital_usd * price_ratio;
    let final_value_usd = hodl_value_usd * (Decimal::ONE + impermanent_loss) + estimated_fees_usd;

    Ok(ExitEstimate {
        impermanent_loss,
        estimated_fees_usd,
        hodl_value_usd,
        final_value_usd,
        pnl_usd: final_value_usd - inputs.capital_usd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn inputs(exit_price: Decimal) -> ExitInputs {
        ExitInputs {
            capital_usd: dec!(1000),
            entry_price: dec!(100),
            exit_price,
            quote_volume_usd: dec!(40_000_000),
            fee_tier: dec!(0.0005),
            pool_tvl_usd: dec!(20_000_000),
        }
    }

    #[test]
    fn test_flat_exit_earns_fees_only() {
        let estimate = estimate_exit(&inputs(dec!(100))).unwrap();
        // 40M * 0.0005 * (1000 / 20M) = 1
        assert_eq!(estimate.estimated_fees_usd, dec!(1));
        assert_eq!(estimate.impermanent_loss, Decimal::ZERO);
        assert_eq!(estimate.final_value_usd, dec!(1001));
        assert_eq!(estimate.pnl_usd, dec!(1));
    }

    #[test]
    fn test_price_move_applies_il() {
        let estimate = estimate_exit(&inputs(dec!(400))).unwrap();
        assert_eq!(estimate.hodl_value_usd, dec!(4000));
        // IL(4) = -0.2 -> 4000 * 0.8 + 1
        assert!((estimate.final_value_usd - dec!(3201)).abs() < dec!(0.001));
    }

    #[test]
    fn test_rejects_zero_tvl() {
        let mut bad = inputs(dec!(100));
        bad.pool_tvl_usd = Decimal::ZERO;
        assert!(estimate_exit(&bad).is_err());
    }
}
