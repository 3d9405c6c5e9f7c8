use crate::error::{DomainError, DomainResult};
use rust_decimal::Decimal;

/// Fees earned by a position owning `position_value / pool_tvl` of a pool.
///
/// # Errors
/// Returns an error if `pool_tvl` is not positive.
pub fn pool_share_fee(
    position_value: Decimal,
    pool_tvl: Decimal,
    volume_usd: Decimal,
    fee_tier: Decimal,
) -> DomainResult<Decimal> {
    if pool_tvl <= Decimal::ZERO {
        return Err(DomainError::invalid(
            "pool_tvl",
            format!("must be positive, got {pool_tvl}"),
        ));
    }
    Ok(position_value / pool_tvl * volume_usd * fee_tier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pool_share_fee() {
        // 1000 / 50M share of 10M volume at 5 bps = 0.1
        let fee = pool_share_fee(dec!(1000), dec!(50_000_000), dec!(10_000_000), dec!(0.0005))
            .unwrap();
        assert_eq!(fee, dec!(0.1));
        assert!(pool_share_fee(dec!(1), dec!(0), dec!(1), dec!(0.0005)).is_err());
    }
}
