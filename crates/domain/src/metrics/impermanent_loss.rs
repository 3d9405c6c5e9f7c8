use crate::error::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Calculates Impermanent Loss for a constant product pool.
/// formula: 2 * sqrt(price_ratio) / (1 + price_ratio) - 1
///
/// # Arguments
///
/// * `entry_price` - The price at which the position was opened
/// * `current_price` - The current price
///
/// # Returns
///
/// * `Decimal` - The impermanent loss as a fraction (e.g., -0.05 for a 5% loss)
///
/// # Errors
/// Returns [`DomainError::NonPositivePrice`] if either price is zero or negative.
pub fn calculate_il_constant_product(
    entry_price: Decimal,
    current_price: Decimal,
) -> DomainResult<Decimal> {
    if entry_price <= Decimal::ZERO {
        return Err(DomainError::NonPositivePrice(entry_price));
    }
    if current_price <= Decimal::ZERO {
        return Err(DomainError::NonPositivePrice(current_price));
    }

    let price_ratio = current_price / entry_price;
    il_from_ratio(price_ratio)
}

/// IL for a given `price / entry` ratio. IL is an estimate, so sqrt goes through `f64`.
///
/// # Errors
/// Returns an error for a non-positive ratio or on `f64` overflow.
pub fn il_from_ratio(price_ratio: Decimal) -> DomainResult<Decimal> {
    if price_ratio <= Decimal::ZERO {
        return Err(DomainError::NonPositivePrice(price_ratio));
    }

    let ratio_f64 = price_ratio
        .to_f64()
        .ok_or(DomainError::Overflow("IL price ratio"))?;
    let sqrt_ratio = ratio_f64.sqrt();

    let numerator = 2.0 * sqrt_ratio;
    let denominator = 1.0 + ratio_f64;

    let result_f64 = (numerator / denominator) - 1.0;

    Decimal::from_f64(result_f64).ok_or(DomainError::Overflow("IL result"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_calculate_il_constant_product() {
        // Price doubles: 100 -> 200. Ratio = 2.
        // IL = 2*sqrt(2)/(1+2) - 1 = 2*1.4142/3 - 1 = 0.9428 - 1 = -0.0572 (5.72%)
        let il = calculate_il_constant_product(dec!(100), dec!(200)).unwrap();
        let diff = (il - dec!(-0.05719)).abs();
        assert!(diff < dec!(0.0001));
    }

    #[test]
    fn test_no_loss_at_entry() {
        assert_eq!(
            calculate_il_constant_product(dec!(3200), dec!(3200)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_loss_is_negative_away_from_entry() {
        for price in [dec!(50), dec!(99), dec!(101), dec!(400)] {
            assert!(calculate_il_constant_product(dec!(100), price).unwrap() < Decimal::ZERO);
        }
    }

    #[test]
    fn test_symmetric_in_ratio() {
        let up = il_from_ratio(dec!(4)).unwrap();
        let down = il_from_ratio(dec!(0.25)).unwrap();
        assert!((up - down).abs() < dec!(0.0000001));
        // 2*2/5 - 1 = -0.2
        assert!((up - dec!(-0.2)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_rejects_non_positive_prices() {
        assert_eq!(
            calculate_il_constant_product(dec!(0), dec!(1)).unwrap_err(),
            DomainError::NonPositivePrice(dec!(0))
        );
        assert!(calculate_il_constant_product(dec!(1), dec!(-1)).is_err());
    }
}
