//! Synthetic cross-rate series built from two USDT legs.

use crate::error::{DomainError, DomainResult};
use rust_decimal::Decimal;

/// Divides the trailing common part of `base_usdt` by `quote_usdt`.
///
/// Both series are aligned on their most recent values: the longer one is
/// trimmed from the front.
///
/// # Errors
/// Returns [`DomainError::EmptyWindow`] if either series is empty and
/// [`DomainError::NonPositivePrice`] if a quote price is zero or negative.
pub fn synthetic_ratio_series(
    base_usdt: &[Decimal],
    quote_usdt: &[Decimal],
) -> DomainResult<Vec<Decimal>> {
    let len = base_usdt.len().min(quote_usdt.len());
    if len == 0 {
        return Err(DomainError::EmptyWindow);
    }

    let base = &base_usdt[base_usdt.len() - len..];
    let quote = &quote_usdt[quote_usdt.len() - len..];

    base.iter()
        .zip(quote)
        .map(|(b, q)| {
            if *q <= Decimal::ZERO {
                Err(DomainError::NonPositivePrice(*q))
            } else {
                Ok(*b / *q)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_aligns_on_trailing_values() {
        let base = [dec!(1), dec!(2000), dec!(3000)];
        let quote = [dec!(500), dec!(600)];
        let ratio = synthetic_ratio_series(&base, &quote).unwrap();
        assert_eq!(ratio, vec![dec!(4), dec!(5)]);
    }

    #[test]
    fn test_zero_quote_is_error() {
        let err = synthetic_ratio_series(&[dec!(1)], &[dec!(0)]).unwrap_err();
        assert_eq!(err, DomainError::NonPositivePrice(dec!(0)));
    }

    #[test]
    fn test_empty_leg_is_error() {
        assert_eq!(
            synthetic_ratio_series(&[], &[dec!(1)]).unwrap_err(),
            DomainError::EmptyWindow
        );
    }
}
