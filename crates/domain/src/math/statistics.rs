use crate::error::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Which denominator to use for the standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdDevKind {
    /// Divide by `n - 1`. Undefined for fewer than two values.
    #[default]
    Sample,
    /// Divide by `n`.
    Population,
}

/// Arithmetic mean.
///
/// # Errors
/// Returns [`DomainError::EmptyWindow`] for an empty slice.
pub fn mean(values: &[Decimal]) -> DomainResult<Decimal> {
    if values.is_empty() {
        return Err(DomainError::EmptyWindow);
    }
    let sum: Decimal = values.iter().sum();
    Ok(sum / Decimal::from(values.len()))
}

/// Standard deviation; `Ok(None)` when it is undefined (sample of one).
///
/// # Errors
/// Returns [`DomainError::EmptyWindow`] for an empty slice.
pub fn std_dev(values: &[Decimal], kind: StdDevKind) -> DomainResult<Option<Decimal>> {
    let avg = mean(values)?;
    let n = values.len();
    let denominator = match kind {
        StdDevKind::Sample if n < 2 => return Ok(None),
        StdDevKind::Sample => n - 1,
        StdDevKind::Population => n,
    };

    let sum_sq: Decimal = values
        .iter()
        .map(|v| {
            let d = *v - avg;
            d * d
        })
        .sum();

    sqrt(sum_sq / Decimal::from(denominator)).map(Some)
}

/// Square root through `f64`; IL and volatility are estimates so the precision loss is fine.
///
/// # Errors
/// Rejects negative input and values that do not fit in `f64`.
pub fn sqrt(value: Decimal) -> DomainResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::invalid("sqrt", "negative input"));
    }
    let f = value.to_f64().ok_or(DomainError::Overflow("sqrt input"))?;
    Decimal::from_f64(f.sqrt()).ok_or(DomainError::Overflow("sqrt result"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.000001)
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[dec!(1), dec!(2), dec!(3), dec!(6)]).unwrap(), dec!(3));
        assert_eq!(mean(&[]).unwrap_err(), DomainError::EmptyWindow);
    }

    #[test]
    fn test_std_dev_kinds() {
        let values = [dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        // population variance = 4, sample variance = 32/7
        let population = std_dev(&values, StdDevKind::Population).unwrap().unwrap();
        assert!(close(population, dec!(2)));

        let sample = std_dev(&values, StdDevKind::Sample).unwrap().unwrap();
        assert!(close(sample, dec!(2.138090)));
    }

    #[test]
    fn test_std_dev_single_value() {
        assert_eq!(std_dev(&[dec!(10)], StdDevKind::Sample).unwrap(), None);
        assert_eq!(
            std_dev(&[dec!(10)], StdDevKind::Population).unwrap(),
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn test_sqrt_negative() {
        assert!(sqrt(dec!(-1)).is_err());
        assert_eq!(sqrt(dec!(16)).unwrap(), dec!(4));
    }
}
