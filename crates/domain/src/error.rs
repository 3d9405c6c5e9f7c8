//! Error type for domain calculations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by domain math and entity construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A calculation received no input values.
    #[error("price window is empty")]
    EmptyWindow,
    /// A tunable parameter is out of its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A price that must be strictly positive was not.
    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),
    /// Range bounds are inverted or equal.
    #[error("invalid range: lower {lower} must be below upper {upper}")]
    InvalidRange {
        /// Lower bound.
        lower: Decimal,
        /// Upper bound.
        upper: Decimal,
    },
    /// Trading pair string could not be parsed.
    #[error("invalid trading pair `{0}`, expected BASE/QUOTE")]
    InvalidPair(String),
    /// Conversion between `Decimal` and `f64` overflowed.
    #[error("numeric overflow in {0}")]
    Overflow(&'static str),
}

/// Convenience alias for domain results.
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Builds an [`DomainError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
