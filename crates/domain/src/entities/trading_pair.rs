use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `BASE/QUOTE` market such as `WETH/USDC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// The same pair with wrapped tokens mapped to their centralized-exchange tickers.
    pub fn to_exchange_pair(&self) -> Self {
        Self::new(unwrap_symbol(&self.base), unwrap_symbol(&self.quote))
    }

    /// `ASSET/USDT` leg used to build synthetic cross rates.
    pub fn usdt_leg(asset: &str) -> Self {
        Self::new(unwrap_symbol(asset), "USDT")
    }

    /// Renders the pair with a custom separator, e.g. `ETHUSDT` or `ETH-USDT`.
    pub fn joined(&self, separator: &str) -> String {
        format!("{}{}{}", self.base, separator, self.quote)
    }
}

fn unwrap_symbol(symbol: &str) -> String {
    match symbol.to_uppercase().as_str() {
        "WETH" => "ETH".to_string(),
        "WBNB" => "BNB".to_string(),
        other => other.to_string(),
    }
}

impl FromStr for TradingPair {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let mut parts = s.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) if !base.is_empty() && !quote.is_empty() => {
                Ok(Self::new(base, quote))
            }
            _ => Err(DomainError::InvalidPair(s.to_string())),
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let pair: TradingPair = "weth/usdc".parse().unwrap();
        assert_eq!(pair.base, "WETH");
        assert_eq!(pair.quote, "USDC");
        assert_eq!(pair.to_string(), "WETH/USDC");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("ETHUSDT".parse::<TradingPair>().is_err());
        assert!("ETH/".parse::<TradingPair>().is_err());
        assert!("A/B/C".parse::<TradingPair>().is_err());
    }

    #[test]
    fn test_exchange_aliases() {
        let pair: TradingPair = "WBNB/WETH".parse().unwrap();
        let cex = pair.to_exchange_pair();
        assert_eq!(cex.joined(""), "BNBETH");
        assert_eq!(TradingPair::usdt_leg("WETH").joined("-"), "ETH-USDT");
    }
}
