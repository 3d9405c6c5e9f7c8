use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Top-level state of the range strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrategyState {
    /// Waiting for price to enter the computed range.
    #[default]
    Searching,
    /// Liquidity is deployed.
    InPosition,
}

/// Outcome of a single polling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickStatus {
    /// Searching and price is outside the range.
    OutOfRange,
    /// A position was opened on this tick.
    PositionOpened,
    /// Position held and price still inside its range.
    InRange,
    /// Position liquidated on this tick.
    Exited,
}

impl TickStatus {
    /// Console label used in status rows.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::OutOfRange => "OUT OF RANGE",
            Self::PositionOpened => "POSITION OPENED",
            Self::InRange => "IN RANGE (ACTIVE)",
            Self::Exited => "EXITED POSITION",
        }
    }
}

impl fmt::Display for TickStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
