//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use range_lp_simulation::prelude::*;
//! ```

// Backtest
pub use crate::backtest::{Backtest, BacktestResult, BacktestSummary, RangePolicy};

// Configuration
pub use crate::config::StrategyConfig;

// Events
pub use crate::event::{EventData, EventLog, SimulationEvent, SimulationEventType};

// Fee models
pub use crate::fee_model::{
    ActivityShareFee, FeeModel, FeeModelKind, NoFees, PoolShareFee, build_fee_model,
};

// Analyses
pub use crate::hourly::{HourlyAnalysis, HourlyRow, MAX_PERIOD_DAYS};
pub use crate::monthly::{MonthlyAnalysis, MonthlyReport, MonthlyRow};

// Liquidity models
pub use crate::liquidity::{
    ConstantLiquidity, LiquidityModel, PeakedLiquidity, RangePositionLiquidity, WeekdayLiquidity,
};

// State
pub use crate::state::MarketSnapshot;
pub use crate::state_machine::{Alert, PositionStateMachine, StrategyTotals, TickReport};

// Volume models
pub use crate::volume::{ConstantVolume, SinusoidalVolume, VolumeModel, WeekdayVolume};
