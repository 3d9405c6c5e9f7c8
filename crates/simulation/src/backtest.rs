//! Rolling backtest over historical candles.
//!
//! Starting at index `lookback`, each candle's close drives the position
//! state machine. While searching, the range is rebuilt from the previous
//! `lookback` closes (or computed once, with [`RangePolicy::Fixed`]).

use crate::config::StrategyConfig;
use crate::event::EventLog;
use crate::fee_model::FeeModel;
use crate::state::MarketSnapshot;
use crate::state_machine::{PositionStateMachine, TickReport};
use range_lp_domain::entities::PriceCandle;
use range_lp_domain::enums::StrategyState;
use range_lp_domain::value_objects::price::Price;
use range_lp_domain::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// When the searching range is (re)computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// Compute once from the first window and keep it.
    Fixed,
    /// Recompute from the trailing window on every searching tick.
    #[default]
    RecomputeWhileSearching,
}

/// Summary statistics from a backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    /// Candles replayed.
    pub total_steps: u64,
    /// Steps with a position open (including entry and exit ticks).
    pub steps_in_position: u64,
    pub positions_opened: u32,
    pub positions_closed: u32,
    /// Total fees earned.
    pub total_fees: Decimal,
    /// Total gas paid.
    pub total_gas: Decimal,
    /// Close of the last replayed candle.
    pub final_price: Price,
    /// Cash plus open position value and fees earned, less gas, at the last close.
    pub final_equity: Decimal,
    /// `final_equity - capital`.
    pub net_pnl: Decimal,
    /// Net PnL as a percentage of capital.
    pub roi_pct: Decimal,
    /// Maximum peak-to-trough equity drop, in percent.
    pub max_drawdown_pct: Decimal,
    /// Value of a 50/50 split of capital held from the first replayed close.
    pub hodl_value: Decimal,
    /// Performance vs HODL (positive = outperformed).
    pub vs_hodl: Decimal,
}

impl BacktestSummary {
    /// Returns the percentage of steps spent in a position.
    #[must_use]
    pub fn time_in_position_pct(&self) -> Decimal {
        if self.total_steps == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.steps_in_position) * Decimal::ONE_HUNDRED
            / Decimal::from(self.total_steps)
    }
}

/// Everything a backtest produces.
#[derive(Debug)]
pub struct BacktestResult {
    /// One report per replayed candle.
    pub reports: Vec<TickReport>,
    pub events: EventLog,
    pub summary: BacktestSummary,
}

/// Replays candles through the strategy.
#[derive(Debug, Clone)]
pub struct Backtest {
    config: StrategyConfig,
    policy: RangePolicy,
}

impl Backtest {
    #[must_use]
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            policy: RangePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs the backtest.
    ///
    /// # Errors
    /// Fails if there are not more candles than `lookback`, if the config is
    /// invalid, or if a range or tick computation fails.
    pub fn run(
        &self,
        candles: &[PriceCandle],
        fee_model: Box<dyn FeeModel + Send>,
    ) -> DomainResult<BacktestResult> {
        let lookback = self.config.lookback;
        if candles.len() <= lookback {
            return Err(DomainError::invalid(
                "candles",
                format!("need more than {lookback} candles, got {}", candles.len()),
            ));
        }

        let calculator = self.config.range_calculator();
        let capital = self.config.capital_usd;
        let mut machine = PositionStateMachine::new(self.config.clone(), fee_model)?;
        let mut reports = Vec::with_capacity(candles.len() - lookback);

        let mut peak = capital;
        let mut max_drawdown = Decimal::ZERO;

        for i in lookback..candles.len() {
            let needs_range = match self.policy {
                RangePolicy::Fixed => machine.search_range().is_none(),
                RangePolicy::RecomputeWhileSearching => {
                    machine.state() == StrategyState::Searching
                }
            };
            if needs_range {
                let closes: Vec<Decimal> =
                    candles[i - lookback..i].iter().map(|c| c.close.value).collect();
                let estimate = calculator.calculate(&closes)?;
                machine.set_search_range(estimate.range);
            }

            let snapshot = MarketSnapshot::from_close(&candles[i]);
            reports.push(machine.on_tick(&snapshot)?);

            let equity = machine.equity_at(snapshot.price);
            if equity > peak {
                peak = equity;
            }
            let drawdown = (peak - equity) / peak;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        let first_price = candles[lookback].close;
        let final_price = candles[candles.len() - 1].close;
        let final_equity = machine.equity_at(final_price);
        let net_pnl = final_equity - capital;

        // 50/50 at the first replayed close, quote leg assumed stable
        let price_ratio = final_price.value / first_price.value;
        let hodl_value = capital * (Decimal::ONE + price_ratio) / Decimal::TWO;

        let totals = machine.totals().clone();
        let summary = BacktestSummary {
            total_steps: totals.steps,
            steps_in_position: totals.steps_in_position,
            positions_opened: totals.positions_opened,
            positions_closed: totals.positions_closed,
            total_fees: totals.total_fees,
            total_gas: totals.total_gas,
            final_price,
            final_equity,
            net_pnl,
            roi_pct: net_pnl * Decimal::ONE_HUNDRED / capital,
            max_drawdown_pct: max_drawdown * Decimal::ONE_HUNDRED,
            hodl_value,
            vs_hodl: final_equity - hodl_value,
        };

        info!(
            steps = summary.total_steps,
            positions = summary.positions_opened,
            net_pnl = %summary.net_pnl,
            "backtest complete"
        );

        Ok(BacktestResult {
            reports,
            events: machine.into_events(),
            summary,
        })
    }
}
