//! Position state machine: `Searching → InPosition → Searching`.
//!
//! The machine owns the cash balance and at most one open position. Each
//! call to [`PositionStateMachine::on_tick`] consumes one market observation
//! and returns a [`TickReport`] describing what happened.

use crate::config::StrategyConfig;
use crate::event::{EventData, EventLog, SimulationEvent};
use crate::fee_model::FeeModel;
use crate::state::MarketSnapshot;
use chrono::{DateTime, Utc};
use range_lp_domain::entities::Position;
use range_lp_domain::enums::{StrategyState, TickStatus};
use range_lp_domain::value_objects::price::Price;
use range_lp_domain::value_objects::price_range::PriceRange;
use range_lp_domain::{DomainError, DomainResult};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, info, warn};

/// Notable condition attached to a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A position was opened.
    Entered { price: Price, range: PriceRange },
    /// IL fell below the alert threshold while in range.
    IlBreach { il_pct: Decimal },
    /// The position was liquidated.
    Exited { price: Price, pnl: Decimal },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entered { price, range } => write!(f, "Entered at {price}. Range: [{range}]"),
            Self::IlBreach { il_pct } => write!(f, "IL Alert! Breach ({:.2}%)", il_pct.round_dp(2)),
            Self::Exited { price, pnl } => {
                write!(f, "Exited at {price}. Final PnL: ${:.2}", pnl.round_dp(2))
            }
        }
    }
}

/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// 1-based tick counter.
    pub step: u64,
    /// Observation time in milliseconds.
    pub timestamp: i64,
    pub status: TickStatus,
    pub price: Price,
    /// Mark-to-market value of the position; zero while searching.
    pub position_value: Decimal,
    /// IL in percent; zero while searching.
    pub il_pct: Decimal,
    pub fees_this_tick: Decimal,
    /// Position PnL while in position, realized PnL while searching.
    pub total_pnl: Decimal,
    pub alert: Option<Alert>,
}

impl TickReport {
    /// Observation time as UTC; the epoch if out of range.
    #[must_use]
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }
}

/// Running totals over the life of a state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyTotals {
    pub steps: u64,
    pub steps_in_position: u64,
    pub positions_opened: u32,
    pub positions_closed: u32,
    pub total_fees: Decimal,
    pub total_gas: Decimal,
    /// Sum of closed-position PnL.
    pub realized_pnl: Decimal,
}

/// Drives one simulated liquidity position at a time.
pub struct PositionStateMachine {
    config: StrategyConfig,
    fee_model: Box<dyn FeeModel + Send>,
    state: StrategyState,
    cash_usd: Decimal,
    search_range: Option<PriceRange>,
    position: Option<Position>,
    events: EventLog,
    totals: StrategyTotals,
}

impl fmt::Debug for PositionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionStateMachine")
            .field("state", &self.state)
            .field("cash_usd", &self.cash_usd)
            .field("search_range", &self.search_range)
            .field("position", &self.position)
            .field("totals", &self.totals)
            .finish_non_exhaustive()
    }
}

impl PositionStateMachine {
    /// Creates a searching machine holding `config.capital_usd` in cash.
    ///
    /// # Errors
    /// Returns an error if the config does not validate.
    pub fn new(config: StrategyConfig, fee_model: Box<dyn FeeModel + Send>) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self {
            cash_usd: config.capital_usd,
            config,
            fee_model,
            state: StrategyState::Searching,
            search_range: None,
            position: None,
            events: EventLog::new(),
            totals: StrategyTotals::default(),
        })
    }

    /// Sets the range used to decide entry while searching.
    pub fn set_search_range(&mut self, range: PriceRange) {
        debug!(range = %range, "search range updated");
        self.search_range = Some(range);
    }

    pub fn search_range(&self) -> Option<PriceRange> {
        self.search_range
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    pub fn cash(&self) -> Decimal {
        self.cash_usd
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Consumes the machine, keeping its event log.
    pub fn into_events(self) -> EventLog {
        self.events
    }

    pub fn totals(&self) -> &StrategyTotals {
        &self.totals
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Cash plus the open position's value, with all fees earned added and
    /// all gas paid subtracted.
    pub fn equity_at(&self, price: Price) -> Decimal {
        let open = self
            .position
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.value_at(price));
        self.cash_usd + open + self.totals.total_fees - self.totals.total_gas
    }

    /// Processes one observation.
    ///
    /// # Errors
    /// Fails if no search range is set while searching, if the price is not
    /// positive, or if the fee model rejects its inputs. State is unchanged
    /// on error.
    pub fn on_tick(&mut self, snapshot: &MarketSnapshot) -> DomainResult<TickReport> {
        if !snapshot.price.is_positive() {
            return Err(DomainError::NonPositivePrice(snapshot.price.value));
        }

        let report = match self.position.take() {
            None => self.tick_searching(snapshot)?,
            Some(position) if position.is_in_range(snapshot.price) => {
                self.tick_in_range(position, snapshot)?
            }
            Some(position) => self.exit(position, snapshot)?,
        };

        self.totals.steps += 1;
        if report.status != TickStatus::OutOfRange {
            self.totals.steps_in_position += 1;
        }
        Ok(report)
    }

    fn tick_searching(&mut self, snapshot: &MarketSnapshot) -> DomainResult<TickReport> {
        let range = self
            .search_range
            .ok_or_else(|| DomainError::invalid("search_range", "not set while searching"))?;
        let price = snapshot.price;

        if !range.contains(price) {
            return Ok(self.report(snapshot, TickStatus::OutOfRange, self.totals.realized_pnl));
        }

        let gas = self.config.gas_fee_usd;
        let investment = self.cash_usd * self.config.investment_fraction;
        let position = Position::open(range, price, investment, gas, snapshot.timestamp)?;

        self.cash_usd -= investment;
        self.totals.positions_opened += 1;
        self.totals.total_gas += gas;
        self.state = StrategyState::InPosition;

        info!(
            position_id = %position.id.0,
            price = %price,
            range = %range,
            investment = %investment,
            "position opened"
        );
        self.record(
            &position,
            snapshot,
            EventData::PositionOpened {
                capital: investment,
                range,
                gas,
            },
        );

        let mut report = self.report(snapshot, TickStatus::PositionOpened, -gas);
        report.position_value = investment;
        report.alert = Some(Alert::Entered { price, range });
        self.position = Some(position);
        Ok(report)
    }

    fn tick_in_range(
        &mut self,
        mut position: Position,
        snapshot: &MarketSnapshot,
    ) -> DomainResult<TickReport> {
        let price = snapshot.price;
        let value = position.value_at(price);
        let il_pct = match position.il_pct_at(price) {
            Ok(il) => il,
            Err(e) => {
                self.position = Some(position);
                return Err(e);
            }
        };
        let fees = match self.fee_model.estimate(value, snapshot) {
            Ok(fees) => fees,
            Err(e) => {
                self.position = Some(position);
                return Err(e);
            }
        };

        position.accrue_fees(fees);
        self.totals.total_fees += fees;
        self.record(
            &position,
            snapshot,
            EventData::FeeAccrued {
                amount: fees,
                cumulative: position.fees_earned_usd,
            },
        );

        let threshold = self.config.il_alert_threshold_pct;
        let alert = if il_pct < threshold {
            warn!(il_pct = %il_pct, threshold = %threshold, "impermanent loss alert");
            self.record(
                &position,
                snapshot,
                EventData::IlAlert {
                    il_pct,
                    threshold_pct: threshold,
                },
            );
            Some(Alert::IlBreach { il_pct })
        } else {
            None
        };

        let mut report = self.report(
            snapshot,
            TickStatus::InRange,
            position.pnl_at(price, Decimal::ZERO),
        );
        report.position_value = value;
        report.il_pct = il_pct;
        report.fees_this_tick = fees;
        report.alert = alert;

        self.position = Some(position);
        Ok(report)
    }

    fn exit(
        &mut self,
        mut position: Position,
        snapshot: &MarketSnapshot,
    ) -> DomainResult<TickReport> {
        let price = snapshot.price;
        let gas = self.config.gas_fee_usd;
        let value = position.value_at(price);
        let il_pct = match position.il_pct_at(price) {
            Ok(il) => il,
            Err(e) => {
                self.position = Some(position);
                return Err(e);
            }
        };
        let pnl = position.pnl_at(price, gas);

        self.cash_usd += value;
        self.totals.positions_closed += 1;
        self.totals.total_gas += gas;
        self.totals.realized_pnl += pnl;
        self.state = StrategyState::Searching;
        position.close();

        info!(
            position_id = %position.id.0,
            price = %price,
            pnl = %pnl,
            fees = %position.fees_earned_usd,
            "position closed"
        );
        self.record(
            &position,
            snapshot,
            EventData::PositionClosed {
                final_value: value,
                total_fees: position.fees_earned_usd,
                final_il_pct: il_pct,
                net_pnl: pnl,
            },
        );

        let mut report = self.report(snapshot, TickStatus::Exited, pnl);
        report.position_value = value;
        report.il_pct = il_pct;
        report.alert = Some(Alert::Exited { price, pnl });
        Ok(report)
    }

    fn report(
        &self,
        snapshot: &MarketSnapshot,
        status: TickStatus,
        total_pnl: Decimal,
    ) -> TickReport {
        TickReport {
            step: self.totals.steps + 1,
            timestamp: snapshot.timestamp,
            status,
            price: snapshot.price,
            position_value: Decimal::ZERO,
            il_pct: Decimal::ZERO,
            fees_this_tick: Decimal::ZERO,
            total_pnl,
            alert: None,
        }
    }

    fn record(&mut self, position: &Position, snapshot: &MarketSnapshot, data: EventData) {
        self.events.record(SimulationEvent {
            step: self.totals.steps + 1,
            timestamp: snapshot.timestamp,
            position_id: position.id,
            price: snapshot.price,
            data,
        });
    }
}
