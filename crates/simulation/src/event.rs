//! Strategy events for tracking what happens during a run.
//!
//! This module defines the event types emitted by the position state machine:
//! entries, fee accruals, IL alerts and exits.

use range_lp_domain::entities::PositionId;
use range_lp_domain::value_objects::price::Price;
use range_lp_domain::value_objects::price_range::PriceRange;
use rust_decimal::Decimal;

/// Types of events that can occur during simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEventType {
    /// Position was opened.
    PositionOpened,
    /// Fees were accrued on an in-range tick.
    FeeAccrued,
    /// Impermanent loss breached the alert threshold.
    IlAlert,
    /// Position was closed.
    PositionClosed,
}

/// A simulation event with full context.
#[derive(Debug, Clone)]
pub struct SimulationEvent {
    /// Step number when event occurred.
    pub step: u64,
    /// Timestamp in milliseconds.
    pub timestamp: i64,
    /// Position the event belongs to.
    pub position_id: PositionId,
    /// Price at the time of event.
    pub price: Price,
    /// Event-specific data.
    pub data: EventData,
}

/// Event-specific data payload.
#[derive(Debug, Clone)]
pub enum EventData {
    /// Position opened data.
    PositionOpened {
        /// Capital invested.
        capital: Decimal,
        /// Range frozen for the position's lifetime.
        range: PriceRange,
        /// Gas charged at entry.
        gas: Decimal,
    },
    /// Fee accrual data.
    FeeAccrued {
        /// Fees earned this tick.
        amount: Decimal,
        /// Cumulative fees for the position.
        cumulative: Decimal,
    },
    /// IL alert data.
    IlAlert {
        /// IL in percent.
        il_pct: Decimal,
        /// Threshold that was breached.
        threshold_pct: Decimal,
    },
    /// Position closed data.
    PositionClosed {
        /// Liquidation value of the held tokens.
        final_value: Decimal,
        /// Total fees earned.
        total_fees: Decimal,
        /// IL percentage at exit.
        final_il_pct: Decimal,
        /// Net PnL including both gas charges.
        net_pnl: Decimal,
    },
}

impl SimulationEvent {
    /// Returns the event type.
    #[must_use]
    pub fn event_type(&self) -> SimulationEventType {
        match self.data {
            EventData::PositionOpened { .. } => SimulationEventType::PositionOpened,
            EventData::FeeAccrued { .. } => SimulationEventType::FeeAccrued,
            EventData::IlAlert { .. } => SimulationEventType::IlAlert,
            EventData::PositionClosed { .. } => SimulationEventType::PositionClosed,
        }
    }
}

/// Event log for collecting all events during simulation.
#[derive(Debug, Default)]
pub struct EventLog {
    /// All recorded events.
    events: Vec<SimulationEvent>,
}

impl EventLog {
    /// Creates a new empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Records an event.
    pub fn record(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    /// Returns all events.
    #[must_use]
    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    /// Returns events of a specific type.
    #[must_use]
    pub fn events_of_type(&self, event_type: SimulationEventType) -> Vec<&SimulationEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Returns the count of events by type.
    #[must_use]
    pub fn count_by_type(&self, event_type: SimulationEventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    /// Clears all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
