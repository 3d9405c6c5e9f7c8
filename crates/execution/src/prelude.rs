//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use range_lp_execution::prelude::*;
//! ```

pub use crate::report::{ConsoleReporter, ReportSink, TickJournal, TickRecord};
pub use crate::trader::{PaperTrader, TraderSummary};
