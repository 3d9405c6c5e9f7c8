//! Sinks that receive every [`TickReport`] the paper trader produces.

mod journal;

pub use journal::{TickJournal, TickRecord};

use anyhow::{Context, Result};
use range_lp_simulation::state_machine::TickReport;
use std::io::{self, Write};

/// Destination for per-tick status rows.
pub trait ReportSink: Send {
    /// Handles one tick.
    ///
    /// # Errors
    /// Returns an error if the report cannot be written.
    fn on_report(&mut self, report: &TickReport) -> Result<()>;
}

/// Fixed-width status table written to any [`Write`] target.
pub struct ConsoleReporter<W: Write + Send = io::Stdout> {
    out: W,
    header_written: bool,
}

impl ConsoleReporter<io::Stdout> {
    /// Reporter printing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    /// Consumes the reporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Column titles matching [`format_row`].
pub fn format_header() -> String {
    format!(
        "{:<19}  {:<17}  {:>12}  {:>12}  {:>8}  {:>9}  {:>10}  {}",
        "Timestamp", "Status", "Price", "Value", "IL", "Fees", "PnL", "Alert"
    )
}

/// One status row: timestamp, status, price, value, IL %, fees, PnL, alert.
pub fn format_row(report: &TickReport) -> String {
    let alert = report
        .alert
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    format!(
        "{:<19}  {:<17}  {:>12}  {:>12}  {:>8}  {:>9}  {:>10}  {}",
        report.datetime().format("%Y-%m-%d %H:%M:%S"),
        report.status.label(),
        report.price.to_string(),
        format!("${:.2}", report.position_value.round_dp(2)),
        format!("{:.2}%", report.il_pct.round_dp(2)),
        format!("${:.4}", report.fees_this_tick.round_dp(4)),
        format!("${:.2}", report.total_pnl.round_dp(2)),
        alert
    )
    .trim_end()
    .to_string()
}

impl<W: Write + Send> ReportSink for ConsoleReporter<W> {
    fn on_report(&mut self, report: &TickReport) -> Result<()> {
        if !self.header_written {
            writeln!(self.out, "{}", format_header()).context("Failed to write header")?;
            self.header_written = true;
        }
        writeln!(self.out, "{}", format_row(report)).context("Failed to write status row")?;
        self.out.flush().context("Failed to flush status row")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_lp_domain::enums::TickStatus;
    use range_lp_domain::value_objects::price::Price;
    use range_lp_simulation::state_machine::Alert;
    use rust_decimal_macros::dec;

    fn report(status: TickStatus, alert: Option<Alert>) -> TickReport {
        TickReport {
            step: 1,
            timestamp: 1_710_720_000_000,
            status,
            price: Price::new(dec!(3512.346)),
            position_value: dec!(499.9),
            il_pct: dec!(-0.126),
            fees_this_tick: dec!(0.01234),
            total_pnl: dec!(-0.1),
            alert,
        }
    }

    #[test]
    fn test_format_row() {
        let row = format_row(&report(TickStatus::InRange, None));
        assert!(row.starts_with("2024-03-18 00:00:00  IN RANGE (ACTIVE)"));
        assert!(row.contains("$3512.35"));
        assert!(row.contains("$499.90"));
        assert!(row.contains("-0.13%"));
        assert!(row.contains("$0.0123"));
        assert!(row.ends_with("$-0.10"));
    }

    #[test]
    fn test_format_row_with_alert() {
        let alert = Alert::IlBreach {
            il_pct: dec!(-2.5),
        };
        let row = format_row(&report(TickStatus::InRange, Some(alert)));
        assert!(row.ends_with("IL Alert! Breach (-2.50%)"));
    }

    #[test]
    fn test_console_writes_header_once() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter
            .on_report(&report(TickStatus::OutOfRange, None))
            .unwrap();
        reporter
            .on_report(&report(TickStatus::OutOfRange, None))
            .unwrap();

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Timestamp"));
        assert!(lines[1].contains("OUT OF RANGE"));
    }
}
