use super::ReportSink;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use range_lp_simulation::state_machine::TickReport;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tracing::info;

/// Journal row for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    pub timestamp: String,
    pub step: u64,
    pub status: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub position_value: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub il_pct: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub fees: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_pnl: Decimal,
    pub alert: String,
}

impl From<&TickReport> for TickRecord {
    fn from(report: &TickReport) -> Self {
        Self {
            timestamp: report.datetime().to_rfc3339(),
            step: report.step,
            status: report.status.label().to_string(),
            price: report.price.value,
            position_value: report.position_value,
            il_pct: report.il_pct,
            fees: report.fees_this_tick,
            total_pnl: report.total_pnl,
            alert: report
                .alert
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

/// Append-only CSV log of tick reports.
///
/// Reopening an existing journal continues it without repeating the header.
pub struct TickJournal {
    writer: csv::Writer<File>,
}

impl TickJournal {
    /// Opens or creates the journal at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_has_data =
            path.exists() && fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open journal {}", path.display()))?;

        let writer = WriterBuilder::new()
            .has_headers(!file_has_data)
            .from_writer(file);

        info!(path = %path.display(), resumed = file_has_data, "Tick journal opened");
        Ok(Self { writer })
    }
}

impl ReportSink for TickJournal {
    fn on_report(&mut self, report: &TickReport) -> Result<()> {
        self.writer
            .serialize(TickRecord::from(report))
            .context("Failed to write tick record")?;
        self.writer.flush().context("Failed to flush tick journal")?;
        Ok(())
    }
}
