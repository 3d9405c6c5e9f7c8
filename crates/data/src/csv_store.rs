use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use range_lp_domain::entities::PriceCandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One row of a candle file: `open_time,open,high,low,close,volume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleRecord {
    pub open_time: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
}

impl From<&PriceCandle> for CandleRecord {
    fn from(c: &PriceCandle) -> Self {
        Self {
            open_time: c.open_time,
            open: c.open.value,
            high: c.high.value,
            low: c.low.value,
            close: c.close.value,
            volume: c.volume,
        }
    }
}

impl From<CandleRecord> for PriceCandle {
    fn from(r: CandleRecord) -> Self {
        PriceCandle::new(r.open_time, r.open, r.high, r.low, r.close, r.volume)
    }
}

/// Writes candles to `path`, replacing any existing file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_candles(path: &Path, candles: &[PriceCandle]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for candle in candles {
        writer
            .serialize(CandleRecord::from(candle))
            .context("Failed to write candle record")?;
    }
    writer.flush().context("Failed to flush candle file")?;
    info!(path = %path.display(), count = candles.len(), "Candles saved");
    Ok(())
}

/// Reads candles from `path`, oldest first.
///
/// # Errors
/// Returns an error if the file is unreadable, a row is malformed, or the
/// open times are not strictly increasing.
pub fn read_candles(path: &Path) -> Result<Vec<PriceCandle>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut candles: Vec<PriceCandle> = Vec::new();
    for (line, result) in reader.deserialize::<CandleRecord>().enumerate() {
        let record = result.with_context(|| format!("Failed to parse candle row {}", line + 1))?;
        if let Some(prev) = candles.last()
            && record.open_time <= prev.open_time
        {
            bail!(
                "candle row {} is out of order ({} after {})",
                line + 1,
                record.open_time,
                prev.open_time
            );
        }
        candles.push(record.into());
    }
    info!(path = %path.display(), count = candles.len(), "Candles loaded");
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_then_read() {
        let file = NamedTempFile::new().unwrap();
        let candles = vec![
            PriceCandle::new(1_000, dec!(1.5), dec!(2), dec!(1), dec!(1.75), dec!(10.25)),
            PriceCandle::new(2_000, dec!(1.75), dec!(2.5), dec!(1.5), dec!(2.25), dec!(8)),
        ];
        write_candles(file.path(), &candles).unwrap();
        assert_eq!(read_candles(file.path()).unwrap(), candles);
    }

    #[test]
    fn test_cross_rate_keeps_every_digit() {
        let file = NamedTempFile::new().unwrap();
        let close = dec!(0.2012345678901234567891);
        let candles = vec![PriceCandle::new(
            1_000,
            close,
            close,
            close,
            close,
            dec!(12345678.123456789012345),
        )];
        write_candles(file.path(), &candles).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("0.2012345678901234567891"));
        let loaded = read_candles(file.path()).unwrap();
        assert_eq!(loaded[0].close.value, close);
        assert_eq!(loaded[0].volume, dec!(12345678.123456789012345));
    }

    #[test]
    fn test_read_hand_written_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "open_time,open,high,low,close,volume").unwrap();
        writeln!(file, "1710720000000, 3500.1, 3520, 3490.5, 3510.25, 1234.5").unwrap();
        file.flush().unwrap();

        let candles = read_candles(file.path()).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close.value, dec!(3510.25));
    }

    #[test]
    fn test_rejects_unordered_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "open_time,open,high,low,close,volume").unwrap();
        writeln!(file, "2000,1,1,1,1,1").unwrap();
        writeln!(file, "1000,1,1,1,1,1").unwrap();
        file.flush().unwrap();

        let err = read_candles(file.path()).unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn test_missing_file() {
        assert!(read_candles(Path::new("/nonexistent/candles.csv")).is_err());
    }
}
