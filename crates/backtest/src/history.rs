//! Trade history loading from CSV.

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use wager_risk_core::TradeRecord;

/// Raw CSV row: `date,predicted_outcome,actual_outcome,odds,stake`.
#[derive(Debug, Deserialize)]
struct TradeRow {
    date: String,
    predicted_outcome: String,
    actual_outcome: String,
    odds: Decimal,
    stake: Decimal,
}

/// A chronologically sorted trade history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeHistory {
    trades: Vec<TradeRecord>,
}

impl TradeHistory {
    /// Wraps records, sorting them by date. Records with equal dates keep their order.
    #[must_use]
    pub fn new(mut trades: Vec<TradeRecord>) -> Self {
        trades.sort_by_key(|t| t.date);
        Self { trades }
    }

    /// Loads a history from a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The CSV file cannot be opened
    /// - A row is missing a column
    /// - A date is neither RFC 3339 nor `YYYY-MM-DD`
    /// - Odds or stake are not decimal numbers
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open trade history {}", path.display()))?;
        let history = Self::from_reader(file)
            .with_context(|| format!("failed to parse trade history {}", path.display()))?;
        tracing::info!(path = %path.display(), trades = history.len(), "trade history loaded");
        Ok(history)
    }

    /// Parses CSV from any reader.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed rows, naming the 1-based data row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut trades = Vec::new();

        for (i, row) in reader.deserialize::<TradeRow>().enumerate() {
            let row = row.with_context(|| format!("row {}", i + 1))?;
            let date = parse_date(&row.date).with_context(|| format!("row {}", i + 1))?;
            trades.push(TradeRecord::new(
                date,
                row.predicted_outcome,
                row.actual_outcome,
                row.odds,
                row.stake,
            ));
        }

        Ok(Self::new(trades))
    }

    #[must_use]
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<TradeRecord> {
        self.trades
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD` (midnight UTC).
fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("unrecognised date '{raw}'"))
}
