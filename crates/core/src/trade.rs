//! Trade records produced by the prediction pipeline.
//!
//! A [`TradeRecord`] is immutable once created: it captures what was predicted,
//! what actually happened, and the decimal odds and stake of the bet.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvalidTradeError;

/// A single settled bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// When the bet was placed.
    pub date: DateTime<Utc>,
    /// Outcome the model predicted (e.g. "home_win").
    pub predicted_outcome: String,
    /// Outcome that actually occurred.
    pub actual_outcome: String,
    /// Decimal odds taken (must be > 1).
    pub odds: Decimal,
    /// Amount staked (must be >= 0).
    pub stake: Decimal,
}

impl TradeRecord {
    /// Creates a new trade record.
    #[must_use]
    pub fn new(
        date: DateTime<Utc>,
        predicted_outcome: impl Into<String>,
        actual_outcome: impl Into<String>,
        odds: Decimal,
        stake: Decimal,
    ) -> Self {
        Self {
            date,
            predicted_outcome: predicted_outcome.into(),
            actual_outcome: actual_outcome.into(),
            odds,
            stake,
        }
    }

    /// Returns true if the prediction matched the actual outcome.
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.predicted_outcome == self.actual_outcome
    }

    /// Checks the odds and stake constraints.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTradeError`] if `odds <= 1` or `stake < 0`.
    pub fn validate(&self) -> Result<(), InvalidTradeError> {
        if self.odds <= Decimal::ONE {
            return Err(InvalidTradeError::OddsNotAboveOne { odds: self.odds });
        }
        if self.stake < Decimal::ZERO {
            return Err(InvalidTradeError::NegativeStake { stake: self.stake });
        }
        Ok(())
    }
}

/// Returns the earliest and latest dates of a trade history.
#[must_use]
pub fn date_bounds(trades: &[TradeRecord]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = trades.iter().map(|t| t.date).min()?;
    let last = trades.iter().map(|t| t.date).max()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn trade(odds: Decimal, stake: Decimal) -> TradeRecord {
        TradeRecord::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap(),
            "home_win",
            "home_win",
            odds,
            stake,
        )
    }

    #[test]
    fn is_win_compares_outcomes() {
        let mut t = trade(dec!(2.0), dec!(100));
        assert!(t.is_win());
        t.actual_outcome = "draw".to_string();
        assert!(!t.is_win());
    }

    #[test]
    fn validate_rejects_odds_of_one() {
        let err = trade(dec!(1.0), dec!(100)).validate().unwrap_err();
        assert_eq!(err, InvalidTradeError::OddsNotAboveOne { odds: dec!(1.0) });
    }

    #[test]
    fn validate_rejects_negative_stake() {
        let err = trade(dec!(1.8), dec!(-1)).validate().unwrap_err();
        assert_eq!(err, InvalidTradeError::NegativeStake { stake: dec!(-1) });
    }

    #[test]
    fn validate_accepts_zero_stake() {
        assert!(trade(dec!(1.01), Decimal::ZERO).validate().is_ok());
    }

    #[test]
    fn date_bounds_finds_min_and_max() {
        let early = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut a = trade(dec!(2), dec!(10));
        a.date = late;
        let mut b = trade(dec!(2), dec!(10));
        b.date = early;

        assert_eq!(date_bounds(&[a, b]), Some((early, late)));
        assert_eq!(date_bounds(&[]), None);
    }
}
