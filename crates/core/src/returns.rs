//! Conversion of trade records into signed monetary returns.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvalidTradeError;
use crate::trade::TradeRecord;

/// Computes the payoff of a settled bet.
pub struct ReturnCalculator;

impl ReturnCalculator {
    /// Returns `(odds - 1) * stake` for a correct prediction and `-stake` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTradeError`] if `odds <= 1` or `stake < 0`.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use rust_decimal_macros::dec;
    /// use wager_risk_core::{ReturnCalculator, TradeRecord};
    ///
    /// let win = TradeRecord::new(Utc::now(), "draw", "draw", dec!(3.2), dec!(50));
    /// assert_eq!(ReturnCalculator::trade_return(&win).unwrap(), dec!(110.0));
    /// ```
    pub fn trade_return(trade: &TradeRecord) -> Result<Decimal, InvalidTradeError> {
        trade.validate()?;
        if trade.is_win() {
            Ok((trade.odds - Decimal::ONE) * trade.stake)
        } else {
            Ok(-trade.stake)
        }
    }

    /// Computes the return series for a whole history, in input order.
    ///
    /// # Errors
    ///
    /// Returns the first invalid record, tagged with its index.
    pub fn series(trades: &[TradeRecord]) -> Result<ReturnSeries, InvalidTradeError> {
        let mut dates = Vec::with_capacity(trades.len());
        let mut values = Vec::with_capacity(trades.len());

        for (index, trade) in trades.iter().enumerate() {
            let ret = Self::trade_return(trade).map_err(|e| e.at_index(index))?;
            dates.push(trade.date);
            values.push(ret.to_f64().unwrap_or(0.0));
        }

        Ok(ReturnSeries { dates, values })
    }
}

/// Ordered signed returns, index-aligned to trade dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Builds a series from parallel date and value vectors.
    ///
    /// Extra entries in the longer vector are dropped.
    #[must_use]
    pub fn new(mut dates: Vec<DateTime<Utc>>, mut values: Vec<f64>) -> Self {
        let n = dates.len().min(values.len());
        dates.truncate(n);
        values.truncate(n);
        Self { dates, values }
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn dates(&self) -> &[DateTime<Utc>] {
        &self.dates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all returns, accumulated in series order.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Number of strictly positive returns.
    #[must_use]
    pub fn winning_count(&self) -> usize {
        self.values.iter().filter(|r| **r > 0.0).count()
    }

    /// Number of strictly negative returns.
    #[must_use]
    pub fn losing_count(&self) -> usize {
        self.values.iter().filter(|r| **r < 0.0).count()
    }
}
