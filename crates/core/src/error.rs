//! Error types shared by the trade model.

use rust_decimal::Decimal;
use thiserror::Error;

/// A trade record that cannot be converted into a return.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidTradeError {
    /// Decimal odds must be strictly greater than 1.0.
    #[error("odds must be greater than 1.0, got {odds}")]
    OddsNotAboveOne {
        /// The offending odds value.
        odds: Decimal,
    },

    /// Stakes are monetary amounts and cannot be negative.
    #[error("stake must be non-negative, got {stake}")]
    NegativeStake {
        /// The offending stake value.
        stake: Decimal,
    },

    /// Wraps another error with the position of the record in its history.
    #[error("trade #{index}: {source}")]
    AtIndex {
        /// Zero-based position in the trade history.
        index: usize,
        /// Underlying validation failure.
        #[source]
        source: Box<InvalidTradeError>,
    },
}

impl InvalidTradeError {
    /// Attaches the record's position in its history.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        Self::AtIndex {
            index,
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn display_mentions_offending_value() {
        let err = InvalidTradeError::OddsNotAboveOne { odds: dec!(0.95) };
        assert_eq!(err.to_string(), "odds must be greater than 1.0, got 0.95");
    }

    #[test]
    fn at_index_prefixes_position() {
        let err = InvalidTradeError::NegativeStake { stake: dec!(-5) }.at_index(7);
        assert_eq!(err.to_string(), "trade #7: stake must be non-negative, got -5");
    }
}
