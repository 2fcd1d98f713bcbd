//! Accumulator reset boundaries for replayed or live trade streams.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

/// Tracks the last seen timestamp and reports which calendar periods a new
/// timestamp falls outside of. Weeks are ISO weeks; all periods are UTC.
#[derive(Debug, Clone, Default)]
pub struct PeriodClock {
    last: Option<DateTime<Utc>>,
}

impl PeriodClock {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Records `at` and returns the periods whose accumulators should be
    /// reset before a trade at `at` is applied. The first call returns none.
    pub fn advance(&mut self, at: DateTime<Utc>) -> Vec<Period> {
        let Some(last) = self.last.replace(at) else {
            return Vec::new();
        };

        let mut crossed = Vec::new();
        if last.date_naive() != at.date_naive() {
            crossed.push(Period::Daily);
        }
        if last.iso_week() != at.iso_week() {
            crossed.push(Period::Weekly);
        }
        if (last.year(), last.month()) != (at.year(), at.month()) {
            crossed.push(Period::Monthly);
        }
        crossed
    }
}
