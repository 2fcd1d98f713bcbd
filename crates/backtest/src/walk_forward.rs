//! Walk-forward analysis over calendar-month windows.
//!
//! The history is split into rolling train/test windows. Each window is
//! scored independently (train and test metrics), then the sequence of
//! Sharpe ratios is checked for instability, overfitting and decay.
//!
//! # Process
//!
//! 1. Starting at the earliest trade, carve `[start, start + train)` as train and
//!    the following `test` months as test
//! 2. Advance `start` by `step` months until the test window would end after the last trade
//! 3. Drop windows where either side has too few trades
//! 4. Score the surviving windows in parallel and aggregate

use chrono::{DateTime, Months, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use wager_risk_core::config::{AppConfig, WalkForwardConfig};
use wager_risk_core::{date_bounds, stats, InvalidTradeError, ReturnCalculator, TradeRecord};

use crate::metrics::{MetricsEngine, ValidationMetrics};

#[derive(Debug, Error, PartialEq)]
pub enum WalkForwardError {
    #[error("no trades provided")]
    EmptyHistory,

    #[error("invalid trade history: {0}")]
    InvalidTrade(#[from] InvalidTradeError),

    #[error(
        "no valid walk-forward windows: need {train_months}+{test_months} months of data with at least \
         {min_train_trades} train and {min_test_trades} test trades per window"
    )]
    NoValidWindows {
        train_months: u32,
        test_months: u32,
        min_train_trades: usize,
        min_test_trades: usize,
    },
}

/// Date ranges of one train/test pair. Both ranges are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    pub train_start: DateTime<Utc>,
    pub train_end: DateTime<Utc>,
    pub test_start: DateTime<Utc>,
    pub test_end: DateTime<Utc>,
    /// Number of trades in the train range.
    pub train_size: usize,
    /// Number of trades in the test range.
    pub test_size: usize,
}

/// A candidate window before trade counts are known.
pub type WindowPeriod = (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>, DateTime<Utc>);

/// Stability signals derived from per-window Sharpe ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityAnalysis {
    /// `1 - mean(CV_train, CV_test)`, clamped to `[0, 1]`.
    pub stability_score: f64,
    pub overfitting_detected: bool,
    pub performance_degradation: bool,
}

impl StabilityAnalysis {
    const INSUFFICIENT: Self = Self {
        stability_score: 0.0,
        overfitting_detected: false,
        performance_degradation: false,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub windows: Vec<WalkForwardWindow>,
    /// Train metrics, index-aligned to `windows`.
    pub train_metrics: Vec<ValidationMetrics>,
    /// Test metrics, index-aligned to `windows`.
    pub test_metrics: Vec<ValidationMetrics>,
    /// Field-wise mean of the finite test metrics.
    pub overall_metrics: ValidationMetrics,
    pub stability_score: f64,
    pub overfitting_detected: bool,
    pub performance_degradation: bool,
}

impl WalkForwardResult {
    #[must_use]
    pub fn num_windows(&self) -> usize {
        self.windows.len()
    }

    /// True if the strategy looks robust out of sample.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.stability_score > 0.7 && !self.overfitting_detected && !self.performance_degradation
    }
}

pub struct WalkForwardAnalyzer {
    config: WalkForwardConfig,
    engine: MetricsEngine,
}

impl Default for WalkForwardAnalyzer {
    fn default() -> Self {
        Self::new(WalkForwardConfig::default(), MetricsEngine::default())
    }
}

impl WalkForwardAnalyzer {
    #[must_use]
    pub fn new(config: WalkForwardConfig, engine: MetricsEngine) -> Self {
        Self { config, engine }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.walk_forward.clone(), MetricsEngine::new(&config.metrics))
    }

    #[must_use]
    pub fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    /// Candidate window periods between `start` and `end`.
    ///
    /// A step of zero months is treated as one month.
    #[must_use]
    pub fn window_periods(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<WindowPeriod> {
        let step = self.config.step_months.max(1);
        let mut periods = Vec::new();

        for k in 0u32.. {
            let Some(offset) = k.checked_mul(step) else {
                break;
            };
            let Some(train_start) = start.checked_add_months(Months::new(offset)) else {
                break;
            };
            let Some(train_end) =
                train_start.checked_add_months(Months::new(self.config.train_months))
            else {
                break;
            };
            let Some(test_end) = train_end.checked_add_months(Months::new(self.config.test_months))
            else {
                break;
            };
            if test_end > end {
                break;
            }
            periods.push((train_start, train_end, train_end, test_end));
        }

        periods
    }

    /// Windows over `trades` that meet both minimum trade counts.
    ///
    /// `trades` must be sorted by date.
    #[must_use]
    pub fn generate_windows(&self, trades: &[TradeRecord]) -> Vec<WalkForwardWindow> {
        let Some((start, end)) = date_bounds(trades) else {
            return Vec::new();
        };

        self.window_periods(start, end)
            .into_iter()
            .filter_map(|(train_start, train_end, test_start, test_end)| {
                let train_size = slice_between(trades, train_start, train_end).len();
                let test_size = slice_between(trades, test_start, test_end).len();
                (train_size >= self.config.min_train_trades
                    && test_size >= self.config.min_test_trades)
                    .then_some(WalkForwardWindow {
                        train_start,
                        train_end,
                        test_start,
                        test_end,
                        train_size,
                        test_size,
                    })
            })
            .collect()
    }

    /// Runs the full analysis.
    ///
    /// # Errors
    ///
    /// Returns [`WalkForwardError::EmptyHistory`] for no trades,
    /// [`WalkForwardError::InvalidTrade`] for a malformed record, and
    /// [`WalkForwardError::NoValidWindows`] if no window meets the minimum counts.
    pub fn analyze(&self, trades: &[TradeRecord]) -> Result<WalkForwardResult, WalkForwardError> {
        if trades.is_empty() {
            return Err(WalkForwardError::EmptyHistory);
        }
        for (index, trade) in trades.iter().enumerate() {
            trade.validate().map_err(|e| e.at_index(index))?;
        }

        let mut sorted = trades.to_vec();
        sorted.sort_by_key(|t| t.date);

        let windows = self.generate_windows(&sorted);
        if windows.is_empty() {
            return Err(WalkForwardError::NoValidWindows {
                train_months: self.config.train_months,
                test_months: self.config.test_months,
                min_train_trades: self.config.min_train_trades,
                min_test_trades: self.config.min_test_trades,
            });
        }
        info!(windows = windows.len(), "walk-forward windows created");

        let scored: Vec<(ValidationMetrics, ValidationMetrics)> = windows
            .par_iter()
            .enumerate()
            .map(|(i, w)| -> Result<_, InvalidTradeError> {
                let train = self.score(slice_between(&sorted, w.train_start, w.train_end))?;
                let test = self.score(slice_between(&sorted, w.test_start, w.test_end))?;
                debug!(
                    window = i + 1,
                    train_start = %w.train_start.date_naive(),
                    test_end = %w.test_end.date_naive(),
                    train_sharpe = train.sharpe_ratio,
                    test_sharpe = test.sharpe_ratio,
                    "window scored"
                );
                Ok((train, test))
            })
            .collect::<Result<_, InvalidTradeError>>()?;

        let (train_metrics, test_metrics): (Vec<_>, Vec<_>) = scored.into_iter().unzip();
        let overall_metrics = ValidationMetrics::finite_mean(&test_metrics);
        let stability = self.analyze_stability(&train_metrics, &test_metrics);

        info!(
            stability = stability.stability_score,
            overfitting = stability.overfitting_detected,
            degradation = stability.performance_degradation,
            "walk-forward analysis complete"
        );

        Ok(WalkForwardResult {
            windows,
            train_metrics,
            test_metrics,
            overall_metrics,
            stability_score: stability.stability_score,
            overfitting_detected: stability.overfitting_detected,
            performance_degradation: stability.performance_degradation,
        })
    }

    /// Stability, overfitting and decay signals over aligned train/test metrics.
    ///
    /// Fewer than two windows yield a zero score and no flags.
    #[must_use]
    pub fn analyze_stability(
        &self,
        train: &[ValidationMetrics],
        test: &[ValidationMetrics],
    ) -> StabilityAnalysis {
        if train.len() < 2 || test.len() < 2 {
            return StabilityAnalysis::INSUFFICIENT;
        }

        let train_sharpe: Vec<f64> = train.iter().map(|m| m.sharpe_ratio).collect();
        let test_sharpe: Vec<f64> = test.iter().map(|m| m.sharpe_ratio).collect();

        let cv = (stats::coefficient_of_variation(&train_sharpe)
            + stats::coefficient_of_variation(&test_sharpe))
            / 2.0;
        let raw_score = 1.0 - cv;
        let stability_score = if raw_score.is_finite() {
            raw_score.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let overfitting_detected =
            stats::mean(&train_sharpe) > self.config.overfitting_ratio * stats::mean(&test_sharpe);

        let lookback = self.config.degradation_lookback;
        let performance_degradation = lookback > 0 && test_sharpe.len() >= lookback && {
            let early = stats::mean(&test_sharpe[..lookback]);
            let recent = stats::mean(&test_sharpe[test_sharpe.len() - lookback..]);
            recent < self.config.degradation_ratio * early
        };

        StabilityAnalysis {
            stability_score,
            overfitting_detected,
            performance_degradation,
        }
    }

    fn score(&self, trades: &[TradeRecord]) -> Result<ValidationMetrics, InvalidTradeError> {
        Ok(self.engine.compute_series(&ReturnCalculator::series(trades)?))
    }
}

/// Trades dated in `[start, end)`; `trades` must be sorted by date.
fn slice_between(trades: &[TradeRecord], start: DateTime<Utc>, end: DateTime<Utc>) -> &[TradeRecord] {
    let lo = trades.partition_point(|t| t.date < start);
    let hi = trades.partition_point(|t| t.date < end);
    &trades[lo..hi.max(lo)]
}
