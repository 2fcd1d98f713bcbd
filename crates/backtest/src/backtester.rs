//! Rigorous validation of a complete trade history.
//!
//! A backtest runs in three stages: data sufficiency checks, metric
//! computation, and evaluation against a [`ThresholdTable`]. Bad metrics never
//! produce an error; they are reported through [`ValidationStatus`] and the
//! issue lists of [`BacktestResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wager_risk_core::config::{AppConfig, BacktestConfig};
use wager_risk_core::threshold::{classify, Severity, Threshold};
use wager_risk_core::{date_bounds, ReturnCalculator, TradeRecord};

use crate::metrics::{MetricKind, MetricsEngine, ValidationMetrics};

/// Days per year used to measure the span of a history.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Verdict of a backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    Warning,
    /// Reserved for callers that post-process results; the backtester itself
    /// reports breaches as `Warning` or `Critical`.
    Failed,
    Critical,
}

impl ValidationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Warning => "warning",
            Self::Failed => "failed",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub metric: MetricKind,
    pub critical: Option<Threshold>,
    pub warning: Option<Threshold>,
    /// Compare the magnitude of the metric rather than its signed value.
    pub use_magnitude: bool,
}

impl ThresholdRule {
    #[must_use]
    pub const fn new(metric: MetricKind, critical: Option<Threshold>, warning: Option<Threshold>) -> Self {
        Self {
            metric,
            critical,
            warning,
            use_magnitude: false,
        }
    }

    #[must_use]
    pub const fn on_magnitude(mut self) -> Self {
        self.use_magnitude = true;
        self
    }

    fn observed(&self, metrics: &ValidationMetrics) -> f64 {
        let value = metrics.get(self.metric);
        if self.use_magnitude {
            value.abs()
        } else {
            value
        }
    }

    /// Evaluates the rule, returning the severity and an issue message on breach.
    #[must_use]
    pub fn evaluate(&self, metrics: &ValidationMetrics) -> Option<(Severity, String)> {
        let value = self.observed(metrics);
        classify(value, self.critical.as_ref(), self.warning.as_ref()).map(|(severity, t)| {
            let message = format!(
                "{} {} {} {}",
                self.metric.label(),
                format_value(self.metric, value),
                t.comparison.breach_symbol(),
                format_value(self.metric, t.bound),
            );
            (severity, message)
        })
    }
}

fn format_value(metric: MetricKind, value: f64) -> String {
    if metric.is_fraction() {
        format!("{:.1}%", value * 100.0)
    } else {
        format!("{value:.2}")
    }
}

/// Acceptance thresholds consulted by the backtester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub rules: Vec<ThresholdRule>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        use MetricKind::*;
        Self {
            rules: vec![
                ThresholdRule::new(
                    SharpeRatio,
                    Some(Threshold::at_least(1.5)),
                    Some(Threshold::at_least(1.0)),
                ),
                ThresholdRule::new(
                    MaxDrawdown,
                    Some(Threshold::at_most(0.20)),
                    Some(Threshold::at_most(0.15)),
                )
                .on_magnitude(),
                ThresholdRule::new(
                    WinRate,
                    Some(Threshold::at_least(0.55)),
                    Some(Threshold::at_least(0.50)),
                ),
                ThresholdRule::new(
                    ProfitFactor,
                    Some(Threshold::at_least(1.3)),
                    Some(Threshold::at_least(1.1)),
                ),
                ThresholdRule::new(CalmarRatio, None, Some(Threshold::at_least(1.0))),
                ThresholdRule::new(SortinoRatio, None, Some(Threshold::at_least(2.0))),
                ThresholdRule::new(Var95, None, Some(Threshold::at_least(-0.05))),
                ThresholdRule::new(Cvar95, None, Some(Threshold::at_least(-0.08))),
            ],
        }
    }
}

impl ThresholdTable {
    /// Evaluates every rule, returning `(warnings, critical_issues)`.
    #[must_use]
    pub fn evaluate(&self, metrics: &ValidationMetrics) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut critical = Vec::new();
        for rule in &self.rules {
            match rule.evaluate(metrics) {
                Some((Severity::Critical, msg)) => critical.push(msg),
                Some((Severity::Warning, msg)) => warnings.push(msg),
                None => {}
            }
        }
        (warnings, critical)
    }
}

/// Outcome of one backtest invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Earliest trade date, `None` for an empty history.
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub metrics: ValidationMetrics,
    pub validation_status: ValidationStatus,
    pub warnings: Vec<String>,
    pub critical_issues: Vec<String>,
}

impl BacktestResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.validation_status == ValidationStatus::Passed
    }

    /// Span between first and last trade in years.
    #[must_use]
    pub fn span_years(&self) -> f64 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => span_years(start, end),
            _ => 0.0,
        }
    }
}

fn span_years(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 86_400.0 / DAYS_PER_YEAR
}

fn status_for(warnings: &[String], critical_issues: &[String]) -> ValidationStatus {
    if !critical_issues.is_empty() {
        ValidationStatus::Critical
    } else if !warnings.is_empty() {
        ValidationStatus::Warning
    } else {
        ValidationStatus::Passed
    }
}

/// Validates a trade history against data requirements and metric thresholds.
#[derive(Debug, Clone, Default)]
pub struct RigorousBacktester {
    config: BacktestConfig,
    engine: MetricsEngine,
    thresholds: ThresholdTable,
}

impl RigorousBacktester {
    #[must_use]
    pub fn new(config: BacktestConfig, engine: MetricsEngine) -> Self {
        Self {
            config,
            engine,
            thresholds: ThresholdTable::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.backtest.clone(), MetricsEngine::new(&config.metrics))
    }

    /// Replaces the default threshold table.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ThresholdTable) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    #[must_use]
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Checks minimum trade count, minimum span and record validity.
    ///
    /// Returns one message per problem; an empty vector means the data is usable.
    #[must_use]
    pub fn validate_data(&self, trades: &[TradeRecord]) -> Vec<String> {
        let mut issues = Vec::new();

        if trades.len() < self.config.min_trades {
            issues.push(format!(
                "insufficient trade count: {} < {} required",
                trades.len(),
                self.config.min_trades
            ));
        }

        let years = date_bounds(trades).map_or(0.0, |(start, end)| span_years(start, end));
        if years < self.config.min_years {
            issues.push(format!(
                "insufficient history: {years:.1} years < {} years required",
                self.config.min_years
            ));
        }

        for (index, trade) in trades.iter().enumerate() {
            if let Err(e) = trade.validate() {
                issues.push(format!("invalid record: {}", e.at_index(index)));
            }
        }

        issues
    }

    /// Runs the full backtest.
    #[must_use]
    pub fn run(&self, trades: &[TradeRecord]) -> BacktestResult {
        info!(trades = trades.len(), "starting rigorous backtest");

        let bounds = date_bounds(trades);
        let (start_date, end_date) = bounds.map_or((None, None), |(s, e)| (Some(s), Some(e)));

        let data_issues = self.validate_data(trades);
        let series = if data_issues.is_empty() {
            ReturnCalculator::series(trades).map_err(|e| vec![e.to_string()])
        } else {
            Err(data_issues)
        };

        let series = match series {
            Ok(series) => series,
            Err(issues) => {
                for issue in &issues {
                    warn!(issue = %issue, "backtest data requirement not met");
                }
                return BacktestResult {
                    start_date,
                    end_date,
                    total_trades: trades.len(),
                    winning_trades: 0,
                    losing_trades: 0,
                    metrics: ValidationMetrics::default(),
                    validation_status: ValidationStatus::Critical,
                    warnings: Vec::new(),
                    critical_issues: issues,
                };
            }
        };

        let metrics = self.engine.compute_series(&series);
        let (warnings, critical_issues) = self.thresholds.evaluate(&metrics);
        let validation_status = status_for(&warnings, &critical_issues);

        info!(
            status = %validation_status,
            warnings = warnings.len(),
            critical = critical_issues.len(),
            sharpe = metrics.sharpe_ratio,
            "backtest complete"
        );

        BacktestResult {
            start_date,
            end_date,
            total_trades: trades.len(),
            winning_trades: series.winning_count(),
            losing_trades: series.losing_count(),
            metrics,
            validation_status,
            warnings,
            critical_issues,
        }
    }
}
