//! Statistical performance metrics over a return series.
//!
//! [`MetricsEngine`] is a pure function object: it holds only the annualisation
//! settings and never mutates its input. Degenerate inputs (single sample, zero
//! volatility, no losses) resolve to documented fallback values instead of NaN.

use serde::{Deserialize, Serialize};
use wager_risk_core::config::MetricsConfig;
use wager_risk_core::stats;
use wager_risk_core::ReturnSeries;

/// Tail percentile used for VaR and CVaR.
pub const VAR_TAIL_PERCENTILE: f64 = 5.0;

/// Full metrics bundle for one return series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    /// Largest peak-to-trough decline of the compounded series, as a fraction (always <= 0).
    pub max_drawdown: f64,
    pub win_rate: f64,
    /// Gross profit over gross loss; infinite when there are no losing returns.
    pub profit_factor: f64,
    pub var_95: f64,
    pub cvar_95: f64,
    pub total_return: f64,
    pub annual_return: f64,
    pub volatility: f64,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
}

/// Names every field of [`ValidationMetrics`] so the bundle can be processed generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    SharpeRatio,
    SortinoRatio,
    CalmarRatio,
    MaxDrawdown,
    WinRate,
    ProfitFactor,
    Var95,
    Cvar95,
    TotalReturn,
    AnnualReturn,
    Volatility,
    Skewness,
    Kurtosis,
}

impl MetricKind {
    pub const ALL: [Self; 13] = [
        Self::SharpeRatio,
        Self::SortinoRatio,
        Self::CalmarRatio,
        Self::MaxDrawdown,
        Self::WinRate,
        Self::ProfitFactor,
        Self::Var95,
        Self::Cvar95,
        Self::TotalReturn,
        Self::AnnualReturn,
        Self::Volatility,
        Self::Skewness,
        Self::Kurtosis,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SharpeRatio => "sharpe_ratio",
            Self::SortinoRatio => "sortino_ratio",
            Self::CalmarRatio => "calmar_ratio",
            Self::MaxDrawdown => "max_drawdown",
            Self::WinRate => "win_rate",
            Self::ProfitFactor => "profit_factor",
            Self::Var95 => "var_95",
            Self::Cvar95 => "cvar_95",
            Self::TotalReturn => "total_return",
            Self::AnnualReturn => "annual_return",
            Self::Volatility => "volatility",
            Self::Skewness => "skewness",
            Self::Kurtosis => "kurtosis",
        }
    }

    /// Human-readable label for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SharpeRatio => "Sharpe Ratio",
            Self::SortinoRatio => "Sortino Ratio",
            Self::CalmarRatio => "Calmar Ratio",
            Self::MaxDrawdown => "Max Drawdown",
            Self::WinRate => "Win Rate",
            Self::ProfitFactor => "Profit Factor",
            Self::Var95 => "VaR 95%",
            Self::Cvar95 => "CVaR 95%",
            Self::TotalReturn => "Total Return",
            Self::AnnualReturn => "Annual Return",
            Self::Volatility => "Volatility",
            Self::Skewness => "Skewness",
            Self::Kurtosis => "Kurtosis",
        }
    }

    /// True for metrics reported as percentages.
    #[must_use]
    pub const fn is_fraction(self) -> bool {
        matches!(self, Self::MaxDrawdown | Self::WinRate)
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl ValidationMetrics {
    #[must_use]
    pub const fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::SharpeRatio => self.sharpe_ratio,
            MetricKind::SortinoRatio => self.sortino_ratio,
            MetricKind::CalmarRatio => self.calmar_ratio,
            MetricKind::MaxDrawdown => self.max_drawdown,
            MetricKind::WinRate => self.win_rate,
            MetricKind::ProfitFactor => self.profit_factor,
            MetricKind::Var95 => self.var_95,
            MetricKind::Cvar95 => self.cvar_95,
            MetricKind::TotalReturn => self.total_return,
            MetricKind::AnnualReturn => self.annual_return,
            MetricKind::Volatility => self.volatility,
            MetricKind::Skewness => self.skewness,
            MetricKind::Kurtosis => self.kurtosis,
        }
    }

    pub fn set(&mut self, kind: MetricKind, value: f64) {
        let slot = match kind {
            MetricKind::SharpeRatio => &mut self.sharpe_ratio,
            MetricKind::SortinoRatio => &mut self.sortino_ratio,
            MetricKind::CalmarRatio => &mut self.calmar_ratio,
            MetricKind::MaxDrawdown => &mut self.max_drawdown,
            MetricKind::WinRate => &mut self.win_rate,
            MetricKind::ProfitFactor => &mut self.profit_factor,
            MetricKind::Var95 => &mut self.var_95,
            MetricKind::Cvar95 => &mut self.cvar_95,
            MetricKind::TotalReturn => &mut self.total_return,
            MetricKind::AnnualReturn => &mut self.annual_return,
            MetricKind::Volatility => &mut self.volatility,
            MetricKind::Skewness => &mut self.skewness,
            MetricKind::Kurtosis => &mut self.kurtosis,
        };
        *slot = value;
    }

    /// Field-wise mean across bundles, skipping NaN and infinite values.
    ///
    /// A field with no finite values averages to 0.0.
    #[must_use]
    pub fn finite_mean<'a>(bundles: impl IntoIterator<Item = &'a Self>) -> Self {
        let bundles: Vec<&Self> = bundles.into_iter().collect();
        let mut out = Self::default();
        for kind in MetricKind::ALL {
            let finite: Vec<f64> = bundles
                .iter()
                .map(|m| m.get(kind))
                .filter(|v| v.is_finite())
                .collect();
            out.set(kind, stats::mean(&finite));
        }
        out
    }
}

/// Computes [`ValidationMetrics`] from a return series.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsEngine {
    periods_per_year: f64,
    risk_free_rate: f64,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(&MetricsConfig::default())
    }
}

impl MetricsEngine {
    #[must_use]
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            periods_per_year: config.periods_per_year,
            risk_free_rate: config.risk_free_rate,
        }
    }

    #[must_use]
    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
    }

    #[must_use]
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    #[must_use]
    pub fn compute_series(&self, series: &ReturnSeries) -> ValidationMetrics {
        self.compute(series.values())
    }

    /// Computes the full metrics bundle.
    ///
    /// An empty slice yields all-zero metrics.
    #[must_use]
    pub fn compute(&self, returns: &[f64]) -> ValidationMetrics {
        if returns.is_empty() {
            return ValidationMetrics::default();
        }

        let n = returns.len() as f64;
        let total_return: f64 = returns.iter().sum();
        let annual_return = self.annualise(total_return, n);
        let ann_factor = self.periods_per_year.sqrt();

        let volatility = stats::sample_std_dev(returns) * ann_factor;
        let excess = annual_return - self.risk_free_rate;
        let sharpe_ratio = if volatility > 0.0 {
            excess / volatility
        } else {
            0.0
        };

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_volatility = stats::sample_std_dev(&downside) * ann_factor;
        let sortino_ratio = if downside_volatility > 0.0 {
            excess / downside_volatility
        } else {
            0.0
        };

        let max_drawdown = max_drawdown(returns);
        let calmar_ratio = if max_drawdown == 0.0 {
            0.0
        } else {
            annual_return / max_drawdown.abs()
        };

        let wins = returns.iter().filter(|r| **r > 0.0).count() as f64;
        let gross_profit: f64 = returns.iter().filter(|r| **r > 0.0).sum();
        let gross_loss: f64 = returns.iter().filter(|r| **r < 0.0).sum::<f64>().abs();
        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else {
            f64::INFINITY
        };

        let (var_95, cvar_95) = stats::var_cvar(returns, VAR_TAIL_PERCENTILE);

        ValidationMetrics {
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            max_drawdown,
            win_rate: wins / n,
            profit_factor,
            var_95,
            cvar_95,
            total_return,
            annual_return,
            volatility,
            skewness: stats::skewness(returns),
            kurtosis: stats::excess_kurtosis(returns),
        }
    }

    /// Compounds the total return to a per-year rate. Returns -1.0 (total loss)
    /// when `1 + total` is not positive, where the power is undefined.
    fn annualise(&self, total_return: f64, n: f64) -> f64 {
        let base = 1.0 + total_return;
        if base <= 0.0 {
            return -1.0;
        }
        base.powf(self.periods_per_year / n) - 1.0
    }
}

/// Drawdown series of the compounded path `[1.0] ++ cumprod(1 + r)`, one value per return.
#[must_use]
pub fn drawdown_series(returns: &[f64]) -> Vec<f64> {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    returns
        .iter()
        .map(|r| {
            equity *= 1.0 + r;
            peak = peak.max(equity);
            (equity - peak) / peak
        })
        .collect()
}

/// Minimum of [`drawdown_series`], 0.0 for an empty slice.
#[must_use]
pub fn max_drawdown(returns: &[f64]) -> f64 {
    drawdown_series(returns).into_iter().fold(0.0, f64::min)
}
