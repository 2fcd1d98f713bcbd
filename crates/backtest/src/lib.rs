//! Historical validation of betting strategies: performance metrics, rigorous
//! backtesting, walk-forward analysis and Monte Carlo stress testing.

pub mod backtester;
pub mod history;
pub mod metrics;
pub mod monte_carlo;
pub mod report;
pub mod walk_forward;

pub use backtester::{
    BacktestResult, RigorousBacktester, ThresholdRule, ThresholdTable, ValidationStatus,
};
pub use history::TradeHistory;
pub use metrics::{MetricKind, MetricsEngine, ValidationMetrics};
pub use monte_carlo::{
    MonteCarloError, MonteCarloResult, MonteCarloSimulator, ScenarioStress, StressTestCell,
    StressTestResult,
};
pub use report::ReportFormatter;
pub use walk_forward::{
    StabilityAnalysis, WalkForwardAnalyzer, WalkForwardError, WalkForwardResult, WalkForwardWindow,
};
