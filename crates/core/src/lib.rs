//! Core model for validating betting strategies: trade records, return
//! calculation, descriptive statistics, Kelly sizing, threshold checks and
//! layered configuration.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod kelly;
pub mod returns;
pub mod stats;
pub mod threshold;
pub mod trade;

pub use config::{
    AppConfig, BacktestConfig, CapitalConfig, MetricsConfig, MonteCarloConfig, ScenarioParams,
    ScenarioTable, ScenarioType, WalkForwardConfig,
};
pub use config_loader::ConfigLoader;
pub use error::InvalidTradeError;
pub use kelly::{KellyDecision, KellyReason, KellySizer};
pub use returns::{ReturnCalculator, ReturnSeries};
pub use threshold::{classify, Comparison, Severity, Threshold};
pub use trade::{date_bounds, TradeRecord};
