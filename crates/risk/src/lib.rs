//! Live risk management for betting strategies: Kelly position sizing,
//! prioritised circuit breakers and an async mailbox front-end.
//!
//! ```
//! use rust_decimal_macros::dec;
//! use wager_risk_manager::{FinancialRiskManager, TradingState};
//!
//! let manager = FinancialRiskManager::default();
//! manager.apply_trade_result(dec!(-600));
//! assert_eq!(manager.trading_state(), TradingState::TradingHalted);
//! assert_eq!(manager.calculate_position_size(0.6, 2.0, 1.0), dec!(0));
//! ```

pub mod actor;
pub mod breakers;
pub mod calendar;
pub mod manager;
pub mod report;
pub mod types;

pub use actor::{spawn, RiskActor, RiskCommand, RiskHandle, DEFAULT_MAILBOX};
pub use breakers::{BreakerKind, BreakerRule, BreakerTrip, CircuitBreakers};
pub use calendar::{Period, PeriodClock};
pub use manager::FinancialRiskManager;
pub use report::RiskReport;
pub use types::{
    ActionType, RiskAction, RiskLevel, RiskMetrics, RiskState, TradeLogEntry, TradingState,
};
