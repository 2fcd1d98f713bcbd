//! Value types shared by the risk manager, its actor and reports.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Risk Actions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Soft drawdown warning; trading continues.
    StopLoss,
    /// A hard limit halted trading.
    CircuitBreaker,
    /// Reserved for callers that shrink open exposure.
    PositionReduction,
    /// Trading resumed after a halt.
    TradingHalt,
    /// Operator-triggered stop, or its clearing.
    EmergencyStop,
}

impl ActionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StopLoss => "stop_loss",
            Self::CircuitBreaker => "circuit_breaker",
            Self::PositionReduction => "position_reduction",
            Self::TradingHalt => "trading_halt",
            Self::EmergencyStop => "emergency_stop",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the risk action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAction {
    pub action_type: ActionType,
    pub risk_level: RiskLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl RiskAction {
    #[must_use]
    pub fn new(
        action_type: ActionType,
        risk_level: RiskLevel,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            action_type,
            risk_level,
            message: message.into(),
            timestamp,
        }
    }
}

// =============================================================================
// Trading State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingState {
    Normal,
    TradingHalted,
    EmergencyStop,
}

impl TradingState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::TradingHalted => "trading_halted",
            Self::EmergencyStop => "emergency_stop",
        }
    }

    #[must_use]
    pub const fn allows_trading(self) -> bool {
        matches!(self, Self::Normal)
    }
}

impl fmt::Display for TradingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settled trade as recorded by the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub timestamp: DateTime<Utc>,
    pub pnl: Decimal,
    pub is_winner: bool,
    pub capital_after: Decimal,
    pub consecutive_losses: u32,
}

// =============================================================================
// Risk State
// =============================================================================

/// Running capital state. Only [`crate::FinancialRiskManager`] mutates it;
/// callers receive clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub initial_capital: Decimal,
    pub current_capital: Decimal,
    /// Highest capital seen; never decreases.
    pub peak_capital: Decimal,
    pub consecutive_losses: u32,
    pub daily_pnl: Decimal,
    pub weekly_pnl: Decimal,
    pub monthly_pnl: Decimal,
    pub trading_halted: bool,
    pub emergency_stop: bool,
    /// Largest drawdown fraction observed after any trade.
    pub max_drawdown: f64,
    pub actions: Vec<RiskAction>,
    pub trades: Vec<TradeLogEntry>,
}

impl RiskState {
    #[must_use]
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            current_capital: initial_capital,
            peak_capital: initial_capital,
            consecutive_losses: 0,
            daily_pnl: Decimal::ZERO,
            weekly_pnl: Decimal::ZERO,
            monthly_pnl: Decimal::ZERO,
            trading_halted: false,
            emergency_stop: false,
            max_drawdown: 0.0,
            actions: Vec::new(),
            trades: Vec::new(),
        }
    }

    /// `(peak - current) / peak`, or 0.0 while the peak is not positive.
    #[must_use]
    pub fn current_drawdown(&self) -> f64 {
        if self.peak_capital <= Decimal::ZERO {
            return 0.0;
        }
        ((self.peak_capital - self.current_capital) / self.peak_capital)
            .to_f64()
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn total_pnl(&self) -> Decimal {
        self.current_capital - self.initial_capital
    }

    #[must_use]
    pub const fn trading_state(&self) -> TradingState {
        if self.emergency_stop {
            TradingState::EmergencyStop
        } else if self.trading_halted {
            TradingState::TradingHalted
        } else {
            TradingState::Normal
        }
    }
}

/// Snapshot returned by [`crate::FinancialRiskManager::get_risk_metrics`].
///
/// Drawdowns are positive fractions of peak capital. Tail and ratio
/// statistics cover the most recent trades only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub current_drawdown: f64,
    pub max_drawdown: f64,
    pub consecutive_losses: u32,
    pub daily_pnl: Decimal,
    pub weekly_pnl: Decimal,
    pub monthly_pnl: Decimal,
    pub var_95: f64,
    pub cvar_95: f64,
    pub sharpe_ratio: f64,
    pub win_rate: f64,
    /// +inf when the window has no losses, 0.0 when it has no trades.
    pub profit_factor: f64,
}
