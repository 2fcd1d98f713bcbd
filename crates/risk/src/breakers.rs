//! Circuit breaker rules, evaluated in priority order after every trade.
//!
//! Each rule observes one quantity of [`RiskState`] and checks it against a
//! [`Threshold`]. The first breached rule fires; a rule that `halts` stops
//! trading, the others only log.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wager_risk_core::{CapitalConfig, Threshold};

use crate::types::{ActionType, RiskLevel, RiskState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerKind {
    DailyLoss,
    WeeklyLoss,
    MonthlyLoss,
    Drawdown,
    ConsecutiveLosses,
    StopLoss,
}

impl BreakerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyLoss => "daily_loss",
            Self::WeeklyLoss => "weekly_loss",
            Self::MonthlyLoss => "monthly_loss",
            Self::Drawdown => "drawdown",
            Self::ConsecutiveLosses => "consecutive_losses",
            Self::StopLoss => "stop_loss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakerRule {
    pub kind: BreakerKind,
    pub threshold: Threshold,
    pub risk_level: RiskLevel,
    pub halts: bool,
}

impl BreakerRule {
    #[must_use]
    pub const fn new(kind: BreakerKind, threshold: Threshold, risk_level: RiskLevel, halts: bool) -> Self {
        Self {
            kind,
            threshold,
            risk_level,
            halts,
        }
    }

    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        if self.halts {
            ActionType::CircuitBreaker
        } else {
            ActionType::StopLoss
        }
    }

    /// The quantity this rule checks.
    ///
    /// Loss rules observe the period loss as a fraction of current capital;
    /// a non-positive capital makes that fraction infinite.
    #[must_use]
    pub fn observe(&self, state: &RiskState) -> f64 {
        match self.kind {
            BreakerKind::DailyLoss => loss_fraction(state.daily_pnl, state.current_capital),
            BreakerKind::WeeklyLoss => loss_fraction(state.weekly_pnl, state.current_capital),
            BreakerKind::MonthlyLoss => loss_fraction(state.monthly_pnl, state.current_capital),
            BreakerKind::Drawdown | BreakerKind::StopLoss => state.current_drawdown(),
            BreakerKind::ConsecutiveLosses => f64::from(state.consecutive_losses),
        }
    }

    fn message(&self, state: &RiskState, observed: f64) -> String {
        let bound = self.threshold.bound;
        match self.kind {
            BreakerKind::DailyLoss => period_message("daily", state.daily_pnl, bound),
            BreakerKind::WeeklyLoss => period_message("weekly", state.weekly_pnl, bound),
            BreakerKind::MonthlyLoss => period_message("monthly", state.monthly_pnl, bound),
            BreakerKind::Drawdown => format!(
                "drawdown of {:.1}% exceeds limit of {:.1}%",
                observed * 100.0,
                bound * 100.0
            ),
            BreakerKind::ConsecutiveLosses => format!(
                "{} consecutive losses reached limit of {}",
                state.consecutive_losses, bound
            ),
            BreakerKind::StopLoss => {
                format!("drawdown of {:.1}% triggers stop loss", observed * 100.0)
            }
        }
    }
}

fn loss_fraction(pnl: Decimal, capital: Decimal) -> f64 {
    if capital <= Decimal::ZERO {
        return f64::INFINITY;
    }
    (-pnl / capital).to_f64().unwrap_or(0.0)
}

fn period_message(period: &str, pnl: Decimal, bound: f64) -> String {
    format!(
        "{period} loss of {:.2} exceeds limit of {:.1}%",
        pnl.abs(),
        bound * 100.0
    )
}

/// A fired rule and what it observed.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerTrip {
    pub rule: BreakerRule,
    pub observed: f64,
    pub message: String,
}

/// Ordered breaker table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakers {
    rules: Vec<BreakerRule>,
}

impl CircuitBreakers {
    /// Builds the standard table: daily, weekly and monthly loss, drawdown,
    /// consecutive losses, then the non-halting stop loss.
    #[must_use]
    pub fn from_config(config: &CapitalConfig) -> Self {
        Self {
            rules: vec![
                BreakerRule::new(
                    BreakerKind::DailyLoss,
                    Threshold::at_most(config.daily_loss_limit),
                    RiskLevel::Critical,
                    true,
                ),
                BreakerRule::new(
                    BreakerKind::WeeklyLoss,
                    Threshold::at_most(config.weekly_loss_limit),
                    RiskLevel::High,
                    true,
                ),
                BreakerRule::new(
                    BreakerKind::MonthlyLoss,
                    Threshold::at_most(config.monthly_loss_limit),
                    RiskLevel::High,
                    true,
                ),
                BreakerRule::new(
                    BreakerKind::Drawdown,
                    Threshold::at_most(config.max_drawdown_limit),
                    RiskLevel::Critical,
                    true,
                ),
                BreakerRule::new(
                    BreakerKind::ConsecutiveLosses,
                    Threshold::below(f64::from(config.consecutive_loss_limit)),
                    RiskLevel::High,
                    true,
                ),
                BreakerRule::new(
                    BreakerKind::StopLoss,
                    Threshold::at_most(config.stop_loss_drawdown),
                    RiskLevel::Medium,
                    false,
                ),
            ],
        }
    }

    #[must_use]
    pub fn new(rules: Vec<BreakerRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[BreakerRule] {
        &self.rules
    }

    /// First breached rule, if any.
    #[must_use]
    pub fn evaluate(&self, state: &RiskState) -> Option<BreakerTrip> {
        self.rules.iter().find_map(|rule| {
            let observed = rule.observe(state);
            rule.threshold.is_breached(observed).then(|| BreakerTrip {
                rule: *rule,
                observed,
                message: rule.message(state, observed),
            })
        })
    }
}
