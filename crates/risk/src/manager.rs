//! Live capital protection.
//!
//! [`FinancialRiskManager`] owns the [`RiskState`] behind a
//! `parking_lot::RwLock`. Every mutation takes the write lock once, so a
//! trade update and the breaker evaluation that follows it are one atomic
//! step: capital, peak and the loss streak can never be observed out of step.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{error, info, warn};
use wager_risk_core::{stats, AppConfig, CapitalConfig, KellySizer};

use crate::breakers::CircuitBreakers;
use crate::calendar::Period;
use crate::types::{
    ActionType, RiskAction, RiskLevel, RiskMetrics, RiskState, TradeLogEntry, TradingState,
};

/// Share of current capital that is never staked.
const CAPITAL_RESERVE: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

/// Tail percentile for rolling VaR and CVaR.
const VAR_TAIL_PERCENTILE: f64 = 5.0;

/// Stake sizes are truncated to cents.
const STAKE_DECIMALS: u32 = 2;

pub struct FinancialRiskManager {
    config: CapitalConfig,
    breakers: CircuitBreakers,
    sizer: KellySizer,
    state: RwLock<RiskState>,
}

impl std::fmt::Debug for FinancialRiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("FinancialRiskManager")
            .field("current_capital", &state.current_capital)
            .field("peak_capital", &state.peak_capital)
            .field("consecutive_losses", &state.consecutive_losses)
            .field("trading_state", &state.trading_state())
            .finish()
    }
}

impl Default for FinancialRiskManager {
    fn default() -> Self {
        Self::new(CapitalConfig::default())
    }
}

impl FinancialRiskManager {
    #[must_use]
    pub fn new(config: CapitalConfig) -> Self {
        Self {
            breakers: CircuitBreakers::from_config(&config),
            sizer: KellySizer::new(config.kelly_fraction, config.max_kelly_fraction),
            state: RwLock::new(RiskState::new(config.initial_capital)),
            config,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.capital.clone())
    }

    /// Replaces the standard breaker table.
    #[must_use]
    pub fn with_breakers(mut self, breakers: CircuitBreakers) -> Self {
        self.breakers = breakers;
        self
    }

    #[must_use]
    pub fn config(&self) -> &CapitalConfig {
        &self.config
    }

    #[must_use]
    pub fn breakers(&self) -> &CircuitBreakers {
        &self.breakers
    }

    // =========================================================================
    // Trade updates
    // =========================================================================

    /// Applies a settled trade's PnL, timestamped now.
    ///
    /// Returns the action logged by the breaker that fired, if any.
    pub fn apply_trade_result(&self, pnl: Decimal) -> Option<RiskAction> {
        self.apply_trade_result_at(pnl, Utc::now())
    }

    /// Applies a settled trade's PnL with an explicit timestamp.
    pub fn apply_trade_result_at(&self, pnl: Decimal, at: DateTime<Utc>) -> Option<RiskAction> {
        let mut state = self.state.write();

        state.current_capital += pnl;
        if state.current_capital > state.peak_capital {
            state.peak_capital = state.current_capital;
            state.consecutive_losses = 0;
        } else if pnl <= Decimal::ZERO {
            state.consecutive_losses += 1;
        } else {
            state.consecutive_losses = 0;
        }

        state.daily_pnl += pnl;
        state.weekly_pnl += pnl;
        state.monthly_pnl += pnl;

        let drawdown = state.current_drawdown();
        if drawdown > state.max_drawdown {
            state.max_drawdown = drawdown;
        }

        let entry = TradeLogEntry {
            timestamp: at,
            pnl,
            is_winner: pnl > Decimal::ZERO,
            capital_after: state.current_capital,
            consecutive_losses: state.consecutive_losses,
        };
        state.trades.push(entry);

        let trip = self.breakers.evaluate(&state)?;
        let action = RiskAction::new(
            trip.rule.action_type(),
            trip.rule.risk_level,
            trip.message,
            at,
        );
        if trip.rule.halts {
            state.trading_halted = true;
            error!(
                breaker = trip.rule.kind.as_str(),
                observed = trip.observed,
                capital = %state.current_capital,
                "circuit breaker activated: {}",
                action.message
            );
        } else {
            warn!(
                breaker = trip.rule.kind.as_str(),
                observed = trip.observed,
                "stop loss activated: {}",
                action.message
            );
        }
        state.actions.push(action.clone());
        Some(action)
    }

    // =========================================================================
    // Position sizing
    // =========================================================================

    /// Stake for a bet at decimal `odds` with model probability `win_prob`,
    /// discounted by `confidence`.
    ///
    /// Zero while trading is halted or emergency-stopped. Otherwise partial
    /// Kelly on current capital, scaled by [`Self::risk_multiplier`], then
    /// capped at `position_size_limit` of capital and at 95% of capital.
    /// Stakes are truncated to cents.
    #[must_use]
    pub fn calculate_position_size(&self, win_prob: f64, odds: f64, confidence: f64) -> Decimal {
        let state = self.state.read();
        if state.trading_halted || state.emergency_stop {
            return Decimal::ZERO;
        }
        let capital = state.current_capital;
        if capital <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let decision = self.sizer.size(win_prob * confidence, odds);
        let fraction = decision.bankroll_fraction * risk_multiplier(&state);
        let limit = to_decimal(self.config.position_size_limit);

        let stake = capital * to_decimal(fraction);
        let stake = stake
            .min(capital * limit)
            .min(capital * CAPITAL_RESERVE)
            .max(Decimal::ZERO);
        stake.round_dp_with_strategy(STAKE_DECIMALS, RoundingStrategy::ToZero)
    }

    /// Size multiplier derived from the current streak, drawdown and daily PnL.
    ///
    /// Three or more consecutive losses halve the size (two: ×0.75); a
    /// drawdown above 15% halves it again (above 10%: ×0.75); a daily loss
    /// beyond 2% of capital halves it once more.
    #[must_use]
    pub fn risk_multiplier(&self) -> f64 {
        risk_multiplier(&self.state.read())
    }

    // =========================================================================
    // Halts and resets
    // =========================================================================

    /// Lifts a circuit-breaker halt unless an emergency stop is active.
    ///
    /// Returns the state after the call; callers must check it, since a
    /// resume during an emergency stop changes nothing.
    pub fn resume_trading(&self, reason: &str) -> TradingState {
        let mut state = self.state.write();
        if state.emergency_stop {
            warn!(reason, "resume refused: emergency stop active");
            return state.trading_state();
        }
        if state.trading_halted {
            state.trading_halted = false;
            let message = format!("trading resumed: {reason}");
            info!("{message}");
            state
                .actions
                .push(RiskAction::new(ActionType::TradingHalt, RiskLevel::Low, message, Utc::now()));
        }
        state.trading_state()
    }

    /// Halts all trading until the stop is cleared and trading resumed.
    pub fn trigger_emergency_stop(&self, reason: &str) {
        let mut state = self.state.write();
        state.emergency_stop = true;
        state.trading_halted = true;
        let message = format!("emergency stop: {reason}");
        error!("{message}");
        state.actions.push(RiskAction::new(
            ActionType::EmergencyStop,
            RiskLevel::Critical,
            message,
            Utc::now(),
        ));
    }

    /// Clears an emergency stop. Trading stays halted until
    /// [`Self::resume_trading`] is called.
    pub fn clear_emergency_stop(&self, reason: &str) -> TradingState {
        let mut state = self.state.write();
        if state.emergency_stop {
            state.emergency_stop = false;
            let message = format!("emergency stop cleared: {reason}");
            info!("{message}");
            state.actions.push(RiskAction::new(
                ActionType::EmergencyStop,
                RiskLevel::Low,
                message,
                Utc::now(),
            ));
        }
        state.trading_state()
    }

    pub fn reset_daily_metrics(&self) {
        self.state.write().daily_pnl = Decimal::ZERO;
        info!("daily risk metrics reset");
    }

    pub fn reset_weekly_metrics(&self) {
        self.state.write().weekly_pnl = Decimal::ZERO;
        info!("weekly risk metrics reset");
    }

    pub fn reset_monthly_metrics(&self) {
        self.state.write().monthly_pnl = Decimal::ZERO;
        info!("monthly risk metrics reset");
    }

    pub fn reset_period(&self, period: Period) {
        match period {
            Period::Daily => self.reset_daily_metrics(),
            Period::Weekly => self.reset_weekly_metrics(),
            Period::Monthly => self.reset_monthly_metrics(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current risk metrics; tail and ratio statistics cover the last
    /// `metrics_window` trades.
    #[must_use]
    pub fn get_risk_metrics(&self) -> RiskMetrics {
        let state = self.state.read();
        let start = state.trades.len().saturating_sub(self.config.metrics_window);
        let recent = &state.trades[start..];
        let pnls: Vec<f64> = recent.iter().map(|t| t.pnl.to_f64().unwrap_or(0.0)).collect();

        let (var_95, cvar_95, sharpe_ratio, win_rate, profit_factor) = if pnls.is_empty() {
            (0.0, 0.0, 0.0, 0.0, 0.0)
        } else {
            let (var, cvar) = stats::var_cvar(&pnls, VAR_TAIL_PERCENTILE);
            let std = stats::population_std_dev(&pnls);
            let sharpe = if pnls.len() > 1 && std > 0.0 {
                stats::mean(&pnls) / std
            } else {
                0.0
            };
            let wins = recent.iter().filter(|t| t.is_winner).count();
            let gross_profit: f64 = pnls.iter().filter(|p| **p > 0.0).sum();
            let gross_loss: f64 = pnls.iter().filter(|p| **p < 0.0).sum::<f64>().abs();
            let profit_factor = if gross_loss > 0.0 {
                gross_profit / gross_loss
            } else {
                f64::INFINITY
            };
            (var, cvar, sharpe, wins as f64 / pnls.len() as f64, profit_factor)
        };

        RiskMetrics {
            current_drawdown: state.current_drawdown(),
            max_drawdown: state.max_drawdown,
            consecutive_losses: state.consecutive_losses,
            daily_pnl: state.daily_pnl,
            weekly_pnl: state.weekly_pnl,
            monthly_pnl: state.monthly_pnl,
            var_95,
            cvar_95,
            sharpe_ratio,
            win_rate,
            profit_factor,
        }
    }

    /// Clone of the full state, including both logs.
    #[must_use]
    pub fn snapshot(&self) -> RiskState {
        self.state.read().clone()
    }

    #[must_use]
    pub fn risk_actions(&self) -> Vec<RiskAction> {
        self.state.read().actions.clone()
    }

    #[must_use]
    pub fn trading_state(&self) -> TradingState {
        self.state.read().trading_state()
    }

    #[must_use]
    pub fn is_trading_allowed(&self) -> bool {
        self.trading_state().allows_trading()
    }

    #[must_use]
    pub fn current_capital(&self) -> Decimal {
        self.state.read().current_capital
    }

    #[must_use]
    pub fn peak_capital(&self) -> Decimal {
        self.state.read().peak_capital
    }

    #[must_use]
    pub fn consecutive_losses(&self) -> u32 {
        self.state.read().consecutive_losses
    }
}

fn risk_multiplier(state: &RiskState) -> f64 {
    let mut multiplier = 1.0;

    if state.consecutive_losses >= 3 {
        multiplier *= 0.5;
    } else if state.consecutive_losses >= 2 {
        multiplier *= 0.75;
    }

    let drawdown = state.current_drawdown();
    if drawdown > 0.15 {
        multiplier *= 0.5;
    } else if drawdown > 0.10 {
        multiplier *= 0.75;
    }

    if state.daily_pnl < -(state.current_capital * Decimal::new(2, 2)) {
        multiplier *= 0.5;
    }

    multiplier
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn manager() -> FinancialRiskManager {
        FinancialRiskManager::default()
    }

    // ============================================
    // Trade updates
    // ============================================

    #[test]
    fn capital_tracks_running_sum() {
        let m = manager();
        for pnl in [dec!(120.5), dec!(-40), dec!(-10.25), dec!(7)] {
            m.apply_trade_result(pnl);
        }
        let state = m.snapshot();
        assert_eq!(state.current_capital, dec!(10077.25));
        assert_eq!(state.peak_capital, dec!(10120.5));
        assert_eq!(state.trades.len(), 4);
    }

    #[test]
    fn new_peak_resets_streak() {
        let m = manager();
        m.apply_trade_result(dec!(-50));
        m.apply_trade_result(dec!(-50));
        assert_eq!(m.consecutive_losses(), 2);

        m.apply_trade_result(dec!(500));
        assert_eq!(m.consecutive_losses(), 0);
        assert_eq!(m.peak_capital(), dec!(10400));
    }

    #[test]
    fn win_below_peak_resets_streak() {
        let m = manager();
        m.apply_trade_result(dec!(-100));
        m.apply_trade_result(dec!(-100));
        m.apply_trade_result(dec!(50));
        assert_eq!(m.consecutive_losses(), 0);
        assert_eq!(m.peak_capital(), dec!(10000));
    }

    #[test]
    fn zero_pnl_counts_as_loss() {
        let m = manager();
        m.apply_trade_result(Decimal::ZERO);
        assert_eq!(m.consecutive_losses(), 1);
        assert!(!m.snapshot().trades[0].is_winner);
    }

    #[test]
    fn period_accumulators_update_together() {
        let m = manager();
        m.apply_trade_result(dec!(-30));
        m.apply_trade_result(dec!(10));

        let metrics = m.get_risk_metrics();
        assert_eq!(metrics.daily_pnl, dec!(-20));
        assert_eq!(metrics.weekly_pnl, dec!(-20));
        assert_eq!(metrics.monthly_pnl, dec!(-20));

        m.reset_daily_metrics();
        let metrics = m.get_risk_metrics();
        assert_eq!(metrics.daily_pnl, Decimal::ZERO);
        assert_eq!(metrics.weekly_pnl, dec!(-20));

        m.reset_period(Period::Weekly);
        m.reset_period(Period::Monthly);
        let metrics = m.get_risk_metrics();
        assert_eq!(metrics.weekly_pnl, Decimal::ZERO);
        assert_eq!(metrics.monthly_pnl, Decimal::ZERO);
    }

    // ============================================
    // Circuit breakers
    // ============================================

    #[test]
    fn daily_loss_halts_trading() {
        let m = manager();
        let action = m.apply_trade_result(dec!(-600)).unwrap();

        assert_eq!(action.action_type, ActionType::CircuitBreaker);
        assert_eq!(action.risk_level, RiskLevel::Critical);
        assert_eq!(m.trading_state(), TradingState::TradingHalted);
        assert_eq!(m.risk_actions().len(), 1);
    }

    fn loose_period_limits() -> CapitalConfig {
        let mut config = CapitalConfig::default()
            .with_daily_loss_limit(1.0)
            .with_consecutive_loss_limit(100);
        config.weekly_loss_limit = 1.0;
        config.monthly_loss_limit = 1.0;
        config
    }

    #[test]
    fn drawdown_beyond_limit_halts() {
        let m = FinancialRiskManager::new(loose_period_limits());
        let action = m.apply_trade_result(dec!(-2500)).unwrap();

        assert_eq!(action.action_type, ActionType::CircuitBreaker);
        assert_eq!(action.risk_level, RiskLevel::Critical);
        assert_eq!(action.message, "drawdown of 25.0% exceeds limit of 20.0%");
        assert!(!m.is_trading_allowed());
    }

    #[test]
    fn weekly_loss_halts_when_daily_allows() {
        let config = CapitalConfig::default()
            .with_daily_loss_limit(1.0)
            .with_consecutive_loss_limit(100);
        let m = FinancialRiskManager::new(config);

        let action = m.apply_trade_result(dec!(-1600)).unwrap();
        assert_eq!(action.action_type, ActionType::CircuitBreaker);
        assert_eq!(action.risk_level, RiskLevel::High);
        assert!(action.message.starts_with("weekly loss"));
    }

    #[test]
    fn monthly_loss_halts_when_daily_and_weekly_allow() {
        let mut config = CapitalConfig::default()
            .with_daily_loss_limit(1.0)
            .with_consecutive_loss_limit(100);
        config.weekly_loss_limit = 1.0;
        let m = FinancialRiskManager::new(config);

        // 2100 / 7900 is above the 25% monthly limit; drawdown is 21%
        let action = m.apply_trade_result(dec!(-2100)).unwrap();
        assert_eq!(action.action_type, ActionType::CircuitBreaker);
        assert_eq!(action.risk_level, RiskLevel::High);
        assert!(action.message.starts_with("monthly loss"));
        assert!(!m.is_trading_allowed());
    }

    #[test]
    fn negative_kelly_cap_sizes_to_zero() {
        let mut config = CapitalConfig::default();
        config.max_kelly_fraction = -0.1;
        let m = FinancialRiskManager::new(config);
        assert_eq!(m.calculate_position_size(0.6, 2.0, 1.0), Decimal::ZERO);
        assert!(m.is_trading_allowed());
    }

    #[test]
    fn soft_drawdown_is_a_medium_stop_loss() {
        let m = FinancialRiskManager::new(loose_period_limits());

        let action = m.apply_trade_result(dec!(-1700)).unwrap();
        assert_eq!(action.action_type, ActionType::StopLoss);
        assert_eq!(action.risk_level, RiskLevel::Medium);
        assert!(m.is_trading_allowed());
    }

    #[test]
    fn max_drawdown_keeps_worst_observed() {
        let m = FinancialRiskManager::new(CapitalConfig::default().with_daily_loss_limit(1.0));
        m.apply_trade_result(dec!(-1000));
        m.apply_trade_result(dec!(1000));

        let metrics = m.get_risk_metrics();
        assert_eq!(metrics.current_drawdown, 0.0);
        assert!((metrics.max_drawdown - 0.10).abs() < 1e-12);
    }

    // ============================================
    // Position sizing
    // ============================================

    #[test]
    fn quarter_kelly_of_clamped_edge() {
        let m = FinancialRiskManager::new(CapitalConfig::default().with_position_size_limit(0.5));
        // f* = (0.75 - 0.25) / 1 = 0.5 -> clamp 0.25 -> quarter Kelly 0.0625 of 10000
        assert_eq!(m.calculate_position_size(0.75, 2.0, 1.0), dec!(625));
    }

    #[test]
    fn position_capped_by_limit() {
        let m = manager();
        // f* = (2 * 0.9 - 0.1) / 2 = 0.85 -> clamp 0.25 -> 0.0625, limited to 0.05
        assert_eq!(m.calculate_position_size(0.9, 3.0, 1.0), dec!(500));
    }

    #[test]
    fn no_edge_means_no_stake() {
        let m = manager();
        assert_eq!(m.calculate_position_size(0.4, 2.0, 1.0), Decimal::ZERO);
        assert_eq!(m.calculate_position_size(0.6, 1.0, 1.0), Decimal::ZERO);
    }

    #[test]
    fn confidence_scales_probability() {
        let m = FinancialRiskManager::new(CapitalConfig::default().with_position_size_limit(0.5));
        // p = 1.0 * 0.75 at evens
        assert_eq!(m.calculate_position_size(1.0, 2.0, 0.75), dec!(625));
    }

    #[test]
    fn losing_streak_shrinks_stake() {
        let m = FinancialRiskManager::new(CapitalConfig::default().with_position_size_limit(0.5));
        m.apply_trade_result(dec!(-1));
        m.apply_trade_result(dec!(-1));
        assert!((m.risk_multiplier() - 0.75).abs() < 1e-12);

        m.apply_trade_result(dec!(-1));
        assert!((m.risk_multiplier() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn drawdown_and_daily_loss_compound_the_multiplier() {
        let m = FinancialRiskManager::new(loose_period_limits().with_max_drawdown_limit(1.0));

        // One loss of 16%: streak 1, drawdown > 15%, daily < -2%
        m.apply_trade_result(dec!(-1600));
        assert!((m.risk_multiplier() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn halted_manager_sizes_zero() {
        let m = manager();
        m.trigger_emergency_stop("operator");
        assert_eq!(m.calculate_position_size(0.7, 2.5, 1.0), Decimal::ZERO);
    }

    // ============================================
    // Resume and emergency stop
    // ============================================

    #[test]
    fn resume_clears_breaker_halt() {
        let m = manager();
        m.apply_trade_result(dec!(-600));
        assert_eq!(m.resume_trading("reviewed"), TradingState::Normal);

        let last = m.risk_actions().pop().unwrap();
        assert_eq!(last.action_type, ActionType::TradingHalt);
        assert_eq!(last.risk_level, RiskLevel::Low);
        assert_eq!(last.message, "trading resumed: reviewed");
    }

    #[test]
    fn resume_is_a_no_op_during_emergency_stop() {
        let m = manager();
        m.trigger_emergency_stop("feed outage");
        let actions = m.risk_actions().len();

        assert_eq!(m.resume_trading("too early"), TradingState::EmergencyStop);
        assert_eq!(m.risk_actions().len(), actions);
    }

    #[test]
    fn clearing_emergency_stop_leaves_trading_halted() {
        let m = manager();
        m.trigger_emergency_stop("feed outage");
        assert_eq!(m.clear_emergency_stop("feed back"), TradingState::TradingHalted);
        assert_eq!(m.resume_trading("checks passed"), TradingState::Normal);

        let kinds: Vec<ActionType> = m.risk_actions().iter().map(|a| a.action_type).collect();
        assert_eq!(
            kinds,
            vec![ActionType::EmergencyStop, ActionType::EmergencyStop, ActionType::TradingHalt]
        );
    }

    #[test]
    fn resume_without_halt_logs_nothing() {
        let m = manager();
        assert_eq!(m.resume_trading("noop"), TradingState::Normal);
        assert!(m.risk_actions().is_empty());
    }

    // ============================================
    // Risk metrics
    // ============================================

    #[test]
    fn metrics_without_trades_are_zero() {
        let metrics = manager().get_risk_metrics();
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn metrics_use_recent_window() {
        let mut config = CapitalConfig::default();
        config.metrics_window = 4;
        let m = FinancialRiskManager::new(config);
        for _ in 0..10 {
            m.apply_trade_result(dec!(-5));
        }
        for _ in 0..4 {
            m.apply_trade_result(dec!(20));
        }

        let metrics = m.get_risk_metrics();
        assert_eq!(metrics.win_rate, 1.0);
        assert!(metrics.profit_factor.is_infinite());
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.var_95, 20.0);
    }

    #[test]
    fn sharpe_uses_population_deviation() {
        let m = manager();
        m.apply_trade_result(dec!(30));
        m.apply_trade_result(dec!(-10));

        // mean 10, population std 20
        let metrics = m.get_risk_metrics();
        assert!((metrics.sharpe_ratio - 0.5).abs() < 1e-12);
        assert!((metrics.win_rate - 0.5).abs() < 1e-12);
        assert!((metrics.profit_factor - 3.0).abs() < 1e-12);
    }
}
