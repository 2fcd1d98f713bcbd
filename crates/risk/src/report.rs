//! Plain-text risk summary.

use crate::types::{RiskMetrics, RiskState, TradingState};

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────────────────\n";

/// Number of most recent actions listed.
const RECENT_ACTIONS: usize = 5;

pub struct RiskReport;

impl RiskReport {
    #[must_use]
    pub fn format(state: &RiskState, metrics: &RiskMetrics) -> String {
        let mut output = String::new();
        output.push('\n');
        output.push_str(HEAVY_RULE);
        output.push_str(&format!("{:^63}\n", "RISK MANAGEMENT REPORT"));
        output.push_str(HEAVY_RULE);
        output.push('\n');

        output.push_str(&format!("Status:                {}\n", status_label(state, metrics)));
        output.push_str(&format!("Trading Halted:        {}\n", yes_no(state.trading_halted)));
        output.push_str(&format!("Emergency Stop:        {}\n", yes_no(state.emergency_stop)));
        output.push('\n');

        section(&mut output, "Capital");
        output.push_str(&format!("Initial:               ${:.2}\n", state.initial_capital));
        output.push_str(&format!("Current:               ${:.2}\n", state.current_capital));
        output.push_str(&format!("Peak:                  ${:.2}\n", state.peak_capital));
        output.push_str(&format!("Total PnL:             ${:.2}\n", state.total_pnl()));
        output.push_str(&format!("Trades Applied:        {}\n", state.trades.len()));
        output.push('\n');

        section(&mut output, "Risk");
        output.push_str(&format!(
            "Current Drawdown:      {:.1}%\n",
            metrics.current_drawdown * 100.0
        ));
        output.push_str(&format!("Max Drawdown:          {:.1}%\n", metrics.max_drawdown * 100.0));
        output.push_str(&format!("Consecutive Losses:    {}\n", metrics.consecutive_losses));
        output.push_str(&format!("Daily PnL:             ${:.2}\n", metrics.daily_pnl));
        output.push_str(&format!("Weekly PnL:            ${:.2}\n", metrics.weekly_pnl));
        output.push_str(&format!("Monthly PnL:           ${:.2}\n", metrics.monthly_pnl));
        output.push_str(&format!("VaR 95%:               ${:.2}\n", metrics.var_95));
        output.push_str(&format!("CVaR 95%:              ${:.2}\n", metrics.cvar_95));
        output.push('\n');

        section(&mut output, "Performance");
        output.push_str(&format!("Sharpe Ratio:          {:.2}\n", metrics.sharpe_ratio));
        output.push_str(&format!("Win Rate:              {:.1}%\n", metrics.win_rate * 100.0));
        output.push_str(&format!("Profit Factor:         {:.2}\n", metrics.profit_factor));
        output.push('\n');

        if !state.actions.is_empty() {
            section(&mut output, "Recent Actions");
            let start = state.actions.len().saturating_sub(RECENT_ACTIONS);
            for action in &state.actions[start..] {
                output.push_str(&format!(
                    "  {} [{}] {}: {}\n",
                    action.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    action.risk_level,
                    action.action_type,
                    action.message
                ));
            }
            output.push('\n');
        }

        section(&mut output, "Recommendations");
        if metrics.current_drawdown > 0.15 {
            output.push_str("  ✗ Critical drawdown: consider stopping\n");
        } else if metrics.consecutive_losses >= 3 {
            output.push_str("  ! Losing streak: reduce position sizes\n");
        } else if metrics.sharpe_ratio < 0.5 {
            output.push_str("  ! Low Sharpe ratio: review the strategy\n");
        } else {
            output.push_str("  ✓ Operating within risk limits\n");
        }
        output.push('\n');

        output.push_str(HEAVY_RULE);
        output
    }
}

fn status_label(state: &RiskState, metrics: &RiskMetrics) -> &'static str {
    match state.trading_state() {
        TradingState::EmergencyStop => "✗ EMERGENCY STOP",
        TradingState::TradingHalted => "! HALTED",
        TradingState::Normal if metrics.current_drawdown > 0.10 => "! HIGH RISK",
        TradingState::Normal => "✓ NORMAL",
    }
}

fn section(output: &mut String, title: &str) {
    output.push_str(title);
    output.push('\n');
    output.push_str(LIGHT_RULE);
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
