//! Replay CLI command.
//!
//! Feeds a trade history through a live risk manager in date order, resetting
//! the period accumulators at day, week and month boundaries. Trades that
//! arrive while trading is halted are skipped.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use wager_risk_backtest::TradeHistory;
use wager_risk_core::{AppConfig, ReturnCalculator, TradeRecord};
use wager_risk_manager::{
    spawn, FinancialRiskManager, Period, PeriodClock, RiskAction, RiskMetrics, RiskReport,
    RiskState, TradingState, DEFAULT_MAILBOX,
};

use super::output::{write_json, OutputFormat};

/// Arguments for the replay command.
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Trade history CSV (date,predicted_outcome,actual_outcome,odds,stake)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Starting capital (overrides config)
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Resume a halted manager at the start of each new trading day
    #[arg(long)]
    pub resume_each_day: bool,

    /// Output JSON results to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub applied: usize,
    pub skipped: usize,
    pub trading_state: TradingState,
    pub final_capital: Decimal,
    pub peak_capital: Decimal,
    pub metrics: RiskMetrics,
    pub actions: Vec<RiskAction>,
    #[serde(skip)]
    state: RiskState,
}

impl ReplaySummary {
    fn format_text(&self) -> String {
        let mut output = RiskReport::format(&self.state, &self.metrics);
        output.push_str(&format!(
            "Replayed {} trades, skipped {} while halted. Final state: {}\n",
            self.applied, self.skipped, self.trading_state
        ));
        output
    }
}

/// Replays `trades` through a freshly spawned risk actor.
///
/// # Errors
/// Returns an error if a trade is invalid or the actor stops unexpectedly.
pub async fn replay(
    trades: &[TradeRecord],
    manager: FinancialRiskManager,
    resume_each_day: bool,
) -> Result<ReplaySummary> {
    let (handle, task) = spawn(Arc::new(manager), DEFAULT_MAILBOX);
    let mut clock = PeriodClock::new();
    let mut applied = 0;
    let mut skipped = 0;

    for (index, trade) in trades.iter().enumerate() {
        let crossed = clock.advance(trade.date);
        for period in &crossed {
            handle.reset(*period).await?;
        }
        if resume_each_day
            && crossed.contains(&Period::Daily)
            && handle.trading_state().await? == TradingState::TradingHalted
        {
            handle.resume("new trading day").await?;
        }

        if !handle.trading_state().await?.allows_trading() {
            skipped += 1;
            continue;
        }

        let pnl = ReturnCalculator::trade_return(trade).map_err(|e| e.at_index(index))?;
        if let Some(action) = handle.apply_trade(pnl, trade.date).await? {
            tracing::debug!("Trade {} triggered {}: {}", index, action.action_type, action.message);
        }
        applied += 1;
    }

    let metrics = handle.metrics().await?;
    let state = handle.snapshot().await?;
    handle.shutdown().await?;
    task.await?;

    Ok(ReplaySummary {
        applied,
        skipped,
        trading_state: state.trading_state(),
        final_capital: state.current_capital,
        peak_capital: state.peak_capital,
        metrics,
        actions: state.actions.clone(),
        state,
    })
}

/// Runs the replay and returns the rendered report.
///
/// # Errors
/// Returns an error if the format is unknown, the CSV cannot be read or the
/// replay fails.
pub async fn execute(args: &ReplayArgs, config: &AppConfig) -> Result<String> {
    let format = OutputFormat::parse(&args.format)?;

    let mut capital = config.capital.clone();
    if let Some(initial) = args.capital {
        capital.initial_capital = initial;
    }

    let history = TradeHistory::from_csv(&args.data)?;
    tracing::info!(
        "Replaying {} trades from ${:.2}",
        history.len(),
        capital.initial_capital
    );

    let summary = replay(
        history.trades(),
        FinancialRiskManager::new(capital),
        args.resume_each_day,
    )
    .await?;
    tracing::info!(
        "Replay complete: {} applied, {} skipped, state {}",
        summary.applied,
        summary.skipped,
        summary.trading_state
    );

    write_json(&summary, args.output.as_deref())?;
    format.render(&summary, ReplaySummary::format_text)
}

/// # Errors
/// Returns an error if the replay cannot be run.
pub async fn run_replay(args: &ReplayArgs, config: &AppConfig) -> Result<()> {
    println!("{}", execute(args, config).await?);
    Ok(())
}
