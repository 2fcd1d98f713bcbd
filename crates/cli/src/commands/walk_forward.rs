//! Walk-forward CLI command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use wager_risk_backtest::{ReportFormatter, TradeHistory, WalkForwardAnalyzer};
use wager_risk_core::AppConfig;

use super::output::{write_json, OutputFormat};

/// Arguments for the walk-forward command.
#[derive(Args, Debug, Clone)]
pub struct WalkForwardArgs {
    /// Trade history CSV (date,predicted_outcome,actual_outcome,odds,stake)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Training window length in months (overrides config)
    #[arg(long)]
    pub train_months: Option<u32>,

    /// Test window length in months (overrides config)
    #[arg(long)]
    pub test_months: Option<u32>,

    /// Months between window starts (overrides config)
    #[arg(long)]
    pub step_months: Option<u32>,

    /// Output JSON results to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Runs the analysis and returns the rendered report.
///
/// # Errors
/// Returns an error if the format is unknown, the CSV cannot be read or no
/// window has enough trades.
pub fn execute(args: &WalkForwardArgs, config: &AppConfig) -> Result<String> {
    let format = OutputFormat::parse(&args.format)?;

    let mut config = config.clone();
    let wf = &mut config.walk_forward;
    if let Some(months) = args.train_months {
        wf.train_months = months;
    }
    if let Some(months) = args.test_months {
        wf.test_months = months;
    }
    if let Some(months) = args.step_months {
        wf.step_months = months;
    }

    let history = TradeHistory::from_csv(&args.data)?;
    tracing::info!(
        "Walk-forward over {} trades: {}m train, {}m test, {}m step",
        history.len(),
        config.walk_forward.train_months,
        config.walk_forward.test_months,
        config.walk_forward.step_months
    );

    let result = WalkForwardAnalyzer::from_config(&config)
        .analyze(history.trades())
        .with_context(|| format!("walk-forward analysis of {} failed", args.data.display()))?;

    write_json(&result, args.output.as_deref())?;
    format.render(&result, ReportFormatter::walk_forward)
}

/// # Errors
/// Returns an error if the analysis cannot be run.
pub fn run_walk_forward(args: &WalkForwardArgs, config: &AppConfig) -> Result<()> {
    println!("{}", execute(args, config)?);
    Ok(())
}
