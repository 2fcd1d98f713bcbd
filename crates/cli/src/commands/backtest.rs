//! Backtest CLI command.
//!
//! Validates a full trade history against the minimum sample requirements
//! and the Sharpe, drawdown and win-rate thresholds.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use wager_risk_backtest::{ReportFormatter, RigorousBacktester, TradeHistory};
use wager_risk_core::AppConfig;

use super::output::{write_json, OutputFormat};

/// Arguments for the backtest command.
#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    /// Trade history CSV (date,predicted_outcome,actual_outcome,odds,stake)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Minimum number of trades (overrides config)
    #[arg(long)]
    pub min_trades: Option<usize>,

    /// Minimum history span in years (overrides config)
    #[arg(long)]
    pub min_years: Option<f64>,

    /// Output JSON results to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Runs the backtest and returns the rendered report.
///
/// # Errors
/// Returns an error if the format is unknown or the CSV cannot be read.
pub fn execute(args: &BacktestArgs, config: &AppConfig) -> Result<String> {
    let format = OutputFormat::parse(&args.format)?;

    let mut config = config.clone();
    if let Some(min_trades) = args.min_trades {
        config.backtest.min_trades = min_trades;
    }
    if let Some(min_years) = args.min_years {
        config.backtest.min_years = min_years;
    }

    let history = TradeHistory::from_csv(&args.data)?;
    tracing::info!("Loaded {} trades from {}", history.len(), args.data.display());

    let result = RigorousBacktester::from_config(&config).run(history.trades());
    tracing::info!(
        "Backtest complete: status {}, {} critical issues",
        result.validation_status,
        result.critical_issues.len()
    );

    write_json(&result, args.output.as_deref())?;
    format.render(&result, ReportFormatter::backtest)
}

/// # Errors
/// Returns an error if the backtest cannot be run.
pub fn run_backtest(args: &BacktestArgs, config: &AppConfig) -> Result<()> {
    println!("{}", execute(args, config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_with(rows: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,predicted_outcome,actual_outcome,odds,stake").unwrap();
        for i in 0..rows {
            let actual = if i % 4 == 3 { "away" } else { "home" };
            writeln!(file, "2023-01-{:02},home,{},1.9,0.01", i % 28 + 1, actual).unwrap();
        }
        file
    }

    fn args(file: &tempfile::NamedTempFile, format: &str) -> BacktestArgs {
        BacktestArgs {
            data: file.path().to_path_buf(),
            min_trades: None,
            min_years: None,
            output: None,
            format: format.to_string(),
        }
    }

    #[test]
    fn short_history_reports_critical() {
        let file = csv_with(20);
        let report = execute(&args(&file, "text"), &AppConfig::default()).unwrap();

        assert!(report.contains("RIGOROUS BACKTEST VALIDATION"));
        assert!(report.contains("CRITICAL"));
    }

    #[test]
    fn overrides_relax_the_minimums() {
        let file = csv_with(20);
        let mut a = args(&file, "json");
        a.min_trades = Some(10);
        a.min_years = Some(0.0);

        let json = execute(&a, &AppConfig::default()).unwrap();
        assert!(!json.contains("insufficient trade count"));
        assert!(!json.contains("insufficient history"));
        assert!(json.contains("\"total_trades\": 20"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let file = csv_with(5);
        assert!(execute(&args(&file, "xml"), &AppConfig::default()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let a = BacktestArgs {
            data: PathBuf::from("no/such/trades.csv"),
            min_trades: None,
            min_years: None,
            output: None,
            format: "text".to_string(),
        };
        assert!(execute(&a, &AppConfig::default()).is_err());
    }
}
