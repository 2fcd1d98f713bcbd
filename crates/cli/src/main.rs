use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wager_risk_core::config_loader::DEFAULT_CONFIG_PATH;
use wager_risk_core::{AppConfig, ConfigLoader};

mod commands;

use commands::{BacktestArgs, MonteCarloArgs, ReplayArgs, StressTestArgs, WalkForwardArgs};

#[derive(Parser)]
#[command(name = "wager-risk")]
#[command(about = "Validation and risk management for betting strategies", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Config profile overlay (loads Config.<profile>.toml after Config.toml)
    #[arg(long, global = true, env = "WAGER_PROFILE")]
    profile: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a trade history against the minimum sample and metric thresholds
    Backtest(BacktestArgs),
    /// Out-of-sample validation over sliding train/test windows
    WalkForward(WalkForwardArgs),
    /// Simulate one market scenario many times
    MonteCarlo(MonteCarloArgs),
    /// Run every scenario across a grid of position sizes and Kelly fractions
    StressTest(StressTestArgs),
    /// Replay a trade history through the live risk manager
    Replay(ReplayArgs),
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            // Reports go to stdout, logs to stderr
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.profile {
        Some(profile) => ConfigLoader::load_with_profile(&cli.config, profile),
        None => ConfigLoader::load(&cli.config),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Backtest(args) => commands::run_backtest(args, &config)?,
        Commands::WalkForward(args) => commands::run_walk_forward(args, &config)?,
        Commands::MonteCarlo(args) => commands::run_monte_carlo(args, &config).await?,
        Commands::StressTest(args) => commands::run_stress_test(args, &config).await?,
        Commands::Replay(args) => commands::run_replay(args, &config).await?,
    }

    Ok(())
}
