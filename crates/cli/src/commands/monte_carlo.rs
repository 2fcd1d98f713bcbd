//! Monte Carlo CLI command.
//!
//! Simulates one market scenario many times and reports the distribution of
//! final capital, VaR/CVaR and the probability of ruin.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;
use wager_risk_backtest::{MonteCarloSimulator, ReportFormatter};
use wager_risk_core::{AppConfig, MonteCarloConfig, ScenarioType};

use super::output::{write_json, OutputFormat};

/// Arguments for the monte-carlo command.
#[derive(Args, Debug, Clone)]
pub struct MonteCarloArgs {
    /// Scenario: normal, stress, crisis, black_swan (default: normal)
    #[arg(long, default_value = "normal")]
    pub scenario: String,

    /// Number of simulated trials (overrides config)
    #[arg(long)]
    pub simulations: Option<usize>,

    /// Trading days per trial (overrides config)
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Starting capital per trial (overrides config)
    #[arg(long)]
    pub capital: Option<f64>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fixed bet size as a fraction of capital (overrides config)
    #[arg(long)]
    pub position_size: Option<f64>,

    /// Kelly multiplier; 0 disables Kelly sizing (overrides config)
    #[arg(long)]
    pub kelly_fraction: Option<f64>,

    /// Output JSON results to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Parses a scenario name.
pub fn parse_scenario(s: &str) -> Result<ScenarioType> {
    s.parse::<ScenarioType>().map_err(|e| anyhow!(e))
}

/// Applies command-line overrides on top of the configured simulation.
pub fn simulation_config(args: &MonteCarloArgs, config: &AppConfig) -> MonteCarloConfig {
    let mut mc = config.monte_carlo.clone();
    if let Some(simulations) = args.simulations {
        mc.simulations = simulations;
    }
    if let Some(horizon) = args.horizon {
        mc.time_horizon = horizon;
    }
    if let Some(capital) = args.capital {
        mc.initial_capital = capital;
    }
    if let Some(seed) = args.seed {
        mc.seed = Some(seed);
    }
    if let Some(position_size) = args.position_size {
        mc.position_size = position_size;
    }
    if let Some(kelly_fraction) = args.kelly_fraction {
        mc.kelly_fraction = kelly_fraction;
    }
    mc
}

/// Runs the simulation on the blocking pool and returns the rendered report.
///
/// # Errors
/// Returns an error for an unknown scenario or format, or invalid simulation
/// parameters.
pub async fn execute(args: &MonteCarloArgs, config: &AppConfig) -> Result<String> {
    let format = OutputFormat::parse(&args.format)?;
    let scenario = parse_scenario(&args.scenario)?;
    let simulator = MonteCarloSimulator::new(simulation_config(args, config));

    tracing::info!(
        "Running {} {} simulations over {} days",
        simulator.config().simulations,
        scenario,
        simulator.config().time_horizon
    );

    let result = tokio::task::spawn_blocking(move || simulator.run_simulation(scenario)).await??;
    tracing::info!(
        "Simulation complete: ruin probability {:.2}%",
        result.probability_of_ruin * 100.0
    );

    write_json(&result, args.output.as_deref())?;
    format.render(&result, ReportFormatter::monte_carlo)
}

/// # Errors
/// Returns an error if the simulation cannot be run.
pub async fn run_monte_carlo(args: &MonteCarloArgs, config: &AppConfig) -> Result<()> {
    println!("{}", execute(args, config).await?);
    Ok(())
}
