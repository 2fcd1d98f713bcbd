//! Monte Carlo simulation of capital trajectories under named market scenarios.
//!
//! Each trial places one bet per trading day with odds drawn from a normal
//! distribution and a win drawn from the scenario's win rate. Loss clustering
//! is modelled by a single rule: with probability `loss_correlation` a day
//! repeats the sign of the previous day's result. This is a first-order
//! approximation of serial correlation, not a market model.
//!
//! Trials are independent and run on the rayon pool. Trial `i` is seeded with
//! `base_seed + i`, so results are bit-identical for any thread count.
//!
//! # Example
//!
//! ```
//! use wager_risk_backtest::MonteCarloSimulator;
//! use wager_risk_core::{MonteCarloConfig, ScenarioType};
//!
//! let config = MonteCarloConfig::new(200, 50, 10_000.0).with_seed(7);
//! let result = MonteCarloSimulator::new(config)
//!     .run_simulation(ScenarioType::Normal)
//!     .unwrap();
//! assert_eq!(result.final_capital.len(), 200);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use wager_risk_core::config::{MonteCarloConfig, ScenarioParams, ScenarioType};
use wager_risk_core::stats;

/// Position sizes swept by the default stress test.
pub const STRESS_POSITION_SIZES: [f64; 4] = [0.01, 0.02, 0.05, 0.10];
/// Kelly fractions swept by the default stress test.
pub const STRESS_KELLY_FRACTIONS: [f64; 4] = [0.0, 0.25, 0.50, 1.0];
/// Trials per stress-test cell.
pub const STRESS_SIMULATIONS: usize = 1_000;

#[derive(Debug, Error, PartialEq)]
pub enum MonteCarloError {
    #[error("simulation count must be positive")]
    ZeroSimulations,

    #[error("invalid parameters for scenario {scenario}: {reason}")]
    InvalidScenario {
        scenario: ScenarioType,
        reason: String,
    },
}

/// Distribution of outcomes for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub scenario_type: ScenarioType,
    pub simulation_count: usize,
    pub initial_capital: f64,
    pub time_horizon: usize,
    /// Base seed; trial `i` used `seed + i`.
    pub seed: u64,
    /// Final capital per trial, in trial order.
    pub final_capital: Vec<f64>,
    /// Worst drawdown per trial as a negative fraction, in trial order.
    pub max_drawdown: Vec<f64>,
    /// Fraction of trials ending below the ruin level.
    pub probability_of_ruin: f64,
    /// Mean final capital.
    pub expected_return: f64,
    pub var_95: f64,
    pub cvar_95: f64,
    pub worst_case: f64,
    pub best_case: f64,
    pub median_case: f64,
}

impl MonteCarloResult {
    /// Mean final capital relative to the initial capital, e.g. 0.12 for +12%.
    #[must_use]
    pub fn expected_return_pct(&self) -> f64 {
        if self.initial_capital == 0.0 {
            return 0.0;
        }
        self.expected_return / self.initial_capital - 1.0
    }

    #[must_use]
    pub fn mean_max_drawdown(&self) -> f64 {
        stats::mean(&self.max_drawdown)
    }

    #[must_use]
    pub fn worst_drawdown(&self) -> f64 {
        self.max_drawdown.iter().copied().fold(0.0, f64::min)
    }

    /// Number of trials that ended above the initial capital.
    #[must_use]
    pub fn profitable_count(&self) -> usize {
        self.final_capital
            .iter()
            .filter(|c| **c > self.initial_capital)
            .count()
    }

    /// Percentile of final capital, `p` in `[0, 100]`.
    #[must_use]
    pub fn percentile(&self, p: f64) -> f64 {
        stats::percentile(&self.final_capital, p)
    }
}

/// One position size and Kelly fraction combination of a stress test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressTestCell {
    pub position_size: f64,
    pub kelly_fraction: f64,
    pub probability_of_ruin: f64,
    pub expected_return: f64,
    pub var_95: f64,
    pub worst_case: f64,
    pub median_case: f64,
}

impl StressTestCell {
    fn from_result(position_size: f64, kelly_fraction: f64, result: &MonteCarloResult) -> Self {
        Self {
            position_size,
            kelly_fraction,
            probability_of_ruin: result.probability_of_ruin,
            expected_return: result.expected_return,
            var_95: result.var_95,
            worst_case: result.worst_case,
            median_case: result.median_case,
        }
    }

    /// Identifier such as `pos_0.05_kelly_0.25`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("pos_{}_kelly_{}", self.position_size, self.kelly_fraction)
    }
}

/// Stress-test grid for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStress {
    pub scenario: ScenarioType,
    pub cells: Vec<StressTestCell>,
}

impl ScenarioStress {
    /// Cell with the highest expected capital.
    #[must_use]
    pub fn best(&self) -> Option<&StressTestCell> {
        self.cells
            .iter()
            .max_by(|a, b| a.expected_return.total_cmp(&b.expected_return))
    }

    /// Cell with the lowest expected capital.
    #[must_use]
    pub fn worst(&self) -> Option<&StressTestCell> {
        self.cells
            .iter()
            .min_by(|a, b| a.expected_return.total_cmp(&b.expected_return))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestResult {
    pub simulations_per_cell: usize,
    pub scenarios: Vec<ScenarioStress>,
}

/// Sizing used by one simulation run.
#[derive(Debug, Clone, Copy)]
struct Sizing {
    position_size: f64,
    kelly_fraction: f64,
}

pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
}

impl Default for MonteCarloSimulator {
    fn default() -> Self {
        Self::new(MonteCarloConfig::default())
    }
}

impl MonteCarloSimulator {
    #[must_use]
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Runs `config.simulations` trials of `scenario` with the configured sizing.
    ///
    /// # Errors
    ///
    /// Returns [`MonteCarloError`] for a zero simulation count or invalid scenario parameters.
    pub fn run_simulation(&self, scenario: ScenarioType) -> Result<MonteCarloResult, MonteCarloError> {
        self.run_with(
            scenario,
            self.config.position_size,
            self.config.kelly_fraction,
            self.config.simulations,
        )
    }

    /// Runs `simulations` trials of `scenario` with explicit sizing.
    ///
    /// # Errors
    ///
    /// Returns [`MonteCarloError`] for a zero simulation count or invalid scenario parameters.
    pub fn run_with(
        &self,
        scenario: ScenarioType,
        position_size: f64,
        kelly_fraction: f64,
        simulations: usize,
    ) -> Result<MonteCarloResult, MonteCarloError> {
        if simulations == 0 {
            return Err(MonteCarloError::ZeroSimulations);
        }
        let params = self.config.scenario_params(scenario);
        let odds = odds_distribution(scenario, &params)?;
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let sizing = Sizing {
            position_size,
            kelly_fraction,
        };

        info!(
            scenario = %scenario,
            simulations,
            horizon = self.config.time_horizon,
            seed,
            "starting Monte Carlo simulation"
        );

        let trials: Vec<(f64, f64)> = (0..simulations)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                self.simulate_trial(&params, &odds, sizing, &mut rng)
            })
            .collect();
        let (final_capital, max_drawdown): (Vec<f64>, Vec<f64>) = trials.into_iter().unzip();

        let ruin_level = self.config.initial_capital * self.config.ruin_fraction;
        let ruined = final_capital.iter().filter(|c| **c < ruin_level).count();
        let sorted = stats::sorted(&final_capital);
        let (var_95, cvar_95) = stats::var_cvar(&final_capital, 5.0);

        let result = MonteCarloResult {
            scenario_type: scenario,
            simulation_count: simulations,
            initial_capital: self.config.initial_capital,
            time_horizon: self.config.time_horizon,
            seed,
            probability_of_ruin: ruined as f64 / simulations as f64,
            expected_return: stats::mean(&final_capital),
            var_95,
            cvar_95,
            worst_case: sorted[0],
            best_case: sorted[sorted.len() - 1],
            median_case: stats::percentile_sorted(&sorted, 50.0),
            final_capital,
            max_drawdown,
        };

        debug!(
            scenario = %scenario,
            ruin = result.probability_of_ruin,
            expected = result.expected_return,
            "Monte Carlo simulation complete"
        );
        Ok(result)
    }

    /// Sweeps every scenario over every position size and Kelly fraction.
    ///
    /// Every cell reuses the same base seed, so cells differ only by sizing.
    ///
    /// # Errors
    ///
    /// Returns the first [`MonteCarloError`] raised by a cell.
    pub fn run_stress_test(
        &self,
        position_sizes: &[f64],
        kelly_fractions: &[f64],
        simulations: usize,
    ) -> Result<StressTestResult, MonteCarloError> {
        info!(
            cells = position_sizes.len() * kelly_fractions.len() * ScenarioType::ALL.len(),
            simulations, "starting stress test"
        );

        let seeded = MonteCarloSimulator::new(MonteCarloConfig {
            seed: Some(self.config.seed.unwrap_or_else(rand::random)),
            ..self.config.clone()
        });

        let mut scenarios = Vec::with_capacity(ScenarioType::ALL.len());
        for scenario in ScenarioType::ALL {
            let mut cells = Vec::with_capacity(position_sizes.len() * kelly_fractions.len());
            for &pos in position_sizes {
                for &kelly in kelly_fractions {
                    let result = seeded.run_with(scenario, pos, kelly, simulations)?;
                    cells.push(StressTestCell::from_result(pos, kelly, &result));
                }
            }
            scenarios.push(ScenarioStress { scenario, cells });
        }

        Ok(StressTestResult {
            simulations_per_cell: simulations,
            scenarios,
        })
    }

    /// Stress test with the default grid and simulation count.
    ///
    /// # Errors
    ///
    /// Returns the first [`MonteCarloError`] raised by a cell.
    pub fn run_default_stress_test(&self) -> Result<StressTestResult, MonteCarloError> {
        self.run_stress_test(&STRESS_POSITION_SIZES, &STRESS_KELLY_FRACTIONS, STRESS_SIMULATIONS)
    }

    /// Simulates one trading period, returning `(final_capital, max_drawdown)`.
    fn simulate_trial(
        &self,
        params: &ScenarioParams,
        odds: &Normal<f64>,
        sizing: Sizing,
        rng: &mut ChaCha8Rng,
    ) -> (f64, f64) {
        let cfg = &self.config;
        let initial = cfg.initial_capital;
        let stop_level = initial * cfg.early_stop_fraction;

        let mut capital = initial;
        let mut peak = initial;
        let mut max_drawdown = 0.0_f64;
        let mut previous_win: Option<bool> = None;

        for _ in 0..cfg.time_horizon {
            let drawn_win = rng.gen::<f64>() < params.win_rate;
            let price = odds.sample(rng).max(cfg.odds_floor);
            let repeat = rng.gen::<f64>() < params.loss_correlation;

            let win = match previous_win {
                Some(prev) if repeat => prev,
                _ => drawn_win,
            };

            let base = if sizing.kelly_fraction > 0.0 {
                sizing.kelly_fraction * sizing.position_size * capital
            } else {
                sizing.position_size * capital
            };
            let stake = base.min(cfg.max_position_fraction * capital);

            capital += if win { (price - 1.0) * stake } else { -stake };
            previous_win = Some(win);

            peak = peak.max(capital);
            if peak > 0.0 {
                max_drawdown = max_drawdown.min((capital - peak) / peak);
            }

            if capital < stop_level {
                break;
            }
        }

        (capital, max_drawdown)
    }
}

fn odds_distribution(
    scenario: ScenarioType,
    params: &ScenarioParams,
) -> Result<Normal<f64>, MonteCarloError> {
    let invalid = |reason: String| MonteCarloError::InvalidScenario { scenario, reason };

    if !(0.0..=1.0).contains(&params.win_rate) {
        return Err(invalid(format!("win rate {} outside [0, 1]", params.win_rate)));
    }
    if !(0.0..=1.0).contains(&params.loss_correlation) {
        return Err(invalid(format!(
            "loss correlation {} outside [0, 1]",
            params.loss_correlation
        )));
    }
    if !(params.average_odds > 1.0 && params.average_odds.is_finite()) {
        return Err(invalid(format!(
            "average odds must be above 1.0, got {}",
            params.average_odds
        )));
    }
    if !(params.volatility >= 0.0 && params.volatility.is_finite()) {
        return Err(invalid(format!(
            "volatility must be non-negative, got {}",
            params.volatility
        )));
    }
    Normal::new(params.average_odds, params.volatility * params.average_odds)
        .map_err(|e| invalid(format!("volatility {}: {e}", params.volatility)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // Test Helpers
    // ============================================================

    fn simulator(simulations: usize, horizon: usize, seed: u64) -> MonteCarloSimulator {
        MonteCarloSimulator::new(MonteCarloConfig::new(simulations, horizon, 10_000.0).with_seed(seed))
    }

    // ============================================================
    // Determinism
    // ============================================================

    #[test]
    fn fixed_seed_is_bit_identical() {
        let sim = simulator(300, 100, 42);
        let a = sim.run_simulation(ScenarioType::Normal).unwrap();
        let b = sim.run_simulation(ScenarioType::Normal).unwrap();
        assert_eq!(a.final_capital, b.final_capital);
        assert_eq!(a.max_drawdown, b.max_drawdown);
    }

    #[test]
    fn single_thread_pool_matches_default_pool() {
        let sim = simulator(200, 60, 9);
        let parallel = sim.run_simulation(ScenarioType::Stress).unwrap();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let serial = pool.install(|| sim.run_simulation(ScenarioType::Stress).unwrap());
        assert_eq!(parallel.final_capital, serial.final_capital);
    }

    #[test]
    fn different_seeds_differ() {
        let a = simulator(50, 50, 1).run_simulation(ScenarioType::Normal).unwrap();
        let b = simulator(50, 50, 2).run_simulation(ScenarioType::Normal).unwrap();
        assert_ne!(a.final_capital, b.final_capital);
    }

    #[test]
    fn unseeded_run_records_its_seed() {
        let sim = MonteCarloSimulator::new(MonteCarloConfig::new(20, 10, 1_000.0));
        let first = sim.run_simulation(ScenarioType::Normal).unwrap();
        let replay = MonteCarloSimulator::new(MonteCarloConfig::new(20, 10, 1_000.0).with_seed(first.seed))
            .run_simulation(ScenarioType::Normal)
            .unwrap();
        assert_eq!(first.final_capital, replay.final_capital);
    }

    // ============================================================
    // Aggregates
    // ============================================================

    #[test]
    fn summary_statistics_are_consistent() {
        let r = simulator(500, 120, 3).run_simulation(ScenarioType::Crisis).unwrap();

        assert_eq!(r.simulation_count, 500);
        assert_eq!(r.final_capital.len(), 500);
        assert_eq!(r.max_drawdown.len(), 500);
        assert!(r.worst_case <= r.median_case && r.median_case <= r.best_case);
        assert!(r.cvar_95 <= r.var_95 + 1e-9);
        assert!((0.0..=1.0).contains(&r.probability_of_ruin));
        assert!(r.max_drawdown.iter().all(|d| *d <= 0.0));
    }

    #[test]
    fn black_swan_is_worse_than_normal() {
        let sim = simulator(500, 252, 11);
        let normal = sim.run_simulation(ScenarioType::Normal).unwrap();
        let swan = sim.run_simulation(ScenarioType::BlackSwan).unwrap();
        assert!(swan.expected_return < normal.expected_return);
    }

    #[test]
    fn certain_loss_hits_early_stop_and_ruin() {
        let config = MonteCarloConfig::new(10, 500, 10_000.0)
            .with_seed(5)
            .with_sizing(0.10, 0.0)
            .with_scenario(ScenarioType::Crisis, ScenarioParams::new(0.0, 2.0, 0.1, 0.0));
        let r = MonteCarloSimulator::new(config)
            .run_simulation(ScenarioType::Crisis)
            .unwrap();

        // 10% stake every day: capital * 0.9^k drops below 1000 after 22 losses
        let expected = 10_000.0 * 0.9_f64.powi(22);
        assert!(r.final_capital.iter().all(|c| (c - expected).abs() < 1e-6));
        assert!((r.probability_of_ruin - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stake_is_capped_at_max_position_fraction() {
        // 1.0 * 0.5 would stake half the capital; the 10% cap applies instead
        let config = MonteCarloConfig::new(1, 1, 10_000.0)
            .with_seed(1)
            .with_sizing(0.5, 1.0)
            .with_scenario(ScenarioType::Normal, ScenarioParams::new(0.0, 2.0, 0.0, 0.0));
        let r = MonteCarloSimulator::new(config)
            .run_simulation(ScenarioType::Normal)
            .unwrap();
        assert!((r.final_capital[0] - 9_000.0).abs() < 1e-9);
    }

    #[test]
    fn odds_are_floored() {
        // certain win at constant odds 1.2, raised to the 1.5 floor
        let config = MonteCarloConfig {
            odds_floor: 1.5,
            ..MonteCarloConfig::new(1, 1, 1_000.0)
        }
        .with_seed(1)
        .with_sizing(0.1, 0.0)
        .with_scenario(ScenarioType::Normal, ScenarioParams::new(1.0, 1.2, 0.0, 0.0));
        let r = MonteCarloSimulator::new(config)
            .run_simulation(ScenarioType::Normal)
            .unwrap();
        // stake 100 at floored odds 1.5
        assert!((r.final_capital[0] - 1_050.0).abs() < 1e-9);
    }

    // ============================================================
    // Errors
    // ============================================================

    #[test]
    fn zero_simulations_is_an_error() {
        let sim = simulator(0, 10, 1);
        assert_eq!(
            sim.run_simulation(ScenarioType::Normal),
            Err(MonteCarloError::ZeroSimulations)
        );
    }

    #[test]
    fn invalid_scenario_is_rejected() {
        let config = MonteCarloConfig::new(10, 10, 1_000.0)
            .with_scenario(ScenarioType::Stress, ScenarioParams::new(1.5, 2.0, 0.1, 0.1));
        let err = MonteCarloSimulator::new(config)
            .run_simulation(ScenarioType::Stress)
            .unwrap_err();
        assert!(matches!(err, MonteCarloError::InvalidScenario { scenario: ScenarioType::Stress, .. }));
    }

    #[test]
    fn negative_volatility_is_rejected() {
        let config = MonteCarloConfig::new(10, 10, 1_000.0)
            .with_scenario(ScenarioType::Normal, ScenarioParams::new(0.5, 2.0, -0.1, 0.1));
        let err = MonteCarloSimulator::new(config)
            .run_simulation(ScenarioType::Normal)
            .unwrap_err();
        assert!(matches!(err, MonteCarloError::InvalidScenario { scenario: ScenarioType::Normal, .. }));
        assert!(err.to_string().contains("volatility must be non-negative"));
    }

    #[test]
    fn nan_volatility_is_rejected() {
        let config = MonteCarloConfig::new(10, 10, 1_000.0)
            .with_scenario(ScenarioType::Crisis, ScenarioParams::new(0.5, 2.0, f64::NAN, 0.1));
        assert!(MonteCarloSimulator::new(config)
            .run_simulation(ScenarioType::Crisis)
            .is_err());
    }

    #[test]
    fn zero_volatility_is_allowed() {
        let config = MonteCarloConfig::new(10, 10, 1_000.0)
            .with_seed(5)
            .with_scenario(ScenarioType::Normal, ScenarioParams::new(0.5, 2.0, 0.0, 0.1));
        assert!(MonteCarloSimulator::new(config)
            .run_simulation(ScenarioType::Normal)
            .is_ok());
    }

    // ============================================================
    // Loss correlation
    // ============================================================

    #[test]
    fn full_correlation_repeats_the_first_outcome() {
        let initial = 10_000.0;
        let config = MonteCarloConfig::new(200, 40, initial)
            .with_seed(17)
            .with_scenario(ScenarioType::Normal, ScenarioParams::new(0.5, 2.0, 0.2, 1.0));
        let result = MonteCarloSimulator::new(config)
            .run_simulation(ScenarioType::Normal)
            .unwrap();

        let mut winning = 0;
        let mut losing = 0;
        for (final_capital, drawdown) in result.final_capital.iter().zip(&result.max_drawdown) {
            if *final_capital > initial {
                // Every day won: capital only rose
                assert_eq!(*drawdown, 0.0);
                winning += 1;
            } else {
                // Every day lost: the last day is the deepest point below the start
                assert!(*final_capital < initial);
                assert!((drawdown - (final_capital - initial) / initial).abs() < 1e-12);
                losing += 1;
            }
        }
        assert!(winning > 0 && losing > 0);
    }

    // ============================================================
    // Stress test
    // ============================================================

    #[test]
    fn stress_test_covers_full_grid() {
        let sim = simulator(10, 30, 8);
        let result = sim.run_stress_test(&[0.01, 0.05], &[0.0, 0.5, 1.0], 50).unwrap();

        assert_eq!(result.simulations_per_cell, 50);
        assert_eq!(result.scenarios.len(), 4);
        for s in &result.scenarios {
            assert_eq!(s.cells.len(), 6);
            let best = s.best().unwrap();
            let worst = s.worst().unwrap();
            assert!(best.expected_return >= worst.expected_return);
        }
        assert_eq!(result.scenarios[0].cells[1].label(), "pos_0.01_kelly_0.5");
    }
}
