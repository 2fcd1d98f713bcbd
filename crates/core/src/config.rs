use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub metrics: MetricsConfig,
    pub capital: CapitalConfig,
    pub backtest: BacktestConfig,
    pub walk_forward: WalkForwardConfig,
    pub monte_carlo: MonteCarloConfig,
}

/// Annualisation and benchmark settings for the metrics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Trading periods per year used for annualisation.
    pub periods_per_year: f64,
    /// Annual risk-free rate subtracted in Sharpe and Sortino.
    pub risk_free_rate: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 252.0,
            risk_free_rate: 0.02,
        }
    }
}

/// Live capital limits enforced by the risk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapitalConfig {
    pub initial_capital: Decimal,
    /// Drawdown from peak that halts trading.
    pub max_drawdown_limit: f64,
    /// Daily loss, as a fraction of current capital, that halts trading.
    pub daily_loss_limit: f64,
    pub weekly_loss_limit: f64,
    pub monthly_loss_limit: f64,
    /// Consecutive losing trades that halt trading.
    pub consecutive_loss_limit: u32,
    /// Maximum single position as a fraction of current capital.
    pub position_size_limit: f64,
    /// Partial Kelly multiplier.
    pub kelly_fraction: f64,
    /// Clamp applied to the full Kelly fraction.
    pub max_kelly_fraction: f64,
    /// Drawdown that logs a stop-loss warning without halting.
    pub stop_loss_drawdown: f64,
    /// Number of most recent trades used for rolling risk metrics.
    pub metrics_window: usize,
}

impl Default for CapitalConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::new(10_000, 0),
            max_drawdown_limit: 0.20,
            daily_loss_limit: 0.05,
            weekly_loss_limit: 0.15,
            monthly_loss_limit: 0.25,
            consecutive_loss_limit: 5,
            position_size_limit: 0.05,
            kelly_fraction: 0.25,
            max_kelly_fraction: 0.25,
            stop_loss_drawdown: 0.15,
            metrics_window: 30,
        }
    }
}

impl CapitalConfig {
    #[must_use]
    pub fn with_initial_capital(mut self, capital: Decimal) -> Self {
        self.initial_capital = capital;
        self
    }

    #[must_use]
    pub fn with_consecutive_loss_limit(mut self, limit: u32) -> Self {
        self.consecutive_loss_limit = limit;
        self
    }

    #[must_use]
    pub fn with_daily_loss_limit(mut self, limit: f64) -> Self {
        self.daily_loss_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_drawdown_limit(mut self, limit: f64) -> Self {
        self.max_drawdown_limit = limit;
        self
    }

    #[must_use]
    pub fn with_position_size_limit(mut self, limit: f64) -> Self {
        self.position_size_limit = limit;
        self
    }
}

/// Minimum data requirements for a rigorous backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Minimum span between first and last trade, in years of 365.25 days.
    pub min_years: f64,
    pub min_trades: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            min_years: 3.0,
            min_trades: 100,
        }
    }
}

impl BacktestConfig {
    #[must_use]
    pub fn new(min_years: f64, min_trades: usize) -> Self {
        Self {
            min_years,
            min_trades,
        }
    }
}

/// Window geometry and decision ratios for walk-forward analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    pub train_months: u32,
    pub test_months: u32,
    /// How far each window start advances.
    pub step_months: u32,
    pub min_train_trades: usize,
    pub min_test_trades: usize,
    /// Overfitting is flagged when mean train Sharpe exceeds this multiple of mean test Sharpe.
    pub overfitting_ratio: f64,
    /// Number of leading and trailing test windows compared for decay.
    pub degradation_lookback: usize,
    /// Decay is flagged when the trailing mean falls below this multiple of the leading mean.
    pub degradation_ratio: f64,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_months: 12,
            test_months: 3,
            step_months: 1,
            min_train_trades: 50,
            min_test_trades: 20,
            overfitting_ratio: 1.5,
            degradation_lookback: 3,
            degradation_ratio: 0.7,
        }
    }
}

impl WalkForwardConfig {
    /// Creates a config with custom window lengths; step defaults to one month.
    #[must_use]
    pub fn new(train_months: u32, test_months: u32) -> Self {
        Self {
            train_months,
            test_months,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_step_months(mut self, step_months: u32) -> Self {
        self.step_months = step_months;
        self
    }

    #[must_use]
    pub fn with_min_trades(mut self, min_train_trades: usize, min_test_trades: usize) -> Self {
        self.min_train_trades = min_train_trades;
        self.min_test_trades = min_test_trades;
        self
    }
}

/// Named market regimes for Monte Carlo stress testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    Normal,
    Stress,
    Crisis,
    BlackSwan,
}

impl ScenarioType {
    pub const ALL: [Self; 4] = [Self::Normal, Self::Stress, Self::Crisis, Self::BlackSwan];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Stress => "stress",
            Self::Crisis => "crisis",
            Self::BlackSwan => "black_swan",
        }
    }

    /// Built-in parameters for the scenario.
    #[must_use]
    pub const fn default_params(self) -> ScenarioParams {
        match self {
            Self::Normal => ScenarioParams::new(0.55, 2.0, 0.15, 0.1),
            Self::Stress => ScenarioParams::new(0.45, 1.8, 0.25, 0.3),
            Self::Crisis => ScenarioParams::new(0.35, 1.6, 0.40, 0.6),
            Self::BlackSwan => ScenarioParams::new(0.25, 1.4, 0.60, 0.8),
        }
    }
}

impl std::fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScenarioType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "normal" => Ok(Self::Normal),
            "stress" => Ok(Self::Stress),
            "crisis" => Ok(Self::Crisis),
            "black_swan" | "blackswan" => Ok(Self::BlackSwan),
            other => Err(format!(
                "Invalid scenario: '{other}'. Valid values: normal, stress, crisis, black_swan"
            )),
        }
    }
}

/// Distribution parameters of a Monte Carlo scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// Probability that a simulated bet wins.
    pub win_rate: f64,
    /// Mean of the simulated decimal odds.
    pub average_odds: f64,
    /// Odds dispersion, relative to `average_odds`.
    pub volatility: f64,
    /// Probability that a day repeats the sign of the previous day's return.
    pub loss_correlation: f64,
}

impl ScenarioParams {
    #[must_use]
    pub const fn new(win_rate: f64, average_odds: f64, volatility: f64, loss_correlation: f64) -> Self {
        Self {
            win_rate,
            average_odds,
            volatility,
            loss_correlation,
        }
    }
}

/// Per-regime parameters, keyed by [`ScenarioType`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioTable {
    pub normal: ScenarioParams,
    pub stress: ScenarioParams,
    pub crisis: ScenarioParams,
    pub black_swan: ScenarioParams,
}

impl Default for ScenarioTable {
    fn default() -> Self {
        Self {
            normal: ScenarioType::Normal.default_params(),
            stress: ScenarioType::Stress.default_params(),
            crisis: ScenarioType::Crisis.default_params(),
            black_swan: ScenarioType::BlackSwan.default_params(),
        }
    }
}

impl ScenarioTable {
    #[must_use]
    pub const fn get(&self, scenario: ScenarioType) -> ScenarioParams {
        match scenario {
            ScenarioType::Normal => self.normal,
            ScenarioType::Stress => self.stress,
            ScenarioType::Crisis => self.crisis,
            ScenarioType::BlackSwan => self.black_swan,
        }
    }

    pub fn get_mut(&mut self, scenario: ScenarioType) -> &mut ScenarioParams {
        match scenario {
            ScenarioType::Normal => &mut self.normal,
            ScenarioType::Stress => &mut self.stress,
            ScenarioType::Crisis => &mut self.crisis,
            ScenarioType::BlackSwan => &mut self.black_swan,
        }
    }
}

/// Simulation sizing, horizon and scenario table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub initial_capital: f64,
    pub simulations: usize,
    /// Trading days per trial.
    pub time_horizon: usize,
    /// Base seed; trial `i` uses `seed + i`.
    pub seed: Option<u64>,
    /// Fraction of capital staked per bet.
    pub position_size: f64,
    /// Kelly multiplier on `position_size`; zero means fixed-fraction sizing.
    pub kelly_fraction: f64,
    /// Stake cap as a fraction of current capital.
    pub max_position_fraction: f64,
    /// Lower bound for simulated odds.
    pub odds_floor: f64,
    /// A trial stops once capital drops below this fraction of the initial capital.
    pub early_stop_fraction: f64,
    /// Trials ending below this fraction of initial capital count as ruined.
    pub ruin_fraction: f64,
    pub scenarios: ScenarioTable,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            simulations: 10_000,
            time_horizon: 252,
            seed: None,
            position_size: 0.05,
            kelly_fraction: 0.25,
            max_position_fraction: 0.10,
            odds_floor: 1.1,
            early_stop_fraction: 0.10,
            ruin_fraction: 0.20,
            scenarios: ScenarioTable::default(),
        }
    }
}

impl MonteCarloConfig {
    #[must_use]
    pub fn new(simulations: usize, time_horizon: usize, initial_capital: f64) -> Self {
        Self {
            simulations,
            time_horizon,
            initial_capital,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_sizing(mut self, position_size: f64, kelly_fraction: f64) -> Self {
        self.position_size = position_size;
        self.kelly_fraction = kelly_fraction;
        self
    }

    #[must_use]
    pub fn with_scenario(mut self, scenario: ScenarioType, params: ScenarioParams) -> Self {
        *self.scenarios.get_mut(scenario) = params;
        self
    }

    #[must_use]
    pub fn scenario_params(&self, scenario: ScenarioType) -> ScenarioParams {
        self.scenarios.get(scenario)
    }
}
