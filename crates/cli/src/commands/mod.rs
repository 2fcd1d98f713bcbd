//! CLI commands for strategy validation and risk replay.

pub mod backtest;
pub mod monte_carlo;
pub mod output;
pub mod replay;
pub mod walk_forward;

pub use backtest::{run_backtest, BacktestArgs};
pub use monte_carlo::{run_monte_carlo, MonteCarloArgs};
pub use replay::{run_replay, ReplayArgs};
pub use stress_test::{run_stress_test, StressTestArgs};
pub use walk_forward::{run_walk_forward, WalkForwardArgs};
