//! Plain-text summaries of backtest, walk-forward and Monte Carlo results.

use crate::backtester::{BacktestResult, ValidationStatus};
use crate::metrics::{MetricKind, ValidationMetrics};
use crate::monte_carlo::{MonteCarloResult, StressTestResult};
use crate::walk_forward::WalkForwardResult;

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────────────────\n";

/// Percentiles of final capital listed in Monte Carlo reports.
const CAPITAL_PERCENTILES: [f64; 7] = [5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0];

pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn backtest(result: &BacktestResult) -> String {
        let mut output = String::new();
        header(&mut output, "RIGOROUS BACKTEST VALIDATION");

        output.push_str(&format!(
            "Status:                {} {}\n",
            status_marker(result.validation_status),
            result.validation_status.as_str().to_uppercase()
        ));
        output.push('\n');

        section(&mut output, "Period");
        match (result.start_date, result.end_date) {
            (Some(start), Some(end)) => {
                output.push_str(&format!("Start:                 {}\n", start.format("%Y-%m-%d")));
                output.push_str(&format!("End:                   {}\n", end.format("%Y-%m-%d")));
                output.push_str(&format!("Span:                  {:.1} years\n", result.span_years()));
            }
            _ => output.push_str("Start/End:             N/A (no trades)\n"),
        }
        output.push_str(&format!("Total Trades:          {}\n", result.total_trades));
        output.push_str(&format!("Winning Trades:        {}\n", result.winning_trades));
        output.push_str(&format!("Losing Trades:         {}\n", result.losing_trades));
        output.push('\n');

        metrics_block(&mut output, "Metrics", &result.metrics);

        if !result.critical_issues.is_empty() {
            section(&mut output, "Critical Issues");
            for issue in &result.critical_issues {
                output.push_str(&format!("  ✗ {issue}\n"));
            }
            output.push('\n');
        }
        if !result.warnings.is_empty() {
            section(&mut output, "Warnings");
            for warning in &result.warnings {
                output.push_str(&format!("  ! {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str(HEAVY_RULE);
        output
    }

    #[must_use]
    pub fn walk_forward(result: &WalkForwardResult) -> String {
        let mut output = String::new();
        header(&mut output, "WALK-FORWARD ANALYSIS");

        section(&mut output, "Summary");
        output.push_str(&format!("Windows Analysed:      {}\n", result.num_windows()));
        output.push_str(&format!("Stability Score:       {:.2}\n", result.stability_score));
        output.push_str(&format!(
            "Overfitting Detected:  {}\n",
            yes_no(result.overfitting_detected)
        ));
        output.push_str(&format!(
            "Performance Decay:     {}\n",
            yes_no(result.performance_degradation)
        ));
        output.push('\n');

        metrics_block(&mut output, "Overall Test Metrics", &result.overall_metrics);

        section(&mut output, "Windows");
        for (i, ((window, train), test)) in result
            .windows
            .iter()
            .zip(&result.train_metrics)
            .zip(&result.test_metrics)
            .enumerate()
        {
            output.push_str(&format!(
                "{:>3}. {} - {}  (train {}, test {})\n",
                i + 1,
                window.train_start.format("%Y-%m-%d"),
                window.test_end.format("%Y-%m-%d"),
                window.train_size,
                window.test_size
            ));
            output.push_str(&format!(
                "     Train Sharpe {:>7.2}  Win Rate {:>6.1}%\n",
                train.sharpe_ratio,
                train.win_rate * 100.0
            ));
            output.push_str(&format!(
                "     Test  Sharpe {:>7.2}  Win Rate {:>6.1}%\n",
                test.sharpe_ratio,
                test.win_rate * 100.0
            ));
            if train.sharpe_ratio > test.sharpe_ratio * 2.0 {
                output.push_str("     ! possible overfitting in this window\n");
            }
            if test.sharpe_ratio < 0.0 {
                output.push_str("     ✗ negative out-of-sample performance\n");
            }
        }
        output.push('\n');

        section(&mut output, "Recommendations");
        if result.stability_score < 0.5 {
            output.push_str("  ! Low stability: review the model\n");
        }
        if result.overfitting_detected {
            output.push_str("  ! Overfitting detected: reduce model complexity\n");
        }
        if result.performance_degradation {
            output.push_str("  ! Performance decay: retrain the model\n");
        }
        if result.is_stable() {
            output.push_str("  ✓ Model is stable out of sample\n");
        }
        output.push('\n');

        output.push_str(HEAVY_RULE);
        output
    }

    #[must_use]
    pub fn monte_carlo(result: &MonteCarloResult) -> String {
        let mut output = String::new();
        header(&mut output, "MONTE CARLO SIMULATION");

        section(&mut output, "Setup");
        output.push_str(&format!(
            "Scenario:              {}\n",
            result.scenario_type.as_str().to_uppercase()
        ));
        output.push_str(&format!("Simulations:           {}\n", result.simulation_count));
        output.push_str(&format!("Horizon:               {} days\n", result.time_horizon));
        output.push_str(&format!("Initial Capital:       ${:.2}\n", result.initial_capital));
        output.push_str(&format!("Seed:                  {}\n", result.seed));
        output.push('\n');

        section(&mut output, "Outcomes");
        output.push_str(&format!("Expected Capital:      ${:.2}\n", result.expected_return));
        output.push_str(&format!(
            "Expected Return:       {:.1}%\n",
            result.expected_return_pct() * 100.0
        ));
        output.push_str(&format!("Best Case:             ${:.2}\n", result.best_case));
        output.push_str(&format!("Worst Case:            ${:.2}\n", result.worst_case));
        output.push_str(&format!("Median Case:           ${:.2}\n", result.median_case));
        output.push('\n');

        section(&mut output, "Risk");
        output.push_str(&format!(
            "Probability of Ruin:   {:.1}%\n",
            result.probability_of_ruin * 100.0
        ));
        output.push_str(&format!("VaR 95%:               ${:.2}\n", result.var_95));
        output.push_str(&format!("CVaR 95%:              ${:.2}\n", result.cvar_95));
        output.push_str(&format!(
            "Mean Max Drawdown:     {:.1}%\n",
            result.mean_max_drawdown() * 100.0
        ));
        output.push_str(&format!(
            "Worst Drawdown:        {:.1}%\n",
            result.worst_drawdown() * 100.0
        ));
        let profitable = result.profitable_count();
        output.push_str(&format!(
            "Profitable Runs:       {} ({:.1}%)\n",
            profitable,
            profitable as f64 / result.simulation_count.max(1) as f64 * 100.0
        ));
        output.push('\n');

        section(&mut output, "Final Capital Percentiles");
        for p in CAPITAL_PERCENTILES {
            output.push_str(&format!("  {:>2.0}%:                  ${:.2}\n", p, result.percentile(p)));
        }
        output.push('\n');

        section(&mut output, "Recommendations");
        if result.probability_of_ruin > 0.10 {
            output.push_str("  ✗ High probability of ruin: reduce position sizes\n");
        } else if result.probability_of_ruin > 0.05 {
            output.push_str("  ! Moderate probability of ruin: monitor closely\n");
        } else {
            output.push_str("  ✓ Low probability of ruin\n");
        }
        if result.var_95 < result.initial_capital * 0.5 {
            output.push_str("  ✗ VaR 95% below half the initial capital\n");
        }
        if result.mean_max_drawdown() < -0.3 {
            output.push_str("  ! High average drawdown: consider a tighter stop loss\n");
        }
        output.push('\n');

        output.push_str(HEAVY_RULE);
        output
    }

    #[must_use]
    pub fn stress_test(result: &StressTestResult) -> String {
        let mut output = String::new();
        header(&mut output, "STRESS TEST");
        output.push_str(&format!(
            "Simulations per cell:  {}\n\n",
            result.simulations_per_cell
        ));

        for scenario in &result.scenarios {
            section(&mut output, &scenario.scenario.as_str().to_uppercase());
            for (tag, cell) in [("Best", scenario.best()), ("Worst", scenario.worst())] {
                let Some(cell) = cell else { continue };
                output.push_str(&format!("{tag} configuration:    {}\n", cell.label()));
                output.push_str(&format!(
                    "  Expected Capital:    ${:.2}\n",
                    cell.expected_return
                ));
                output.push_str(&format!(
                    "  Prob. of Ruin:       {:.1}%\n",
                    cell.probability_of_ruin * 100.0
                ));
                output.push_str(&format!("  VaR 95%:             ${:.2}\n", cell.var_95));
            }
            output.push('\n');
        }

        output.push_str(HEAVY_RULE);
        output
    }
}

fn header(output: &mut String, title: &str) {
    output.push('\n');
    output.push_str(HEAVY_RULE);
    output.push_str(&format!("{title:^63}\n"));
    output.push_str(HEAVY_RULE);
    output.push('\n');
}

fn section(output: &mut String, title: &str) {
    output.push_str(title);
    output.push('\n');
    output.push_str(LIGHT_RULE);
}

fn metrics_block(output: &mut String, title: &str, metrics: &ValidationMetrics) {
    section(output, title);
    for kind in MetricKind::ALL {
        let value = metrics.get(kind);
        let formatted = if kind.is_fraction() {
            format!("{:.2}%", value * 100.0)
        } else {
            format!("{value:.2}")
        };
        output.push_str(&format!("{:<23}{}\n", format!("{}:", kind.label()), formatted));
    }
    output.push('\n');
}

const fn status_marker(status: ValidationStatus) -> &'static str {
    match status {
        ValidationStatus::Passed => "✓",
        ValidationStatus::Warning => "!",
        ValidationStatus::Failed | ValidationStatus::Critical => "✗",
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtester::RigorousBacktester;
    use crate::monte_carlo::MonteCarloSimulator;
    use wager_risk_core::{MonteCarloConfig, ScenarioType};

    #[test]
    fn backtest_report_lists_critical_issues() {
        let result = RigorousBacktester::default().run(&[]);
        let report = ReportFormatter::backtest(&result);

        assert!(report.contains("CRITICAL"));
        assert!(report.contains("insufficient trade count"));
        assert!(report.contains("N/A (no trades)"));
    }

    #[test]
    fn monte_carlo_report_includes_percentiles() {
        let result = MonteCarloSimulator::new(MonteCarloConfig::new(50, 20, 10_000.0).with_seed(4))
            .run_simulation(ScenarioType::Normal)
            .unwrap();
        let report = ReportFormatter::monte_carlo(&result);

        assert!(report.contains("NORMAL"));
        assert!(report.contains("Final Capital Percentiles"));
        assert!(report.contains("95%:"));
    }

    #[test]
    fn stress_report_names_best_and_worst() {
        let result = MonteCarloSimulator::new(MonteCarloConfig::new(10, 10, 1_000.0).with_seed(2))
            .run_stress_test(&[0.01, 0.05], &[0.0], 20)
            .unwrap();
        let report = ReportFormatter::stress_test(&result);

        assert!(report.contains("BLACK_SWAN"));
        assert!(report.contains("Best configuration"));
        assert!(report.contains("Worst configuration"));
    }

    #[test]
    fn metrics_block_formats_fractions_as_percent() {
        let mut out = String::new();
        let metrics = ValidationMetrics {
            win_rate: 0.5,
            ..Default::default()
        };
        metrics_block(&mut out, "M", &metrics);
        assert!(out.contains("Win Rate:              50.00%"));
    }
}
