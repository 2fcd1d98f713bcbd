use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use wager_risk_core::{CapitalConfig, ReturnCalculator, TradeRecord};
use wager_risk_manager::{
    spawn, ActionType, BreakerKind, FinancialRiskManager, PeriodClock, RiskLevel, TradingState,
    DEFAULT_MAILBOX,
};

// ============================================================
// Losing streak
// ============================================================

#[test]
fn five_straight_losses_halt_trading() {
    let manager = FinancialRiskManager::new(
        CapitalConfig::default().with_initial_capital(dec!(10000)),
    );
    let start = Utc.with_ymd_and_hms(2024, 9, 2, 18, 0, 0).unwrap();

    let mut trades = Vec::new();
    for i in 0..3 {
        trades.push(TradeRecord::new(start + Duration::hours(i), "home", "home", dec!(2.0), dec!(100)));
    }
    for i in 3..8 {
        trades.push(TradeRecord::new(start + Duration::hours(i), "home", "away", dec!(2.0), dec!(100)));
    }

    let mut fired = Vec::new();
    for trade in &trades {
        let pnl = ReturnCalculator::trade_return(trade).unwrap();
        if let Some(action) = manager.apply_trade_result_at(pnl, trade.date) {
            fired.push(action);
        }
    }

    let state = manager.snapshot();
    assert_eq!(state.peak_capital, dec!(10300));
    assert_eq!(state.current_capital, dec!(9800));
    assert_eq!(state.consecutive_losses, 5);
    assert!(state.trading_halted);
    assert_eq!(manager.calculate_position_size(0.6, 2.0, 1.0), Decimal::ZERO);

    // Only the streak breaker fired, on the last trade
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].action_type, ActionType::CircuitBreaker);
    assert_eq!(fired[0].risk_level, RiskLevel::High);
    assert_eq!(fired[0].timestamp, trades[7].date);
    assert_eq!(fired[0].message, "5 consecutive losses reached limit of 5");
}

#[test]
fn streak_breaker_is_the_only_rule_breached() {
    let manager = FinancialRiskManager::default();
    for pnl in [dec!(100), dec!(100), dec!(100)] {
        manager.apply_trade_result(pnl);
    }
    for _ in 0..5 {
        manager.apply_trade_result(dec!(-100));
    }

    let trip = manager.breakers().evaluate(&manager.snapshot()).unwrap();
    assert_eq!(trip.rule.kind, BreakerKind::ConsecutiveLosses);
}

// ============================================================
// Replay with period resets
// ============================================================

#[test]
fn daily_resets_keep_small_losses_under_the_daily_limit() {
    let manager = FinancialRiskManager::new(CapitalConfig::default().with_consecutive_loss_limit(100));
    let mut clock = PeriodClock::new();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    // 300 lost per day, two trades a day, for three days
    for day in 0..3 {
        for hour in [0, 4] {
            let at = start + Duration::days(day) + Duration::hours(hour);
            for period in clock.advance(at) {
                manager.reset_period(period);
            }
            manager.apply_trade_result_at(dec!(-150), at);
        }
    }

    assert_eq!(manager.trading_state(), TradingState::Normal);
    let metrics = manager.get_risk_metrics();
    assert_eq!(metrics.daily_pnl, dec!(-300));
    assert_eq!(metrics.weekly_pnl, dec!(-900));
}

// ============================================================
// Actor
// ============================================================

#[tokio::test]
async fn concurrent_handles_preserve_capital_invariant() {
    let manager = Arc::new(FinancialRiskManager::new(
        CapitalConfig::default()
            .with_consecutive_loss_limit(u32::MAX)
            .with_daily_loss_limit(1.0),
    ));
    let (handle, task) = spawn(Arc::clone(&manager), DEFAULT_MAILBOX);

    let mut workers = Vec::new();
    for worker in 0..8 {
        let handle = handle.clone();
        workers.push(tokio::spawn(async move {
            for i in 0..25 {
                let pnl = if (worker + i) % 3 == 0 { dec!(12.5) } else { dec!(-2.5) };
                handle.apply_trade(pnl, Utc::now()).await.unwrap();
            }
        }));
    }
    for worker in workers {
        worker.await.unwrap();
    }

    let state = handle.snapshot().await.unwrap();
    let applied: Decimal = state.trades.iter().map(|t| t.pnl).sum();
    assert_eq!(state.trades.len(), 200);
    assert_eq!(state.current_capital, state.initial_capital + applied);
    assert!(state.peak_capital >= state.current_capital);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}
