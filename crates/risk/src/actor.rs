//! Mailbox front-end for a shared [`FinancialRiskManager`].
//!
//! [`RiskActor`] drains a tokio `mpsc` channel and applies each command in
//! arrival order; [`RiskHandle`] is the cloneable sender side. Requests that
//! need an answer carry a `oneshot` reply channel.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::calendar::Period;
use crate::manager::FinancialRiskManager;
use crate::types::{RiskAction, RiskMetrics, RiskState, TradingState};

/// Default mailbox capacity for [`spawn`].
pub const DEFAULT_MAILBOX: usize = 64;

#[derive(Debug)]
pub enum RiskCommand {
    ApplyTrade {
        pnl: Decimal,
        at: DateTime<Utc>,
        reply: oneshot::Sender<Option<RiskAction>>,
    },
    PositionSize {
        win_prob: f64,
        odds: f64,
        confidence: f64,
        reply: oneshot::Sender<Decimal>,
    },
    Resume {
        reason: String,
        reply: oneshot::Sender<TradingState>,
    },
    EmergencyStop {
        reason: String,
    },
    ClearEmergencyStop {
        reason: String,
        reply: oneshot::Sender<TradingState>,
    },
    Reset(Period),
    GetMetrics(oneshot::Sender<RiskMetrics>),
    GetTradingState(oneshot::Sender<TradingState>),
    GetSnapshot(oneshot::Sender<RiskState>),
    Shutdown,
}

pub struct RiskActor {
    manager: Arc<FinancialRiskManager>,
    rx: mpsc::Receiver<RiskCommand>,
}

impl RiskActor {
    #[must_use]
    pub const fn new(manager: Arc<FinancialRiskManager>, rx: mpsc::Receiver<RiskCommand>) -> Self {
        Self { manager, rx }
    }

    /// Processes commands until [`RiskCommand::Shutdown`] or until every
    /// handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("risk actor starting");

        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                RiskCommand::ApplyTrade { pnl, at, reply } => {
                    let action = self.manager.apply_trade_result_at(pnl, at);
                    let _ = reply.send(action);
                }
                RiskCommand::PositionSize {
                    win_prob,
                    odds,
                    confidence,
                    reply,
                } => {
                    let size = self.manager.calculate_position_size(win_prob, odds, confidence);
                    let _ = reply.send(size);
                }
                RiskCommand::Resume { reason, reply } => {
                    let _ = reply.send(self.manager.resume_trading(&reason));
                }
                RiskCommand::EmergencyStop { reason } => {
                    self.manager.trigger_emergency_stop(&reason);
                }
                RiskCommand::ClearEmergencyStop { reason, reply } => {
                    let _ = reply.send(self.manager.clear_emergency_stop(&reason));
                }
                RiskCommand::Reset(period) => self.manager.reset_period(period),
                RiskCommand::GetMetrics(reply) => {
                    let _ = reply.send(self.manager.get_risk_metrics());
                }
                RiskCommand::GetTradingState(reply) => {
                    let _ = reply.send(self.manager.trading_state());
                }
                RiskCommand::GetSnapshot(reply) => {
                    let _ = reply.send(self.manager.snapshot());
                }
                RiskCommand::Shutdown => {
                    tracing::info!("risk actor shutting down");
                    break;
                }
            }
        }

        tracing::info!("risk actor stopped");
    }
}

#[derive(Clone)]
pub struct RiskHandle {
    tx: mpsc::Sender<RiskCommand>,
}

impl RiskHandle {
    #[must_use]
    pub const fn new(tx: mpsc::Sender<RiskCommand>) -> Self {
        Self { tx }
    }

    /// Applies a settled trade and returns the breaker action it caused.
    ///
    /// # Errors
    /// Returns an error if the actor has stopped.
    pub async fn apply_trade(&self, pnl: Decimal, at: DateTime<Utc>) -> Result<Option<RiskAction>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RiskCommand::ApplyTrade { pnl, at, reply }).await?;
        Ok(rx.await?)
    }

    /// # Errors
    /// Returns an error if the actor has stopped.
    pub async fn position_size(&self, win_prob: f64, odds: f64, confidence: f64) -> Result<Decimal> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RiskCommand::PositionSize {
                win_prob,
                odds,
                confidence,
                reply,
            })
            .await?;
        Ok(rx.await?)
    }

    /// # Errors
    /// Returns an error if the actor has stopped.
    pub async fn resume(&self, reason: impl Into<String>) -> Result<TradingState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RiskCommand::Resume {
                reason: reason.into(),
                reply,
            })
            .await?;
        Ok(rx.await?)
    }

    /// # Errors
    /// Returns an error if the command cannot be sent to the actor.
    pub async fn emergency_stop(&self, reason: impl Into<String>) -> Result<()> {
        self.tx
            .send(RiskCommand::EmergencyStop {
                reason: reason.into(),
            })
            .await?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if the actor has stopped.
    pub async fn clear_emergency_stop(&self, reason: impl Into<String>) -> Result<TradingState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RiskCommand::ClearEmergencyStop {
                reason: reason.into(),
                reply,
            })
            .await?;
        Ok(rx.await?)
    }

    /// # Errors
    /// Returns an error if the command cannot be sent to the actor.
    pub async fn reset(&self, period: Period) -> Result<()> {
        self.tx.send(RiskCommand::Reset(period)).await?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if the actor has stopped.
    pub async fn metrics(&self) -> Result<RiskMetrics> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RiskCommand::GetMetrics(reply)).await?;
        Ok(rx.await?)
    }

    /// # Errors
    /// Returns an error if the actor has stopped.
    pub async fn trading_state(&self) -> Result<TradingState> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RiskCommand::GetTradingState(reply)).await?;
        Ok(rx.await?)
    }

    /// # Errors
    /// Returns an error if the actor has stopped.
    pub async fn snapshot(&self) -> Result<RiskState> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RiskCommand::GetSnapshot(reply)).await?;
        Ok(rx.await?)
    }

    /// # Errors
    /// Returns an error if the command cannot be sent to the actor.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(RiskCommand::Shutdown).await?;
        Ok(())
    }
}

/// Spawns an actor over `manager` on the current tokio runtime.
#[must_use]
pub fn spawn(manager: Arc<FinancialRiskManager>, mailbox: usize) -> (RiskHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(mailbox.max(1));
    let task = tokio::spawn(RiskActor::new(manager, rx).run());
    (RiskHandle::new(tx), task)
}
