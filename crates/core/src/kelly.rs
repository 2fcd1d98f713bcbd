//! Kelly Criterion sizing for decimal-odds bets.
//!
//! For decimal odds `o`, net odds are `b = o - 1` and the full Kelly fraction is:
//! ```text
//! f* = (b*p - q) / b      where q = 1 - p
//! ```
//! The sizer clamps `f*` to `[0, max_full_kelly]` and then applies a partial
//! Kelly multiplier.

use serde::{Deserialize, Serialize};

/// Fractional Kelly sizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KellySizer {
    /// Fraction of (clamped) Kelly to bet, e.g. 0.25 for quarter Kelly.
    pub fraction: f64,
    /// Upper clamp applied to the full Kelly fraction before `fraction`.
    pub max_full_kelly: f64,
}

impl Default for KellySizer {
    fn default() -> Self {
        Self {
            fraction: 0.25,
            max_full_kelly: 0.25,
        }
    }
}

/// Outcome of a sizing calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KellyDecision {
    /// Unclamped Kelly fraction (may be negative).
    pub full_kelly: f64,
    /// Fraction of bankroll to stake after clamping and partial Kelly.
    pub bankroll_fraction: f64,
    /// Why the decision came out this way.
    pub reason: KellyReason,
}

/// Reason attached to a [`KellyDecision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KellyReason {
    /// Positive edge, stake recommended.
    PositiveEdge,
    /// Kelly fraction was zero or negative.
    NoEdge,
    /// Probability outside (0, 1) or odds not above 1.
    InvalidInputs,
}

impl KellySizer {
    #[must_use]
    pub fn new(fraction: f64, max_full_kelly: f64) -> Self {
        Self {
            fraction,
            max_full_kelly,
        }
    }

    /// Full Kelly fraction for win probability `p` at decimal `odds`.
    ///
    /// Returns 0.0 for invalid inputs.
    ///
    /// # Examples
    /// ```
    /// use wager_risk_core::kelly::KellySizer;
    ///
    /// // p = 0.6 at evens: f* = (1*0.6 - 0.4) / 1 = 0.2
    /// assert!((KellySizer::full_kelly(0.6, 2.0) - 0.2).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn full_kelly(p: f64, odds: f64) -> f64 {
        if !Self::inputs_valid(p, odds) {
            return 0.0;
        }
        let b = odds - 1.0;
        let q = 1.0 - p;
        (b * p - q) / b
    }

    /// Sizes a bet as a fraction of bankroll.
    #[must_use]
    pub fn size(&self, p: f64, odds: f64) -> KellyDecision {
        if !Self::inputs_valid(p, odds) {
            return KellyDecision {
                full_kelly: 0.0,
                bankroll_fraction: 0.0,
                reason: KellyReason::InvalidInputs,
            };
        }

        let full_kelly = Self::full_kelly(p, odds);
        // A negative or NaN cap from config sizes to zero
        let cap = self.max_full_kelly.max(0.0);
        let clamped = full_kelly.max(0.0).min(cap);
        let bankroll_fraction = clamped * self.fraction;

        let reason = if bankroll_fraction > 0.0 {
            KellyReason::PositiveEdge
        } else {
            KellyReason::NoEdge
        };

        KellyDecision {
            full_kelly,
            bankroll_fraction,
            reason,
        }
    }

    /// Expected profit per unit staked: `p * (odds - 1) - (1 - p)`.
    #[must_use]
    pub fn expected_value(p: f64, odds: f64) -> f64 {
        p * (odds - 1.0) - (1.0 - p)
    }

    fn inputs_valid(p: f64, odds: f64) -> bool {
        p > 0.0 && p < 1.0 && odds > 1.0 && p.is_finite() && odds.is_finite()
    }
}
