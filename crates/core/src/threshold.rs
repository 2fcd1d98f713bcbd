//! Generic limit checks shared by metric validation and circuit breakers.
//!
//! A [`Threshold`] pairs a bound with a [`Comparison`]. `is_breached` is the
//! single evaluation point; NaN never satisfies a threshold.

use serde::{Deserialize, Serialize};

/// How an observed value must relate to its bound to be acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Acceptable when `value >= bound`.
    AtLeast,
    /// Acceptable when `value <= bound`.
    AtMost,
    /// Acceptable when `value < bound`.
    Below,
}

impl Comparison {
    /// Symbol describing the breaching relation, for messages.
    #[must_use]
    pub const fn breach_symbol(self) -> &'static str {
        match self {
            Self::AtLeast => "<",
            Self::AtMost => ">",
            Self::Below => ">=",
        }
    }
}

/// A bound and the comparison that must hold against it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub bound: f64,
    pub comparison: Comparison,
}

impl Threshold {
    #[must_use]
    pub const fn at_least(bound: f64) -> Self {
        Self {
            bound,
            comparison: Comparison::AtLeast,
        }
    }

    #[must_use]
    pub const fn at_most(bound: f64) -> Self {
        Self {
            bound,
            comparison: Comparison::AtMost,
        }
    }

    #[must_use]
    pub const fn below(bound: f64) -> Self {
        Self {
            bound,
            comparison: Comparison::Below,
        }
    }

    /// Returns true if `value` violates the threshold.
    #[must_use]
    pub fn is_breached(&self, value: f64) -> bool {
        let ok = match self.comparison {
            Comparison::AtLeast => value >= self.bound,
            Comparison::AtMost => value <= self.bound,
            Comparison::Below => value < self.bound,
        };
        !ok
    }
}

/// Severity of a breached rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// Evaluates a critical/warning pair: the critical bound is checked first,
/// the warning bound only if the critical one holds.
#[must_use]
pub fn classify(
    value: f64,
    critical: Option<&Threshold>,
    warning: Option<&Threshold>,
) -> Option<(Severity, Threshold)> {
    if let Some(t) = critical.filter(|t| t.is_breached(value)) {
        return Some((Severity::Critical, *t));
    }
    warning
        .filter(|t| t.is_breached(value))
        .map(|t| (Severity::Warning, *t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_least_breached_below_bound() {
        let t = Threshold::at_least(1.5);
        assert!(t.is_breached(1.49));
        assert!(!t.is_breached(1.5));
        assert!(!t.is_breached(f64::INFINITY));
    }

    #[test]
    fn at_most_breached_above_bound() {
        let t = Threshold::at_most(0.2);
        assert!(t.is_breached(0.21));
        assert!(!t.is_breached(0.2));
    }

    #[test]
    fn below_breached_at_bound() {
        let t = Threshold::below(5.0);
        assert!(t.is_breached(5.0));
        assert!(!t.is_breached(4.0));
    }

    #[test]
    fn nan_always_breaches() {
        assert!(Threshold::at_least(0.0).is_breached(f64::NAN));
        assert!(Threshold::at_most(0.0).is_breached(f64::NAN));
        assert!(Threshold::below(0.0).is_breached(f64::NAN));
    }

    #[test]
    fn classify_prefers_critical() {
        let crit = Threshold::at_most(0.20);
        let warn = Threshold::at_most(0.15);
        assert_eq!(
            classify(0.25, Some(&crit), Some(&warn)).map(|(s, _)| s),
            Some(Severity::Critical)
        );
        assert_eq!(
            classify(0.18, Some(&crit), Some(&warn)).map(|(s, _)| s),
            Some(Severity::Warning)
        );
        assert_eq!(classify(0.10, Some(&crit), Some(&warn)), None);
    }

    #[test]
    fn classify_warning_only_rule() {
        let warn = Threshold::at_least(1.0);
        assert_eq!(
            classify(0.5, None, Some(&warn)).map(|(s, _)| s),
            Some(Severity::Warning)
        );
    }
}
