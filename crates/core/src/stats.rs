//! Descriptive statistics over `f64` samples.
//!
//! Percentiles use linear interpolation between closest ranks. Standard
//! deviations come in two flavours: [`sample_std_dev`] (n - 1) and
//! [`population_std_dev`] (n). Degenerate inputs return 0.0 rather than NaN.

/// Arithmetic mean, 0.0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator), 0.0 when n < 2.
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Population standard deviation (n denominator), 0.0 for an empty slice.
#[must_use]
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Returns a sorted copy of the values (NaN sorts last).
#[must_use]
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Percentile of an already sorted slice, `p` in `[0, 100]`.
#[must_use]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let weight = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * weight
        }
    }
}

/// Percentile of unsorted values, `p` in `[0, 100]`.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    percentile_sorted(&sorted(values), p)
}

/// Historical value at risk and expected shortfall at the given tail percentile.
///
/// Returns `(var, cvar)` where `var` is the `tail_pct` percentile and `cvar`
/// is the mean of all values at or below it.
#[must_use]
pub fn var_cvar(values: &[f64], tail_pct: f64) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let var = percentile(values, tail_pct);
    let tail: Vec<f64> = values.iter().copied().filter(|v| *v <= var).collect();
    let cvar = if tail.is_empty() { var } else { mean(&tail) };
    (var, cvar)
}

/// Bias-corrected sample skewness (adjusted Fisher-Pearson).
///
/// Returns 0.0 for fewer than 3 values or zero variance.
#[must_use]
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let nf = n as f64;
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / nf;
    if m2 <= f64::EPSILON * m.abs().max(1.0) {
        return 0.0;
    }
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / nf;
    let g1 = m3 / m2.powf(1.5);
    (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * g1
}

/// Bias-corrected sample excess kurtosis.
///
/// Returns 0.0 for fewer than 4 values or zero variance.
#[must_use]
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return 0.0;
    }
    let nf = n as f64;
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    if m2 <= f64::EPSILON * m.abs().max(1.0) {
        return 0.0;
    }
    let m4 = values.iter().map(|v| (v - m).powi(4)).sum::<f64>();
    let s2 = m2 / (nf - 1.0);

    let scale = nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0));
    let correction = 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0));
    scale * m4 / (s2 * s2) - correction
}

/// Coefficient of variation (population σ / mean), 0.0 when the mean is zero.
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    population_std_dev(values) / m
}
