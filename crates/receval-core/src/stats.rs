//! Significance testing for comparing two systems on the same users.
//!
//! Per-user metric values from two evaluations are paired by user id; users
//! undefined (NaN) on either side are dropped from the pairing.
//!
//! - [`paired_t_test`]: two-tailed paired t-test (Student's t via `elinor`)
//! - [`cohens_d`]: standardized mean difference
//! - [`bootstrap_ci`]: percentile bootstrap interval for a mean
//!
//! # References
//!
//! - Efron & Tibshirani (1993). "An Introduction to the Bootstrap"
//! - Smucker et al. (2007). "A comparison of statistical significance tests for IR evaluation"

use crate::data::UserId;
use elinor::statistical_tests::StudentTTest;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean with a 95% percentile-bootstrap interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapResult {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

impl BootstrapResult {
    /// "mean [lower, upper]" with `precision` decimals.
    pub fn format(&self, precision: usize) -> String {
        format!(
            "{:.prec$} [{:.prec$}, {:.prec$}]",
            self.mean,
            self.lower,
            self.upper,
            prec = precision
        )
    }
}

/// Resamples `values` with replacement `n_resamples` times and takes the
/// 2.5th and 97.5th percentiles of the resampled means. NaN values are
/// ignored; with nothing left every field is NaN.
pub fn bootstrap_ci(values: &[f64], n_resamples: usize, seed: u64) -> BootstrapResult {
    let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = values.len();
    if n == 0 || n_resamples == 0 {
        let mean = mean(&values);
        return BootstrapResult {
            mean,
            lower: f64::NAN,
            upper: f64::NAN,
        };
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut means: Vec<f64> = (0..n_resamples)
        .map(|_| (0..n).map(|_| values[rng.gen_range(0..n)]).sum::<f64>() / n as f64)
        .collect();
    means.sort_by(f64::total_cmp);

    let at = |q: f64| means[((n_resamples as f64 * q) as usize).min(n_resamples - 1)];
    BootstrapResult {
        mean: mean(&values),
        lower: at(0.025),
        upper: at(0.975),
    }
}

/// Outcome of a paired t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    /// Positive when system A scores higher on average
    pub t_statistic: f64,
    /// Two-tailed
    pub p_value: f64,
    pub df: usize,
    /// Number of users paired
    pub pairs: usize,
    /// Mean of `a - b`
    pub mean_difference: f64,
}

impl TTestResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    pub fn format(&self) -> String {
        let marker = if self.is_significant(0.05) { "*" } else { "" };
        format!(
            "t({})={:.3}, p={:.4}{}",
            self.df, self.t_statistic, self.p_value, marker
        )
    }
}

/// Users defined on both sides, with their `(a, b)` values.
pub fn pair_by_user(
    a: &BTreeMap<UserId, f64>,
    b: &BTreeMap<UserId, f64>,
) -> Vec<(UserId, f64, f64)> {
    a.iter()
        .filter(|(_, va)| !va.is_nan())
        .filter_map(|(&user, &va)| match b.get(&user) {
            Some(&vb) if !vb.is_nan() => Some((user, va, vb)),
            _ => None,
        })
        .collect()
}

/// Paired two-tailed t-test over the users both systems were scored on.
///
/// Returns `None` with fewer than two pairs. Identical systems give `t = 0`
/// and `p = 1`; a constant non-zero difference gives an infinite `t` and
/// `p = 0`.
pub fn paired_t_test(a: &BTreeMap<UserId, f64>, b: &BTreeMap<UserId, f64>) -> Option<TTestResult> {
    let pairs: Vec<(f64, f64)> = pair_by_user(a, b)
        .into_iter()
        .map(|(_, va, vb)| (va, vb))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let diffs: Vec<f64> = pairs.iter().map(|(va, vb)| va - vb).collect();
    let mean_difference = mean(&diffs);

    let (t_statistic, p_value) = if sample_variance(&diffs, mean_difference) > 0.0 {
        let stat = StudentTTest::from_paired_samples(pairs.iter().copied()).ok()?;
        // sign follows `a - b`
        (stat.t_stat().abs() * mean_difference.signum(), stat.p_value())
    } else if mean_difference == 0.0 {
        (0.0, 1.0)
    } else {
        (mean_difference.signum() * f64::INFINITY, 0.0)
    };

    Some(TTestResult {
        t_statistic,
        p_value,
        df: n - 1,
        pairs: n,
        mean_difference,
    })
}

/// Cohen's d with pooled standard deviation. Positive when `a` is larger.
/// NaN values are ignored; returns 0 when either group has fewer than two
/// values or the pooled deviation is zero.
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    let a: Vec<f64> = a.iter().copied().filter(|v| !v.is_nan()).collect();
    let b: Vec<f64> = b.iter().copied().filter(|v| !v.is_nan()).collect();
    let (n_a, n_b) = (a.len(), b.len());
    if n_a < 2 || n_b < 2 {
        return 0.0;
    }

    let (mean_a, mean_b) = (mean(&a), mean(&b));
    let pooled = ((n_a - 1) as f64 * sample_variance(&a, mean_a)
        + (n_b - 1) as f64 * sample_variance(&b, mean_b))
        / (n_a + n_b - 2) as f64;
    let pooled_std = pooled.sqrt();

    if pooled_std == 0.0 {
        0.0
    } else {
        (mean_a - mean_b) / pooled_std
    }
}

/// Cohen's conventional labels for |d|.
pub fn interpret_cohens_d(d: f64) -> &'static str {
    match d.abs() {
        x if x < 0.2 => "negligible",
        x if x < 0.5 => "small",
        x if x < 0.8 => "medium",
        _ => "large",
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sample_variance(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}
