//! Rating-prediction error: RMSE and MAE.
//!
//! Walks every (user, item) pair of the test store and looks the pair up in
//! the predictions. Pairs without a prediction are skipped and counted:
//!
//! - `empty_users`: the user has no predictions at all (every pair of that
//!   user is counted)
//! - `empty_items`: the user has predictions, but not for this item
//!
//! so that `empty_users + empty_items + compared` equals the number of test
//! pairs. With nothing compared the error is undefined (NaN).

use super::{CoverageDiagnostics, Metric, MetricInput, MetricKind, MetricResult};
use crate::data::{PreferenceStore, UserId};
use crate::error::InsufficientDataWarning;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMetricKind {
    /// Root of the mean squared error
    Rmse,
    /// Mean absolute error
    Mae,
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorMetric {
    kind: ErrorMetricKind,
}

/// Running sum of per-pair errors.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, error: f64) {
        self.sum += error;
        self.count += 1;
    }

    fn merge(&mut self, other: Accumulator) {
        self.sum += other.sum;
        self.count += other.count;
    }
}

impl ErrorMetric {
    pub fn rmse() -> Self {
        Self {
            kind: ErrorMetricKind::Rmse,
        }
    }

    pub fn mae() -> Self {
        Self {
            kind: ErrorMetricKind::Mae,
        }
    }

    fn pair_error(&self, actual: f64, predicted: f64) -> f64 {
        let diff = actual - predicted;
        match self.kind {
            ErrorMetricKind::Rmse => diff * diff,
            ErrorMetricKind::Mae => diff.abs(),
        }
    }

    fn finish(&self, acc: Accumulator) -> f64 {
        if acc.count == 0 {
            return f64::NAN;
        }
        let mean = acc.sum / acc.count as f64;
        match self.kind {
            ErrorMetricKind::Rmse => mean.sqrt(),
            ErrorMetricKind::Mae => mean,
        }
    }

    /// Scores `predictions` against every pair of `test`.
    pub fn evaluate(&self, predictions: &PreferenceStore, test: &PreferenceStore) -> MetricResult {
        let mut coverage = CoverageDiagnostics::default();
        let mut warnings = Vec::new();
        let mut total = Accumulator::default();
        let mut per_user: BTreeMap<UserId, f64> = BTreeMap::new();

        for user in test.users() {
            let test_items = test.user_items(user);
            let Some(predicted) = predictions.user_preferences(user) else {
                coverage.empty_users += test_items.len();
                coverage.missing_users += 1;
                warnings.push(InsufficientDataWarning::MissingUser {
                    user,
                    pairs: test_items.len(),
                });
                per_user.insert(user, f64::NAN);
                continue;
            };

            let mut user_acc = Accumulator::default();
            for item in test_items {
                match (test.preference(user, item), predicted.get(&item)) {
                    (Some(actual), Some(&estimate)) => {
                        user_acc.add(self.pair_error(actual, estimate));
                    }
                    _ => coverage.empty_items += 1,
                }
            }
            coverage.compared += user_acc.count;
            total.merge(user_acc);
            per_user.insert(user, self.finish(user_acc));
        }

        if coverage.missing_users > 0 {
            warn!(
                "{} test users ({} pairs) have no predictions",
                coverage.missing_users, coverage.empty_users
            );
        }
        debug!(
            "{:?}: compared {} pairs, skipped {} user pairs and {} item pairs",
            self.kind, coverage.compared, coverage.empty_users, coverage.empty_items
        );

        MetricResult {
            global: self.finish(total),
            per_cutoff: BTreeMap::new(),
            per_user,
            per_user_at_cutoff: BTreeMap::new(),
            coverage: Some(coverage),
            warnings,
        }
    }
}

impl Metric for ErrorMetric {
    fn kind(&self) -> MetricKind {
        match self.kind {
            ErrorMetricKind::Rmse => MetricKind::Rmse,
            ErrorMetricKind::Mae => MetricKind::Mae,
        }
    }

    fn compute(&self, input: &MetricInput<'_>) -> MetricResult {
        self.evaluate(input.predictions, input.test)
    }
}
