//! Ranking and error metrics.
//!
//! | Metric | Name | Relevance | Undefined for a user when |
//! |--------|------|-----------|---------------------------|
//! | [`Precision`] | `precision` | binary | no ranked candidates |
//! | [`Ndcg`] | `ndcg` | graded | no ranked candidates, or IDCG = 0 |
//! | [`Recall`] | `recall` | binary | no ranked candidates, or no relevant test items |
//! | [`ErrorMetric::rmse`] | `rmse` | n/a | no compared pairs |
//! | [`ErrorMetric::mae`] | `mae` | n/a | no compared pairs |
//!
//! Undefined values are `NaN`. They are kept in the per-user maps so callers
//! can see which users were excluded, and skipped by every average.
//!
//! # References
//!
//! - Järvelin & Kekäläinen (2002). "Cumulated gain-based evaluation of IR techniques"
//! - Said & Bellogín (2014). "Comparative recommender system evaluation"

pub mod error_metric;
pub mod ndcg;
pub mod precision;
pub mod recall;

pub use error_metric::{ErrorMetric, ErrorMetricKind};
pub use ndcg::{Gain, Ndcg};
pub use precision::Precision;
pub use recall::Recall;

use crate::data::{PreferenceStore, UserId};
use crate::error::{ConfigError, InsufficientDataWarning};
use crate::ranking::RelevanceSequence;
use crate::strategy::CandidateStrategy;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Registry of known metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    Precision,
    Ndcg,
    Recall,
    Rmse,
    Mae,
}

impl MetricKind {
    pub fn all() -> &'static [MetricKind] {
        &[
            MetricKind::Precision,
            MetricKind::Ndcg,
            MetricKind::Recall,
            MetricKind::Rmse,
            MetricKind::Mae,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Precision => "precision",
            MetricKind::Ndcg => "ndcg",
            MetricKind::Recall => "recall",
            MetricKind::Rmse => "rmse",
            MetricKind::Mae => "mae",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ConfigError::UnknownMetric(name.to_string()))
    }

    /// True for metrics reported at cutoffs.
    pub fn is_ranking(self) -> bool {
        matches!(
            self,
            MetricKind::Precision | MetricKind::Ndcg | MetricKind::Recall
        )
    }

    /// Lower values are better (error metrics).
    pub fn lower_is_better(self) -> bool {
        !self.is_ranking()
    }

    /// Instantiates the metric. `gain` only affects NDCG.
    pub fn build(self, gain: Gain) -> Box<dyn Metric> {
        match self {
            MetricKind::Precision => Box::new(Precision),
            MetricKind::Ndcg => Box::new(Ndcg::new(gain)),
            MetricKind::Recall => Box::new(Recall),
            MetricKind::Rmse => Box::new(ErrorMetric::rmse()),
            MetricKind::Mae => Box::new(ErrorMetric::mae()),
        }
    }
}

/// Everything a metric reads. All stores are borrowed read-only.
#[derive(Clone, Copy)]
pub struct MetricInput<'a> {
    pub predictions: &'a PreferenceStore,
    pub test: &'a PreferenceStore,
    pub strategy: &'a dyn CandidateStrategy,
    pub relevance_threshold: f64,
    pub cutoffs: &'a BTreeSet<usize>,
}

/// A metric is a pure function of its input.
pub trait Metric: Send + Sync {
    fn kind(&self) -> MetricKind;

    fn compute(&self, input: &MetricInput<'_>) -> MetricResult;
}

/// Skip/compare counters reported by the error metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageDiagnostics {
    /// Test pairs skipped because their user has no predictions
    pub empty_users: usize,
    /// Test pairs skipped because the user has predictions but not this item
    pub empty_items: usize,
    /// Test pairs that had a prediction
    pub compared: usize,
    /// Test users with no predictions at all
    pub missing_users: usize,
}

/// Output of one metric computation.
///
/// `NaN` marks an undefined value; `serde_json` writes it as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricResult {
    pub global: f64,
    pub per_cutoff: BTreeMap<usize, f64>,
    pub per_user: BTreeMap<UserId, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub per_user_at_cutoff: BTreeMap<usize, BTreeMap<UserId, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageDiagnostics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<InsufficientDataWarning>,
}

impl MetricResult {
    /// Value at cutoff `k`, NaN if `k` was not computed.
    pub fn at(&self, k: usize) -> f64 {
        self.per_cutoff.get(&k).copied().unwrap_or(f64::NAN)
    }

    /// Number of users with a defined per-user value.
    pub fn defined_users(&self) -> usize {
        self.per_user.values().filter(|v| !v.is_nan()).count()
    }
}

/// Arithmetic mean of the non-NaN values; NaN if there are none.
pub fn mean_defined<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Assembles a ranking-metric result from a per-user scoring function.
///
/// `score(seq, k)` returns the user's value at cutoff `k`, with `None`
/// meaning the whole list. Empty sequences are undefined at every cutoff.
pub(crate) fn ranking_result<F>(
    sequences: &BTreeMap<UserId, RelevanceSequence>,
    cutoffs: &BTreeSet<usize>,
    score: F,
) -> MetricResult
where
    F: Fn(&RelevanceSequence, Option<usize>) -> f64,
{
    let eval = |seq: &RelevanceSequence, k: Option<usize>| {
        if seq.is_empty() {
            f64::NAN
        } else {
            score(seq, k)
        }
    };

    let per_user: BTreeMap<UserId, f64> = sequences
        .iter()
        .map(|(&user, seq)| (user, eval(seq, None)))
        .collect();

    let per_user_at_cutoff: BTreeMap<usize, BTreeMap<UserId, f64>> = cutoffs
        .iter()
        .map(|&k| {
            let values = sequences
                .iter()
                .map(|(&user, seq)| (user, eval(seq, Some(k))))
                .collect();
            (k, values)
        })
        .collect();

    let per_cutoff = per_user_at_cutoff
        .iter()
        .map(|(&k, values)| (k, mean_defined(values.values().copied())))
        .collect();

    MetricResult {
        global: mean_defined(per_user.values().copied()),
        per_cutoff,
        per_user,
        per_user_at_cutoff,
        coverage: None,
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::TestItems;
    use crate::test_utils::{assert_close, store_from};

    #[test]
    fn test_metric_registry() {
        for &kind in MetricKind::all() {
            assert_eq!(MetricKind::from_name(kind.name()), Ok(kind));
            assert_eq!(kind.build(Gain::Linear).kind(), kind);
        }
        assert_eq!(
            MetricKind::from_name("map"),
            Err(ConfigError::UnknownMetric("map".to_string()))
        );
    }

    #[test]
    fn test_mean_defined_skips_nan() {
        assert_close(mean_defined([1.0, f64::NAN, 0.0]), 0.5);
        assert!(mean_defined([f64::NAN]).is_nan());
        assert!(mean_defined(Vec::<f64>::new()).is_nan());
    }

    #[test]
    fn test_identical_predictions_scenario() {
        let test = store_from(&[(1, 1, 5.0), (1, 2, 3.0), (2, 1, 4.0)]);
        let predictions = test.clone();
        let strategy = TestItems::new(&test);
        let cutoffs: BTreeSet<usize> = [1].into_iter().collect();
        let input = MetricInput {
            predictions: &predictions,
            test: &test,
            strategy: &strategy,
            relevance_threshold: 3.0,
            cutoffs: &cutoffs,
        };

        let rmse = ErrorMetric::rmse().compute(&input);
        assert_close(rmse.global, 0.0);

        let precision = Precision.compute(&input);
        assert_close(precision.at(1), 1.0);

        let ndcg = Ndcg::new(Gain::Linear).compute(&input);
        assert_close(ndcg.per_user_at_cutoff[&1][&1], 1.0);
        assert_close(ndcg.per_user_at_cutoff[&1][&2], 1.0);
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let result = MetricResult {
            global: f64::NAN,
            per_cutoff: [(5, f64::NAN)].into_iter().collect(),
            ..MetricResult::default()
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""global":null"#));
        assert!(json.contains(r#""5":null"#));
    }
}
