//! End-to-end evaluation: split → recommend → filter → score → aggregate.
//!
//! ```text
//! PreferenceStore ─▶ Splitter ─▶ (train, test)*
//!                                   │
//!                 Recommender(train)▼
//!                             predictions ─▶ CandidateStrategy filter ─▶ metrics ─▶ FoldReport
//!                                                                                    │
//!                                                                   aggregate ◀──────┘
//! ```
//!
//! [`Evaluator::new`] resolves every registry name up front, so a bad
//! strategy or metric name fails before any data is read.

use crate::config::EvaluationConfig;
use crate::data::{PreferenceStore, UserId};
use crate::error::{ConfigError, InsufficientDataWarning};
use crate::metrics::{mean_defined, CoverageDiagnostics, Metric, MetricInput, MetricResult};
use crate::recommend::{generate_predictions, RecommenderKind};
use crate::split::{
    CrossValidationSplitter, Fold, RandomSplitter, SplitOutcome, Splitter, SplitterKind,
};
use crate::strategy::{filter_predictions, StrategyContext, StrategyKind};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Metric results of one fold, keyed by metric name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldReport {
    pub index: usize,
    pub metrics: BTreeMap<String, MetricResult>,
    /// Users the recommender could not serve
    pub recommendation_failures: usize,
}

/// Results averaged over folds plus the per-fold detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub strategy: String,
    pub metrics: BTreeMap<String, MetricResult>,
    pub folds: Vec<FoldReport>,
    pub warnings: Vec<InsufficientDataWarning>,
}

/// A validated evaluation protocol.
pub struct Evaluator {
    config: EvaluationConfig,
    strategy: StrategyKind,
    metrics: Vec<Box<dyn Metric>>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = StrategyKind::from_name(&config.strategy)?;
        let metrics = config
            .metric_kinds()?
            .into_iter()
            .map(|kind| kind.build(config.ndcg_gain))
            .collect();
        Ok(Self {
            config,
            strategy,
            metrics,
        })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Splits `store` with the configured splitter.
    pub fn split(&self, store: &PreferenceStore) -> Result<SplitOutcome, ConfigError> {
        let c = &self.config;
        let outcome = match c.splitter {
            SplitterKind::Random => RandomSplitter::new(c.test_fraction, c.per_user, c.seed)?
                .with_keep_order(c.keep_order)
                .with_num_folds(c.num_folds)?
                .split(store),
            SplitterKind::CrossValidation => {
                CrossValidationSplitter::new(c.num_folds, c.per_user, c.seed)?.split(store)
            }
        };
        Ok(outcome)
    }

    /// Scores `predictions` for one train/test pair.
    pub fn evaluate_fold(
        &self,
        index: usize,
        train: &PreferenceStore,
        test: &PreferenceStore,
        predictions: &PreferenceStore,
    ) -> FoldReport {
        let strategy = self.strategy.build(StrategyContext {
            train,
            test,
            relevance_threshold: self.config.relevance_threshold,
            rel_plus_n: self.config.rel_plus_n,
            seed: self.config.seed,
        });
        let filtered = filter_predictions(predictions, strategy.as_ref());

        let input = MetricInput {
            predictions: &filtered,
            test,
            strategy: strategy.as_ref(),
            relevance_threshold: self.config.relevance_threshold,
            cutoffs: &self.config.cutoffs,
        };

        let metrics = self
            .metrics
            .iter()
            .map(|metric| {
                let result = metric.compute(&input);
                info!(
                    "Fold {} {}: {:.4}",
                    index,
                    metric.kind().name(),
                    result.global
                );
                (metric.kind().name().to_string(), result)
            })
            .collect();

        FoldReport {
            index,
            metrics,
            recommendation_failures: 0,
        }
    }

    /// Fits `recommender` on the fold's train set, predicts for every test
    /// user and scores the predictions.
    pub fn run_fold(
        &self,
        fold: &Fold,
        recommender: RecommenderKind,
        how_many: Option<usize>,
    ) -> FoldReport {
        let model = recommender.fit(&fold.train);
        let (predictions, failures) =
            generate_predictions(model.as_ref(), &fold.train, fold.test.users(), how_many);
        let mut report = self.evaluate_fold(fold.index, &fold.train, &fold.test, &predictions);
        report.recommendation_failures = failures.len();
        report
    }

    /// Full pipeline over a raw dataset.
    pub fn run(
        &self,
        store: &PreferenceStore,
        recommender: RecommenderKind,
        how_many: Option<usize>,
    ) -> Result<EvaluationReport, ConfigError> {
        let outcome = self.split(store)?;
        let folds: Vec<FoldReport> = outcome
            .folds
            .iter()
            .map(|fold| self.run_fold(fold, recommender, how_many))
            .collect();
        Ok(self.report(folds, outcome.warnings))
    }

    /// Wraps fold reports and split warnings into the final report.
    pub fn report(
        &self,
        folds: Vec<FoldReport>,
        warnings: Vec<InsufficientDataWarning>,
    ) -> EvaluationReport {
        EvaluationReport {
            strategy: self.config.strategy.clone(),
            metrics: aggregate(&folds),
            folds,
            warnings,
        }
    }
}

/// Averages every metric over folds, skipping undefined values.
///
/// Per-user values are averaged over the folds the user was scored in.
/// Coverage counters are summed.
pub fn aggregate(folds: &[FoldReport]) -> BTreeMap<String, MetricResult> {
    let mut grouped: BTreeMap<&str, Vec<&MetricResult>> = BTreeMap::new();
    for fold in folds {
        for (name, result) in &fold.metrics {
            grouped.entry(name.as_str()).or_default().push(result);
        }
    }

    grouped
        .into_iter()
        .map(|(name, results)| (name.to_string(), aggregate_metric(&results)))
        .collect()
}

fn aggregate_metric(results: &[&MetricResult]) -> MetricResult {
    let mut per_cutoff: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    let mut per_user: BTreeMap<UserId, Vec<f64>> = BTreeMap::new();
    let mut per_user_at_cutoff: BTreeMap<usize, BTreeMap<UserId, Vec<f64>>> = BTreeMap::new();
    let mut coverage: Option<CoverageDiagnostics> = None;

    for result in results {
        for (&k, &value) in &result.per_cutoff {
            per_cutoff.entry(k).or_default().push(value);
        }
        for (&user, &value) in &result.per_user {
            per_user.entry(user).or_default().push(value);
        }
        for (&k, users) in &result.per_user_at_cutoff {
            let slot = per_user_at_cutoff.entry(k).or_default();
            for (&user, &value) in users {
                slot.entry(user).or_default().push(value);
            }
        }
        if let Some(c) = result.coverage {
            let total = coverage.get_or_insert_with(CoverageDiagnostics::default);
            total.empty_users += c.empty_users;
            total.empty_items += c.empty_items;
            total.compared += c.compared;
            total.missing_users += c.missing_users;
        }
    }

    let collapse = |values: Vec<f64>| mean_defined(values);
    MetricResult {
        global: mean_defined(results.iter().map(|r| r.global)),
        per_cutoff: per_cutoff.into_iter().map(|(k, v)| (k, collapse(v))).collect(),
        per_user: per_user.into_iter().map(|(u, v)| (u, collapse(v))).collect(),
        per_user_at_cutoff: per_user_at_cutoff
            .into_iter()
            .map(|(k, users)| {
                let users = users.into_iter().map(|(u, v)| (u, collapse(v))).collect();
                (k, users)
            })
            .collect(),
        coverage,
        warnings: results
            .iter()
            .flat_map(|r| r.warnings.iter().cloned())
            .collect(),
    }
}
