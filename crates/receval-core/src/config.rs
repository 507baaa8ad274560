//! Evaluation configuration and its defaults.
//!
//! The default constants describe the protocol used when nothing else is
//! configured: an 80/20 per-user random split, seed 20, relevance threshold
//! 3.0 on a 1–5 rating scale, and the candidate set restricted to each
//! user's test items.
//!
//! # Usage
//!
//! ```
//! use receval_core::config::EvaluationConfig;
//!
//! let config = EvaluationConfig {
//!     cutoffs: [5, 10].into_iter().collect(),
//!     strategy: "relevant_test_items".to_string(),
//!     ..EvaluationConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::ConfigError;
use crate::metrics::{Gain, MetricKind};
use crate::split::SplitterKind;
use crate::strategy::StrategyKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// Split Defaults
// =============================================================================

/// Fraction of preferences held out for testing.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Seed for every randomized step (splitting, RelPlusN sampling, bootstrap).
pub const DEFAULT_SEED: u64 = 20;

/// Number of random folds produced by one split call.
pub const DEFAULT_NUM_FOLDS: usize = 1;

// =============================================================================
// Ranking Defaults
// =============================================================================

/// Minimum test rating for an item to count as relevant.
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 3.0;

/// Rank positions at which ranking metrics are reported.
pub const DEFAULT_CUTOFFS: &[usize] = &[1, 5, 10, 20];

/// Candidate strategy registry key.
pub const DEFAULT_STRATEGY: &str = "test_items";

/// Number of non-relevant items sampled per user by the `rel_plus_n` strategy.
pub const DEFAULT_REL_PLUS_N: usize = 100;

/// Metrics computed when none are configured.
pub const DEFAULT_METRICS: &[&str] = &["precision", "ndcg", "rmse"];

/// Complete description of one evaluation protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Random holdout or k-fold cross-validation
    pub splitter: SplitterKind,
    /// Fraction of preferences assigned to test, in (0, 1)
    pub test_fraction: f64,
    /// Split each user's ratings independently instead of globally
    pub per_user: bool,
    /// Seed for all randomized steps
    pub seed: u64,
    /// Replace shuffling with chronological order (most recent go to test)
    pub keep_order: bool,
    /// Number of random folds
    pub num_folds: usize,
    /// Minimum test rating considered relevant
    pub relevance_threshold: f64,
    /// Ranking cutoffs (positive)
    pub cutoffs: BTreeSet<usize>,
    /// Candidate strategy name
    pub strategy: String,
    /// `N` for the `rel_plus_n` strategy
    pub rel_plus_n: usize,
    /// Metric names to compute
    pub metrics: Vec<String>,
    /// Gain applied to graded relevance by NDCG
    pub ndcg_gain: Gain,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            splitter: SplitterKind::Random,
            test_fraction: DEFAULT_TEST_FRACTION,
            per_user: true,
            seed: DEFAULT_SEED,
            keep_order: false,
            num_folds: DEFAULT_NUM_FOLDS,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            cutoffs: DEFAULT_CUTOFFS.iter().copied().collect(),
            strategy: DEFAULT_STRATEGY.to_string(),
            rel_plus_n: DEFAULT_REL_PLUS_N,
            metrics: DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
            ndcg_gain: Gain::Linear,
        }
    }
}

impl EvaluationConfig {
    /// Checks every field and resolves every registry name.
    ///
    /// Runs before any data is touched so that a bad strategy or metric name
    /// fails immediately instead of deep inside a fold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_test_fraction(self.test_fraction)?;
        let min_folds = match self.splitter {
            SplitterKind::Random => 1,
            SplitterKind::CrossValidation => 2,
        };
        if self.num_folds < min_folds {
            return Err(ConfigError::InvalidFolds(self.num_folds));
        }
        validate_cutoffs(&self.cutoffs)?;
        if !self.relevance_threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "relevance_threshold must be finite, got {}",
                self.relevance_threshold
            )));
        }
        StrategyKind::from_name(&self.strategy)?;
        if self.metrics.is_empty() {
            return Err(ConfigError::Invalid("no metrics configured".to_string()));
        }
        for name in &self.metrics {
            MetricKind::from_name(name)?;
        }
        Ok(())
    }

    /// Resolved metric kinds, in configuration order.
    pub fn metric_kinds(&self) -> Result<Vec<MetricKind>, ConfigError> {
        self.metrics.iter().map(|m| MetricKind::from_name(m)).collect()
    }
}

/// Rejects fractions outside the open interval (0, 1).
pub fn validate_test_fraction(fraction: f64) -> Result<(), ConfigError> {
    if fraction > 0.0 && fraction < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTestFraction(fraction))
    }
}

/// Rejects a zero cutoff.
pub fn validate_cutoffs(cutoffs: &BTreeSet<usize>) -> Result<(), ConfigError> {
    match cutoffs.iter().find(|&&k| k == 0) {
        Some(&k) => Err(ConfigError::InvalidCutoff(k as i64)),
        None => Ok(()),
    }
}

/// Converts signed cutoffs (as typed by a user) into a validated set.
pub fn cutoffs_from_signed(values: &[i64]) -> Result<BTreeSet<usize>, ConfigError> {
    values
        .iter()
        .map(|&k| {
            if k <= 0 {
                Err(ConfigError::InvalidCutoff(k))
            } else {
                Ok(k as usize)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EvaluationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_test_fraction() {
        for fraction in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let config = EvaluationConfig {
                test_fraction: fraction,
                ..EvaluationConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidTestFraction(_))
            ));
        }
    }

    #[test]
    fn test_zero_cutoff_rejected() {
        let config = EvaluationConfig {
            cutoffs: [0, 5].into_iter().collect(),
            ..EvaluationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidCutoff(0)));
    }

    #[test]
    fn test_negative_cutoff_rejected() {
        assert_eq!(
            cutoffs_from_signed(&[5, -1]),
            Err(ConfigError::InvalidCutoff(-1))
        );
        assert_eq!(
            cutoffs_from_signed(&[10, 5, 10]).unwrap(),
            [5, 10].into_iter().collect()
        );
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let config = EvaluationConfig {
            strategy: "UserTest".to_string(),
            ..EvaluationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownStrategy("UserTest".to_string()))
        );
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let config = EvaluationConfig {
            metrics: vec!["precision".into(), "auc".into()],
            ..EvaluationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownMetric("auc".to_string()))
        );
    }

    #[test]
    fn test_zero_folds_rejected() {
        let config = EvaluationConfig {
            num_folds: 0,
            ..EvaluationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFolds(0)));
    }

    #[test]
    fn test_cross_validation_needs_two_folds() {
        let config = EvaluationConfig {
            splitter: SplitterKind::CrossValidation,
            ..EvaluationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFolds(1)));

        let config = EvaluationConfig {
            num_folds: 5,
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_toml_like_json() {
        let config: EvaluationConfig =
            serde_json::from_str(r#"{"cutoffs": [10], "strategy": "all_items"}"#).unwrap();
        assert_eq!(config.cutoffs, [10].into_iter().collect());
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.ndcg_gain, Gain::Linear);
        assert!(config.validate().is_ok());

        let config: EvaluationConfig =
            serde_json::from_str(r#"{"ndcg_gain": "exponential"}"#).unwrap();
        assert_eq!(config.ndcg_gain, Gain::Exponential);
    }

    #[test]
    fn test_misspelled_key_rejected() {
        let err = serde_json::from_str::<EvaluationConfig>(r#"{"sed": 3}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field `sed`"));
    }
}
