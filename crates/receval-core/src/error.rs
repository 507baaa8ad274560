//! Error types for receval-core.
//!
//! This module defines the error types used across the library: configuration
//! validation, dataset loading and parsing, recommender failures, and an
//! umbrella [`EvalError`] for pipeline steps that can hit more than one of them.
//!
//! Data-sparsity conditions are *not* errors. They are reported as
//! [`InsufficientDataWarning`] values next to the results they affect.

use crate::data::UserId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating an evaluation configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Strategy name not present in the registry
    #[error("Unknown candidate strategy: {0}")]
    UnknownStrategy(String),
    /// Metric name not present in the registry
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
    /// Cutoffs must be positive
    #[error("Invalid cutoff {0}: cutoffs must be positive integers")]
    InvalidCutoff(i64),
    /// Test fraction must lie strictly between 0 and 1
    #[error("Invalid test fraction {0}: must be in (0, 1)")]
    InvalidTestFraction(f64),
    /// Fold count out of range for the requested splitter
    #[error("Invalid number of folds {0}")]
    InvalidFolds(usize),
    /// Any other malformed field
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur while reading or writing preference files.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Underlying I/O failure (unreadable file, permission, ...)
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed token, with 1-based line and column of the offending field
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    /// Output file exists and overwriting was not requested
    #[error("Refusing to overwrite existing file: {0}")]
    AlreadyExists(PathBuf),
}

/// A recommender failed to produce a ranking for one user.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Recommendation failed for user {user}: {message}")]
pub struct RecommendationError {
    /// User whose recommendations could not be produced
    pub user: UserId,
    /// Human-readable cause
    pub message: String,
}

/// Umbrella error for pipeline steps.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Recommendation(#[from] RecommendationError),
}

/// Non-fatal data-sparsity diagnostics.
///
/// These never abort a computation; the affected users or pairs are left out
/// of metric denominators and the warning is returned alongside the result.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsufficientDataWarning {
    /// User has too few ratings for the per-user split to give them any
    /// test preference; all of them stay in train.
    TooFewRatings {
        user: UserId,
        ratings: usize,
        required: usize,
    },
    /// User present in the test set but absent from predictions.
    MissingUser { user: UserId, pairs: usize },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}
