//! # receval Core
//!
//! Offline evaluation of recommender systems: partition interaction data
//! into train/test folds, restrict each user's ranking to a candidate set,
//! and score predictions with ranking and error metrics.
//!
//! Everything is deterministic and batch: stores are fully materialized in
//! memory and every random step is seeded.
//!
//! ## Modules
//!
//! - [`data`] - In-memory preference store, delimited-text parser and writer
//! - [`split`] - Seeded random holdout and k-fold cross-validation
//! - [`strategy`] - Candidate-item strategies and the strategy registry
//! - [`ranking`] - Per-user relevance-labeled rankings shared by ranking metrics
//! - [`metrics`] - Precision@k, NDCG@k, Recall@k, RMSE, MAE
//! - [`recommend`] - Recommender seam and baseline recommenders
//! - [`pipeline`] - Split → recommend → filter → score → aggregate
//! - [`stats`] - Paired t-test, effect size, bootstrap intervals
//! - [`config`] - Evaluation configuration and defaults
//! - [`error`] - Error and diagnostic types

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod ranking;
pub mod recommend;
pub mod split;
pub mod stats;
pub mod strategy;

#[cfg(test)]
mod test_utils;
