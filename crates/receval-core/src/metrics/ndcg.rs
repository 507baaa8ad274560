//! Normalized Discounted Cumulative Gain.
//!
//! # Formula
//!
//! ```text
//! DCG@k  = Σ gain(rel_i) / log₂(i + 1)   for i in 1..=min(k, n)
//! IDCG@k = DCG@k of the user's test relevances sorted descending
//! NDCG@k = DCG@k / IDCG@k
//! ```
//!
//! A user whose IDCG is zero has no relevant test items; their NDCG is
//! undefined rather than 0 or 1.

use super::{ranking_result, Metric, MetricInput, MetricKind, MetricResult};
use crate::ranking::{self, RelevanceMode, RelevanceSequence};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gain applied to a graded relevance label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gain {
    /// `rel`
    #[default]
    Linear,
    /// `2^rel - 1`
    Exponential,
}

impl Gain {
    #[inline]
    pub fn apply(self, relevance: f64) -> f64 {
        match self {
            Gain::Linear => relevance,
            Gain::Exponential => relevance.exp2() - 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ndcg {
    gain: Gain,
}

impl Ndcg {
    pub fn new(gain: Gain) -> Self {
        Self { gain }
    }

    /// NDCG of one user's list at `k` (`None` = whole lists).
    pub fn score(&self, seq: &RelevanceSequence, k: Option<usize>) -> f64 {
        let depth = k.unwrap_or(usize::MAX);
        let dcg = self.dcg(seq.ranked.iter().map(|r| r.relevance), depth);
        let idcg = self.dcg(seq.ideal.iter().copied(), depth);
        if idcg == 0.0 {
            f64::NAN
        } else {
            dcg / idcg
        }
    }

    fn dcg(&self, relevances: impl Iterator<Item = f64>, k: usize) -> f64 {
        relevances
            .take(k)
            .enumerate()
            .map(|(i, rel)| self.gain.apply(rel) / discount(i + 1))
            .sum()
    }
}

/// Logarithmic discount for a 1-indexed rank: log₂(rank + 1).
#[inline]
fn discount(rank: usize) -> f64 {
    (rank as f64 + 1.0).log2()
}

impl Metric for Ndcg {
    fn kind(&self) -> MetricKind {
        MetricKind::Ndcg
    }

    fn compute(&self, input: &MetricInput<'_>) -> MetricResult {
        let sequences = ranking::build(
            input.predictions,
            input.test,
            input.strategy,
            RelevanceMode::Graded,
        );
        let result = ranking_result(&sequences, input.cutoffs, |seq, k| self.score(seq, k));
        debug!(
            "ndcg ({:?} gain): {} of {} users defined",
            self.gain,
            result.defined_users(),
            sequences.len()
        );
        result
    }
}
