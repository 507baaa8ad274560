//! Precision at cutoff.
//!
//! ```text
//! P@k = hits in top k / k          if the list has at least k items
//! P@k = hits in list / list length otherwise
//! ```
//!
//! Short lists are not padded with non-relevant items.

use super::{ranking_result, Metric, MetricInput, MetricKind, MetricResult};
use crate::ranking::{self, RelevanceMode, RelevanceSequence};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct Precision;

/// Precision of one user's list at `k` (`None` = whole list).
pub fn precision_at(seq: &RelevanceSequence, k: Option<usize>) -> f64 {
    let n = seq.len();
    if n == 0 {
        return f64::NAN;
    }
    let depth = k.map_or(n, |k| k.min(n));
    seq.hits_at(depth) as f64 / depth as f64
}

impl Metric for Precision {
    fn kind(&self) -> MetricKind {
        MetricKind::Precision
    }

    fn compute(&self, input: &MetricInput<'_>) -> MetricResult {
        let mode = RelevanceMode::Binary {
            threshold: input.relevance_threshold,
        };
        let sequences = ranking::build(input.predictions, input.test, input.strategy, mode);
        let result = ranking_result(&sequences, input.cutoffs, precision_at);
        debug!(
            "precision: {} of {} users defined",
            result.defined_users(),
            sequences.len()
        );
        result
    }
}
