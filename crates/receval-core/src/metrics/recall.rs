//! Recall at cutoff: relevant items in the top k divided by the number of
//! relevant items in the user's test set. Undefined when the user has no
//! relevant test items.

use super::{ranking_result, Metric, MetricInput, MetricKind, MetricResult};
use crate::ranking::{self, RelevanceMode, RelevanceSequence};

#[derive(Debug, Clone, Copy, Default)]
pub struct Recall;

pub fn recall_at(seq: &RelevanceSequence, k: Option<usize>) -> f64 {
    let relevant = seq.num_relevant();
    if relevant == 0 {
        return f64::NAN;
    }
    let depth = k.unwrap_or(seq.len());
    seq.hits_at(depth) as f64 / relevant as f64
}

impl Metric for Recall {
    fn kind(&self) -> MetricKind {
        MetricKind::Recall
    }

    fn compute(&self, input: &MetricInput<'_>) -> MetricResult {
        let mode = RelevanceMode::Binary {
            threshold: input.relevance_threshold,
        };
        let sequences = ranking::build(input.predictions, input.test, input.strategy, mode);
        ranking_result(&sequences, input.cutoffs, recall_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::TestItems;
    use crate::test_utils::{assert_close, store_from};
    use std::collections::BTreeSet;

    #[test]
    fn test_recall_at_k() {
        let test = store_from(&[(1, 1, 5.0), (1, 2, 4.0), (1, 3, 1.0), (1, 4, 3.0)]);
        // ranked: 3 (not), 1 (rel), 2 (rel); item 4 relevant but not predicted
        let predictions = store_from(&[(1, 1, 0.8), (1, 2, 0.7), (1, 3, 0.9)]);
        let strategy = TestItems::new(&test);
        let cutoffs: BTreeSet<usize> = [1, 2, 10].into_iter().collect();

        let result = Recall.compute(&MetricInput {
            predictions: &predictions,
            test: &test,
            strategy: &strategy,
            relevance_threshold: 3.0,
            cutoffs: &cutoffs,
        });
        assert_close(result.at(1), 0.0);
        assert_close(result.at(2), 1.0 / 3.0);
        assert_close(result.at(10), 2.0 / 3.0);
        assert_close(result.global, 2.0 / 3.0);
    }

    #[test]
    fn test_no_relevant_items_is_undefined() {
        let test = store_from(&[(1, 1, 1.0)]);
        let predictions = store_from(&[(1, 1, 0.5)]);
        let strategy = TestItems::new(&test);
        let cutoffs: BTreeSet<usize> = [1].into_iter().collect();

        let result = Recall.compute(&MetricInput {
            predictions: &predictions,
            test: &test,
            strategy: &strategy,
            relevance_threshold: 3.0,
            cutoffs: &cutoffs,
        });
        assert!(result.per_user[&1].is_nan());
        assert!(result.at(1).is_nan());
    }
}
