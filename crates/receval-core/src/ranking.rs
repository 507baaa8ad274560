//! Conversion of raw predictions into per-user relevance-labeled rankings.
//!
//! Every ranking metric consumes the output of [`build`]: for each user, the
//! predicted candidate items sorted by descending score (ties broken by
//! ascending item id), each labeled with its relevance in the test set, plus
//! the ideal relevance ordering used for normalization.

use crate::data::{ItemId, PreferenceStore, UserId};
use crate::strategy::CandidateStrategy;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// How a test rating is turned into a relevance label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelevanceMode {
    /// 1 if the test rating is ≥ `threshold`, else 0
    Binary { threshold: f64 },
    /// The raw test rating, 0 when absent
    Graded,
}

impl RelevanceMode {
    /// Label for a test rating (`None` when the pair is not in test).
    pub fn label(self, rating: Option<f64>) -> f64 {
        match (self, rating) {
            (_, None) => 0.0,
            (RelevanceMode::Binary { threshold }, Some(r)) => {
                if r >= threshold {
                    1.0
                } else {
                    0.0
                }
            }
            (RelevanceMode::Graded, Some(r)) => r,
        }
    }
}

/// One ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedItem {
    pub item: ItemId,
    pub score: f64,
    pub relevance: f64,
}

/// A user's ranking together with its ideal counterpart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceSequence {
    /// Predicted candidates, best first
    pub ranked: Vec<RankedItem>,
    /// Relevance labels of all the user's test items, descending
    pub ideal: Vec<f64>,
}

impl RelevanceSequence {
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Number of test items with a positive label.
    pub fn num_relevant(&self) -> usize {
        self.ideal.iter().filter(|&&rel| rel > 0.0).count()
    }

    /// Labeled items with a positive label among the first `k` ranks.
    pub fn hits_at(&self, k: usize) -> usize {
        self.ranked
            .iter()
            .take(k)
            .filter(|ranked| ranked.relevance > 0.0)
            .count()
    }
}

/// Builds the relevance sequence of every user in `predictions` ∪ `test`.
///
/// Only predicted items that are candidates under `strategy` are ranked.
/// A user without such items gets an empty sequence.
pub fn build(
    predictions: &PreferenceStore,
    test: &PreferenceStore,
    strategy: &dyn CandidateStrategy,
    mode: RelevanceMode,
) -> BTreeMap<UserId, RelevanceSequence> {
    let mut users = predictions.users();
    users.extend(test.users());

    users
        .into_iter()
        .map(|user| (user, user_sequence(user, predictions, test, strategy, mode)))
        .collect()
}

fn user_sequence(
    user: UserId,
    predictions: &PreferenceStore,
    test: &PreferenceStore,
    strategy: &dyn CandidateStrategy,
    mode: RelevanceMode,
) -> RelevanceSequence {
    let mut ranked: Vec<RankedItem> = match predictions.user_preferences(user) {
        Some(predicted) => strategy
            .candidate_items(user)
            .into_iter()
            .filter_map(|item| {
                predicted.get(&item).map(|&score| RankedItem {
                    item,
                    score,
                    relevance: mode.label(test.preference(user, item)),
                })
            })
            .collect(),
        None => Vec::new(),
    };
    ranked.sort_by(rank_order);

    let mut ideal: Vec<f64> = test
        .user_preferences(user)
        .map(|prefs| prefs.values().map(|&r| mode.label(Some(r))).collect())
        .unwrap_or_default();
    ideal.sort_by(|a, b| b.total_cmp(a));

    RelevanceSequence { ranked, ideal }
}

/// Descending score, then ascending item id.
fn rank_order(a: &RankedItem, b: &RankedItem) -> Ordering {
    b.score.total_cmp(&a.score).then(a.item.cmp(&b.item))
}
