//! Candidate-item strategies.
//!
//! A strategy decides, for each user, which items the recommender's ranking
//! is evaluated over. Strategies are built from a fixed
//! `(train, test, relevance_threshold)` context and selected by name through
//! the [`StrategyKind`] registry:
//!
//! | Name | Candidates for user `u` |
//! |------|-------------------------|
//! | `test_items` | items `u` rated in test |
//! | `train_items` | items `u` rated in train |
//! | `relevant_test_items` | items `u` rated in test with value ≥ threshold |
//! | `all_items` | every item in train ∪ test that `u` did not rate in train |
//! | `rel_plus_n` | relevant test items of `u` plus `N` sampled unrated items |

pub mod items;
pub mod rel_plus_n;

pub use items::{AllItems, RelevantTestItems, TestItems, TrainItems};
pub use rel_plus_n::RelPlusN;

use crate::data::{ItemId, PreferenceStore, UserId};
use crate::error::ConfigError;
use std::collections::BTreeSet;
use tracing::debug;

/// Computes the candidate item set of a user.
pub trait CandidateStrategy: Send + Sync {
    /// Registry name of this strategy.
    fn name(&self) -> &'static str;

    /// Items the user's ranking is evaluated over, ascending.
    fn candidate_items(&self, user: UserId) -> BTreeSet<ItemId>;
}

/// Registry of known strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    TestItems,
    TrainItems,
    RelevantTestItems,
    AllItems,
    RelPlusN,
}

/// Everything a strategy may need at construction time.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub train: &'a PreferenceStore,
    pub test: &'a PreferenceStore,
    pub relevance_threshold: f64,
    /// `N` for [`StrategyKind::RelPlusN`]
    pub rel_plus_n: usize,
    /// Seed for [`StrategyKind::RelPlusN`] sampling
    pub seed: u64,
}

impl StrategyKind {
    /// Returns all registered strategies.
    pub fn all() -> &'static [StrategyKind] {
        &[
            StrategyKind::TestItems,
            StrategyKind::TrainItems,
            StrategyKind::RelevantTestItems,
            StrategyKind::AllItems,
            StrategyKind::RelPlusN,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::TestItems => "test_items",
            StrategyKind::TrainItems => "train_items",
            StrategyKind::RelevantTestItems => "relevant_test_items",
            StrategyKind::AllItems => "all_items",
            StrategyKind::RelPlusN => "rel_plus_n",
        }
    }

    /// Looks a strategy up by registry name. There is no fallback.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ConfigError::UnknownStrategy(name.to_string()))
    }

    /// Instantiates the strategy over `ctx`.
    pub fn build<'a>(self, ctx: StrategyContext<'a>) -> Box<dyn CandidateStrategy + 'a> {
        match self {
            StrategyKind::TestItems => Box::new(TestItems::new(ctx.test)),
            StrategyKind::TrainItems => Box::new(TrainItems::new(ctx.train)),
            StrategyKind::RelevantTestItems => {
                Box::new(RelevantTestItems::new(ctx.test, ctx.relevance_threshold))
            }
            StrategyKind::AllItems => Box::new(AllItems::new(ctx.train, ctx.test)),
            StrategyKind::RelPlusN => Box::new(RelPlusN::new(
                ctx.train,
                ctx.test,
                ctx.relevance_threshold,
                ctx.rel_plus_n,
                ctx.seed,
            )),
        }
    }
}

/// Keeps, for every user in `predictions`, only the predicted items that are
/// candidates under `strategy`.
pub fn filter_predictions(
    predictions: &PreferenceStore,
    strategy: &dyn CandidateStrategy,
) -> PreferenceStore {
    let mut filtered = PreferenceStore::new();
    for user in predictions.users() {
        for item in strategy.candidate_items(user) {
            filtered.copy_pair_from(predictions, user, item);
        }
    }
    debug!(
        "Strategy {} kept {} of {} predictions",
        strategy.name(),
        filtered.num_preferences(),
        predictions.num_preferences()
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::store_from;

    #[test]
    fn test_registry_round_trip() {
        for &kind in StrategyKind::all() {
            assert_eq!(StrategyKind::from_name(kind.name()), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_name_fails() {
        assert_eq!(
            StrategyKind::from_name("TestItems"),
            Err(ConfigError::UnknownStrategy("TestItems".to_string()))
        );
    }

    #[test]
    fn test_filter_predictions_by_test_items() {
        let train = store_from(&[(1, 1, 5.0)]);
        let test = store_from(&[(1, 2, 4.0), (1, 3, 1.0), (2, 9, 3.0)]);
        let predictions = store_from(&[(1, 1, 0.9), (1, 2, 0.8), (1, 4, 0.7), (3, 2, 0.1)]);

        let ctx = StrategyContext {
            train: &train,
            test: &test,
            relevance_threshold: 3.0,
            rel_plus_n: 0,
            seed: 0,
        };
        let strategy = StrategyKind::TestItems.build(ctx);
        let filtered = filter_predictions(&predictions, strategy.as_ref());

        assert_eq!(filtered.triples(), vec![(1, 2, 0.8)]);
    }
}
