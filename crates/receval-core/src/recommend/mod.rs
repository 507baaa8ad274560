//! Recommender collaborators.
//!
//! The evaluation core only needs predictions as a [`PreferenceStore`]; this
//! module defines the [`Recommender`] seam that produces them and two
//! non-personalized baselines so that a dataset can be evaluated end to end
//! without an external library.

pub mod baseline;

pub use baseline::{ItemAverageRecommender, PopularityRecommender};

use crate::data::{ItemId, PreferenceStore, UserId};
use crate::error::{ConfigError, RecommendationError};
use tracing::{debug, warn};

/// Produces a ranked list of `(item, score)` pairs for one user.
pub trait Recommender {
    fn name(&self) -> &str;

    /// Best first. `how_many = None` returns every scored item.
    fn recommend(
        &self,
        train: &PreferenceStore,
        user: UserId,
        how_many: Option<usize>,
    ) -> Result<Vec<(ItemId, f64)>, RecommendationError>;
}

/// Registry of built-in recommenders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommenderKind {
    ItemAverage,
    Popularity,
}

impl RecommenderKind {
    pub fn all() -> &'static [RecommenderKind] {
        &[RecommenderKind::ItemAverage, RecommenderKind::Popularity]
    }

    pub fn name(self) -> &'static str {
        match self {
            RecommenderKind::ItemAverage => "item_average",
            RecommenderKind::Popularity => "popularity",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown recommender: {}", name)))
    }

    /// Fits the recommender on `train`.
    pub fn fit(self, train: &PreferenceStore) -> Box<dyn Recommender> {
        match self {
            RecommenderKind::ItemAverage => Box::new(ItemAverageRecommender::fit(train)),
            RecommenderKind::Popularity => Box::new(PopularityRecommender::fit(train)),
        }
    }
}

/// Runs `recommender` for every user in `users`.
///
/// A failing user contributes nothing to the predictions store; its error is
/// collected and the run continues.
pub fn generate_predictions<I>(
    recommender: &dyn Recommender,
    train: &PreferenceStore,
    users: I,
    how_many: Option<usize>,
) -> (PreferenceStore, Vec<RecommendationError>)
where
    I: IntoIterator<Item = UserId>,
{
    let mut predictions = PreferenceStore::new();
    let mut failures = Vec::new();

    for user in users {
        match recommender.recommend(train, user, how_many) {
            Ok(ranked) => {
                for (item, score) in ranked {
                    predictions.add_preference(user, item, score);
                }
            }
            Err(err) => {
                debug!("{}", err);
                failures.push(err);
            }
        }
    }

    if !failures.is_empty() {
        warn!(
            "{} failed for {} users",
            recommender.name(),
            failures.len()
        );
    }
    (predictions, failures)
}

/// Sorts by descending score, ties by ascending item id, and truncates.
pub(crate) fn rank(mut scored: Vec<(ItemId, f64)>, how_many: Option<usize>) -> Vec<(ItemId, f64)> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    if let Some(n) = how_many {
        scored.truncate(n);
    }
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::store_from;

    struct FailsOnOdd;

    impl Recommender for FailsOnOdd {
        fn name(&self) -> &str {
            "fails_on_odd"
        }

        fn recommend(
            &self,
            _train: &PreferenceStore,
            user: UserId,
            _how_many: Option<usize>,
        ) -> Result<Vec<(ItemId, f64)>, RecommendationError> {
            if user % 2 == 1 {
                Err(RecommendationError {
                    user,
                    message: "odd".to_string(),
                })
            } else {
                Ok(vec![(user * 10, 1.0)])
            }
        }
    }

    #[test]
    fn test_failures_are_collected_not_fatal() {
        let train = PreferenceStore::new();
        let (predictions, failures) = generate_predictions(&FailsOnOdd, &train, 1..=4, None);

        assert_eq!(predictions.triples(), vec![(2, 20, 1.0), (4, 40, 1.0)]);
        assert_eq!(
            failures.iter().map(|f| f.user).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let ranked = rank(vec![(3, 0.5), (1, 0.9), (2, 0.5)], Some(2));
        assert_eq!(ranked, vec![(1, 0.9), (2, 0.5)]);
    }

    #[test]
    fn test_recommender_registry() {
        let train = store_from(&[(1, 1, 4.0)]);
        for &kind in RecommenderKind::all() {
            assert_eq!(RecommenderKind::from_name(kind.name()), Ok(kind));
            assert_eq!(kind.fit(&train).name(), kind.name());
        }
        assert!(RecommenderKind::from_name("svd").is_err());
    }
}
