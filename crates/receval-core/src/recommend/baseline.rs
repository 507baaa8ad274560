//! Non-personalized baselines. Both score every catalog item the user has
//! not rated in training with a per-item statistic of the training data.

use super::{rank, Recommender};
use crate::data::{ItemId, PreferenceStore, UserId};
use crate::error::RecommendationError;
use std::collections::BTreeMap;

/// Scores an item by its mean training rating.
#[derive(Debug, Clone, Default)]
pub struct ItemAverageRecommender {
    means: BTreeMap<ItemId, f64>,
}

impl ItemAverageRecommender {
    pub fn fit(train: &PreferenceStore) -> Self {
        let mut sums: BTreeMap<ItemId, (f64, usize)> = BTreeMap::new();
        for prefs in train.preferences().values() {
            for (&item, &value) in prefs {
                let entry = sums.entry(item).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
        let means = sums
            .into_iter()
            .map(|(item, (sum, count))| (item, sum / count as f64))
            .collect();
        Self { means }
    }

    pub fn mean(&self, item: ItemId) -> Option<f64> {
        self.means.get(&item).copied()
    }
}

impl Recommender for ItemAverageRecommender {
    fn name(&self) -> &str {
        "item_average"
    }

    fn recommend(
        &self,
        train: &PreferenceStore,
        user: UserId,
        how_many: Option<usize>,
    ) -> Result<Vec<(ItemId, f64)>, RecommendationError> {
        score_unrated(&self.means, train, user, how_many)
    }
}

/// Scores an item by the number of training ratings it received.
#[derive(Debug, Clone, Default)]
pub struct PopularityRecommender {
    counts: BTreeMap<ItemId, f64>,
}

impl PopularityRecommender {
    pub fn fit(train: &PreferenceStore) -> Self {
        let mut counts: BTreeMap<ItemId, f64> = BTreeMap::new();
        for prefs in train.preferences().values() {
            for &item in prefs.keys() {
                *counts.entry(item).or_insert(0.0) += 1.0;
            }
        }
        Self { counts }
    }
}

impl Recommender for PopularityRecommender {
    fn name(&self) -> &str {
        "popularity"
    }

    fn recommend(
        &self,
        train: &PreferenceStore,
        user: UserId,
        how_many: Option<usize>,
    ) -> Result<Vec<(ItemId, f64)>, RecommendationError> {
        score_unrated(&self.counts, train, user, how_many)
    }
}

fn score_unrated(
    scores: &BTreeMap<ItemId, f64>,
    train: &PreferenceStore,
    user: UserId,
    how_many: Option<usize>,
) -> Result<Vec<(ItemId, f64)>, RecommendationError> {
    let rated = train
        .user_preferences(user)
        .ok_or_else(|| RecommendationError {
            user,
            message: "user has no training preferences".to_string(),
        })?;

    let scored = scores
        .iter()
        .filter(|(item, _)| !rated.contains_key(item))
        .map(|(&item, &score)| (item, score))
        .collect();
    Ok(rank(scored, how_many))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::store_from;

    fn train() -> PreferenceStore {
        store_from(&[
            (1, 1, 5.0),
            (1, 2, 1.0),
            (2, 1, 3.0),
            (2, 3, 4.0),
            (3, 2, 3.0),
            (3, 4, 2.0),
        ])
    }

    #[test]
    fn test_item_average_scores_unrated_items() {
        let train = train();
        let recommender = ItemAverageRecommender::fit(&train);
        assert_eq!(recommender.mean(1), Some(4.0));
        assert_eq!(recommender.mean(2), Some(2.0));

        let ranked = recommender.recommend(&train, 1, None).unwrap();
        assert_eq!(ranked, vec![(3, 4.0), (4, 2.0)]);

        let top = recommender.recommend(&train, 3, Some(1)).unwrap();
        assert_eq!(top, vec![(1, 4.0)]);
    }

    #[test]
    fn test_popularity_ties_by_item_id() {
        let train = train();
        let ranked = PopularityRecommender::fit(&train)
            .recommend(&train, 3, None)
            .unwrap();
        assert_eq!(ranked, vec![(1, 2.0), (3, 1.0)]);
    }

    #[test]
    fn test_unknown_user_fails() {
        let train = train();
        let err = ItemAverageRecommender::fit(&train)
            .recommend(&train, 42, None)
            .unwrap_err();
        assert_eq!(err.user, 42);
    }
}
