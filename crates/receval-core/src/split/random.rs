//! Seeded random holdout splitter.

use super::{test_count, Fold, SplitOutcome, Splitter, MIN_RATINGS_FOR_TEST};
use crate::config::validate_test_fraction;
use crate::data::{ItemId, PreferenceStore, UserId};
use crate::error::{ConfigError, InsufficientDataWarning};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Random holdout: each fold sends about `test_fraction` of the preferences
/// to test.
///
/// With `per_user` every user is split independently (every user with at
/// least one rating keeps one in train); otherwise all triples are shuffled
/// together and the fraction applies to the global count.
///
/// With `keep_order` nothing is shuffled: preferences are ordered by
/// timestamp (pairs without one first, ties by item id) and the most recent
/// ones go to test. The seed is then irrelevant.
#[derive(Debug, Clone)]
pub struct RandomSplitter {
    test_fraction: f64,
    per_user: bool,
    seed: u64,
    keep_order: bool,
    num_folds: usize,
}

impl RandomSplitter {
    /// Creates a single-fold shuffling splitter.
    pub fn new(test_fraction: f64, per_user: bool, seed: u64) -> Result<Self, ConfigError> {
        validate_test_fraction(test_fraction)?;
        Ok(Self {
            test_fraction,
            per_user,
            seed,
            keep_order: false,
            num_folds: 1,
        })
    }

    /// Uses chronological order instead of shuffling.
    pub fn with_keep_order(mut self, keep_order: bool) -> Self {
        self.keep_order = keep_order;
        self
    }

    /// Number of independent holdouts drawn from the same generator.
    pub fn with_num_folds(mut self, num_folds: usize) -> Result<Self, ConfigError> {
        if num_folds == 0 {
            return Err(ConfigError::InvalidFolds(num_folds));
        }
        self.num_folds = num_folds;
        Ok(self)
    }

    fn split_per_user(&self, store: &PreferenceStore, rng: &mut ChaCha8Rng) -> Fold {
        let mut train = PreferenceStore::new();
        let mut test = PreferenceStore::new();

        for user in store.users() {
            let mut items: Vec<ItemId> = store.user_items(user).into_iter().collect();
            let n_test = test_count(items.len(), self.test_fraction);

            let test_items = if self.keep_order {
                items.sort_by_key(|&item| (store.timestamp(user, item), item));
                items.split_off(items.len() - n_test)
            } else {
                items.shuffle(rng);
                let rest = items.split_off(n_test);
                std::mem::replace(&mut items, rest)
            };

            for &item in &items {
                train.copy_pair_from(store, user, item);
            }
            for &item in &test_items {
                test.copy_pair_from(store, user, item);
            }
        }

        Fold {
            index: 0,
            train,
            test,
        }
    }

    fn split_global(&self, store: &PreferenceStore, rng: &mut ChaCha8Rng) -> Fold {
        let mut pairs: Vec<(UserId, ItemId)> = store
            .triples()
            .into_iter()
            .map(|(user, item, _)| (user, item))
            .collect();
        let n_test = test_count(pairs.len(), self.test_fraction);

        let test_pairs = if self.keep_order {
            pairs.sort_by_key(|&(user, item)| (store.timestamp(user, item), user, item));
            pairs.split_off(pairs.len() - n_test)
        } else {
            pairs.shuffle(rng);
            let rest = pairs.split_off(n_test);
            std::mem::replace(&mut pairs, rest)
        };

        let mut train = PreferenceStore::new();
        let mut test = PreferenceStore::new();
        for &(user, item) in &pairs {
            train.copy_pair_from(store, user, item);
        }
        for &(user, item) in &test_pairs {
            test.copy_pair_from(store, user, item);
        }

        Fold {
            index: 0,
            train,
            test,
        }
    }

    fn sparsity_warnings(&self, store: &PreferenceStore) -> Vec<InsufficientDataWarning> {
        if !self.per_user {
            return Vec::new();
        }
        store
            .users()
            .into_iter()
            .filter_map(|user| {
                let ratings = store.user_preferences(user).map_or(0, |p| p.len());
                (test_count(ratings, self.test_fraction) == 0).then_some(
                    InsufficientDataWarning::TooFewRatings {
                        user,
                        ratings,
                        required: MIN_RATINGS_FOR_TEST,
                    },
                )
            })
            .collect()
    }
}

impl Splitter for RandomSplitter {
    fn split(&self, store: &PreferenceStore) -> SplitOutcome {
        // One generator per call, consumed fold after fold
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let folds: Vec<Fold> = (0..self.num_folds)
            .map(|index| {
                let fold = if self.per_user {
                    self.split_per_user(store, &mut rng)
                } else {
                    self.split_global(store, &mut rng)
                };
                debug!(
                    "Fold {}: {} train / {} test preferences",
                    index,
                    fold.train.num_preferences(),
                    fold.test.num_preferences()
                );
                Fold { index, ..fold }
            })
            .collect();

        let warnings = self.sparsity_warnings(store);
        if !warnings.is_empty() {
            warn!(
                "{} users have fewer than {} ratings and get no test preference",
                warnings.len(),
                MIN_RATINGS_FOR_TEST
            );
        }
        info!(
            "Random split (fraction={}, per_user={}, keep_order={}): {} folds",
            self.test_fraction,
            self.per_user,
            self.keep_order,
            folds.len()
        );

        SplitOutcome { folds, warnings }
    }
}

/// Single-fold convenience wrapper: `split(store, fraction, per_user, seed, keep_order)`.
pub fn split(
    store: &PreferenceStore,
    test_fraction: f64,
    per_user: bool,
    seed: u64,
    keep_order: bool,
) -> Result<SplitOutcome, ConfigError> {
    let splitter = RandomSplitter::new(test_fraction, per_user, seed)?.with_keep_order(keep_order);
    Ok(splitter.split(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_store, triple_set};
    use proptest::prelude::*;

    #[test]
    fn test_per_user_fraction() {
        let store = sample_store(4, 10);
        let outcome = RandomSplitter::new(0.3, true, 7).unwrap().split(&store);
        let fold = &outcome.folds[0];

        for user in store.users() {
            assert_eq!(fold.test.user_items(user).len(), 3);
            assert_eq!(fold.train.user_items(user).len(), 7);
        }
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_single_rating_user_stays_in_train() {
        let mut store = PreferenceStore::new();
        store.add_preference(1, 100, 4.0);

        let outcome = RandomSplitter::new(0.5, true, 1).unwrap().split(&store);
        let fold = &outcome.folds[0];

        assert_eq!(fold.train.preference(1, 100), Some(4.0));
        assert!(fold.test.is_empty());
        assert_eq!(
            outcome.warnings,
            vec![InsufficientDataWarning::TooFewRatings {
                user: 1,
                ratings: 1,
                required: 2
            }]
        );
    }

    #[test]
    fn test_forced_test_item_needs_no_warning() {
        // 3 ratings at 0.2 floor to 0 and are forced up to 1
        let store = sample_store(2, 3);
        let outcome = RandomSplitter::new(0.2, true, 5).unwrap().split(&store);
        let fold = &outcome.folds[0];

        for user in store.users() {
            assert_eq!(fold.test.user_items(user).len(), 1);
        }
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_global_split_count() {
        let store = sample_store(5, 4);
        let outcome = RandomSplitter::new(0.25, false, 3).unwrap().split(&store);
        let fold = &outcome.folds[0];

        assert_eq!(fold.test.num_preferences(), 5);
        assert_eq!(fold.train.num_preferences(), 15);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_different_seeds_differ() {
        let store = sample_store(3, 20);
        let a = RandomSplitter::new(0.5, true, 1).unwrap().split(&store);
        let b = RandomSplitter::new(0.5, true, 2).unwrap().split(&store);
        assert_ne!(a.folds[0].test, b.folds[0].test);
    }

    #[test]
    fn test_keep_order_holds_out_most_recent() {
        let mut store = PreferenceStore::new();
        for (item, time) in [(1, 400), (2, 100), (3, 300), (4, 200), (5, 500)] {
            store.add_preference(9, item, 3.0);
            store.add_timestamp(9, item, time);
        }

        let outcome = split(&store, 0.4, true, 0, true).unwrap();
        let fold = &outcome.folds[0];

        assert_eq!(
            fold.test.user_items(9).into_iter().collect::<Vec<_>>(),
            vec![1, 5]
        );
        assert_eq!(fold.test.timestamp(9, 5), Some(500));
        assert_eq!(fold.train.timestamp(9, 2), Some(100));
    }

    #[test]
    fn test_multiple_folds_are_numbered_and_distinct() {
        let store = sample_store(3, 10);
        let outcome = RandomSplitter::new(0.2, true, 5)
            .unwrap()
            .with_num_folds(3)
            .unwrap()
            .split(&store);

        let indices: Vec<_> = outcome.folds.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_ne!(outcome.folds[0].test, outcome.folds[1].test);
    }

    #[test]
    fn test_rejects_bad_fraction() {
        assert!(matches!(
            RandomSplitter::new(1.0, true, 0),
            Err(ConfigError::InvalidTestFraction(_))
        ));
        assert!(RandomSplitter::new(0.5, true, 0)
            .unwrap()
            .with_num_folds(0)
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_split_is_complete_and_disjoint(
            ratings in proptest::collection::vec((0u64..20, 0u64..30, 1u8..=5), 0..120),
            fraction in 0.05f64..0.95,
            per_user in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let mut store = PreferenceStore::new();
            for (user, item, value) in ratings {
                store.add_preference(user, item, value as f64);
                store.add_timestamp(user, item, (user * 31 + item) as i64);
            }

            let outcome = RandomSplitter::new(fraction, per_user, seed).unwrap().split(&store);
            let fold = &outcome.folds[0];

            let train = triple_set(&fold.train);
            let test = triple_set(&fold.test);
            prop_assert!(train.is_disjoint(&test));
            let union: std::collections::BTreeSet<_> = train.union(&test).cloned().collect();
            prop_assert_eq!(union, triple_set(&store));
            prop_assert_eq!(
                fold.train.num_preferences() + fold.test.num_preferences(),
                store.num_preferences()
            );

            for (user, item, _) in fold.test.triples() {
                prop_assert_eq!(fold.test.timestamp(user, item), store.timestamp(user, item));
            }
            if per_user {
                prop_assert_eq!(fold.train.users(), store.users());
            }
        }

        #[test]
        fn prop_split_is_deterministic(
            ratings in proptest::collection::vec((0u64..10, 0u64..50, 1u8..=5), 0..80),
            fraction in 0.05f64..0.95,
            per_user in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let mut store = PreferenceStore::new();
            for (user, item, value) in ratings {
                store.add_preference(user, item, value as f64);
            }

            let splitter = RandomSplitter::new(fraction, per_user, seed).unwrap();
            let first = splitter.split(&store);
            let second = splitter.split(&store.clone());
            prop_assert_eq!(first.folds, second.folds);
        }
    }
}
