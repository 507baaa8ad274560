//! k-fold cross-validation splitter.

use super::{Fold, SplitOutcome, Splitter};
use crate::data::{ItemId, PreferenceStore, UserId};
use crate::error::ConfigError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Assigns every preference to exactly one of `num_folds` test folds.
///
/// Preferences are shuffled (per user, or globally) and dealt round-robin
/// to the folds; fold `i` tests on the preferences dealt to `i` and trains on
/// everything else. In per-user mode the dealing position carries over from
/// one user to the next so users with fewer ratings than folds do not all
/// pile into fold 0.
#[derive(Debug, Clone)]
pub struct CrossValidationSplitter {
    num_folds: usize,
    per_user: bool,
    seed: u64,
}

impl CrossValidationSplitter {
    pub fn new(num_folds: usize, per_user: bool, seed: u64) -> Result<Self, ConfigError> {
        if num_folds < 2 {
            return Err(ConfigError::InvalidFolds(num_folds));
        }
        Ok(Self {
            num_folds,
            per_user,
            seed,
        })
    }

    fn assign(&self, store: &PreferenceStore) -> Vec<Vec<(UserId, ItemId)>> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut assignment = vec![Vec::new(); self.num_folds];
        let mut next_fold = 0;

        let mut deal = |pairs: Vec<(UserId, ItemId)>| {
            for pair in pairs {
                assignment[next_fold].push(pair);
                next_fold = (next_fold + 1) % self.num_folds;
            }
        };

        if self.per_user {
            for user in store.users() {
                let mut pairs: Vec<_> = store
                    .user_items(user)
                    .into_iter()
                    .map(|item| (user, item))
                    .collect();
                pairs.shuffle(&mut rng);
                deal(pairs);
            }
        } else {
            let mut pairs: Vec<_> = store
                .triples()
                .into_iter()
                .map(|(user, item, _)| (user, item))
                .collect();
            pairs.shuffle(&mut rng);
            deal(pairs);
        }

        assignment
    }
}

impl Splitter for CrossValidationSplitter {
    fn split(&self, store: &PreferenceStore) -> SplitOutcome {
        let assignment = self.assign(store);

        let folds = (0..self.num_folds)
            .map(|index| {
                let mut train = PreferenceStore::new();
                let mut test = PreferenceStore::new();
                for (fold, pairs) in assignment.iter().enumerate() {
                    let target = if fold == index { &mut test } else { &mut train };
                    for &(user, item) in pairs {
                        target.copy_pair_from(store, user, item);
                    }
                }
                Fold { index, train, test }
            })
            .collect();

        info!(
            "Cross-validation split (k={}, per_user={})",
            self.num_folds, self.per_user
        );

        SplitOutcome {
            folds,
            warnings: Vec::new(),
        }
    }
}
