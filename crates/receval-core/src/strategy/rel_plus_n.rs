//! Relevant test items plus `N` sampled negatives.

use super::CandidateStrategy;
use crate::data::{ItemId, PreferenceStore, UserId};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

/// Candidates are the user's relevant test items plus `n` items drawn from
/// the catalog items the user has rated in neither train nor test.
///
/// Each user gets its own generator derived from `(seed, user)`, so the
/// sample does not depend on the order in which users are queried.
#[derive(Debug, Clone)]
pub struct RelPlusN<'a> {
    train: &'a PreferenceStore,
    test: &'a PreferenceStore,
    threshold: f64,
    n: usize,
    seed: u64,
    catalog: BTreeSet<ItemId>,
}

impl<'a> RelPlusN<'a> {
    pub fn new(
        train: &'a PreferenceStore,
        test: &'a PreferenceStore,
        threshold: f64,
        n: usize,
        seed: u64,
    ) -> Self {
        let mut catalog = train.items();
        catalog.extend(test.items());
        Self {
            train,
            test,
            threshold,
            n,
            seed,
            catalog,
        }
    }

    fn user_rng(&self, user: UserId) -> ChaCha8Rng {
        // SplitMix64 finalizer over seed ^ user
        let mut z = self.seed ^ user.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        ChaCha8Rng::seed_from_u64(z ^ (z >> 31))
    }
}

impl CandidateStrategy for RelPlusN<'_> {
    fn name(&self) -> &'static str {
        "rel_plus_n"
    }

    fn candidate_items(&self, user: UserId) -> BTreeSet<ItemId> {
        let test_items = self.test.user_preferences(user);
        let mut candidates: BTreeSet<ItemId> = test_items
            .map(|prefs| {
                prefs
                    .iter()
                    .filter(|(_, &value)| value >= self.threshold)
                    .map(|(&item, _)| item)
                    .collect()
            })
            .unwrap_or_default();

        let rated_train = self.train.user_items(user);
        let unrated: Vec<ItemId> = self
            .catalog
            .iter()
            .copied()
            .filter(|item| {
                !rated_train.contains(item) && test_items.map_or(true, |p| !p.contains_key(item))
            })
            .collect();

        let mut rng = self.user_rng(user);
        candidates.extend(unrated.choose_multiple(&mut rng, self.n).copied());
        candidates
    }
}
