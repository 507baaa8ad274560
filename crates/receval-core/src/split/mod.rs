//! Train/test partitioning of a [`PreferenceStore`].
//!
//! Two splitters are provided:
//!
//! | Splitter | Folds | Each pair lands in |
//! |----------|-------|--------------------|
//! | [`RandomSplitter`] | `num_folds` independent holdouts | test of a fold with probability ≈ `test_fraction` |
//! | [`CrossValidationSplitter`] | `k` complementary folds | test of exactly one fold |
//!
//! Both are deterministic: the generator is seeded once per
//! [`Splitter::split`] call and users/items are visited in ascending id order
//! before any shuffling, so the same input and seed always yield identical
//! folds. Timestamps travel with their (user, item) pair.
//!
//! # Example
//!
//! ```
//! use receval_core::data::PreferenceStore;
//! use receval_core::split::{RandomSplitter, Splitter};
//!
//! let mut store = PreferenceStore::new();
//! for item in 0..10 {
//!     store.add_preference(1, item, 4.0);
//! }
//! let outcome = RandomSplitter::new(0.2, true, 42).unwrap().split(&store);
//! let fold = &outcome.folds[0];
//! assert_eq!(fold.test.num_preferences(), 2);
//! assert_eq!(fold.train.num_preferences(), 8);
//! ```

pub mod cross_validation;
pub mod random;

pub use cross_validation::CrossValidationSplitter;
pub use random::RandomSplitter;

use crate::data::PreferenceStore;
use crate::error::InsufficientDataWarning;
use serde::{Deserialize, Serialize};

/// One train/test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    /// Position of this fold in the sequence produced by one split call
    pub index: usize,
    pub train: PreferenceStore,
    pub test: PreferenceStore,
}

/// Folds plus the data-sparsity diagnostics gathered while producing them.
#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    pub folds: Vec<Fold>,
    pub warnings: Vec<InsufficientDataWarning>,
}

/// Partitions a store into numbered train/test folds.
pub trait Splitter {
    fn split(&self, store: &PreferenceStore) -> SplitOutcome;
}

/// Which splitter a configuration asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitterKind {
    #[default]
    Random,
    CrossValidation,
}

/// Number of test items for a group of `count` preferences.
///
/// `floor(fraction × count)`, raised to 1 when that would leave no test item
/// and the group has at least two preferences, and capped at `count − 1` so
/// the training side of a non-empty group is never empty. A single
/// preference therefore always stays in train.
pub fn test_count(count: usize, fraction: f64) -> usize {
    if count == 0 {
        return 0;
    }
    // Guard against 0.29 * 100 = 28.999999999999996
    let mut n_test = (fraction * count as f64 + 1e-9).floor() as usize;
    if n_test == 0 && fraction > 0.0 && count >= 2 {
        n_test = 1;
    }
    n_test.min(count - 1)
}

/// Ratings a user needs before the per-user split can give them a test
/// preference (the forced-test rule covers every `n >= 2`).
pub(crate) const MIN_RATINGS_FOR_TEST: usize = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_floors() {
        assert_eq!(test_count(10, 0.2), 2);
        assert_eq!(test_count(9, 0.2), 1);
        assert_eq!(test_count(100, 0.29), 29);
    }

    #[test]
    fn test_count_forces_one_test_item() {
        assert_eq!(test_count(2, 0.1), 1);
        assert_eq!(test_count(3, 0.2), 1);
    }

    #[test]
    fn test_count_keeps_train_non_empty() {
        assert_eq!(test_count(1, 0.5), 0);
        assert_eq!(test_count(1, 0.99), 0);
        assert_eq!(test_count(2, 0.99), 1);
        assert_eq!(test_count(0, 0.5), 0);
    }

    #[test]
    fn test_min_ratings_always_get_test_item() {
        for fraction in [0.01, 0.2, 0.5, 0.99] {
            assert_eq!(test_count(MIN_RATINGS_FOR_TEST - 1, fraction), 0);
            assert!(test_count(MIN_RATINGS_FOR_TEST, fraction) >= 1);
        }
    }
}
