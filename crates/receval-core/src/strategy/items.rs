//! Strategies whose candidates come straight from the train/test stores.

use super::CandidateStrategy;
use crate::data::{ItemId, PreferenceStore, UserId};
use std::collections::BTreeSet;

/// Items the user rated in the test set.
#[derive(Debug, Clone, Copy)]
pub struct TestItems<'a> {
    test: &'a PreferenceStore,
}

impl<'a> TestItems<'a> {
    pub fn new(test: &'a PreferenceStore) -> Self {
        Self { test }
    }
}

impl CandidateStrategy for TestItems<'_> {
    fn name(&self) -> &'static str {
        "test_items"
    }

    fn candidate_items(&self, user: UserId) -> BTreeSet<ItemId> {
        self.test.user_items(user)
    }
}

/// Items the user rated in the training set.
#[derive(Debug, Clone, Copy)]
pub struct TrainItems<'a> {
    train: &'a PreferenceStore,
}

impl<'a> TrainItems<'a> {
    pub fn new(train: &'a PreferenceStore) -> Self {
        Self { train }
    }
}

impl CandidateStrategy for TrainItems<'_> {
    fn name(&self) -> &'static str {
        "train_items"
    }

    fn candidate_items(&self, user: UserId) -> BTreeSet<ItemId> {
        self.train.user_items(user)
    }
}

/// Test items whose rating reaches the relevance threshold.
#[derive(Debug, Clone, Copy)]
pub struct RelevantTestItems<'a> {
    test: &'a PreferenceStore,
    threshold: f64,
}

impl<'a> RelevantTestItems<'a> {
    pub fn new(test: &'a PreferenceStore, threshold: f64) -> Self {
        Self { test, threshold }
    }
}

impl CandidateStrategy for RelevantTestItems<'_> {
    fn name(&self) -> &'static str {
        "relevant_test_items"
    }

    fn candidate_items(&self, user: UserId) -> BTreeSet<ItemId> {
        self.test
            .user_preferences(user)
            .map(|prefs| {
                prefs
                    .iter()
                    .filter(|(_, &value)| value >= self.threshold)
                    .map(|(&item, _)| item)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Every known item except those the user already rated in training.
#[derive(Debug, Clone)]
pub struct AllItems<'a> {
    train: &'a PreferenceStore,
    catalog: BTreeSet<ItemId>,
}

impl<'a> AllItems<'a> {
    pub fn new(train: &'a PreferenceStore, test: &PreferenceStore) -> Self {
        let mut catalog = train.items();
        catalog.extend(test.items());
        Self { train, catalog }
    }
}

impl CandidateStrategy for AllItems<'_> {
    fn name(&self) -> &'static str {
        "all_items"
    }

    fn candidate_items(&self, user: UserId) -> BTreeSet<ItemId> {
        let rated = self.train.user_items(user);
        self.catalog.difference(&rated).copied().collect()
    }
}
