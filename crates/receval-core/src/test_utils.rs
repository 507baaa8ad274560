//! Test utilities for receval-core.
//!
//! Shared fixtures for unit tests. Only compiled when running tests.

use crate::data::{ItemId, PreferenceStore, UserId};
use std::collections::BTreeSet;

/// Builds a store with `users` users (ids `1..=users`), each rating
/// `items_per_user` items (ids `1..=items_per_user`) with values cycling 1–5.
pub fn sample_store(users: u64, items_per_user: u64) -> PreferenceStore {
    let mut store = PreferenceStore::new();
    for user in 1..=users {
        for item in 1..=items_per_user {
            let value = ((user + item) % 5 + 1) as f64;
            store.add_preference(user, item, value);
            store.add_timestamp(user, item, (user * 1_000 + item) as i64);
        }
    }
    store
}

/// Builds a store from `(user, item, value)` triples.
pub fn store_from(triples: &[(UserId, ItemId, f64)]) -> PreferenceStore {
    let mut store = PreferenceStore::new();
    for &(user, item, value) in triples {
        store.add_preference(user, item, value);
    }
    store
}

/// Triples as an ordered set; values compared bitwise.
pub fn triple_set(store: &PreferenceStore) -> BTreeSet<(UserId, ItemId, u64)> {
    store
        .triples()
        .into_iter()
        .map(|(user, item, value)| (user, item, value.to_bits()))
        .collect()
}

/// Asserts two floats are equal within 1e-9, treating NaN as equal to NaN.
pub fn assert_close(actual: f64, expected: f64) {
    if expected.is_nan() {
        assert!(actual.is_nan(), "expected NaN, got {}", actual);
    } else {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }
}
