//! In-memory sparse preference store.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// User identifier.
pub type UserId = u64;

/// Item identifier.
pub type ItemId = u64;

/// Sparse user → item → preference mapping with optional timestamps.
///
/// Inserts are O(1) amortized and overwrite any previous value for the same
/// pair (last write wins). Read accessors that expose *sets* of ids return
/// them sorted, so callers iterating users or items get a canonical order
/// independent of hashing.
///
/// Every timestamped pair is guaranteed to also carry a preference:
/// [`add_timestamp`](Self::add_timestamp) ignores pairs without one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceStore {
    preferences: HashMap<UserId, HashMap<ItemId, f64>>,
    timestamps: HashMap<UserId, HashMap<ItemId, i64>>,
}

impl PreferenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the preference of `user` for `item`.
    pub fn add_preference(&mut self, user: UserId, item: ItemId, value: f64) {
        self.preferences
            .entry(user)
            .or_default()
            .insert(item, value);
    }

    /// Records the time at which `user` expressed a preference for `item`.
    ///
    /// The pair must already have a preference; otherwise the timestamp is
    /// dropped.
    pub fn add_timestamp(&mut self, user: UserId, item: ItemId, time: i64) {
        if self.preference(user, item).is_none() {
            debug!(
                "Ignoring timestamp for ({}, {}) without a preference",
                user, item
            );
            return;
        }
        self.timestamps.entry(user).or_default().insert(item, time);
    }

    /// Full user → item → preference map.
    pub fn preferences(&self) -> &HashMap<UserId, HashMap<ItemId, f64>> {
        &self.preferences
    }

    /// Full user → item → timestamp map.
    pub fn timestamps(&self) -> &HashMap<UserId, HashMap<ItemId, i64>> {
        &self.timestamps
    }

    /// Preferences of a single user, if the user is known.
    pub fn user_preferences(&self, user: UserId) -> Option<&HashMap<ItemId, f64>> {
        self.preferences.get(&user)
    }

    pub fn preference(&self, user: UserId, item: ItemId) -> Option<f64> {
        self.preferences.get(&user)?.get(&item).copied()
    }

    pub fn timestamp(&self, user: UserId, item: ItemId) -> Option<i64> {
        self.timestamps.get(&user)?.get(&item).copied()
    }

    pub fn contains_user(&self, user: UserId) -> bool {
        self.preferences.contains_key(&user)
    }

    /// Users with at least one preference, ascending.
    pub fn users(&self) -> BTreeSet<UserId> {
        self.preferences.keys().copied().collect()
    }

    /// Union of all rated items, ascending.
    pub fn items(&self) -> BTreeSet<ItemId> {
        self.preferences
            .values()
            .flat_map(|prefs| prefs.keys().copied())
            .collect()
    }

    /// Items rated by `user`, ascending. Empty for unknown users.
    pub fn user_items(&self, user: UserId) -> BTreeSet<ItemId> {
        self.preferences
            .get(&user)
            .map(|prefs| prefs.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn num_users(&self) -> usize {
        self.preferences.len()
    }

    pub fn num_items(&self) -> usize {
        self.items().len()
    }

    /// Number of (user, item) pairs with a preference.
    pub fn num_preferences(&self) -> usize {
        self.preferences.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    /// All `(user, item, value)` triples sorted by user, then item.
    pub fn triples(&self) -> Vec<(UserId, ItemId, f64)> {
        let mut triples: Vec<_> = self
            .preferences
            .iter()
            .flat_map(|(&user, prefs)| prefs.iter().map(move |(&item, &value)| (user, item, value)))
            .collect();
        triples.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        triples
    }

    /// Copies the preference (and timestamp, if any) of one pair from `source`.
    ///
    /// Used by splitters so timestamps travel with their pair.
    pub(crate) fn copy_pair_from(&mut self, source: &PreferenceStore, user: UserId, item: ItemId) {
        if let Some(value) = source.preference(user, item) {
            self.add_preference(user, item, value);
            if let Some(time) = source.timestamp(user, item) {
                self.add_timestamp(user, item, time);
            }
        }
    }
}
