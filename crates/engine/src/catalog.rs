//! Metadata catalog: dense id → entry, feature id → dense ids
//!
//! The catalog's key set mirrors the index's valid range `0..N`. Any
//! divergence is a store bug, never a caller error.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use revsearch_core::{DenseId, Entry, Metadata};

/// Entry records plus the inverse identifier lookup
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    /// BTreeMap keeps iteration in dense-id order for snapshots
    entries: BTreeMap<DenseId, Entry>,
    by_feature: HashMap<String, BTreeSet<DenseId>>,
}

impl MetadataCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from entries, keyed by their own dense ids (for snapshot load)
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store an entry stamped with the current time
    ///
    /// Overwrites silently if `dense_id` is already present.
    pub fn record(&mut self, dense_id: DenseId, feature_id: &str, metadata: Metadata) {
        self.insert(Entry {
            dense_id,
            feature_id: feature_id.to_string(),
            metadata,
            timestamp: Utc::now(),
        });
    }

    /// Entry at a position
    pub fn lookup(&self, dense_id: DenseId) -> Option<&Entry> {
        self.entries.get(&dense_id)
    }

    /// Every position recorded under `feature_id`
    pub fn reverse_lookup(&self, feature_id: &str) -> BTreeSet<DenseId> {
        self.by_feature.get(feature_id).cloned().unwrap_or_default()
    }

    /// Renumber entries after an index rebuild
    ///
    /// `remap` maps surviving old ids to new ids; entries whose old id is
    /// absent are dropped.
    pub fn reindex(&mut self, remap: &BTreeMap<DenseId, DenseId>) {
        let old = std::mem::take(&mut self.entries);
        self.by_feature.clear();
        for (old_id, mut entry) in old {
            if let Some(&new_id) = remap.get(&old_id) {
                entry.dense_id = new_id;
                self.insert(entry);
            }
        }
    }

    /// Entries in dense-id order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Whether the key set is exactly `0..n`
    pub fn is_dense(&self, n: usize) -> bool {
        self.entries.len() == n
            && self
                .entries
                .keys()
                .enumerate()
                .all(|(i, id)| id.as_usize() == i)
    }

    fn insert(&mut self, entry: Entry) {
        let dense_id = entry.dense_id;
        if let Some(previous) = self.entries.insert(dense_id, entry) {
            if let Some(ids) = self.by_feature.get_mut(&previous.feature_id) {
                ids.remove(&dense_id);
                if ids.is_empty() {
                    self.by_feature.remove(&previous.feature_id);
                }
            }
        }
        let feature_id = self.entries[&dense_id].feature_id.clone();
        self.by_feature.entry(feature_id).or_default().insert(dense_id);
    }
}
