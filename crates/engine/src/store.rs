//! VectorStore: the orchestrating facade over index, catalog, snapshots and cache
//!
//! One `parking_lot::Mutex` guards the index, the catalog, the cache
//! generation and the lifecycle state. Every public operation holds it for
//! its whole duration, snapshot writes included, so operations are
//! linearizable in lock-acquisition order.
//!
//! # Durability
//!
//! A snapshot is written when the vector count reaches a multiple of
//! `snapshot_interval`, after every removal that matched something, on
//! `flush`, and on `close`. Adds between checkpoints are lost on a crash.
//! Dropping an unclosed store attempts one last save.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use revsearch_core::{
    validate_feature_id, DenseId, Entry, Metadata, RemoveOutcome, SearchHit, StoreConfig,
    StoreError, StoreResult, StoreStats, CONFIG_FILE_NAME,
};
use revsearch_durability::{PersistenceManager, Snapshot, SnapshotInfo};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheBackend, ResultCache};
use crate::catalog::MetadataCatalog;
use crate::distance::prepare_vector;
use crate::index::{VectorIndex, INDEX_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Open,
    Closed,
}

#[derive(Debug)]
struct StoreState {
    index: VectorIndex,
    catalog: MetadataCatalog,
    cache: ResultCache,
    lifecycle: Lifecycle,
}

impl StoreState {
    fn ensure_open(&self) -> StoreResult<()> {
        match self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::Closed => Err(StoreError::Closed),
        }
    }

    fn check_dense(&self) {
        debug_assert!(
            self.catalog.is_dense(self.index.len()),
            "catalog keys diverged from index range 0..{}",
            self.index.len()
        );
    }
}

/// Exact similarity store for fixed-dimension vectors
///
/// `VectorStore` is `Send + Sync`; share it across threads as
/// `Arc<VectorStore>`.
pub struct VectorStore {
    config: StoreConfig,
    persistence: PersistenceManager,
    state: Mutex<StoreState>,
}

impl VectorStore {
    /// Open a store, loading the snapshot in `config.data_dir` if present
    ///
    /// A snapshot that cannot be read (missing companion, checksum failure,
    /// dimension change, torn pair) is logged and replaced by an empty
    /// store. `cache` is used only when `config.cache.enabled` is set.
    ///
    /// # Errors
    ///
    /// - Config validation errors
    /// - `Persistence` if the data directory cannot be created
    pub fn open(
        config: StoreConfig,
        cache: Option<Arc<dyn CacheBackend>>,
    ) -> StoreResult<Self> {
        config.validate()?;

        let persistence = PersistenceManager::from_config(&config);
        persistence.prepare()?;

        let (index, catalog) = load_or_empty(&persistence, config.dimension)?;
        let cache = ResultCache::new(cache, &config.cache);

        info!(
            dir = %config.data_dir.display(),
            dimension = config.dimension,
            count = index.len(),
            cache_enabled = cache.is_enabled(),
            "Vector store opened"
        );

        Ok(VectorStore {
            config,
            persistence,
            state: Mutex::new(StoreState {
                index,
                catalog,
                cache,
                lifecycle: Lifecycle::Open,
            }),
        })
    }

    /// Open the store rooted at `data_dir`, configured by its `revsearch.toml`
    ///
    /// A commented default config is written first if the directory has
    /// none. `data_dir` in the file is ignored; the store always lives at
    /// the given path.
    pub fn open_dir(
        data_dir: impl AsRef<Path>,
        cache: Option<Arc<dyn CacheBackend>>,
    ) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to create data directory '{}': {}",
                data_dir.display(),
                e
            ))
        })?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        StoreConfig::write_default_if_missing(&config_path)?;
        let mut config = StoreConfig::from_file(&config_path)?;
        config.data_dir = data_dir.to_path_buf();

        Self::open(config, cache)
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory holding the snapshot artifacts
    pub fn data_dir(&self) -> &Path {
        self.persistence.data_dir()
    }

    /// Insert a vector under `feature_id`
    ///
    /// Validation happens before any state change. The vector is
    /// normalized to unit length unless its norm is zero.
    ///
    /// # Errors
    ///
    /// - `InvalidFeatureId`, `EmptyVector`, `DimensionMismatch`,
    ///   `NonFiniteComponent` (nothing was stored)
    /// - `Closed`
    /// - `Persistence` if a periodic snapshot failed; the vector *was* added
    pub fn add_feature(
        &self,
        feature_id: &str,
        vector: &[f32],
        metadata: Metadata,
    ) -> StoreResult<DenseId> {
        validate_feature_id(feature_id)?;
        let prepared = prepare_vector(vector, self.config.dimension)?;

        let mut state = self.state.lock();
        state.ensure_open()?;

        let dense_id = state.index.append(&prepared)?;
        state.catalog.record(dense_id, feature_id, metadata);
        state.cache.invalidate();
        state.check_dense();

        debug!(feature_id, dense_id = dense_id.as_u64(), "Feature added");

        if state.index.len() % self.config.snapshot_interval == 0 {
            self.save_locked(&state)?;
        }

        Ok(dense_id)
    }

    /// Find up to `k` stored features closest to `query`
    ///
    /// `k` is clamped to `max_results`. Hits farther than `max_distance`
    /// are dropped, so fewer than `k` results is normal. Results are
    /// ordered by ascending distance, ties by insertion order.
    ///
    /// # Errors
    ///
    /// - `EmptyVector`, `DimensionMismatch`, `NonFiniteComponent`
    /// - `Closed`
    pub fn search_similar(&self, query: &[f32], k: usize) -> StoreResult<Vec<SearchHit>> {
        let prepared = prepare_vector(query, self.config.dimension)?;
        let k = k.min(self.config.max_results);

        let state = self.state.lock();
        state.ensure_open()?;

        if k == 0 || state.index.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(hits) = state.cache.lookup(&prepared, k) {
            return Ok(hits);
        }

        let max_distance = self.config.max_distance;
        let mut hits = Vec::with_capacity(k);
        for (dense_id, distance) in state.index.search(&prepared, k)? {
            if distance > max_distance {
                continue;
            }
            match state.catalog.lookup(dense_id) {
                Some(entry) => hits.push(SearchHit::new(entry.feature_id.clone(), distance)),
                None => error!(
                    dense_id = dense_id.as_u64(),
                    "Index position has no catalog entry"
                ),
            }
        }

        state.cache.store(&prepared, k, &hits);
        debug!(k, hits = hits.len(), "Search completed");
        Ok(hits)
    }

    /// Delete every entry recorded under any of `feature_ids`
    ///
    /// Surviving entries are renumbered densely in their relative order.
    /// Unknown ids are reported in `not_found`, not treated as errors.
    ///
    /// # Errors
    ///
    /// - `Closed`
    /// - `Persistence` if the post-removal snapshot failed; the removal
    ///   *was* applied in memory
    pub fn remove_features<S: AsRef<str>>(&self, feature_ids: &[S]) -> StoreResult<RemoveOutcome> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        let mut outcome = RemoveOutcome::default();
        let mut seen = HashSet::new();
        let mut excluded = BTreeSet::new();

        for feature_id in feature_ids {
            let feature_id = feature_id.as_ref();
            if !seen.insert(feature_id) {
                continue;
            }
            let positions = state.catalog.reverse_lookup(feature_id);
            if positions.is_empty() {
                outcome.not_found.push(feature_id.to_string());
            } else {
                excluded.extend(positions);
                outcome.removed.push(feature_id.to_string());
            }
        }

        if excluded.is_empty() {
            return Ok(outcome);
        }

        let (rebuilt, remap) = state.index.rebuild_excluding(&excluded);
        state.index = rebuilt;
        state.catalog.reindex(&remap);
        state.cache.invalidate();
        state.check_dense();

        info!(
            requested = feature_ids.len(),
            vectors_removed = excluded.len(),
            remaining = state.index.len(),
            "Features removed"
        );

        self.save_locked(&state)?;
        Ok(outcome)
    }

    /// Current sizes and settings
    ///
    /// Still answers after `close`, reporting the state that was saved.
    pub fn stats(&self) -> StoreStats {
        let state = self.state.lock();
        StoreStats {
            total_vectors: state.index.len(),
            dimension: self.config.dimension,
            metadata_count: state.catalog.len(),
            cache_enabled: state.cache.is_enabled(),
            index_type: INDEX_TYPE.to_string(),
            max_distance: self.config.max_distance,
        }
    }

    /// Write a snapshot now
    ///
    /// # Errors
    ///
    /// - `Closed`
    /// - `Persistence`
    pub fn flush(&self) -> StoreResult<()> {
        let state = self.state.lock();
        state.ensure_open()?;
        self.save_locked(&state)?;
        Ok(())
    }

    /// Whether `close` has completed
    pub fn is_closed(&self) -> bool {
        self.state.lock().lifecycle == Lifecycle::Closed
    }

    /// Save a final snapshot and close the store
    ///
    /// # Errors
    ///
    /// - `Persistence` if the final snapshot failed
    pub fn close(self) -> StoreResult<()> {
        self.close_shared()
    }

    /// Close through a shared handle
    ///
    /// Other holders of the same `Arc<VectorStore>` get `Closed` from every
    /// subsequent operation. Closing twice is a no-op. If the final save
    /// fails the store stays open so the caller can retry.
    pub fn close_shared(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Closed {
            return Ok(());
        }
        let info = self.save_locked(&state)?;
        state.lifecycle = Lifecycle::Closed;
        info!(
            dir = %self.persistence.data_dir().display(),
            count = info.count,
            "Vector store closed"
        );
        Ok(())
    }

    fn save_locked(&self, state: &StoreState) -> StoreResult<SnapshotInfo> {
        let entries: Vec<Entry> = state.catalog.entries().cloned().collect();
        let info = self
            .persistence
            .save(state.index.dimension(), state.index.as_slice(), &entries)?;
        debug!(
            count = info.count,
            vectors_bytes = info.vectors_bytes,
            metadata_bytes = info.metadata_bytes,
            "Snapshot saved"
        );
        Ok(info)
    }
}

impl Drop for VectorStore {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.lifecycle == Lifecycle::Closed {
            return;
        }
        let entries: Vec<Entry> = state.catalog.entries().cloned().collect();
        match self
            .persistence
            .save(state.index.dimension(), state.index.as_slice(), &entries)
        {
            Ok(info) => debug!(count = info.count, "Snapshot saved on drop"),
            Err(e) => warn!(
                dir = %self.persistence.data_dir().display(),
                error = %e,
                "Failed to save snapshot on drop"
            ),
        }
        state.lifecycle = Lifecycle::Closed;
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("data_dir", &self.persistence.data_dir())
            .field("dimension", &self.config.dimension)
            .finish()
    }
}

fn load_or_empty(
    persistence: &PersistenceManager,
    dimension: usize,
) -> StoreResult<(VectorIndex, MetadataCatalog)> {
    let snapshot = match persistence.load(dimension) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            debug!(dir = %persistence.data_dir().display(), "No snapshot found, starting empty");
            return Ok((VectorIndex::new(dimension)?, MetadataCatalog::new()));
        }
        Err(e) => {
            error!(
                dir = %persistence.data_dir().display(),
                error = %e,
                "Failed to load snapshot, starting empty"
            );
            return Ok((VectorIndex::new(dimension)?, MetadataCatalog::new()));
        }
    };

    match restore(snapshot) {
        Ok(pair) => Ok(pair),
        Err(e) => {
            error!(
                dir = %persistence.data_dir().display(),
                error = %e,
                "Snapshot is inconsistent, starting empty"
            );
            Ok((VectorIndex::new(dimension)?, MetadataCatalog::new()))
        }
    }
}

fn restore(snapshot: Snapshot) -> StoreResult<(VectorIndex, MetadataCatalog)> {
    let index = VectorIndex::from_raw(snapshot.matrix.dimension, snapshot.matrix.data)?;
    let catalog = MetadataCatalog::from_entries(snapshot.entries);
    if !catalog.is_dense(index.len()) {
        return Err(StoreError::Persistence(format!(
            "catalog keys are not exactly 0..{}",
            index.len()
        )));
    }
    Ok((index, catalog))
}
