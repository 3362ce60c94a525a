//! revsearch - Exact image-similarity vector store
//!
//! revsearch holds fixed-dimension embeddings in memory, answers exact
//! nearest-neighbor queries by Euclidean distance, and persists everything
//! as a checksummed snapshot pair on disk.
//!
//! # Quick Start
//!
//! ```no_run
//! use revsearch::{Metadata, StoreConfig, VectorStore};
//!
//! # fn main() -> Result<(), revsearch::StoreError> {
//! let store = VectorStore::open(StoreConfig::new(4, "./features"), None)?;
//!
//! store.add_feature("cat-001", &[0.1, 0.9, 0.0, 0.2], Metadata::new())?;
//!
//! for hit in store.search_similar(&[0.1, 0.8, 0.0, 0.3], 5)? {
//!     println!("{} at {:.3}", hit.feature_id, hit.distance);
//! }
//!
//! store.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `revsearch-core`: shared types, errors and `revsearch.toml` config
//! - `revsearch-durability`: vector blob / metadata document snapshots
//! - `revsearch-engine`: index, catalog, cache, [`VectorStore`] and
//!   [`SearchService`]
//!
//! Only the types needed to open and drive a store are re-exported here.

pub use revsearch_core::{
    CacheConfig, DenseId, Entry, Metadata, RemoveOutcome, SearchHit, StoreConfig, StoreError,
    StoreResult, StoreStats, CONFIG_FILE_NAME,
};
pub use revsearch_engine::{
    CacheBackend, CacheError, ExtractError, FeatureExtractor, MemoryCache, ModelInfo, NoopCache,
    SearchService, ServiceInfo, VectorStore, INDEX_TYPE,
};
