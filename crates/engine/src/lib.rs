//! Similarity engine for revsearch
//!
//! This crate orchestrates the lower layers:
//! - VectorIndex: contiguous vectors with exact L2 search
//! - MetadataCatalog: dense id ↔ feature id bookkeeping
//! - ResultCache: best-effort memoization of search results
//! - VectorStore: the locked facade with open/close and snapshots
//! - SearchService: image extraction in front of the store
//!
//! The engine is the only component that knows about:
//! - Rebuild-on-delete and dense id reassignment
//! - When snapshots are taken
//! - Cache invalidation on mutation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod catalog;
pub mod distance;
pub mod extractor;
pub mod index;
pub mod service;
pub mod store;

pub use cache::{CacheBackend, CacheError, MemoryCache, NoopCache, ResultCache};
pub use catalog::MetadataCatalog;
pub use extractor::{ExtractError, FeatureExtractor, ModelInfo};
pub use index::{VectorIndex, INDEX_TYPE};
pub use service::{SearchService, ServiceInfo};
pub use store::VectorStore;
