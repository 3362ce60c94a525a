//! Core types for revsearch
//!
//! This crate defines the foundational types used throughout the system:
//! - DenseId: Contiguous position of a vector in the index
//! - Entry / Metadata: Catalog records and their opaque payload
//! - SearchHit / RemoveOutcome / StoreStats: Operation results
//! - StoreError: Error type shared by every layer
//! - StoreConfig: Configuration loaded from `revsearch.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    CacheConfig, StoreConfig, CONFIG_FILE_NAME, DEFAULT_METADATA_FILE, DEFAULT_VECTORS_FILE,
};
pub use error::{StoreError, StoreResult};
pub use types::{
    validate_feature_id, DenseId, Entry, Metadata, RemoveOutcome, SearchHit, StoreStats,
    MAX_FEATURE_ID_LEN,
};
