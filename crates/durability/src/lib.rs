//! Durability layer for revsearch
//!
//! This crate persists the vector index and its metadata catalog as a pair
//! of companion artifacts:
//!
//! - **Vector blob**: N×D matrix of f32, row-major, CRC32-protected
//! - **Metadata document**: JSON object keyed by dense id
//!
//! # Architecture
//!
//! - `vector_blob`: Binary matrix codec
//! - `metadata_doc`: JSON catalog codec
//! - `atomic`: Write-fsync-rename file replacement
//! - `snapshot`: PersistenceManager tying the two artifacts together
//!
//! # Guarantees
//!
//! Each artifact is replaced atomically. The blob records the checksum of
//! its companion document, and the pair is cross-checked on load (document
//! checksum, row count vs. document keys, dimension vs. configuration), so
//! a torn or corrupt snapshot is reported instead of silently loaded.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atomic;
pub mod error;
pub mod metadata_doc;
pub mod snapshot;
pub mod vector_blob;

pub use error::{PersistenceError, PersistenceResult};
pub use snapshot::{PersistenceManager, Snapshot, SnapshotInfo};
pub use vector_blob::{VectorMatrix, VECTOR_BLOB_MAGIC, VECTOR_BLOB_VERSION};
