//! Snapshot persistence for the vector index and its metadata catalog
//!
//! A snapshot is a pair of companion artifacts in the data directory:
//! the vector blob (see [`crate::vector_blob`]) and the metadata document
//! (see [`crate::metadata_doc`]).
//!
//! # Crash Safety
//!
//! 1. Encode both artifacts in memory
//! 2. Stage each to a temp sibling and fsync it
//! 3. Rename the blob into place, then the document, fsyncing the directory
//!
//! Each file is replaced atomically, but the pair is not: a crash between the
//! two renames leaves a new blob next to an old document. The blob header
//! records the CRC32 of the document it was written with, and
//! [`PersistenceManager::load`] rejects any document that does not match,
//! so such a pair is reported as corrupt rather than loaded.

use std::path::{Path, PathBuf};

use revsearch_core::{Entry, StoreConfig};
use tracing::{debug, info};

use crate::atomic;
use crate::error::{PersistenceError, PersistenceResult};
use crate::metadata_doc;
use crate::vector_blob::{self, VectorMatrix};

/// Contents of a successfully loaded snapshot
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Row-major vectors in dense-id order
    pub matrix: VectorMatrix,
    /// Catalog entries in dense-id order, one per row
    pub entries: Vec<Entry>,
}

/// Information about a written snapshot
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    /// Number of vectors written
    pub count: usize,
    /// Size of the vector blob
    pub vectors_bytes: u64,
    /// Size of the metadata document
    pub metadata_bytes: u64,
}

/// Writes and reads the vector blob / metadata document pair
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    data_dir: PathBuf,
    vectors_path: PathBuf,
    metadata_path: PathBuf,
}

impl PersistenceManager {
    /// Create a manager for explicit artifact paths
    pub fn new(
        data_dir: impl Into<PathBuf>,
        vectors_path: impl Into<PathBuf>,
        metadata_path: impl Into<PathBuf>,
    ) -> Self {
        PersistenceManager {
            data_dir: data_dir.into(),
            vectors_path: vectors_path.into(),
            metadata_path: metadata_path.into(),
        }
    }

    /// Create a manager for the paths named in a store config
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            config.data_dir.clone(),
            config.vectors_path(),
            config.metadata_path(),
        )
    }

    /// Directory holding both artifacts
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Vector blob path
    pub fn vectors_path(&self) -> &Path {
        &self.vectors_path
    }

    /// Metadata document path
    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// Create the data directory and remove temp files left by a crash
    pub fn prepare(&self) -> PersistenceResult<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let removed = atomic::cleanup_temp_files(&self.data_dir)?;
        if removed > 0 {
            info!(
                dir = %self.data_dir.display(),
                removed,
                "Removed incomplete snapshot temp files"
            );
        }
        Ok(())
    }

    /// Write a full snapshot
    ///
    /// `entries` must hold exactly one entry per row of `vectors`, in
    /// dense-id order.
    pub fn save(
        &self,
        dimension: usize,
        vectors: &[f32],
        entries: &[Entry],
    ) -> PersistenceResult<SnapshotInfo> {
        let rows = if dimension == 0 {
            0
        } else {
            vectors.len() / dimension
        };
        if rows != entries.len() {
            return Err(PersistenceError::Inconsistent(format!(
                "{} vectors but {} catalog entries",
                rows,
                entries.len()
            )));
        }

        let doc = metadata_doc::encode(entries)?;
        let blob = vector_blob::encode(dimension, vectors, crc32fast::hash(&doc))?;

        std::fs::create_dir_all(&self.data_dir)?;
        let blob_temp = atomic::stage(&self.vectors_path, &blob)?;
        let doc_temp = match atomic::stage(&self.metadata_path, &doc) {
            Ok(path) => path,
            Err(e) => {
                let _ = std::fs::remove_file(&blob_temp);
                return Err(e.into());
            }
        };

        if let Err(e) = atomic::commit(&blob_temp, &self.vectors_path) {
            let _ = std::fs::remove_file(&doc_temp);
            return Err(e.into());
        }
        atomic::commit(&doc_temp, &self.metadata_path)?;

        debug!(
            vectors = %self.vectors_path.display(),
            metadata = %self.metadata_path.display(),
            count = rows,
            "Snapshot written"
        );

        Ok(SnapshotInfo {
            count: rows,
            vectors_bytes: blob.len() as u64,
            metadata_bytes: doc.len() as u64,
        })
    }

    /// Read the snapshot, if any
    ///
    /// Returns `Ok(None)` when neither artifact exists. Any other problem
    /// (one artifact missing, checksum failure, dimension differing from
    /// `expected_dimension`, row count not matching document keys) is an
    /// error; the caller decides whether to fall back to an empty store.
    pub fn load(&self, expected_dimension: usize) -> PersistenceResult<Option<Snapshot>> {
        let has_vectors = self.vectors_path.exists();
        let has_metadata = self.metadata_path.exists();

        match (has_vectors, has_metadata) {
            (false, false) => return Ok(None),
            (true, false) => {
                return Err(PersistenceError::MissingArtifact(
                    self.metadata_path.display().to_string(),
                ))
            }
            (false, true) => {
                return Err(PersistenceError::MissingArtifact(
                    self.vectors_path.display().to_string(),
                ))
            }
            (true, true) => {}
        }

        let matrix = vector_blob::decode(&std::fs::read(&self.vectors_path)?)?;
        if matrix.dimension != expected_dimension {
            return Err(PersistenceError::DimensionMismatch {
                expected: expected_dimension,
                found: matrix.dimension,
            });
        }

        let doc = std::fs::read(&self.metadata_path)?;
        let doc_crc = crc32fast::hash(&doc);
        if doc_crc != matrix.metadata_crc {
            return Err(PersistenceError::Inconsistent(format!(
                "metadata document checksum {:08x} does not match {:08x} recorded in the vector blob",
                doc_crc, matrix.metadata_crc
            )));
        }

        let entries = metadata_doc::decode(&doc)?;
        if entries.len() != matrix.count() {
            return Err(PersistenceError::Inconsistent(format!(
                "vector blob has {} rows but metadata document has {} entries",
                matrix.count(),
                entries.len()
            )));
        }

        info!(
            vectors = %self.vectors_path.display(),
            count = entries.len(),
            dimension = matrix.dimension,
            "Snapshot loaded"
        );

        Ok(Some(Snapshot { matrix, entries }))
    }
}
