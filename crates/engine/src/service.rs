//! Image search service: extraction in front of the vector store

use std::sync::Arc;

use revsearch_core::{
    DenseId, Metadata, RemoveOutcome, SearchHit, StoreError, StoreResult, StoreStats,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::extractor::{FeatureExtractor, ModelInfo};
use crate::store::VectorStore;

/// Model description plus the store it feeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Extractor description
    pub model: ModelInfo,
    /// Store dimension
    pub store_dimension: usize,
    /// Index implementation name
    pub index_type: String,
}

/// Index and query images by visual similarity
pub struct SearchService<E: FeatureExtractor> {
    extractor: E,
    store: Arc<VectorStore>,
}

impl<E: FeatureExtractor> SearchService<E> {
    /// Pair an extractor with a store
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the extractor's vectors don't fit the store.
    pub fn new(extractor: E, store: Arc<VectorStore>) -> StoreResult<Self> {
        let produced = extractor.model_info().feature_dimension;
        let expected = store.config().dimension;
        if produced != expected {
            return Err(StoreError::DimensionMismatch {
                expected,
                got: produced,
            });
        }
        info!(pipeline = %extractor.model_info().pipeline, dimension = expected, "Search service ready");
        Ok(SearchService { extractor, store })
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Embed `image` and index it under `feature_id`
    ///
    /// # Errors
    ///
    /// - `NoSubjectDetected` / `Extraction` from the extractor
    /// - any error from [`VectorStore::add_feature`]
    pub fn add_image(
        &self,
        feature_id: &str,
        image: &[u8],
        metadata: Metadata,
    ) -> StoreResult<DenseId> {
        let vector = self.extractor.extract(image)?;
        debug!(feature_id, bytes = image.len(), "Image embedded");
        self.store.add_feature(feature_id, &vector, metadata)
    }

    /// Find indexed images similar to `image`
    ///
    /// `k` defaults to the store's `max_results`.
    pub fn search_image(&self, image: &[u8], k: Option<usize>) -> StoreResult<Vec<SearchHit>> {
        let vector = self.extractor.extract(image)?;
        let k = k.unwrap_or(self.store.config().max_results);
        self.store.search_similar(&vector, k)
    }

    /// Remove indexed images by feature id
    pub fn remove<S: AsRef<str>>(&self, feature_ids: &[S]) -> StoreResult<RemoveOutcome> {
        self.store.remove_features(feature_ids)
    }

    /// Store statistics
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Extractor and store description
    pub fn model_info(&self) -> ServiceInfo {
        ServiceInfo {
            model: self.extractor.model_info(),
            store_dimension: self.store.config().dimension,
            index_type: crate::index::INDEX_TYPE.to_string(),
        }
    }
}
