//! Image-to-vector boundary
//!
//! The embedding model lives outside this crate. Anything that turns
//! image bytes into a fixed-dimension `f32` vector can back the search
//! service by implementing [`FeatureExtractor`].

use revsearch_core::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to produce an embedding
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The image contains nothing the model is trained to embed
    #[error("No subject detected in image")]
    NoSubjectDetected,

    /// Decoding or inference failed
    #[error("Feature extraction failed: {0}")]
    Processing(String),
}

impl From<ExtractError> for StoreError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::NoSubjectDetected => StoreError::NoSubjectDetected,
            ExtractError::Processing(msg) => StoreError::Extraction(msg),
        }
    }
}

/// Description of the embedding pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Pipeline name, e.g. "detector + embedder"
    pub pipeline: String,
    /// Model names making up the pipeline, in stage order
    pub models: Vec<String>,
    /// Length of the vectors produced
    pub feature_dimension: usize,
    /// Free-form pipeline parameters (thresholds, class lists)
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

/// Turns raw image bytes into an embedding
pub trait FeatureExtractor: Send + Sync {
    /// Embed one image
    ///
    /// The vector need not be normalized; the store does that.
    fn extract(&self, image: &[u8]) -> Result<Vec<f32>, ExtractError>;

    /// Describe the pipeline
    fn model_info(&self) -> ModelInfo;
}
