//! Model abstractions: the forward pass and the loader that produces it.

use std::sync::Arc;

use async_trait::async_trait;
use ndarray::Array4;

use crate::error::PipelineResult;

/// A loaded image classification model.
///
/// `predict` is synchronous and CPU-bound; callers run it on a blocking thread.
pub trait ImageModel: Send + Sync {
    /// Run a forward pass over a `[1, height, width, channels]` batch and
    /// return the raw logits for the single image.
    fn predict(&self, batch: &Array4<f32>) -> PipelineResult<Vec<f32>>;
}

/// Fetches and parses models by identifier.
///
/// Uses `async_trait` so loaders can be shared as `Arc<dyn ModelLoader>`.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Load the model at `source` (a local path or http(s) URL).
    async fn load(&self, source: &str) -> PipelineResult<Arc<dyn ImageModel>>;
}
