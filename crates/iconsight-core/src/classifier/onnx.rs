//! ONNX Runtime model backend.
//!
//! Models may live on disk or behind an http(s) URL. Bytes are fetched
//! asynchronously, then the session is built on a blocking thread.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::config::is_remote;
use crate::error::{PipelineError, PipelineResult};

use super::model::{ImageModel, ModelLoader};

/// An ONNX classifier session.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct OnnxModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    source: String,
}

impl OnnxModel {
    /// Build a session from serialized model bytes.
    pub fn from_bytes(source: &str, bytes: &[u8]) -> PipelineResult<Self> {
        let load_err = |message: String| PipelineError::ModelLoad {
            model: source.to_string(),
            message,
        };

        let session = Session::builder()
            .map_err(|e| load_err(format!("Failed to create ONNX session builder: {e}")))?
            .commit_from_memory(bytes)
            .map_err(|e| load_err(format!("Failed to parse ONNX model: {e}")))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| load_err("Model declares no inputs".to_string()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| load_err("Model declares no outputs".to_string()))?;

        tracing::debug!(
            "Loaded ONNX model {source} (input: {input_name:?}, output: {output_name:?})"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            source: source.to_string(),
        })
    }
}

impl ImageModel for OnnxModel {
    fn predict(&self, batch: &Array4<f32>) -> PipelineResult<Vec<f32>> {
        let infer_err = |message: String| PipelineError::Inference {
            model: self.source.clone(),
            message,
        };

        // (shape, flat data) avoids depending on ort's ndarray feature.
        let shape: Vec<i64> = batch.shape().iter().map(|&d| d as i64).collect();
        let flat: Vec<f32> = batch.iter().copied().collect();
        let input = Value::from_array((shape, flat))
            .map_err(|e| infer_err(format!("Failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| infer_err(format!("Session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| infer_err(format!("ONNX inference failed: {e}")))?;

        let logits = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name)
            .ok_or_else(|| infer_err(format!("Model did not produce {}", self.output_name)))?;
        let (shape, data) = logits
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| infer_err(format!("Failed to extract output tensor: {e}")))?;

        // [classes] or [1, classes]
        match shape.len() {
            1 => Ok(data.to_vec()),
            2 if shape[0] == 1 => Ok(data[..shape[1] as usize].to_vec()),
            _ => Err(infer_err(format!("Unexpected output shape: {shape:?}"))),
        }
    }
}

/// Loads [`OnnxModel`]s from local files or http(s) URLs.
pub struct OnnxModelLoader {
    client: reqwest::Client,
    timeout: Duration,
}

impl OnnxModelLoader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn fetch(&self, source: &str) -> PipelineResult<Vec<u8>> {
        let load_err = |message: String| PipelineError::ModelLoad {
            model: source.to_string(),
            message,
        };

        if is_remote(source) {
            let response = self
                .client
                .get(source)
                .timeout(self.timeout)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| load_err(format!("Download failed: {e}")))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| load_err(format!("Download interrupted: {e}")))?;
            Ok(bytes.to_vec())
        } else {
            tokio::fs::read(source)
                .await
                .map_err(|e| load_err(format!("Cannot read model file: {e}")))
        }
    }
}

#[async_trait]
impl ModelLoader for OnnxModelLoader {
    async fn load(&self, source: &str) -> PipelineResult<Arc<dyn ImageModel>> {
        let bytes = self.fetch(source).await?;
        tracing::debug!("Fetched {} bytes of model data from {source}", bytes.len());

        let owned = source.to_string();
        let model = tokio::task::spawn_blocking(move || OnnxModel::from_bytes(&owned, &bytes))
            .await
            .map_err(|e| PipelineError::ModelLoad {
                model: source.to_string(),
                message: format!("Task join error: {e}"),
            })??;

        Ok(Arc::new(model))
    }
}
