//! Image classification with lazily loaded, shared models.
//!
//! A [`Classifier`] owns one model identifier, its input shape and class
//! names. The model is fetched on first use and cached; concurrent callers
//! that arrive while a load is in flight await the same load.
//!
//! # Model states
//!
//! ```text
//! Unloaded ──load_model()──▶ Loading ──▶ Loaded
//!                                   └──▶ Failed
//! ```
//!
//! `Failed` is terminal for a given instance; build a new `Classifier` to retry.

pub mod debug;
pub mod model;
pub mod onnx;
pub mod preprocess;
pub mod taxonomy;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use ndarray::Array3;

use crate::error::{PipelineError, PipelineResult};
use crate::math::{rank_descending, softmax};
use crate::types::{ClassificationResult, Prediction};

use self::debug::DebugSink;
use self::model::{ImageModel, ModelLoader};
use self::preprocess::{InputShape, TensorPreprocessor};

type LoadFuture = Shared<BoxFuture<'static, PipelineResult<Arc<dyn ImageModel>>>>;

enum ModelState {
    Unloaded,
    Loading(LoadFuture),
    Loaded(Arc<dyn ImageModel>),
    Failed(PipelineError),
}

/// One image classifier over a fixed class taxonomy.
pub struct Classifier {
    name: String,
    source: String,
    class_names: Vec<String>,
    preprocessor: TensorPreprocessor,
    loader: Arc<dyn ModelLoader>,
    state: Mutex<ModelState>,
}

impl Classifier {
    /// Create an unloaded classifier. No I/O happens until the first
    /// [`load_model`](Self::load_model) or [`classify`](Self::classify).
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        input_shape: InputShape,
        class_names: Vec<String>,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            class_names,
            preprocessor: TensorPreprocessor::new(input_shape),
            loader,
            state: Mutex::new(ModelState::Unloaded),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Whether the model has finished loading successfully.
    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock_state(), ModelState::Loaded(_))
    }

    /// Load the model if it is not loaded yet.
    ///
    /// Idempotent: once loaded, returns the cached handle without fetching.
    /// Fails with `ModelLoad` on fetch or parse errors, which are not retried.
    pub async fn load_model(&self) -> PipelineResult<Arc<dyn ImageModel>> {
        let pending = {
            let mut state = self.lock_state();
            match &*state {
                ModelState::Loaded(model) => return Ok(model.clone()),
                ModelState::Failed(e) => return Err(e.clone()),
                ModelState::Loading(pending) => pending.clone(),
                ModelState::Unloaded => {
                    let pending = self.start_load();
                    *state = ModelState::Loading(pending.clone());
                    pending
                }
            }
        };

        let result = pending.await;

        // First finisher records the outcome; later ones see it already set.
        let mut state = self.lock_state();
        if matches!(*state, ModelState::Loading(_)) {
            *state = match &result {
                Ok(model) => ModelState::Loaded(model.clone()),
                Err(e) => ModelState::Failed(e.clone()),
            };
        }
        result
    }

    fn start_load(&self) -> LoadFuture {
        let loader = self.loader.clone();
        let name = self.name.clone();
        let source = self.source.clone();

        async move {
            tracing::info!("Loading {name} model from {source}");
            let start = Instant::now();
            let result = loader.load(&source).await;
            match &result {
                Ok(_) => tracing::info!(
                    "{name} model loaded in {:.2}s",
                    start.elapsed().as_secs_f64()
                ),
                Err(e) => tracing::error!("{name} model failed to load: {e}"),
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Classify one `[height, width, channels]` image tensor with raw [0, 255]
    /// values.
    ///
    /// Loads the model on demand. Returns predictions over every class,
    /// ranked by probability with ties in class order.
    ///
    /// After a failed load this returns the stored `ModelLoad` error, not
    /// `Inference`.
    pub async fn classify(
        &self,
        tensor: &Array3<f32>,
        debug: Option<&dyn DebugSink>,
    ) -> PipelineResult<ClassificationResult> {
        let model = self.load_model().await?;
        let batch = self.preprocessor.prepare(tensor, &self.name, debug)?;

        let start = Instant::now();
        let logits = tokio::task::spawn_blocking(move || model.predict(&batch))
            .await
            .map_err(|e| PipelineError::Inference {
                model: self.name.clone(),
                message: format!("Task join error: {e}"),
            })??;
        let inference_time = start.elapsed();

        if logits.len() != self.class_names.len() {
            return Err(PipelineError::Inference {
                model: self.name.clone(),
                message: format!(
                    "model produced {} outputs but {} class names are configured",
                    logits.len(),
                    self.class_names.len()
                ),
            });
        }

        let probabilities = softmax(&logits);
        let predictions = rank_descending(&probabilities)
            .into_iter()
            .map(|index| Prediction {
                class_name: self.class_names[index].clone(),
                class_index: index,
                probability: probabilities[index],
            })
            .collect();

        tracing::trace!("{} inference took {inference_time:?}", self.name);
        Ok(ClassificationResult {
            predictions,
            inference_time,
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, ModelState> {
        // State transitions never panic mid-update, so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn classifier(loader: MockLoader, names: &[&str]) -> Classifier {
        Classifier::new(
            "primary",
            "mock://primary",
            InputShape::new(8, 8, 3),
            classes(names),
            Arc::new(loader),
        )
    }

    fn image(h: usize, w: usize) -> Array3<f32> {
        Array3::from_elem((h, w, 3), 200.0)
    }

    #[tokio::test]
    async fn test_load_model_is_idempotent() {
        let loader = MockLoader::new(vec![0.0, 1.0]);
        let loads = loader.loads.clone();
        let c = classifier(loader, &["a", "b"]);
        assert!(!c.is_loaded());

        c.load_model().await.unwrap();
        c.load_model().await.unwrap();
        assert!(c.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_in_flight_load() {
        let mut loader = MockLoader::new(vec![0.0, 1.0]);
        loader.delay = Some(Duration::from_millis(50));
        let loads = loader.loads.clone();
        let c = Arc::new(classifier(loader, &["a", "b"]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = c.clone();
                tokio::spawn(async move { c.classify(&image(8, 8), None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_terminal() {
        let loader = MockLoader::failing();
        let loads = loader.loads.clone();
        let c = classifier(loader, &["a"]);

        let err = c.load_model().await.err().unwrap();
        assert_eq!(err.kind(), "ModelLoadError");
        let err = c.classify(&image(8, 8), None).await.unwrap_err();
        assert_eq!(err.kind(), "ModelLoadError");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classify_ranks_probabilities() {
        let c = classifier(
            MockLoader::new(vec![0.5, 3.0, 0.5, -1.0]),
            &["home", "mail", "search", "user"],
        );
        let result = c.classify(&image(8, 8), None).await.unwrap();

        let sum: f32 = result.predictions.iter().map(|p| p.probability).sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(result
            .predictions
            .iter()
            .all(|p| (0.0..=1.0).contains(&p.probability)));

        let order: Vec<usize> = result.predictions.iter().map(|p| p.class_index).collect();
        // Equal logits for "home" and "search" keep class order.
        assert_eq!(order, vec![1, 0, 2, 3]);
        assert_eq!(result.top().unwrap().class_name, "mail");
    }

    #[tokio::test]
    async fn test_classify_is_deterministic() {
        let c = classifier(MockLoader::new(vec![0.1, 0.7, 0.2]), &["a", "b", "c"]);
        let first = c.classify(&image(8, 8), None).await.unwrap();
        let second = c.classify(&image(8, 8), None).await.unwrap();
        assert_eq!(first.predictions, second.predictions);
    }

    #[tokio::test]
    async fn test_classify_resizes_mismatched_input() {
        let c = classifier(MockLoader::new(vec![1.0, 2.0]), &["a", "b"]);
        let result = c.classify(&image(31, 17), None).await.unwrap();
        assert_eq!(result.predictions.len(), 2);
        assert_eq!(result.top().unwrap().class_name, "b");
    }

    #[tokio::test]
    async fn test_class_count_mismatch_is_inference_error() {
        let c = classifier(MockLoader::new(vec![1.0, 2.0, 3.0]), &["a", "b"]);
        let err = c.classify(&image(8, 8), None).await.unwrap_err();
        assert_eq!(err.kind(), "InferenceError");
    }
}
