//! Ensemble labeling: two classifiers, one label per icon.
//!
//! For every icon without an accessibility label, the labeler rasterizes it,
//! runs the primary (noun) and secondary (qualifier) classifiers concurrently
//! on the same tensor, and combines their top classes with
//! [`decide_label`](decision::decide_label).
//!
//! A batch is a fan-out/fan-in join: one task per icon, each resolving to its
//! own `Result`. A failing icon never aborts its siblings; only a model load
//! failure before dispatch fails the whole batch.

pub mod decision;
pub mod events;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::classifier::debug::{DebugSink, ScopedSink};
use crate::classifier::model::ModelLoader;
use crate::classifier::onnx::OnnxModelLoader;
use crate::classifier::preprocess::InputShape;
use crate::classifier::taxonomy::Taxonomy;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::element::IconElement;
use crate::error::{ConfigError, PipelineError, PipelineResult, Result};
use crate::raster::{RasterOptions, Rasterizer};
use crate::types::{
    BatchReport, ClassificationResult, IconLabels, IconOutcome, IconStatus, Prediction,
};

use self::decision::{decide_label, diagnostic_label};
use self::events::{BatchEvent, BatchObserver};

/// Batch-level labeling options.
#[derive(Debug, Clone)]
pub struct LabelerOptions {
    /// Rasterization settings shared by both classifiers
    pub raster: RasterOptions,
    /// Secondary class that never qualifies the primary label
    pub catch_all_class: String,
    /// Maximum icons in flight (0 = unbounded)
    pub max_concurrency: usize,
    /// Pause before heavy work so progress output can render
    pub startup_delay: Duration,
}

impl Default for LabelerOptions {
    fn default() -> Self {
        Self {
            raster: RasterOptions::new(96),
            catch_all_class: "other".to_string(),
            max_concurrency: 0,
            startup_delay: Duration::ZERO,
        }
    }
}

impl LabelerOptions {
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            raster: RasterOptions::from_config(&config.raster)?,
            catch_all_class: config.labeling.catch_all_class.clone(),
            max_concurrency: config.labeling.max_concurrency,
            startup_delay: Duration::from_millis(config.labeling.startup_delay_ms),
        })
    }
}

/// Labels icons with a primary/secondary classifier ensemble.
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct EnsembleLabeler {
    primary: Arc<Classifier>,
    secondary: Arc<Classifier>,
    rasterizer: Arc<Rasterizer>,
    options: Arc<LabelerOptions>,
    observer: Arc<dyn BatchObserver>,
    debug: Option<Arc<dyn DebugSink>>,
}

impl EnsembleLabeler {
    pub fn new(
        primary: Classifier,
        secondary: Classifier,
        rasterizer: Rasterizer,
        options: LabelerOptions,
    ) -> Self {
        Self {
            primary: Arc::new(primary),
            secondary: Arc::new(secondary),
            rasterizer: Arc::new(rasterizer),
            options: Arc::new(options),
            observer: Arc::new(()),
            debug: None,
        }
    }

    /// Build a labeler backed by ONNX models as described by `config`.
    ///
    /// Reads the taxonomy file; models are not fetched until first use.
    pub fn from_config(config: &Config) -> Result<Self> {
        let taxonomy = Taxonomy::load(&config.taxonomy_path())?;
        let shape = InputShape::new(
            config.models.input_height,
            config.models.input_width,
            config.models.input_channels,
        );
        let loader: Arc<dyn ModelLoader> = Arc::new(OnnxModelLoader::new(Duration::from_millis(
            config.models.load_timeout_ms,
        )));

        let primary = Classifier::new(
            "primary",
            Config::resolve_model_source(&config.models.primary),
            shape,
            taxonomy.primary,
            loader.clone(),
        );
        let secondary = Classifier::new(
            "secondary",
            Config::resolve_model_source(&config.models.secondary),
            shape,
            taxonomy.secondary,
            loader,
        );

        Ok(Self::new(
            primary,
            secondary,
            Rasterizer::new(&config.raster)?,
            LabelerOptions::from_config(config)?,
        ))
    }

    /// Report batch lifecycle events to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Send every classifier input to `sink`, named `<icon-id>.<classifier>`.
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.debug = Some(sink);
        self
    }

    pub fn primary(&self) -> &Classifier {
        &self.primary
    }

    pub fn secondary(&self) -> &Classifier {
        &self.secondary
    }

    /// Load both models concurrently.
    pub async fn load_models(&self) -> PipelineResult<()> {
        tokio::try_join!(self.primary.load_model(), self.secondary.load_model())?;
        Ok(())
    }

    /// Compute labels for one icon without modifying it.
    ///
    /// Ignores any existing accessibility label; skipping is a batch policy.
    pub async fn label_icon(&self, icon: &IconElement) -> PipelineResult<IconLabels> {
        let canvas = self.rasterizer.rasterize(icon, &self.options.raster).await?;
        let tensor = canvas.to_tensor();

        let scoped = self.debug.as_deref().map(|inner| ScopedSink {
            prefix: &icon.id,
            inner,
        });
        let debug = scoped.as_ref().map(|s| s as &dyn DebugSink);

        let (primary, secondary) = tokio::join!(
            self.primary.classify(&tensor, debug),
            self.secondary.classify(&tensor, debug)
        );
        let primary = top_prediction(&self.primary, primary?)?;
        let secondary = top_prediction(&self.secondary, secondary?)?;

        Ok(IconLabels {
            label: decide_label(
                &primary.class_name,
                &secondary.class_name,
                &self.options.catch_all_class,
            ),
            diagnostic: diagnostic_label(&primary, &secondary),
        })
    }

    /// Label every unlabeled icon in `icons`.
    ///
    /// Icons that already carry an accessibility label are left untouched.
    /// Both labels are written to an icon together once both classifiers have
    /// finished; failed icons are left unchanged. Returns after every icon has
    /// resolved, with one outcome per icon in input order.
    ///
    /// Fails only if a model cannot be loaded, before any icon is processed.
    pub async fn label_batch(&self, icons: &mut [IconElement]) -> Result<BatchReport> {
        let start = Instant::now();

        if !self.options.startup_delay.is_zero() {
            tokio::time::sleep(self.options.startup_delay).await;
        }
        self.load_models().await?;

        let total = icons.len();
        tracing::info!("Labeling {total} icons");
        self.observer.on_event(&BatchEvent::Started { total });

        let semaphore = (self.options.max_concurrency > 0)
            .then(|| Arc::new(Semaphore::new(self.options.max_concurrency)));
        let mut handles = Vec::with_capacity(total);

        for icon in icons.iter() {
            if icon.aria_label().is_some() {
                tracing::debug!("Skipping icon {}: already labeled", icon.id);
                self.observer
                    .on_event(&BatchEvent::IconSkipped { id: &icon.id });
                handles.push(None);
                continue;
            }

            // Our own semaphore is never closed; a missing permit just means no bound.
            let permit = match &semaphore {
                Some(s) => s.clone().acquire_owned().await.ok(),
                None => None,
            };

            let labeler = self.clone();
            let icon = icon.clone();
            handles.push(Some(tokio::spawn(async move {
                let icon_start = Instant::now();
                let result = labeler.label_icon(&icon).await;
                drop(permit);

                match &result {
                    Ok(labels) => {
                        tracing::debug!("Labeled icon {} as {:?}", icon.id, labels.label);
                        labeler.observer.on_event(&BatchEvent::IconLabeled {
                            id: &icon.id,
                            labels,
                            elapsed: icon_start.elapsed(),
                        });
                    }
                    Err(e) => {
                        tracing::error!("Failed to label icon {}: {e}", icon.id);
                        labeler.observer.on_event(&BatchEvent::IconFailed {
                            id: &icon.id,
                            error: e,
                        });
                    }
                }
                result
            })));
        }

        let mut outcomes = Vec::with_capacity(total);
        for (icon, handle) in icons.iter_mut().zip(handles) {
            let status = match handle {
                None => IconStatus::Skipped,
                Some(handle) => {
                    let result = handle.await.unwrap_or_else(|e| {
                        tracing::error!("Labeling task for icon {} panicked: {e}", icon.id);
                        Err(PipelineError::Inference {
                            model: "ensemble".to_string(),
                            message: format!("labeling task for icon {} panicked: {e}", icon.id),
                        })
                    });
                    match result {
                        Ok(labels) => {
                            icon.apply_labels(labels.clone());
                            IconStatus::Labeled(labels)
                        }
                        Err(e) => IconStatus::Failed {
                            kind: e.kind(),
                            message: e.to_string(),
                        },
                    }
                }
            };
            outcomes.push(IconOutcome {
                id: icon.id.clone(),
                status,
            });
        }

        let report = BatchReport {
            outcomes,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Batch complete: {} labeled, {} skipped, {} failed in {:.2}s",
            report.labeled(),
            report.skipped(),
            report.failed(),
            report.elapsed.as_secs_f64()
        );
        self.observer
            .on_event(&BatchEvent::Finished { report: &report });

        Ok(report)
    }
}

fn top_prediction(
    classifier: &Classifier,
    result: ClassificationResult,
) -> PipelineResult<Prediction> {
    result
        .predictions
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::Inference {
            model: classifier.name().to_string(),
            message: "classification produced no predictions".to_string(),
        })
}
