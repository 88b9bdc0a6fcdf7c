//! Core data types produced by classification and labeling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One class and its probability in a ranked classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Display name from the classifier's taxonomy
    pub class_name: String,

    /// Position of the class in the model output
    pub class_index: usize,

    /// Post-softmax probability in [0, 1]
    pub probability: f32,
}

/// Output of a single `Classifier::classify` call.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// Predictions sorted by probability, highest first
    pub predictions: Vec<Prediction>,

    /// Wall-clock time of the forward pass
    pub inference_time: Duration,
}

impl ClassificationResult {
    /// The highest-ranked prediction.
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }
}

/// The two attributes written onto a labeled icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconLabels {
    /// Accessibility label, e.g. "mail settings"
    pub label: String,

    /// Both classifiers' top class and probability, e.g.
    /// "PRIMARY settings[0.91]; SECONDARY mail[0.64]"
    pub diagnostic: String,
}

/// What happened to one icon in a batch.
#[derive(Debug, Clone)]
pub enum IconStatus {
    /// Both classifiers ran and labels were attached
    Labeled(IconLabels),

    /// The icon already carried an accessibility label
    Skipped,

    /// Rasterization or inference failed; the icon is unchanged
    Failed {
        /// Failure kind name (see `PipelineError::kind`)
        kind: &'static str,
        /// Human-readable failure message
        message: String,
    },
}

/// Per-icon result of a batch run.
#[derive(Debug, Clone)]
pub struct IconOutcome {
    /// Identity of the icon element
    pub id: String,

    /// Outcome for this icon
    pub status: IconStatus,
}

/// Aggregate outcome of labeling a collection of icons.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One outcome per icon, in input order
    pub outcomes: Vec<IconOutcome>,

    /// Wall-clock time from batch start to the last icon resolving
    pub elapsed: Duration,
}

impl BatchReport {
    /// Number of icons that received a new label.
    pub fn labeled(&self) -> usize {
        self.count(|s| matches!(s, IconStatus::Labeled(_)))
    }

    /// Number of icons skipped because they were already labeled.
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, IconStatus::Skipped))
    }

    /// Number of icons whose processing failed.
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, IconStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&IconStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}
