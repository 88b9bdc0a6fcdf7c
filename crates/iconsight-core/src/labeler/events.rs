//! Batch lifecycle events for progress and telemetry sinks.

use std::time::Duration;

use crate::error::PipelineError;
use crate::types::{BatchReport, IconLabels};

/// A lifecycle event emitted while a batch runs.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// Models are loaded and `total` icons are about to be dispatched
    Started { total: usize },
    /// The icon already had an accessibility label
    IconSkipped { id: &'a str },
    /// Both classifiers finished and the labels were computed. They are
    /// attached to the element once the batch joins its tasks.
    IconLabeled {
        id: &'a str,
        labels: &'a IconLabels,
        elapsed: Duration,
    },
    /// Rasterization or inference failed for this icon
    IconFailed { id: &'a str, error: &'a PipelineError },
    /// Every icon has resolved
    Finished { report: &'a BatchReport },
}

/// Receives [`BatchEvent`]s. Implementations must be cheap; they are called
/// from the batch driver.
pub trait BatchObserver: Send + Sync {
    fn on_event(&self, event: &BatchEvent<'_>);
}

/// Ignores every event.
impl BatchObserver for () {
    fn on_event(&self, _event: &BatchEvent<'_>) {}
}
