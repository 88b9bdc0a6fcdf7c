//! Terminal progress for a labeling batch.

use iconsight_core::{BatchEvent, BatchObserver};
use indicatif::{ProgressBar, ProgressStyle};

/// Drives an `indicatif` progress bar from batch events.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.set_message("loading models...");
        Self { bar }
    }

    /// An observer that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for ProgressObserver {
    fn on_event(&self, event: &BatchEvent<'_>) {
        match event {
            BatchEvent::Started { total } => {
                self.bar.set_length(*total as u64);
                self.bar.set_message("labeling...");
            }
            BatchEvent::IconSkipped { id }
            | BatchEvent::IconLabeled { id, .. }
            | BatchEvent::IconFailed { id, .. } => {
                self.bar.set_message(id.to_string());
                self.bar.inc(1);
            }
            BatchEvent::Finished { .. } => self.bar.finish_and_clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iconsight_core::BatchReport;

    #[test]
    fn test_counts_resolved_icons() {
        let observer = ProgressObserver::hidden();
        observer.on_event(&BatchEvent::Started { total: 3 });
        observer.on_event(&BatchEvent::IconSkipped { id: "a" });
        observer.on_event(&BatchEvent::IconSkipped { id: "b" });
        assert_eq!(observer.position(), 2);
        observer.on_event(&BatchEvent::Finished {
            report: &BatchReport::default(),
        });
    }
}
