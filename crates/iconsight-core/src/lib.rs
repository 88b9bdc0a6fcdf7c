//! Iconsight Core - accessibility labels for icons.
//!
//! Iconsight renders small page icons (raster images, icon-font glyphs and
//! inline vector graphics) to a fixed-size canvas and classifies them with two
//! cooperating image classifiers. Their top classes are merged into one
//! human-readable label that is attached to the icon as its accessibility
//! label, alongside a diagnostic string recording both predictions.
//!
//! # Architecture
//!
//! ```text
//! IconElement → Rasterizer → RasterImage → ┬→ Classifier (primary)   ─┬→ decision rule → label
//!                                          └→ Classifier (secondary) ─┘
//! ```
//!
//! Each classifier reconciles the tensor with its model's input shape
//! (resize, colourspace conversion, normalization) and loads its model on
//! first use.
//!
//! # Usage
//!
//! ```rust,ignore
//! use iconsight_core::{Config, EnsembleLabeler, IconElement};
//!
//! #[tokio::main]
//! async fn main() -> iconsight_core::Result<()> {
//!     let config = Config::load()?;
//!     let labeler = EnsembleLabeler::from_config(&config)?;
//!
//!     let mut icons: Vec<IconElement> = discover_icons();
//!     let report = labeler.label_batch(&mut icons).await?;
//!     println!("{} labeled, {} failed", report.labeled(), report.failed());
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod element;
pub mod error;
pub mod labeler;
pub mod math;
pub mod output;
pub mod raster;
pub mod types;

pub use classifier::Classifier;
pub use config::Config;
pub use element::{ElementDescriptor, IconElement, IconKind};
pub use error::{ConfigError, IconsightError, PipelineError, PipelineResult, Result};
pub use labeler::events::{BatchEvent, BatchObserver};
pub use labeler::{EnsembleLabeler, LabelerOptions};
pub use output::{IconRecord, OutputFormat, OutputWriter};
pub use raster::{RasterImage, RasterOptions, Rasterizer};
pub use types::{BatchReport, ClassificationResult, IconLabels, IconOutcome, IconStatus, Prediction};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
