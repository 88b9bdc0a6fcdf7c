//! Error types for the Iconsight labeling pipeline.
//!
//! Errors are organized by stage so a failure names the icon or model it
//! belongs to. Per-icon failures are reported through [`PipelineError::kind`]
//! to the batch observer without aborting sibling icons.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Iconsight operations.
#[derive(Error, Debug)]
pub enum IconsightError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// The class-name taxonomy could not be loaded
    #[error("Invalid taxonomy {path}: {message}")]
    Taxonomy { path: PathBuf, message: String },
}

/// Pipeline errors, organized by stage.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Element kind is not one of raster image, glyph font, or vector graphic
    #[error("Unsupported element <{tag}> for icon {id}: only img, i and svg are supported")]
    UnsupportedElementKind { id: String, tag: String },

    /// Fetching or drawing the icon failed
    #[error("Render error for icon {id}: {message}")]
    Render { id: String, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for icon {id} after {timeout_ms}ms")]
    Timeout {
        id: String,
        stage: String,
        timeout_ms: u64,
    },

    /// Tensor has a channel count the conversion cannot handle
    #[error("Invalid channel count: expected {expected}, got {got}")]
    InvalidChannelCount { expected: usize, got: usize },

    /// Model fetch or parse failed
    #[error("Failed to load model {model}: {message}")]
    ModelLoad { model: String, message: String },

    /// Forward computation failed
    #[error("Inference failed for model {model}: {message}")]
    Inference { model: String, message: String },
}

impl PipelineError {
    /// Stable name of the failure kind, used in telemetry and output records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedElementKind { .. } => "UnsupportedElementKind",
            Self::Render { .. } | Self::Timeout { .. } => "RenderError",
            Self::InvalidChannelCount { .. } => "InvalidChannelCount",
            Self::ModelLoad { .. } => "ModelLoadError",
            Self::Inference { .. } => "InferenceError",
        }
    }
}

/// Convenience type alias for Iconsight results.
pub type Result<T> = std::result::Result<T, IconsightError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let err = PipelineError::Timeout {
            id: "a".into(),
            stage: "render".into(),
            timeout_ms: 10,
        };
        assert_eq!(err.kind(), "RenderError");

        let err = PipelineError::InvalidChannelCount {
            expected: 3,
            got: 4,
        };
        assert_eq!(err.kind(), "InvalidChannelCount");
        assert!(err.to_string().contains("expected 3, got 4"));
    }

    #[test]
    fn test_unsupported_message_names_tag() {
        let err = PipelineError::UnsupportedElementKind {
            id: "logo".into(),
            tag: "div".into(),
        };
        assert!(err.to_string().contains("<div>"));
        assert_eq!(err.kind(), "UnsupportedElementKind");
    }
}
