//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Classifier model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Primary (noun) classifier: local path or http(s) URL to an ONNX model
    pub primary: String,

    /// Secondary (qualifier) classifier: local path or http(s) URL
    pub secondary: String,

    /// JSON file with `primary` and `secondary` class-name lists
    pub taxonomy: PathBuf,

    /// Model input height in pixels
    pub input_height: usize,

    /// Model input width in pixels
    pub input_width: usize,

    /// Model input channels (1 = grayscale, 3 = RGB)
    pub input_channels: usize,

    /// Model fetch timeout in milliseconds
    pub load_timeout_ms: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            primary: "~/.iconsight/models/primary/model.onnx".to_string(),
            secondary: "~/.iconsight/models/secondary/model.onnx".to_string(),
            taxonomy: PathBuf::from("~/.iconsight/models/class_names.json"),
            input_height: 96,
            input_width: 96,
            input_channels: 3,
            load_timeout_ms: 60_000,
        }
    }
}

/// Rasterization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Side length of the square canvas every icon is rendered to
    pub resolution: u32,

    /// Fill colour for vector paths (`#rgb` or `#rrggbb`)
    pub fill_color: String,

    /// Canvas background for vector graphics
    pub background_color: String,

    /// Page backdrop behind raster images and icon-font glyphs
    pub page_background: String,

    /// Whether remote (http/https) image sources may be fetched
    pub allow_remote_images: bool,

    /// Remote image fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,

    /// Per-icon render timeout in milliseconds
    pub render_timeout_ms: u64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            resolution: 96,
            fill_color: "#000".to_string(),
            background_color: "#999".to_string(),
            page_background: "#fff".to_string(),
            allow_remote_images: true,
            fetch_timeout_ms: 10_000,
            render_timeout_ms: 5_000,
        }
    }
}

/// Ensemble labeling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    /// Maximum icons in flight at once (0 = unbounded)
    pub max_concurrency: usize,

    /// Delay before heavy work starts so progress output can render
    pub startup_delay_ms: u64,

    /// Secondary class meaning "no qualifier"
    pub catch_all_class: String,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 0,
            startup_delay_ms: 200,
            catch_all_class: "other".to_string(),
        }
    }
}

/// Icon candidate selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Elements larger than this on either side are not treated as icons
    pub max_icon_dimension: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_icon_dimension: 75,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
