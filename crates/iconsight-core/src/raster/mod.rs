//! Icon rasterization.
//!
//! Renders any [`IconElement`] to a square RGB canvas of a fixed resolution:
//! - **bitmap**: `<img>` sources, fetched, decoded and scaled over the page backdrop
//! - **glyph**: `<i>` icon-font glyphs drawn with `ab_glyph`
//! - **vector**: `<svg>` markup, stripped of presentational attributes and drawn with `resvg`
//!
//! # Usage
//!
//! ```rust,ignore
//! use iconsight_core::raster::{RasterOptions, Rasterizer};
//!
//! let rasterizer = Rasterizer::new(&config.raster)?;
//! let canvas = rasterizer.rasterize(&icon, &RasterOptions::new(96)).await?;
//! assert_eq!((canvas.width(), canvas.height()), (96, 96));
//! ```

mod bitmap;
mod canvas;
mod glyph;
pub mod vector;

pub use canvas::{parse_hex_color, RasterImage};

use std::time::Duration;

use image::{Rgb, RgbImage};
use tokio::time::timeout;

use crate::config::RasterConfig;
use crate::element::{IconElement, IconKind};
use crate::error::{ConfigError, PipelineError, PipelineResult};

use self::bitmap::ImageFetcher;

/// Default vector fill colour (#000).
pub const DEFAULT_FILL_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Default vector background colour (#999).
pub const DEFAULT_BACKGROUND_COLOR: Rgb<u8> = Rgb([153, 153, 153]);

/// Per-call rasterization options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Canvas side length in pixels
    pub resolution: u32,
    /// Fill for vector paths (applies to `currentColor` and inherited fill)
    pub fill_color: Rgb<u8>,
    /// Canvas background for vector graphics
    pub background_color: Rgb<u8>,
}

impl RasterOptions {
    /// Options with default vector colours.
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            fill_color: DEFAULT_FILL_COLOR,
            background_color: DEFAULT_BACKGROUND_COLOR,
        }
    }

    pub fn with_fill_color(mut self, color: Rgb<u8>) -> Self {
        self.fill_color = color;
        self
    }

    pub fn with_background_color(mut self, color: Rgb<u8>) -> Self {
        self.background_color = color;
        self
    }

    /// Build options from the `[raster]` config section.
    pub fn from_config(config: &RasterConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.resolution)
            .with_fill_color(color_setting("raster.fill_color", &config.fill_color)?)
            .with_background_color(color_setting(
                "raster.background_color",
                &config.background_color,
            )?))
    }
}

fn color_setting(key: &str, value: &str) -> Result<Rgb<u8>, ConfigError> {
    parse_hex_color(value).ok_or_else(|| {
        ConfigError::ValidationError(format!("{key} must be a #rgb or #rrggbb colour"))
    })
}

/// Renders icon elements to fixed-size canvases.
pub struct Rasterizer {
    fetcher: ImageFetcher,
    page_background: Rgb<u8>,
    render_timeout: Duration,
}

impl Rasterizer {
    /// Create a rasterizer from the `[raster]` config section.
    pub fn new(config: &RasterConfig) -> Result<Self, ConfigError> {
        let page_background = color_setting("raster.page_background", &config.page_background)?;
        Ok(Self {
            fetcher: ImageFetcher::new(
                reqwest::Client::new(),
                config.allow_remote_images,
                Duration::from_millis(config.fetch_timeout_ms),
            ),
            page_background,
            render_timeout: Duration::from_millis(config.render_timeout_ms),
        })
    }

    /// Render `element` to a `resolution × resolution` RGB canvas.
    ///
    /// Does not modify the element.
    pub async fn rasterize(
        &self,
        element: &IconElement,
        options: &RasterOptions,
    ) -> PipelineResult<RasterImage> {
        let id = element.id.clone();
        if options.resolution == 0 {
            return Err(PipelineError::Render {
                id,
                message: "resolution must be > 0".to_string(),
            });
        }
        if element.width == 0 || element.height == 0 {
            return Err(PipelineError::Render {
                id,
                message: format!(
                    "element has no rendered size ({}x{})",
                    element.width, element.height
                ),
            });
        }

        let (width, height) = (element.width, element.height);
        let resolution = options.resolution;
        let backdrop = self.page_background;

        match &element.kind {
            IconKind::RasterImage(img) => {
                let bytes = self.fetcher.fetch(&id, &img.source).await?;
                self.render_blocking(id.clone(), move || {
                    bitmap::render(&id, &bytes, width, height, resolution, backdrop)
                })
                .await
            }
            IconKind::GlyphFont(glyph) => {
                let glyph = glyph.clone();
                self.render_blocking(id.clone(), move || {
                    glyph::render(&id, &glyph, width, height, resolution, backdrop)
                })
                .await
            }
            IconKind::VectorGraphic(svg) => {
                let markup = svg.markup.clone();
                let (fill, background) = (options.fill_color, options.background_color);
                self.render_blocking(id.clone(), move || {
                    vector::render(&id, &markup, resolution, fill, background)
                })
                .await
            }
        }
    }

    /// Run a CPU-bound draw off the async workers, bounded by the render timeout.
    async fn render_blocking<F>(&self, id: String, draw: F) -> PipelineResult<RasterImage>
    where
        F: FnOnce() -> PipelineResult<RgbImage> + Send + 'static,
    {
        let result = timeout(self.render_timeout, tokio::task::spawn_blocking(draw)).await;

        match result {
            Ok(Ok(Ok(canvas))) => {
                tracing::trace!("Rasterized icon {id} to {}x{}", canvas.width(), canvas.height());
                Ok(RasterImage::from_rgb(canvas))
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(PipelineError::Render {
                id,
                message: format!("Task join error: {e}"),
            }),
            Err(_) => Err(PipelineError::Timeout {
                id,
                stage: "render".to_string(),
                timeout_ms: self.render_timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{
        GlyphFontElement, ImageSource, RasterImageElement, VectorGraphicElement,
    };
    use std::sync::Arc;

    fn svg_icon(id: &str) -> IconElement {
        IconElement::new(
            id,
            24,
            24,
            IconKind::VectorGraphic(VectorGraphicElement {
                markup: r#"<svg viewBox="0 0 24 24"><circle cx="12" cy="12" r="8"/></svg>"#
                    .to_string(),
            }),
        )
    }

    fn png_icon(id: &str, width: u32, height: u32) -> IconElement {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        IconElement::new(
            id,
            width,
            height,
            IconKind::RasterImage(RasterImageElement {
                source: ImageSource::Inline(Arc::from(out.into_inner())),
            }),
        )
    }

    fn glyph_icon(id: &str, width: u32, height: u32) -> IconElement {
        IconElement::new(
            id,
            width,
            height,
            IconKind::GlyphFont(GlyphFontElement {
                font: glyph::test_font(),
                glyph: 'M',
                font_size: height as f32,
                color: Rgb([0, 0, 0]),
            }),
        )
    }

    fn rasterizer() -> Rasterizer {
        Rasterizer::new(&RasterConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_every_kind_yields_requested_resolution() {
        let r = rasterizer();
        let options = RasterOptions::new(64);
        for icon in [
            svg_icon("svg"),
            png_icon("img", 30, 20),
            glyph_icon("i", 20, 10),
        ] {
            let canvas = r.rasterize(&icon, &options).await.unwrap();
            assert_eq!((canvas.width(), canvas.height()), (64, 64));
            assert_eq!(canvas.channels(), 3);
            assert_eq!(canvas.to_tensor().shape(), &[64, 64, 3]);
        }
    }

    #[tokio::test]
    async fn test_glyph_is_drawn_over_page_backdrop() {
        let canvas = rasterizer()
            .rasterize(&glyph_icon("i", 20, 10), &RasterOptions::new(96))
            .await
            .unwrap();
        let rgb = canvas.as_image().to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert!(rgb.pixels().any(|p| p[0] < 128));
    }

    #[tokio::test]
    async fn test_vector_background_is_configurable() {
        let r = rasterizer();
        let options = RasterOptions::new(32).with_background_color(Rgb([255, 0, 0]));
        let canvas = r.rasterize(&svg_icon("svg"), &options).await.unwrap();
        let rgb = canvas.as_image().to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(16, 16), &DEFAULT_FILL_COLOR);
    }

    #[tokio::test]
    async fn test_zero_sized_element_is_render_error() {
        let r = rasterizer();
        let icon = png_icon("img", 4, 4);
        let icon = IconElement::new("hidden", 0, 10, icon.kind);
        let err = r.rasterize(&icon, &RasterOptions::new(32)).await.unwrap_err();
        assert_eq!(err.kind(), "RenderError");
    }

    #[tokio::test]
    async fn test_rasterize_does_not_mutate_element() {
        let r = rasterizer();
        let icon = svg_icon("svg");
        r.rasterize(&icon, &RasterOptions::new(16)).await.unwrap();
        assert!(icon.aria_label().is_none());
        assert!(icon.diagnostic().is_none());
    }

    #[test]
    fn test_options_from_config() {
        let options = RasterOptions::from_config(&RasterConfig::default()).unwrap();
        assert_eq!(options, RasterOptions::new(96));

        let bad = RasterConfig {
            fill_color: "black".into(),
            ..RasterConfig::default()
        };
        assert!(RasterOptions::from_config(&bad).is_err());
    }
}
