//! Icon elements handed to the labeler by page discovery.
//!
//! An [`IconElement`] is a closed set of kinds: raster image (`<img>`),
//! icon-font glyph (`<i>`) and vector graphic (`<svg>`). Anything else is
//! rejected with `UnsupportedElementKind` when a generic page-element
//! descriptor is converted, so the rasterizer can match exhaustively.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::FontArc;
use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::config::is_remote;
use crate::error::{PipelineError, PipelineResult};
use crate::raster::parse_hex_color;
use crate::types::IconLabels;

/// Default glyph colour when a descriptor names none.
const DEFAULT_GLYPH_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// A page element as reported by discovery, before its kind is checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Identity of the element on the page
    pub id: String,

    /// Lower- or upper-case tag name ("img", "i", "svg", ...)
    pub tag: String,

    /// Rendered width in CSS pixels
    pub width: u32,

    /// Rendered height in CSS pixels
    pub height: u32,

    /// Existing accessibility label, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,

    /// Image source for `<img>`: file path (relative to the manifest) or URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    /// Serialized markup for `<svg>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,

    /// Font file for `<i>` icon fonts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,

    /// Glyph text for `<i>` icon fonts (first character is drawn)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyph: Option<String>,

    /// Computed font size in CSS pixels (defaults to the element height)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,

    /// Computed text colour for `<i>` icon fonts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Where a raster image's encoded bytes come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Bytes already in memory
    Inline(Arc<[u8]>),
    /// A file on disk
    File(PathBuf),
    /// An http(s) URL
    Remote(String),
}

/// `<img>` element data.
#[derive(Debug, Clone)]
pub struct RasterImageElement {
    pub source: ImageSource,
}

/// `<i>` icon-font element data.
#[derive(Clone)]
pub struct GlyphFontElement {
    pub font: FontArc,
    pub glyph: char,
    pub font_size: f32,
    pub color: Rgb<u8>,
}

impl fmt::Debug for GlyphFontElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphFontElement")
            .field("glyph", &self.glyph)
            .field("font_size", &self.font_size)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

/// `<svg>` element data.
#[derive(Debug, Clone)]
pub struct VectorGraphicElement {
    /// Serialized markup of the element, presentational attributes included
    pub markup: String,
}

/// The kind-specific payload of an icon element.
#[derive(Debug, Clone)]
pub enum IconKind {
    RasterImage(RasterImageElement),
    GlyphFont(GlyphFontElement),
    VectorGraphic(VectorGraphicElement),
}

impl IconKind {
    /// The HTML tag this kind corresponds to.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RasterImage(_) => "img",
            Self::GlyphFont(_) => "i",
            Self::VectorGraphic(_) => "svg",
        }
    }
}

/// An icon on the page, mutated in place when it is labeled.
#[derive(Debug, Clone)]
pub struct IconElement {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub kind: IconKind,
    aria_label: Option<String>,
    diagnostic: Option<String>,
}

impl IconElement {
    /// Create an unlabeled icon element.
    pub fn new(id: impl Into<String>, width: u32, height: u32, kind: IconKind) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            kind,
            aria_label: None,
            diagnostic: None,
        }
    }

    /// Set an existing (manual) accessibility label.
    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    /// Current accessibility label.
    pub fn aria_label(&self) -> Option<&str> {
        self.aria_label.as_deref()
    }

    /// Diagnostic label attached by the labeler.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Attach both labels in one step.
    pub fn apply_labels(&mut self, labels: IconLabels) {
        self.aria_label = Some(labels.label);
        self.diagnostic = Some(labels.diagnostic);
    }

    /// HTML tag of the element.
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Build an icon element from a discovery descriptor.
    ///
    /// Relative image and font paths are resolved against `base_dir`.
    pub fn from_descriptor(desc: &ElementDescriptor, base_dir: &Path) -> PipelineResult<Self> {
        let render_err = |message: &str| PipelineError::Render {
            id: desc.id.clone(),
            message: message.to_string(),
        };

        let kind = match desc.tag.to_ascii_lowercase().as_str() {
            "img" => {
                let src = desc
                    .src
                    .as_deref()
                    .ok_or_else(|| render_err("image element has no src"))?;
                let source = if is_remote(src) {
                    ImageSource::Remote(src.to_string())
                } else {
                    ImageSource::File(base_dir.join(src))
                };
                IconKind::RasterImage(RasterImageElement { source })
            }
            "i" => {
                let font_path = desc
                    .font
                    .as_ref()
                    .ok_or_else(|| render_err("icon-font element has no font"))?;
                let glyph = desc
                    .glyph
                    .as_deref()
                    .and_then(|g| g.chars().next())
                    .ok_or_else(|| render_err("icon-font element has no glyph"))?;
                let bytes = std::fs::read(base_dir.join(font_path))
                    .map_err(|e| render_err(&format!("cannot read font {font_path:?}: {e}")))?;
                let font = FontArc::try_from_vec(bytes)
                    .map_err(|e| render_err(&format!("invalid font {font_path:?}: {e}")))?;
                let color = match desc.color.as_deref() {
                    Some(c) => parse_hex_color(c)
                        .ok_or_else(|| render_err(&format!("invalid colour {c:?}")))?,
                    None => DEFAULT_GLYPH_COLOR,
                };
                IconKind::GlyphFont(GlyphFontElement {
                    font,
                    glyph,
                    font_size: desc.font_size.unwrap_or(desc.height as f32),
                    color,
                })
            }
            "svg" => {
                let markup = desc
                    .svg
                    .clone()
                    .ok_or_else(|| render_err("vector element has no markup"))?;
                IconKind::VectorGraphic(VectorGraphicElement { markup })
            }
            other => {
                return Err(PipelineError::UnsupportedElementKind {
                    id: desc.id.clone(),
                    tag: other.to_string(),
                })
            }
        };

        let mut element = Self::new(desc.id.clone(), desc.width, desc.height, kind);
        element.aria_label = desc.aria_label.clone();
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(tag: &str) -> ElementDescriptor {
        ElementDescriptor {
            id: "icon-1".into(),
            tag: tag.into(),
            width: 24,
            height: 24,
            ..Default::default()
        }
    }

    #[test]
    fn test_unsupported_tag_is_rejected() {
        let err = IconElement::from_descriptor(&descriptor("div"), Path::new(".")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedElementKind { ref tag, .. } if tag == "div"));
    }

    #[test]
    fn test_svg_descriptor() {
        let mut desc = descriptor("SVG");
        desc.svg = Some("<svg viewBox=\"0 0 24 24\"/>".into());
        desc.aria_label = Some("Search".into());
        let element = IconElement::from_descriptor(&desc, Path::new(".")).unwrap();
        assert_eq!(element.tag(), "svg");
        assert_eq!(element.aria_label(), Some("Search"));
    }

    #[test]
    fn test_img_sources() {
        let mut desc = descriptor("img");
        desc.src = Some("https://cdn.example.com/a.png".into());
        let element = IconElement::from_descriptor(&desc, Path::new("/page")).unwrap();
        assert!(matches!(
            element.kind,
            IconKind::RasterImage(RasterImageElement {
                source: ImageSource::Remote(_)
            })
        ));

        desc.src = Some("icons/a.png".into());
        let element = IconElement::from_descriptor(&desc, Path::new("/page")).unwrap();
        match element.kind {
            IconKind::RasterImage(RasterImageElement {
                source: ImageSource::File(path),
            }) => assert_eq!(path, Path::new("/page/icons/a.png")),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_missing_payload_is_render_error() {
        let err = IconElement::from_descriptor(&descriptor("img"), Path::new(".")).unwrap_err();
        assert_eq!(err.kind(), "RenderError");
    }

    #[test]
    fn test_apply_labels_sets_both_attributes() {
        let mut element = IconElement::new(
            "x",
            16,
            16,
            IconKind::VectorGraphic(VectorGraphicElement {
                markup: "<svg/>".into(),
            }),
        );
        assert!(element.aria_label().is_none());
        element.apply_labels(IconLabels {
            label: "mail settings".into(),
            diagnostic: "PRIMARY settings[0.90]; SECONDARY mail[0.80]".into(),
        });
        assert_eq!(element.aria_label(), Some("mail settings"));
        assert!(element.diagnostic().unwrap().starts_with("PRIMARY"));
    }
}
