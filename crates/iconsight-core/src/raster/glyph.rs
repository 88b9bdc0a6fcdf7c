//! Icon-font (`<i>`) rendering with `ab_glyph`.

use ab_glyph::{point, Font, PxScale};
use image::{Rgb, RgbImage};

use crate::element::GlyphFontElement;
use crate::error::{PipelineError, PipelineResult};

use super::canvas::{blend, fit_in_square};

/// Draw the element's glyph, scaled with the element box so the box's larger
/// side spans `resolution`, centred over an opaque page backdrop.
pub(crate) fn render(
    id: &str,
    glyph: &GlyphFontElement,
    width: u32,
    height: u32,
    resolution: u32,
    backdrop: Rgb<u8>,
) -> PipelineResult<RgbImage> {
    let render_err = |message: String| PipelineError::Render {
        id: id.to_string(),
        message,
    };

    let scale = resolution as f32 / width.max(height).max(1) as f32;
    let px_size = glyph.font_size * scale;
    if !px_size.is_finite() || px_size <= 0.0 {
        return Err(render_err(format!(
            "invalid font size {}px",
            glyph.font_size
        )));
    }

    let glyph_id = glyph.font.glyph_id(glyph.glyph);
    if glyph_id.0 == 0 {
        return Err(render_err(format!(
            "font has no glyph for U+{:04X}",
            glyph.glyph as u32
        )));
    }

    let mut canvas = RgbImage::from_pixel(resolution, resolution, backdrop);
    let positioned = glyph_id.with_scale_and_position(PxScale::from(px_size), point(0.0, 0.0));
    let Some(outlined) = glyph.font.outline_glyph(positioned) else {
        tracing::debug!("Glyph U+{:04X} of icon {id} has no outline", glyph.glyph as u32);
        return Ok(canvas);
    };

    let placement = fit_in_square(width, height, resolution);
    let bounds = outlined.px_bounds();
    let center_x = placement.x as f32 + placement.width as f32 / 2.0;
    let center_y = placement.y as f32 + placement.height as f32 / 2.0;
    let origin_x = (center_x - bounds.width() / 2.0).round() as i64;
    let origin_y = (center_y - bounds.height() / 2.0).round() as i64;

    outlined.draw(|x, y, coverage| {
        let px = origin_x + x as i64;
        let py = origin_y + y as i64;
        if px >= 0 && py >= 0 && (px as u32) < resolution && (py as u32) < resolution {
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            *pixel = blend(*pixel, glyph.color, coverage);
        }
    });

    Ok(canvas)
}

/// A public-domain Latin font bundled for tests.
#[cfg(test)]
pub(crate) fn test_font() -> ab_glyph::FontArc {
    const TUFFY: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/Tuffy.ttf"
    ));
    ab_glyph::FontArc::try_from_slice(TUFFY).unwrap()
}
