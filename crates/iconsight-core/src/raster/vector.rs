//! Vector-graphic (`<svg>`) rendering with `resvg`.
//!
//! The root element is rewritten before rendering: explicit `width`,
//! `height`, `class` and `style` are dropped so page styling and fixed
//! dimensions cannot override the canvas size, and the fill colour is pushed
//! onto the root as `color` (for `currentColor`) and as an inherited `fill`.
//! resvg never runs SMIL animation, so output is a single static frame.

use std::io::Cursor;

use image::{Rgb, RgbImage};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use resvg::{tiny_skia, usvg};

use crate::error::{PipelineError, PipelineResult};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Attributes on the root that would pull in page styles or fixed sizes.
const PRESENTATIONAL_ATTRIBUTES: [&[u8]; 5] = [b"width", b"height", b"class", b"style", b"color"];

/// Serialize `markup` to a self-contained SVG string with the root's
/// presentational attributes removed.
pub fn serialize_portable(markup: &str, fill: Rgb<u8>) -> Result<String, String> {
    let fill = to_hex(fill);
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut found_root = false;

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        let event = match event {
            Event::Start(start) if !found_root && start.local_name().as_ref() == b"svg" => {
                found_root = true;
                Event::Start(strip_root(&start, &fill)?)
            }
            Event::Empty(start) if !found_root && start.local_name().as_ref() == b"svg" => {
                found_root = true;
                Event::Empty(strip_root(&start, &fill)?)
            }
            Event::Eof => break,
            other => other,
        };
        writer.write_event(event).map_err(|e| e.to_string())?;
    }

    if !found_root {
        return Err("markup has no <svg> root element".to_string());
    }
    String::from_utf8(writer.into_inner().into_inner()).map_err(|e| e.to_string())
}

fn strip_root(start: &BytesStart<'_>, fill: &str) -> Result<BytesStart<'static>, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut root = BytesStart::new(name);
    let mut has_fill = false;
    let mut has_namespace = false;

    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = attr.key.as_ref();
        if PRESENTATIONAL_ATTRIBUTES.contains(&key) {
            continue;
        }
        has_fill |= key == b"fill";
        has_namespace |= key == b"xmlns";
        root.push_attribute(attr);
    }

    if !has_namespace {
        root.push_attribute(("xmlns", SVG_NAMESPACE));
    }
    root.push_attribute(("color", fill));
    if !has_fill {
        root.push_attribute(("fill", fill));
    }
    Ok(root)
}

/// Render vector markup onto a `resolution × resolution` canvas filled with
/// `background`, fitting the graphic's viewBox to the canvas.
pub(crate) fn render(
    id: &str,
    markup: &str,
    resolution: u32,
    fill: Rgb<u8>,
    background: Rgb<u8>,
) -> PipelineResult<RgbImage> {
    let render_err = |message: String| PipelineError::Render {
        id: id.to_string(),
        message,
    };

    let portable = serialize_portable(markup, fill).map_err(render_err)?;
    let tree = usvg::Tree::from_str(&portable, &usvg::Options::default())
        .map_err(|e| render_err(format!("cannot parse svg: {e}")))?;

    let mut pixmap = tiny_skia::Pixmap::new(resolution, resolution)
        .ok_or_else(|| render_err(format!("cannot allocate {resolution}px canvas")))?;
    let [r, g, b] = background.0;
    pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));

    let size = tree.size();
    let side = resolution as f32;
    let scale = (side / size.width()).min(side / size.height());
    let tx = (side - size.width() * scale) / 2.0;
    let ty = (side - size.height() * scale) / 2.0;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_row(scale, 0.0, 0.0, scale, tx, ty),
        &mut pixmap.as_mut(),
    );

    // The background is opaque, so premultiplied RGBA equals straight RGBA.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(resolution, resolution, rgb)
        .ok_or_else(|| render_err("canvas size mismatch".to_string()))
}

fn to_hex(color: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
