//! The square raster canvas shared by every element kind.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array3;

/// A rendered icon: a square pixel buffer with 1 or 3 channels in [0, 255].
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
}

impl RasterImage {
    pub(crate) fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Number of colour channels (1 or 3).
    pub fn channels(&self) -> usize {
        self.image.color().channel_count() as usize
    }

    /// The underlying image.
    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }

    /// Convert to an `[height, width, channels]` tensor with raw [0, 255] values.
    pub fn to_tensor(&self) -> Array3<f32> {
        let (w, h) = self.image.dimensions();
        match &self.image {
            DynamicImage::ImageLuma8(gray) => {
                Array3::from_shape_fn((h as usize, w as usize, 1), |(y, x, _)| {
                    gray.get_pixel(x as u32, y as u32)[0] as f32
                })
            }
            other => {
                let rgb = other.to_rgb8();
                Array3::from_shape_fn((h as usize, w as usize, 3), |(y, x, c)| {
                    rgb.get_pixel(x as u32, y as u32)[c] as f32
                })
            }
        }
    }
}

/// Where a `width × height` element lands inside a square canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Scale an element so its larger side spans `resolution`, centred.
pub(crate) fn fit_in_square(width: u32, height: u32, resolution: u32) -> Placement {
    let largest = width.max(height).max(1) as f32;
    let scale = resolution as f32 / largest;
    let w = ((width as f32 * scale).round() as u32).clamp(1, resolution);
    let h = ((height as f32 * scale).round() as u32).clamp(1, resolution);
    Placement {
        x: (resolution - w) / 2,
        y: (resolution - h) / 2,
        width: w,
        height: h,
    }
}

/// Parse a `#rgb` or `#rrggbb` colour.
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Rgb(rgb))
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
        }
        _ => None,
    }
}

/// Blend `fg` over `bg` with coverage `alpha` in [0, 1].
pub(crate) fn blend(bg: Rgb<u8>, fg: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |b: u8, f: u8| (b as f32 * (1.0 - a) + f as f32 * a).round() as u8;
    Rgb([mix(bg[0], fg[0]), mix(bg[1], fg[1]), mix(bg[2], fg[2])])
}
