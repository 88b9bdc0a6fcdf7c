//! Tensor preprocessing: reconcile an image tensor with a model's input shape.
//!
//! Input tensors are `[height, width, channels]` with raw [0, 255] values.
//! The output is a `[1, height, width, channels]` batch scaled to [-1, 1].

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::{Array3, Array4, Axis};

use crate::error::{PipelineError, PipelineResult};

use super::debug::DebugSink;

/// Luma weights for RGB → grayscale conversion.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Expected model input shape (NHWC without the batch dimension).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl InputShape {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }
}

/// Shapes and normalizes tensors for one classifier.
#[derive(Debug, Clone)]
pub struct TensorPreprocessor {
    shape: InputShape,
}

impl TensorPreprocessor {
    pub fn new(shape: InputShape) -> Self {
        Self { shape }
    }

    /// Resize, recolour and normalize `image`, then add the batch dimension.
    ///
    /// `name` identifies the classifier in logs and debug output.
    pub fn prepare(
        &self,
        image: &Array3<f32>,
        name: &str,
        debug: Option<&dyn DebugSink>,
    ) -> PipelineResult<Array4<f32>> {
        let (h, w, c) = image.dim();
        let expected = self.shape;

        let resized = if (h, w) != (expected.height, expected.width) {
            tracing::warn!(
                "[{name}] expected image to have size {}x{} but got {h}x{w}, resizing",
                expected.height,
                expected.width
            );
            Some(resize_bilinear(image, expected.height, expected.width))
        } else {
            None
        };
        let image = resized.as_ref().unwrap_or(image);

        let converted = match (expected.channels, c) {
            (e, g) if e == g => None,
            (1, _) => {
                tracing::warn!(
                    "[{name}] expected image to have 1 color channel but got {c}, converting to grayscale"
                );
                Some(rgb_to_grayscale(image)?)
            }
            (3, 1) => {
                tracing::warn!(
                    "[{name}] expected image to have 3 color channels but got 1, converting to rgb"
                );
                Some(grayscale_to_rgb(image))
            }
            (e, g) => {
                return Err(PipelineError::InvalidChannelCount {
                    expected: e,
                    got: g,
                })
            }
        };
        let image = converted.as_ref().unwrap_or(image);

        let normalized = normalize(image);
        if let Some(sink) = debug {
            sink.inspect(name, &tensor_to_image(&normalized));
        }

        Ok(normalized.insert_axis(Axis(0)))
    }
}

/// Scale raw [0, 255] values to [-1, 1].
pub fn normalize(image: &Array3<f32>) -> Array3<f32> {
    image.mapv(|v| v * (1.0 / 127.5) - 1.0)
}

/// Convert `[h, w, 3]` RGB to `[h, w, 1]` luma.
pub fn rgb_to_grayscale(image: &Array3<f32>) -> PipelineResult<Array3<f32>> {
    let (h, w, c) = image.dim();
    if c != 3 {
        return Err(PipelineError::InvalidChannelCount {
            expected: 3,
            got: c,
        });
    }
    Ok(Array3::from_shape_fn((h, w, 1), |(y, x, _)| {
        LUMA_R * image[[y, x, 0]] + LUMA_G * image[[y, x, 1]] + LUMA_B * image[[y, x, 2]]
    }))
}

/// Expand `[h, w, 1]` grayscale to `[h, w, 3]` by repeating the channel.
pub fn grayscale_to_rgb(image: &Array3<f32>) -> Array3<f32> {
    let (h, w, _) = image.dim();
    Array3::from_shape_fn((h, w, 3), |(y, x, _)| image[[y, x, 0]])
}

/// Bilinear resize with corner-aligned sampling (`src = dst * in / out`).
pub fn resize_bilinear(image: &Array3<f32>, out_h: usize, out_w: usize) -> Array3<f32> {
    let (in_h, in_w, channels) = image.dim();
    if in_h == 0 || in_w == 0 {
        return Array3::zeros((out_h, out_w, channels));
    }
    let scale_y = in_h as f32 / out_h as f32;
    let scale_x = in_w as f32 / out_w as f32;

    Array3::from_shape_fn((out_h, out_w, channels), |(y, x, c)| {
        let src_y = y as f32 * scale_y;
        let src_x = x as f32 * scale_x;
        let y0 = (src_y.floor() as usize).min(in_h - 1);
        let x0 = (src_x.floor() as usize).min(in_w - 1);
        let y1 = (y0 + 1).min(in_h - 1);
        let x1 = (x0 + 1).min(in_w - 1);
        let dy = src_y - y0 as f32;
        let dx = src_x - x0 as f32;

        let top = image[[y0, x0, c]] * (1.0 - dx) + image[[y0, x1, c]] * dx;
        let bottom = image[[y1, x0, c]] * (1.0 - dx) + image[[y1, x1, c]] * dx;
        top * (1.0 - dy) + bottom * dy
    })
}

/// Map a normalized [-1, 1] tensor back to an 8-bit image.
pub fn tensor_to_image(tensor: &Array3<f32>) -> DynamicImage {
    let (h, w, c) = tensor.dim();
    let to_u8 = |v: f32| ((v + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8;
    if c == 1 {
        DynamicImage::ImageLuma8(GrayImage::from_fn(w as u32, h as u32, |x, y| {
            image::Luma([to_u8(tensor[[y as usize, x as usize, 0]])])
        }))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w as u32, h as u32, |x, y| {
            let (y, x) = (y as usize, x as usize);
            image::Rgb([
                to_u8(tensor[[y, x, 0]]),
                to_u8(tensor[[y, x, 1.min(c - 1)]]),
                to_u8(tensor[[y, x, 2.min(c - 1)]]),
            ])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn uniform(h: usize, w: usize, values: &[f32]) -> Array3<f32> {
        Array3::from_shape_fn((h, w, values.len()), |(_, _, c)| values[c])
    }

    #[test]
    fn test_grayscale_uses_luma_weights() {
        let gray = rgb_to_grayscale(&uniform(2, 2, &[30.0, 40.0, 50.0])).unwrap();
        assert_eq!(gray.dim(), (2, 2, 1));
        // 0.299 * 30 + 0.587 * 40 + 0.114 * 50
        assert!((gray[[1, 1, 0]] - 38.15).abs() < 1e-4);
    }

    #[test]
    fn test_grayscale_rejects_non_rgb() {
        let err = rgb_to_grayscale(&uniform(2, 2, &[1.0, 2.0, 3.0, 4.0])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidChannelCount {
                expected: 3,
                got: 4
            }
        ));
    }

    #[test]
    fn test_grayscale_to_rgb_repeats_channel() {
        let rgb = grayscale_to_rgb(&uniform(3, 2, &[77.0]));
        assert_eq!(rgb.dim(), (3, 2, 3));
        assert!(rgb.iter().all(|&v| v == 77.0));
    }

    #[test]
    fn test_normalize_range() {
        let n = normalize(&uniform(1, 2, &[0.0, 127.5, 255.0]));
        assert!((n[[0, 0, 0]] + 1.0).abs() < 1e-6);
        assert!(n[[0, 0, 1]].abs() < 1e-6);
        assert!((n[[0, 0, 2]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resize_bilinear_interpolates() {
        // 1x2 row [0, 100] upsampled to 1x4 samples at x = 0, 0.5, 1, 1.5.
        let row = Array3::from_shape_vec((1, 2, 1), vec![0.0, 100.0]).unwrap();
        let out = resize_bilinear(&row, 1, 4);
        let values: Vec<f32> = out.iter().copied().collect();
        assert_eq!(values, vec![0.0, 50.0, 100.0, 100.0]);
    }

    #[test]
    fn test_resize_keeps_uniform_values() {
        let out = resize_bilinear(&uniform(7, 5, &[10.0, 20.0, 30.0]), 96, 96);
        assert_eq!(out.dim(), (96, 96, 3));
        for ((_, _, c), &v) in out.indexed_iter() {
            assert!((v - [10.0, 20.0, 30.0][c]).abs() < 1e-3);
        }
    }

    #[test]
    fn test_prepare_resizes_converts_and_batches() {
        let pre = TensorPreprocessor::new(InputShape::new(8, 8, 1));
        let batch = pre
            .prepare(&uniform(16, 4, &[255.0, 255.0, 255.0]), "primary", None)
            .unwrap();
        assert_eq!(batch.dim(), (1, 8, 8, 1));
        assert!(batch.iter().all(|&v| (v - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_prepare_expands_grayscale() {
        let pre = TensorPreprocessor::new(InputShape::new(4, 4, 3));
        let batch = pre.prepare(&uniform(4, 4, &[0.0]), "p", None).unwrap();
        assert_eq!(batch.dim(), (1, 4, 4, 3));
        assert!(batch.iter().all(|&v| (v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_prepare_rejects_unconvertible_channels() {
        let pre = TensorPreprocessor::new(InputShape::new(4, 4, 3));
        let err = pre
            .prepare(&uniform(4, 4, &[0.0, 0.0]), "p", None)
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidChannelCount");
    }

    struct Capture(Mutex<Vec<(String, u32, u32)>>);

    impl DebugSink for Capture {
        fn inspect(&self, name: &str, image: &DynamicImage) {
            self.0
                .lock()
                .unwrap()
                .push((name.to_string(), image.width(), image.height()));
        }
    }

    #[test]
    fn test_debug_sink_receives_final_tensor() {
        let sink = Capture(Mutex::new(Vec::new()));
        let pre = TensorPreprocessor::new(InputShape::new(6, 6, 3));
        pre.prepare(&uniform(3, 3, &[1.0, 2.0, 3.0]), "secondary", Some(&sink))
            .unwrap();
        let seen = sink.0.lock().unwrap();
        assert_eq!(seen.as_slice(), &[("secondary".to_string(), 6, 6)]);
    }

    #[test]
    fn test_tensor_to_image_round_trips_pixels() {
        let img = tensor_to_image(&normalize(&uniform(2, 2, &[0.0, 128.0, 255.0])));
        assert_eq!(img.to_rgb8().get_pixel(0, 0), &image::Rgb([0, 128, 255]));
    }
}
