//! Bitmap (`<img>`) rendering: fetch, decode, scale onto the canvas.

use std::io::Cursor;
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use crate::element::ImageSource;
use crate::error::{PipelineError, PipelineResult};

use super::canvas::fit_in_square;

/// Fetches encoded image bytes for an `<img>` source.
pub(crate) struct ImageFetcher {
    client: reqwest::Client,
    allow_remote: bool,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(client: reqwest::Client, allow_remote: bool, timeout: Duration) -> Self {
        Self {
            client,
            allow_remote,
            timeout,
        }
    }

    /// Load the bytes behind an image source.
    pub async fn fetch(&self, id: &str, source: &ImageSource) -> PipelineResult<Vec<u8>> {
        let render_err = |message: String| PipelineError::Render {
            id: id.to_string(),
            message,
        };

        match source {
            ImageSource::Inline(bytes) => Ok(bytes.to_vec()),
            ImageSource::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| render_err(format!("cannot read {}: {e}", path.display()))),
            ImageSource::Remote(url) => {
                if !self.allow_remote {
                    return Err(render_err(format!(
                        "image data from {url} is not fetchable: remote images are disabled"
                    )));
                }
                tracing::debug!("Fetching icon {id} from {url}");
                let response = self
                    .client
                    .get(url)
                    .timeout(self.timeout)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| render_err(format!("cannot fetch {url}: {e}")))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| render_err(format!("cannot read body of {url}: {e}")))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

/// Decode `bytes` and draw them at the element's rendered size, scaled so the
/// larger side spans `resolution`, over an opaque page backdrop.
pub(crate) fn render(
    id: &str,
    bytes: &[u8],
    width: u32,
    height: u32,
    resolution: u32,
    backdrop: Rgb<u8>,
) -> PipelineResult<RgbImage> {
    let decoded = decode(id, bytes)?;

    let placement = fit_in_square(width, height, resolution);
    let scaled = decoded.resize_exact(placement.width, placement.height, FilterType::Triangle);

    let [r, g, b] = backdrop.0;
    let mut canvas = RgbaImage::from_pixel(resolution, resolution, Rgba([r, g, b, 255]));
    imageops::overlay(
        &mut canvas,
        &scaled.to_rgba8(),
        placement.x as i64,
        placement.y as i64,
    );

    Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

fn decode(id: &str, bytes: &[u8]) -> PipelineResult<DynamicImage> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Render {
            id: id.to_string(),
            message: format!("cannot detect image format: {e}"),
        })?;
    reader.decode().map_err(|e| PipelineError::Render {
        id: id.to_string(),
        message: format!("cannot decode image: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn png_bytes(img: RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_render_wide_image_letterboxes_on_backdrop() {
        let bytes = png_bytes(RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255])));
        let out = render("a", &bytes, 40, 20, 32, Rgb([255, 255, 255])).unwrap();
        assert_eq!(out.dimensions(), (32, 32));
        assert_eq!(out.get_pixel(16, 16), &Rgb([255, 0, 0]));
        // Top rows are outside the 32x16 placement.
        assert_eq!(out.get_pixel(16, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_transparent_pixels_show_backdrop() {
        let bytes = png_bytes(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        let out = render("a", &bytes, 8, 8, 16, Rgb([255, 255, 255])).unwrap();
        assert!(out.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_render_rejects_garbage() {
        let err = render("broken", b"not an image", 8, 8, 16, Rgb([0, 0, 0])).unwrap_err();
        assert!(matches!(err, PipelineError::Render { ref id, .. } if id == "broken"));
    }

    #[tokio::test]
    async fn test_remote_disabled_is_render_error() {
        let fetcher = ImageFetcher::new(reqwest::Client::new(), false, Duration::from_secs(1));
        let err = fetcher
            .fetch("cdn", &ImageSource::Remote("https://example.com/a.png".into()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "RenderError");
        assert!(err.to_string().contains("not fetchable"));
    }

    #[tokio::test]
    async fn test_fetch_inline_and_file() {
        let fetcher = ImageFetcher::new(reqwest::Client::new(), false, Duration::from_secs(1));
        let inline: Arc<[u8]> = Arc::from(vec![1u8, 2, 3]);
        assert_eq!(
            fetcher.fetch("a", &ImageSource::Inline(inline)).await.unwrap(),
            vec![1, 2, 3]
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.bin");
        std::fs::write(&path, [9u8, 8]).unwrap();
        assert_eq!(
            fetcher.fetch("b", &ImageSource::File(path)).await.unwrap(),
            vec![9, 8]
        );
    }
}
