//! Debug hooks for inspecting the tensors fed to each classifier.

use std::path::PathBuf;

use image::DynamicImage;

/// Receives the final preprocessed tensor of each classification, rendered
/// back to an image.
pub trait DebugSink: Send + Sync {
    /// `name` is the classifier (or `icon-id.classifier`) the image was fed to.
    fn inspect(&self, name: &str, image: &DynamicImage);
}

/// Writes each inspected tensor as a PNG into a directory.
///
/// Write failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct DebugDirSink {
    dir: PathBuf,
}

impl DebugDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl DebugSink for DebugDirSink {
    fn inspect(&self, name: &str, image: &DynamicImage) {
        let file_name: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        let path = self.dir.join(format!("{file_name}.png"));
        if let Err(e) = image.save(&path) {
            tracing::warn!("Failed to write debug image {path:?}: {e}");
        }
    }
}

/// Prefixes every name with an icon id before forwarding.
pub(crate) struct ScopedSink<'a> {
    pub prefix: &'a str,
    pub inner: &'a dyn DebugSink,
}

impl DebugSink for ScopedSink<'_> {
    fn inspect(&self, name: &str, image: &DynamicImage) {
        self.inner.inspect(&format!("{}.{name}", self.prefix), image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_dir_sink_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DebugDirSink::new(dir.path().join("debug")).unwrap();
        let scoped = ScopedSink {
            prefix: "icon/3",
            inner: &sink,
        };
        scoped.inspect("primary", &DynamicImage::ImageRgb8(RgbImage::new(4, 4)));

        let written = dir.path().join("debug").join("icon_3.primary.png");
        assert!(written.exists());
        let img = image::open(written).unwrap();
        assert_eq!((img.width(), img.height()), (4, 4));
    }
}
