//! Page manifests: the list of elements discovered on a page.
//!
//! A manifest is a JSON array of element descriptors. Only icon candidates
//! are labeled: `<img>`, `<i>` and `<svg>` elements no larger than the
//! configured icon dimension on either side.

use std::path::Path;

use anyhow::Context;
use iconsight_core::{ElementDescriptor, IconElement, IconRecord};

/// Icons ready to label, plus candidates that could not be turned into icons.
#[derive(Debug, Default)]
pub struct Manifest {
    pub icons: Vec<IconElement>,
    pub rejected: Vec<IconRecord>,
    /// Elements ignored because they are not icon candidates
    pub ignored: usize,
}

/// Whether a page element looks like an icon. Hidden (zero-area) elements
/// never do.
pub fn is_icon_candidate(desc: &ElementDescriptor, max_dimension: u32) -> bool {
    matches!(desc.tag.to_ascii_lowercase().as_str(), "img" | "i" | "svg")
        && desc.width > 0
        && desc.height > 0
        && desc.width <= max_dimension
        && desc.height <= max_dimension
}

/// Read a manifest and convert its icon candidates.
///
/// Relative `src` and `font` paths resolve against the manifest's directory.
pub fn load(path: &Path, max_dimension: u32) -> anyhow::Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let descriptors: Vec<ElementDescriptor> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid manifest {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut manifest = Manifest::default();
    for desc in &descriptors {
        if !is_icon_candidate(desc, max_dimension) {
            manifest.ignored += 1;
            continue;
        }
        match IconElement::from_descriptor(desc, base_dir) {
            Ok(icon) => manifest.icons.push(icon),
            Err(e) => {
                tracing::warn!("Cannot prepare icon {}: {e}", desc.id);
                manifest.rejected.push(IconRecord {
                    id: desc.id.clone(),
                    tag: desc.tag.to_ascii_lowercase(),
                    status: "failed",
                    aria_label: desc.aria_label.clone(),
                    diagnostic: None,
                    error: Some(format!("{}: {e}", e.kind())),
                });
            }
        }
    }

    tracing::debug!(
        "Manifest {}: {} icons, {} rejected, {} ignored",
        path.display(),
        manifest.icons.len(),
        manifest.rejected.len(),
        manifest.ignored
    );
    Ok(manifest)
}
