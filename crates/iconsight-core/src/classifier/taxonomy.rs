//! Class-name lists for the two classifiers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Class names indexed by model output position.
///
/// Stored on disk as `{"primary": [...], "secondary": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

impl Taxonomy {
    /// Load and check a taxonomy file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let err = |message: String| ConfigError::Taxonomy {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        let taxonomy: Self = serde_json::from_str(&content).map_err(|e| err(e.to_string()))?;

        for (name, classes) in [("primary", &taxonomy.primary), ("secondary", &taxonomy.secondary)]
        {
            if classes.is_empty() {
                return Err(err(format!("{name} class list is empty")));
            }
        }
        Ok(taxonomy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_taxonomy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("class_names.json");
        std::fs::write(
            &path,
            r#"{"primary": ["gmail", "settings"], "secondary": ["gmail", "mail", "other"]}"#,
        )
        .unwrap();

        let taxonomy = Taxonomy::load(&path).unwrap();
        assert_eq!(taxonomy.primary, vec!["gmail", "settings"]);
        assert_eq!(taxonomy.secondary.len(), 3);
    }

    #[test]
    fn test_empty_list_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("class_names.json");
        std::fs::write(&path, r#"{"primary": [], "secondary": ["other"]}"#).unwrap();

        let err = Taxonomy::load(&path).unwrap_err();
        assert!(err.to_string().contains("primary class list is empty"));
    }

    #[test]
    fn test_missing_file() {
        let err = Taxonomy::load(Path::new("/nonexistent/class_names.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Taxonomy { .. }));
    }
}
