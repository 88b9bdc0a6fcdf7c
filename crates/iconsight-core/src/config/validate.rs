//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::raster::parse_hex_color;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.primary.trim().is_empty() || self.models.secondary.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "models.primary and models.secondary must be set".into(),
            ));
        }
        if self.models.input_height == 0 || self.models.input_width == 0 {
            return Err(ConfigError::ValidationError(
                "models.input_height and models.input_width must be > 0".into(),
            ));
        }
        if !matches!(self.models.input_channels, 1 | 3) {
            return Err(ConfigError::ValidationError(
                "models.input_channels must be 1 or 3".into(),
            ));
        }
        if self.models.load_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "models.load_timeout_ms must be > 0".into(),
            ));
        }
        if self.raster.resolution == 0 {
            return Err(ConfigError::ValidationError(
                "raster.resolution must be > 0".into(),
            ));
        }
        for (key, value) in [
            ("raster.fill_color", &self.raster.fill_color),
            ("raster.background_color", &self.raster.background_color),
            ("raster.page_background", &self.raster.page_background),
        ] {
            if parse_hex_color(value).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must be a #rgb or #rrggbb colour, got {value:?}"
                )));
            }
        }
        if self.raster.fetch_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "raster.fetch_timeout_ms must be > 0".into(),
            ));
        }
        if self.raster.render_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "raster.render_timeout_ms must be > 0".into(),
            ));
        }
        if self.labeling.catch_all_class.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "labeling.catch_all_class must not be empty".into(),
            ));
        }
        if self.discovery.max_icon_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "discovery.max_icon_dimension must be > 0".into(),
            ));
        }
        if self.raster.resolution as usize != self.models.input_height
            || self.raster.resolution as usize != self.models.input_width
        {
            tracing::warn!(
                "raster.resolution ({}) differs from model input {}x{}; icons will be resized before inference",
                self.raster.resolution,
                self.models.input_height,
                self.models.input_width
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_resolution() {
        let mut config = Config::default();
        config.raster.resolution = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("raster.resolution"));
    }

    #[test]
    fn test_validate_rejects_unsupported_channels() {
        let mut config = Config::default();
        config.models.input_channels = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("input_channels"));
    }

    #[test]
    fn test_validate_rejects_bad_colour() {
        let mut config = Config::default();
        config.raster.background_color = "grey".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("raster.background_color"));
    }

    #[test]
    fn test_validate_rejects_empty_catch_all() {
        let mut config = Config::default();
        config.labeling.catch_all_class = " ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("catch_all_class"));
    }

    #[test]
    fn test_resolution_mismatch_is_only_a_warning() {
        let mut config = Config::default();
        config.raster.resolution = 128;
        assert!(config.validate().is_ok());
    }
}
