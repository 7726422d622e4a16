//! Configuration for cutout masks.

use serde::{Deserialize, Serialize};

/// Configuration for computing which global points a local domain hides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Shape used for the local domain's footprint.
    pub footprint: FootprintMethod,

    /// Distance in degrees the footprint is grown by before testing global points.
    pub buffer_degrees: f64,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            footprint: FootprintMethod::ConvexHull,
            buffer_degrees: 0.0,
        }
    }
}

impl MaskConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CUTOUT_FOOTPRINT") {
            config.footprint = FootprintMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("CUTOUT_BUFFER_DEG") {
            if let Ok(buffer) = val.parse() {
                config.buffer_degrees = buffer;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.buffer_degrees.is_finite() || self.buffer_degrees < 0.0 {
            return Err(format!(
                "buffer_degrees must be a finite value >= 0, got {}",
                self.buffer_degrees
            ));
        }

        Ok(())
    }
}

/// Shape of a local domain's footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootprintMethod {
    /// Convex hull of the local points.
    #[default]
    ConvexHull,
    /// Lat/lon bounding box of the local points.
    BoundingBox,
}

impl FootprintMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bbox" | "bounding_box" => Self::BoundingBox,
            _ => Self::ConvexHull,
        }
    }

    /// Get the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConvexHull => "convex_hull",
            Self::BoundingBox => "bounding_box",
        }
    }
}

impl std::fmt::Display for FootprintMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MaskConfig::default();
        assert_eq!(config.footprint, FootprintMethod::ConvexHull);
        assert_eq!(config.buffer_degrees, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = MaskConfig::default();
        config.buffer_degrees = -1.0;
        assert!(config.validate().is_err());

        config.buffer_degrees = f64::NAN;
        assert!(config.validate().is_err());

        config.buffer_degrees = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_footprint_from_str() {
        assert_eq!(FootprintMethod::from_str("bbox"), FootprintMethod::BoundingBox);
        assert_eq!(
            FootprintMethod::from_str("BOUNDING_BOX"),
            FootprintMethod::BoundingBox
        );
        assert_eq!(
            FootprintMethod::from_str("convex_hull"),
            FootprintMethod::ConvexHull
        );
        assert_eq!(FootprintMethod::from_str("other"), FootprintMethod::ConvexHull);
    }

    #[test]
    fn test_partial_yaml() {
        let config: MaskConfig = serde_yaml::from_str("buffer_degrees: 0.25").unwrap();
        assert_eq!(config.footprint, FootprintMethod::ConvexHull);
        assert_eq!(config.buffer_degrees, 0.25);
    }
}
