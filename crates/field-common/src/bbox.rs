//! Geographic bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box enclosing every `(lat, lon)` pair, or `None` when there are no points.
    pub fn from_points(latitudes: &[f64], longitudes: &[f64]) -> Option<Self> {
        let mut points = latitudes.iter().zip(longitudes.iter());
        let (&lat0, &lon0) = points.next()?;
        let mut bbox = Self::new(lon0, lat0, lon0, lat0);
        for (&lat, &lon) in points {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        Some(bbox)
    }

    /// Parse a "min_lon,min_lat,max_lon,max_lat" string.
    pub fn from_csv(s: &str) -> CommonResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(CommonError::InvalidBbox(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (value, part) in values.iter_mut().zip(parts.iter()) {
            *value = part
                .parse()
                .map_err(|_| CommonError::InvalidBbox(s.to_string()))?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude at the middle of the box.
    pub fn center_lon(&self) -> f64 {
        (self.min_lon + self.max_lon) / 2.0
    }

    /// Check if a point is contained within this bbox (edges included).
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Grow the box by `buffer` degrees on every side.
    pub fn expand(&self, buffer: f64) -> Self {
        Self {
            min_lon: self.min_lon - buffer,
            min_lat: self.min_lat - buffer,
            max_lon: self.max_lon + buffer,
            max_lat: self.max_lat + buffer,
        }
    }
}

/// Shift `lon` by whole turns so that it lies in `[reference - 180, reference + 180)`.
///
/// Non-finite input stays non-finite.
pub fn unwrap_longitude(lon: f64, reference: f64) -> f64 {
    (lon - reference + 180.0).rem_euclid(360.0) - 180.0 + reference
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_bbox() {
        let bbox = BoundingBox::from_csv("-25.0, 30.0, 45.0, 72.0").unwrap();
        assert_eq!(bbox.min_lon, -25.0);
        assert_eq!(bbox.min_lat, 30.0);
        assert_eq!(bbox.max_lon, 45.0);
        assert_eq!(bbox.max_lat, 72.0);

        assert!(BoundingBox::from_csv("1,2,3").is_err());
        assert!(BoundingBox::from_csv("1,2,x,4").is_err());
    }

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox::from_points(&[50.0, 40.0, 45.0], &[-5.0, 10.0, 2.0]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-5.0, 40.0, 10.0, 50.0));
        assert!(BoundingBox::from_points(&[], &[]).is_none());
    }

    #[test]
    fn test_expand_and_contains() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(!bbox.contains_point(1.5, 0.5));
        assert!(bbox.expand(0.5).contains_point(1.5, 0.5));
        assert!(bbox.contains_point(1.0, 1.0));
    }

    #[test]
    fn test_unwrap_longitude() {
        assert_eq!(unwrap_longitude(350.0, 0.0), -10.0);
        assert_eq!(unwrap_longitude(-170.0, 170.0), 190.0);
        assert_eq!(unwrap_longitude(20.0, 10.0), 20.0);
        assert_eq!(unwrap_longitude(190.0, 10.0), -170.0);
    }

    #[test]
    fn test_unwrap_longitude_extreme_values() {
        let far = unwrap_longitude(1e20, 0.0);
        assert!((-180.0..180.0).contains(&far));
        assert!(unwrap_longitude(f64::NAN, 0.0).is_nan());
        assert!(unwrap_longitude(f64::INFINITY, 0.0).is_nan());
    }
}
