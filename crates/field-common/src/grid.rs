//! Regular lat/lon grid specifications.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{CommonError, CommonResult};

/// Specification of a regular lat/lon grid, flattened row by row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points in the longitude direction
    pub nx: usize,
    /// Number of points in the latitude direction
    pub ny: usize,
    /// Longitude increment in degrees
    pub dx: f64,
    /// Latitude increment in degrees (negative when rows run north to south)
    pub dy: f64,
    /// Longitude of the first grid point
    pub first_lon: f64,
    /// Latitude of the first grid point
    pub first_lat: f64,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64, first_lon: f64, first_lat: f64) -> Self {
        Self {
            nx,
            ny,
            dx,
            dy,
            first_lon,
            first_lat,
        }
    }

    /// Grid with `resolution` degree spacing covering `bbox`, rows running north to south.
    pub fn covering(bbox: &BoundingBox, resolution: f64) -> CommonResult<Self> {
        if !(resolution > 0.0) {
            return Err(CommonError::InvalidGrid(format!(
                "resolution must be > 0, got {}",
                resolution
            )));
        }
        if bbox.width() < 0.0 || bbox.height() < 0.0 {
            return Err(CommonError::InvalidGrid(format!(
                "inverted bounding box {:?}",
                bbox
            )));
        }

        let nx = (bbox.width() / resolution).round() as usize + 1;
        let ny = (bbox.height() / resolution).round() as usize + 1;

        Ok(Self::new(
            nx,
            ny,
            resolution,
            -resolution,
            bbox.min_lon,
            bbox.max_lat,
        ))
    }

    /// Calculate the bounding box of this grid.
    pub fn bbox(&self) -> BoundingBox {
        let last_lon = self.first_lon + self.nx.saturating_sub(1) as f64 * self.dx;
        let last_lat = self.first_lat + self.ny.saturating_sub(1) as f64 * self.dy;

        BoundingBox {
            min_lon: self.first_lon.min(last_lon),
            min_lat: self.first_lat.min(last_lat),
            max_lon: self.first_lon.max(last_lon),
            max_lat: self.first_lat.max(last_lat),
        }
    }

    /// Flattened latitudes, one per grid point.
    pub fn latitudes(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len());
        for j in 0..self.ny {
            let lat = self.first_lat + j as f64 * self.dy;
            out.extend(std::iter::repeat(lat).take(self.nx));
        }
        out
    }

    /// Flattened longitudes, one per grid point.
    pub fn longitudes(&self) -> Vec<f64> {
        let row: Vec<f64> = (0..self.nx)
            .map(|i| self.first_lon + i as f64 * self.dx)
            .collect();
        let mut out = Vec::with_capacity(self.len());
        for _ in 0..self.ny {
            out.extend_from_slice(&row);
        }
        out
    }

    /// Short label used to compare grid resolutions, e.g. "0.25".
    pub fn resolution_label(&self) -> String {
        format!("{}", self.dx.abs())
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covering_grid() {
        let grid = GridSpec::covering(&BoundingBox::new(0.0, 40.0, 2.0, 41.0), 0.5).unwrap();
        assert_eq!(grid.nx, 5);
        assert_eq!(grid.ny, 3);
        assert_eq!(grid.len(), 15);
        assert_eq!(grid.bbox(), BoundingBox::new(0.0, 40.0, 2.0, 41.0));
        assert_eq!(grid.resolution_label(), "0.5");
    }

    #[test]
    fn test_flattened_coordinates() {
        let grid = GridSpec::new(3, 2, 1.0, -1.0, 10.0, 50.0);
        assert_eq!(grid.latitudes(), vec![50.0, 50.0, 50.0, 49.0, 49.0, 49.0]);
        assert_eq!(grid.longitudes(), vec![10.0, 11.0, 12.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_invalid_resolution() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(GridSpec::covering(&bbox, 0.0).is_err());
        assert!(GridSpec::covering(&bbox, -1.0).is_err());
    }
}
