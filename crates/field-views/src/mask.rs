//! Geometry for cutout masks.
//!
//! A local (limited-area) domain hides the global points that fall inside
//! its footprint. The footprint is pluggable through [`Footprint`]; the
//! default is the convex hull of the local points.

use field_common::bbox::unwrap_longitude;
use field_common::BoundingBox;
use rayon::prelude::*;
use tracing::debug;

use crate::config::{FootprintMethod, MaskConfig};
use crate::error::{Result, ViewError};

/// Points closer than this to a footprint edge count as on it.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Geometric predicate deciding whether a point lies inside a local domain.
pub trait Footprint: Send + Sync {
    /// Check if the point at (`lat`, `lon`) lies inside the domain.
    fn contains(&self, lat: f64, lon: f64) -> bool;
}

/// Footprint made of the bounding box of the local points.
#[derive(Debug, Clone)]
pub struct BoundingBoxFootprint {
    bbox: BoundingBox,
}

impl BoundingBoxFootprint {
    /// Build from local coordinates, grown by `buffer` degrees.
    pub fn new(latitudes: &[f64], longitudes: &[f64], buffer: f64) -> Result<Self> {
        let longitudes = unwrap_all(longitudes);
        let bbox = BoundingBox::from_points(latitudes, &longitudes)
            .ok_or_else(|| ViewError::Mask("local domain has no points".to_string()))?;
        Ok(Self {
            bbox: bbox.expand(buffer),
        })
    }
}

impl Footprint for BoundingBoxFootprint {
    fn contains(&self, lat: f64, lon: f64) -> bool {
        let lon = unwrap_longitude(lon, self.bbox.center_lon());
        self.bbox.contains_point(lon, lat)
    }
}

/// Footprint made of the convex hull of the local points, in lon/lat.
#[derive(Debug, Clone)]
pub struct ConvexHullFootprint {
    /// Hull vertices as (lon, lat), counter-clockwise.
    hull: Vec<(f64, f64)>,
    /// Hull extent grown by the buffer, for a cheap first test.
    bbox: BoundingBox,
    buffer: f64,
}

impl ConvexHullFootprint {
    /// Build from local coordinates, grown by `buffer` degrees.
    pub fn new(latitudes: &[f64], longitudes: &[f64], buffer: f64) -> Result<Self> {
        let longitudes = unwrap_all(longitudes);
        let points: Vec<(f64, f64)> = longitudes
            .iter()
            .copied()
            .zip(latitudes.iter().copied())
            .collect();

        let hull = convex_hull(points);
        let lats: Vec<f64> = hull.iter().map(|p| p.1).collect();
        let lons: Vec<f64> = hull.iter().map(|p| p.0).collect();
        let bbox = BoundingBox::from_points(&lats, &lons)
            .ok_or_else(|| ViewError::Mask("local domain has no points".to_string()))?;

        Ok(Self {
            hull,
            bbox: bbox.expand(buffer),
            buffer,
        })
    }

    /// Hull vertices as (lon, lat).
    pub fn hull(&self) -> &[(f64, f64)] {
        &self.hull
    }

    /// Ray casting test against the hull polygon.
    fn inside_polygon(&self, lon: f64, lat: f64) -> bool {
        let n = self.hull.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;

        for i in 0..n {
            let (xi, yi) = self.hull[i];
            let (xj, yj) = self.hull[j];

            if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    /// Distance in degrees from the point to the nearest hull edge or vertex.
    fn distance_to_edge(&self, lon: f64, lat: f64) -> f64 {
        let n = self.hull.len();
        match n {
            0 => f64::INFINITY,
            1 => distance((lon, lat), self.hull[0]),
            _ => (0..n)
                .map(|i| segment_distance((lon, lat), self.hull[i], self.hull[(i + 1) % n]))
                .fold(f64::INFINITY, f64::min),
        }
    }
}

impl Footprint for ConvexHullFootprint {
    fn contains(&self, lat: f64, lon: f64) -> bool {
        let lon = unwrap_longitude(lon, self.bbox.center_lon());
        if !self.bbox.contains_point(lon, lat) {
            return false;
        }
        self.inside_polygon(lon, lat)
            || self.distance_to_edge(lon, lat) <= self.buffer.max(EDGE_TOLERANCE)
    }
}

/// Build the footprint selected by `config` from local coordinates.
pub fn footprint_from_config(
    latitudes: &[f64],
    longitudes: &[f64],
    config: &MaskConfig,
) -> Result<Box<dyn Footprint>> {
    config.validate().map_err(ViewError::InvalidConfig)?;
    let footprint: Box<dyn Footprint> = match config.footprint {
        FootprintMethod::ConvexHull => Box::new(ConvexHullFootprint::new(
            latitudes,
            longitudes,
            config.buffer_degrees,
        )?),
        FootprintMethod::BoundingBox => Box::new(BoundingBoxFootprint::new(
            latitudes,
            longitudes,
            config.buffer_degrees,
        )?),
    };
    Ok(footprint)
}

/// Mask over global points: `true` where the point lies outside `footprint`
/// and is therefore kept.
pub fn mask_outside(footprint: &dyn Footprint, latitudes: &[f64], longitudes: &[f64]) -> Vec<bool> {
    latitudes
        .par_iter()
        .zip(longitudes.par_iter())
        .map(|(&lat, &lon)| !footprint.contains(lat, lon))
        .collect()
}

/// Compute the cutout mask of a global grid against a local domain.
pub fn cutout_mask(
    lam_latitudes: &[f64],
    lam_longitudes: &[f64],
    globe_latitudes: &[f64],
    globe_longitudes: &[f64],
    config: &MaskConfig,
) -> Result<Vec<bool>> {
    if lam_latitudes.len() != lam_longitudes.len() {
        return Err(ViewError::Mask(format!(
            "local domain has {} latitudes but {} longitudes",
            lam_latitudes.len(),
            lam_longitudes.len()
        )));
    }
    if globe_latitudes.len() != globe_longitudes.len() {
        return Err(ViewError::Mask(format!(
            "global domain has {} latitudes but {} longitudes",
            globe_latitudes.len(),
            globe_longitudes.len()
        )));
    }
    for (domain, coordinate, values) in [
        ("local", "latitude", lam_latitudes),
        ("local", "longitude", lam_longitudes),
        ("global", "latitude", globe_latitudes),
        ("global", "longitude", globe_longitudes),
    ] {
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(ViewError::Mask(format!(
                "{} domain {} {} is {}",
                domain, coordinate, position, values[position]
            )));
        }
    }

    let footprint = footprint_from_config(lam_latitudes, lam_longitudes, config)?;
    let mask = mask_outside(footprint.as_ref(), globe_latitudes, globe_longitudes);

    let retained = mask.iter().filter(|&&keep| keep).count();
    debug!(
        footprint = %config.footprint,
        lam_points = lam_latitudes.len(),
        globe_points = mask.len(),
        retained,
        dropped = mask.len() - retained,
        "Computed cutout mask"
    );

    Ok(mask)
}

/// Unwrap every longitude into the frame of the first one.
fn unwrap_all(longitudes: &[f64]) -> Vec<f64> {
    match longitudes.first() {
        Some(&reference) => longitudes
            .iter()
            .map(|&lon| unwrap_longitude(lon, reference))
            .collect(),
        None => Vec::new(),
    }
}

/// Monotone chain convex hull; returns vertices counter-clockwise.
fn convex_hull(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    points.dedup();

    if points.len() < 3 {
        return points;
    }

    let mut lower: Vec<(f64, f64)> = Vec::new();
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f64, f64)> = Vec::new();
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return distance(p, a);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0);
    distance(p, (a.0 + t * dx, a.1 + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> (Vec<f64>, Vec<f64>) {
        // (lat, lon) corners of [0, 1] x [0, 1] plus the centre
        (
            vec![0.0, 0.0, 1.0, 1.0, 0.5],
            vec![0.0, 1.0, 0.0, 1.0, 0.5],
        )
    }

    #[test]
    fn test_convex_hull_drops_interior() {
        let (lats, lons) = square();
        let footprint = ConvexHullFootprint::new(&lats, &lons, 0.0).unwrap();
        assert_eq!(footprint.hull().len(), 4);
        assert!(!footprint.hull().contains(&(0.5, 0.5)));
    }

    #[test]
    fn test_hull_contains() {
        let (lats, lons) = square();
        let footprint = ConvexHullFootprint::new(&lats, &lons, 0.0).unwrap();
        assert!(footprint.contains(0.25, 0.25));
        assert!(footprint.contains(1.0, 1.0));
        assert!(footprint.contains(0.0, 0.5));
        assert!(!footprint.contains(1.5, 0.5));
        assert!(!footprint.contains(-0.1, 0.5));
    }

    #[test]
    fn test_triangle_differs_from_bbox() {
        let lats = vec![0.0, 0.0, 2.0];
        let lons = vec![0.0, 2.0, 0.0];
        let hull = ConvexHullFootprint::new(&lats, &lons, 0.0).unwrap();
        let bbox = BoundingBoxFootprint::new(&lats, &lons, 0.0).unwrap();
        // Above the hypotenuse, inside the bounding box
        assert!(!hull.contains(1.8, 1.8));
        assert!(bbox.contains(1.8, 1.8));
    }

    #[test]
    fn test_buffer_grows_footprint() {
        let (lats, lons) = square();
        let tight = ConvexHullFootprint::new(&lats, &lons, 0.0).unwrap();
        let loose = ConvexHullFootprint::new(&lats, &lons, 0.5).unwrap();
        assert!(!tight.contains(1.3, 0.5));
        assert!(loose.contains(1.3, 0.5));
        assert!(!loose.contains(1.6, 0.5));
    }

    #[test]
    fn test_longitudes_are_unwrapped() {
        // Local domain straddling the antimeridian
        let lats = vec![0.0, 0.0, 2.0, 2.0];
        let lons = vec![179.0, -179.0, 179.0, -179.0];
        let footprint = ConvexHullFootprint::new(&lats, &lons, 0.0).unwrap();
        assert!(footprint.contains(1.0, 180.0));
        assert!(footprint.contains(1.0, -180.0));
        assert!(!footprint.contains(1.0, 0.0));
    }

    #[test]
    fn test_cutout_mask() {
        let (lats, lons) = square();
        let globe_lats = vec![0.25, 0.75, 5.0, -5.0];
        let globe_lons = vec![0.25, 0.5, 0.0, 0.0];
        let mask = cutout_mask(&lats, &lons, &globe_lats, &globe_lons, &MaskConfig::default())
            .unwrap();
        assert_eq!(mask, vec![false, false, true, true]);
    }

    #[test]
    fn test_cutout_mask_rejects_bad_input() {
        let config = MaskConfig::default();
        assert!(cutout_mask(&[0.0], &[0.0, 1.0], &[0.0], &[0.0], &config).is_err());
        assert!(cutout_mask(&[], &[], &[0.0], &[0.0], &config).is_err());

        let bad = MaskConfig {
            buffer_degrees: -1.0,
            ..MaskConfig::default()
        };
        assert!(matches!(
            cutout_mask(&[0.0], &[0.0], &[0.0], &[0.0], &bad),
            Err(ViewError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cutout_mask_rejects_non_finite_coordinates() {
        let (lats, lons) = square();
        let config = MaskConfig::default();

        let err = cutout_mask(&lats, &lons, &[0.0, 1.0], &[0.0, f64::NAN], &config).unwrap_err();
        assert!(matches!(err, ViewError::Mask(_)));
        assert!(err.to_string().contains("global domain longitude 1"), "{err}");

        let mut bad_lats = lats.clone();
        bad_lats[2] = f64::INFINITY;
        assert!(matches!(
            cutout_mask(&bad_lats, &lons, &[0.0], &[0.0], &config),
            Err(ViewError::Mask(_))
        ));
    }

    #[test]
    fn test_cutout_mask_far_longitude_terminates() {
        let (lats, lons) = square();
        let mask = cutout_mask(
            &lats,
            &lons,
            &[0.5, 0.5],
            &[0.5, 1e20],
            &MaskConfig::default(),
        )
        .unwrap();
        assert!(!mask[0]);
        assert_eq!(mask.len(), 2);
    }
}
