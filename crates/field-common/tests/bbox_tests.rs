//! Tests for BoundingBox and GridSpec working together.

use field_common::bbox::unwrap_longitude;
use field_common::{BoundingBox, CommonError, GridSpec};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.min_lon, -180.0);
    assert_eq!(bbox.min_lat, -90.0);
    assert_eq!(bbox.max_lon, 180.0);
    assert_eq!(bbox.max_lat, 90.0);
    assert_eq!(bbox.width(), 360.0);
    assert_eq!(bbox.height(), 180.0);
    assert_eq!(bbox.center_lon(), 0.0);
}

#[test]
fn test_bbox_from_points() {
    let bbox = BoundingBox::from_points(&[10.0, -5.0, 3.0], &[100.0, 120.0, 90.0]).unwrap();
    assert_eq!(bbox, BoundingBox::new(90.0, -5.0, 120.0, 10.0));
    assert!(BoundingBox::from_points(&[], &[]).is_none());
}

// ============================================================================
// from_csv tests
// ============================================================================

#[test]
fn test_parse_csv_scientific_notation() {
    let bbox = BoundingBox::from_csv("1e-6,2e-6,1e2,2e1").unwrap();
    assert_eq!(bbox.min_lon, 1e-6);
    assert_eq!(bbox.max_lat, 20.0);
}

#[test]
fn test_parse_csv_errors() {
    for input in ["", "1,2,3,4,5", "a,b,c,d", "1;2;3;4"] {
        let err = BoundingBox::from_csv(input).unwrap_err();
        assert!(matches!(err, CommonError::InvalidBbox(_)), "{input}");
    }
}

// ============================================================================
// Containment tests
// ============================================================================

#[test]
fn test_contains_point_edges() {
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(1.0, 0.5));
    assert!(!bbox.contains_point(1.0001, 0.5));
    assert!(bbox.expand(0.01).contains_point(1.0001, 0.5));
}

#[test]
fn test_unwrap_longitude_across_antimeridian() {
    assert_eq!(unwrap_longitude(-179.0, 179.0), 181.0);
    assert_eq!(unwrap_longitude(179.0, -179.0), -181.0);
    assert_eq!(unwrap_longitude(10.0, 0.0), 10.0);
    assert_eq!(unwrap_longitude(350.0, 0.0), -10.0);
}

// ============================================================================
// Grid tests
// ============================================================================

#[test]
fn test_grid_points_cover_bbox() {
    let bbox = BoundingBox::new(-10.0, 40.0, 10.0, 50.0);
    let grid = GridSpec::covering(&bbox, 5.0).unwrap();
    assert_eq!((grid.nx, grid.ny), (5, 3));

    let lats = grid.latitudes();
    let lons = grid.longitudes();
    assert_eq!(lats.len(), grid.len());
    assert_eq!(lons.len(), grid.len());

    // Rows run north to south
    assert_eq!(lats[0], 50.0);
    assert_eq!(lats[grid.len() - 1], 40.0);
    assert_eq!(&lons[..5], &[-10.0, -5.0, 0.0, 5.0, 10.0]);

    assert_eq!(BoundingBox::from_points(&lats, &lons).unwrap(), bbox);
}

#[test]
fn test_grid_rejects_bad_resolution() {
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    assert!(matches!(
        GridSpec::covering(&bbox, 0.0),
        Err(CommonError::InvalidGrid(_))
    ));
    assert!(GridSpec::covering(&BoundingBox::new(1.0, 0.0, 0.0, 1.0), 0.5).is_err());
}
