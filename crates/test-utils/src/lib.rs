//! Shared test utilities for the field-views workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic dataset generators
//! - Common coordinate fixtures
//! - Approximate equality macros
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{encoded_array, fixtures};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Compare flattened `(latitudes, longitudes)` point lists within `epsilon`.
///
/// Reports the first point that differs.
///
/// ```ignore
/// use test_utils::assert_points_approx_eq;
///
/// assert_points_approx_eq!((cutout.latitudes(), cutout.longitudes()), (lats, lons), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_points_approx_eq {
    (($lats:expr, $lons:expr), ($expected_lats:expr, $expected_lons:expr), $epsilon:expr) => {{
        let lats: &[f64] = &$lats;
        let lons: &[f64] = &$lons;
        let expected_lats: &[f64] = &$expected_lats;
        let expected_lons: &[f64] = &$expected_lons;
        assert_eq!(lats.len(), lons.len(), "latitude and longitude counts differ");
        assert_eq!(lats.len(), expected_lats.len(), "point counts differ");
        assert_eq!(expected_lats.len(), expected_lons.len(), "expected counts differ");
        for (i, (lat, lon)) in lats.iter().zip(lons.iter()).enumerate() {
            let (expected_lat, expected_lon) = (expected_lats[i], expected_lons[i]);
            if (lat - expected_lat).abs() > $epsilon || (lon - expected_lon).abs() > $epsilon {
                panic!(
                    "point {} differs: got ({}, {}), expected ({}, {})",
                    i, lat, lon, expected_lat, expected_lon
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_points_approx_eq_passes() {
        let (lats, lons) = lam_square();
        assert_points_approx_eq!((lats, lons), (lam_square().0, lam_square().1), 1e-12);
    }

    #[test]
    #[should_panic(expected = "point 2 differs")]
    fn test_assert_points_approx_eq_fails() {
        let (mut lats, lons) = lam_square();
        lats[2] += 0.01;
        assert_points_approx_eq!((lats, lons), (lam_square().0, lam_square().1), 1e-6);
    }
}
