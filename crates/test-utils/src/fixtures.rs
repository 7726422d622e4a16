//! Common test fixtures for field-views tests.
//!
//! Coordinates are `(latitudes, longitudes)` pairs of flattened points.

/// The unit square `[0, 1] x [0, 1]` corners plus its centre: 5 points.
pub fn lam_square() -> (Vec<f64>, Vec<f64>) {
    (
        vec![0.0, 0.0, 1.0, 1.0, 0.5],
        vec![0.0, 1.0, 0.0, 1.0, 0.5],
    )
}

/// Ten global points; only the first two fall inside [`lam_square`].
pub fn globe_ten() -> (Vec<f64>, Vec<f64>) {
    (
        vec![0.25, 0.75, -60.0, -30.0, 0.0, 30.0, 60.0, 10.0, -10.0, 45.0],
        vec![0.25, 0.5, 0.0, 90.0, 180.0, -90.0, 45.0, 10.0, -10.0, -135.0],
    )
}

/// Longitudes of [`globe_ten`] kept by a cutout against [`lam_square`].
pub const GLOBE_TEN_RETAINED_LONS: [f64; 8] = [0.0, 90.0, 180.0, -90.0, 45.0, 10.0, -10.0, -135.0];

/// Record counts used for concatenation scenarios.
pub const CONCAT_LENGTHS: [usize; 3] = [3, 2, 4];
