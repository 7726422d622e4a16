//! Test data generators for creating synthetic datasets.
//!
//! These generators create predictable, verifiable values so a test can
//! tell from a single number where in a composed dataset it came from.

use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::Array4;

/// Creates an array whose values encode their own position.
///
/// Each value is calculated as:
/// `offset + record * 1_000_000 + variable * 10_000 + member * 1_000 + point`
///
/// Keep points below 1000 and variables below 100 for the encoding to stay
/// unambiguous. Use a distinct `offset` per dataset (e.g. `0.5`) to tell
/// datasets apart after they are combined.
///
/// # Example
///
/// ```
/// use test_utils::encoded_array;
///
/// let data = encoded_array((2, 3, 1, 4), 0.0);
/// assert_eq!(data[[1, 2, 0, 3]], 1_020_003.0);
/// ```
pub fn encoded_array(shape: (usize, usize, usize, usize), offset: f32) -> Array4<f32> {
    Array4::from_shape_fn(shape, |(r, v, e, p)| offset + encode(r, v, e, p))
}

/// The value [`encoded_array`] stores at a position, without offset.
pub fn encode(record: usize, variable: usize, member: usize, point: usize) -> f32 {
    (record * 1_000_000 + variable * 10_000 + member * 1_000 + point) as f32
}

/// Creates `count` dates starting at `start`, `step_hours` apart.
pub fn hourly_dates(start: DateTime<Utc>, count: usize, step_hours: i64) -> Vec<DateTime<Utc>> {
    (0..count)
        .map(|i| start + Duration::hours(i as i64 * step_hours))
        .collect()
}

/// Midnight UTC on the given day.
pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day}"))
}

/// Creates `count` evenly spaced values starting at `start`.
pub fn line(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Creates flattened (latitudes, longitudes) of a regular grid, row-major
/// from the first latitude.
pub fn grid_points(lats: &[f64], lons: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut out_lats = Vec::with_capacity(lats.len() * lons.len());
    let mut out_lons = Vec::with_capacity(lats.len() * lons.len());
    for &lat in lats {
        for &lon in lons {
            out_lats.push(lat);
            out_lons.push(lon);
        }
    }
    (out_lats, out_lons)
}
