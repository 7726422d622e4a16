//! Error types for the shared field types.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised by grid and time helpers.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Invalid BBOX format: {0}. Expected 'min_lon,min_lat,max_lon,max_lat'")]
    InvalidBbox(String),

    #[error("Invalid grid specification: {0}")]
    InvalidGrid(String),

    #[error(
        "Unsupported time coordinates: {dates} date, {times} time and {steps} step coordinate(s)"
    )]
    UnsupportedTimeCoordinates {
        dates: usize,
        times: usize,
        steps: usize,
    },

    #[error("Missing {0} value for time layout")]
    MissingTimeValue(&'static str),

    /// A forecast step that is not a whole number of hours means the upstream
    /// source is broken; it is never rounded.
    #[error("Forecast step of {seconds}s is not a whole number of hours")]
    NonIntegralStep { seconds: i64 },

    #[error("Base date {given} does not match valid time minus step ({expected})")]
    InconsistentBaseTime { given: String, expected: String },
}
