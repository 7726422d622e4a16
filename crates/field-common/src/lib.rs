//! Common types shared by the field-views crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{CommonError, CommonResult};
pub use grid::GridSpec;
pub use time::{ForecastTime, TimeLayout};
