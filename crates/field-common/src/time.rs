//! Forecast time metadata for meteorological records.
//!
//! A record's valid time is turned into the `date`/`time`/`step` triple that
//! forecast archives use. Which formula applies depends on the time
//! coordinates the source carries, see [`TimeLayout::from_coordinates`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{CommonError, CommonResult};

/// Base date, base time and step of a forecast record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastTime {
    /// Base date as `YYYYMMDD`
    pub date: String,
    /// Base time as `HHMM`
    pub time: String,
    /// Forecast step in whole hours
    pub step: i64,
}

impl ForecastTime {
    fn from_base(base: DateTime<Utc>, step: i64) -> Self {
        Self {
            date: base.format("%Y%m%d").to_string(),
            time: base.format("%H%M").to_string(),
            step,
        }
    }
}

/// How forecast metadata is derived from a source's time coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeLayout {
    /// No time coordinate at all; records carry no forecast metadata.
    Constant,
    /// Only a valid time: every record is an analysis (step 0).
    Analysis,
    /// Valid time and step; the base time is `valid - step`.
    ForecastFromValidTimeAndStep {
        /// A base date coordinate is also present and must agree.
        check_base: bool,
    },
    /// Valid time and a fixed base date.
    ForecastFromValidTimeAndBaseTime,
    /// Base date and step; the record's time is the base itself.
    ForecastFromBaseTimeAndStep,
}

impl TimeLayout {
    /// Pick the layout for a source with the given number of date, time and step coordinates.
    pub fn from_coordinates(dates: usize, times: usize, steps: usize) -> CommonResult<Self> {
        let layout = match (dates, times, steps) {
            (0, 1, 1) => Self::ForecastFromValidTimeAndStep { check_base: false },
            (0, 1, 0) => Self::Analysis,
            (0, 0, 0) => Self::Constant,
            (1, 1, 0) => Self::ForecastFromValidTimeAndBaseTime,
            (1, 0, 1) => Self::ForecastFromBaseTimeAndStep,
            (1, 1, 1) => Self::ForecastFromValidTimeAndStep { check_base: true },
            _ => {
                error!(dates, times, steps, "Unsupported combination of time coordinates");
                return Err(CommonError::UnsupportedTimeCoordinates {
                    dates,
                    times,
                    steps,
                });
            }
        };
        Ok(layout)
    }

    /// Derive the forecast metadata of one record.
    ///
    /// `time` is the record's time value, `step` its forecast step and `base`
    /// the base date coordinate, each only consulted by the layouts that use it.
    pub fn fill(
        &self,
        time: DateTime<Utc>,
        step: Option<Duration>,
        base: Option<DateTime<Utc>>,
    ) -> CommonResult<Option<ForecastTime>> {
        match *self {
            Self::Constant => Ok(None),
            Self::Analysis => Ok(Some(ForecastTime::from_base(time, 0))),
            Self::ForecastFromValidTimeAndStep { check_base } => {
                let step = step.ok_or(CommonError::MissingTimeValue("step"))?;
                let hours = whole_hours(step)?;
                let computed = time - step;

                if check_base {
                    let given = base.ok_or(CommonError::MissingTimeValue("date"))?;
                    if given != computed {
                        return Err(CommonError::InconsistentBaseTime {
                            given: given.to_rfc3339(),
                            expected: computed.to_rfc3339(),
                        });
                    }
                }

                Ok(Some(ForecastTime::from_base(computed, hours)))
            }
            Self::ForecastFromValidTimeAndBaseTime => {
                let base = base.ok_or(CommonError::MissingTimeValue("date"))?;
                let hours = whole_hours(time - base)?;
                Ok(Some(ForecastTime::from_base(base, hours)))
            }
            Self::ForecastFromBaseTimeAndStep => {
                let step = step.ok_or(CommonError::MissingTimeValue("step"))?;
                let hours = whole_hours(step)?;
                Ok(Some(ForecastTime::from_base(time, hours)))
            }
        }
    }
}

fn whole_hours(step: Duration) -> CommonResult<i64> {
    let seconds = step.num_seconds();
    if step.num_milliseconds() % 3_600_000 != 0 {
        return Err(CommonError::NonIntegralStep { seconds });
    }
    Ok(seconds / 3600)
}
