//! Construction entry points for combined datasets.
//!
//! Callers hand over already opened datasets plus keyword options, as they
//! appear in a dataset description:
//!
//! ```yaml
//! cutout:
//!   - lam-2.5km
//!   - era5-o96
//! mask:
//!   footprint: convex_hull
//!   buffer_degrees: 0.1
//! start: 2020
//! ```
//!
//! Options this crate understands (`axis`, `mask`, `ensemble`) are consumed;
//! everything else is handed back untouched in [`Opened::subset`] so the
//! caller can apply its own subsetting to the built node.
//!
//! # Example
//!
//! ```rust,ignore
//! use field_views::{Combination, CombineOptions};
//!
//! let options: CombineOptions = serde_yaml::from_str("start: 2020")?;
//! let opened = Combination::Concat.open(datasets, options)?;
//! println!("{}", opened.dataset.tree());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::concat::Concat;
use crate::config::MaskConfig;
use crate::cutout::Cutout;
use crate::dataset::Dataset;
use crate::error::{Result, ViewError};
use crate::grids::Grids;
use crate::multienc::MultiEncCutout;
use crate::types::{JoinAxis, RECORD_AXIS, SPATIAL_AXIS, VARIABLE_AXIS};

/// Keyword options accepted when building a combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineOptions {
    /// Join axis; each combination has its own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<JoinAxis>,

    /// Ensemble request; only its presence matters here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<serde_json::Value>,

    /// Cutout mask settings; defaults come from the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<MaskConfig>,

    /// Remaining options, applied by the caller after construction.
    #[serde(flatten)]
    pub subset: BTreeMap<String, serde_json::Value>,
}

/// A built combination plus the options left for the caller.
#[derive(Debug)]
pub struct Opened {
    pub dataset: Box<dyn Dataset>,
    pub subset: BTreeMap<String, serde_json::Value>,
}

/// The kinds of combination this crate builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combination {
    Concat,
    Grids,
    Cutout,
    MultiEncCutout,
}

impl Combination {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "concat" | "join" => Some(Self::Concat),
            "grids" => Some(Self::Grids),
            "cutout" => Some(Self::Cutout),
            "multienccutout" => Some(Self::MultiEncCutout),
            _ => None,
        }
    }

    /// Get the combination name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concat => "concat",
            Self::Grids => "grids",
            Self::Cutout => "cutout",
            Self::MultiEncCutout => "multienccutout",
        }
    }

    /// Join axis used when none is given.
    pub fn default_axis(&self) -> JoinAxis {
        match self {
            Self::Concat => JoinAxis::Single(RECORD_AXIS),
            Self::Grids | Self::Cutout => JoinAxis::Single(SPATIAL_AXIS),
            Self::MultiEncCutout => JoinAxis::Pair([VARIABLE_AXIS, SPATIAL_AXIS]),
        }
    }

    /// Build this combination from opened datasets.
    pub fn open(&self, datasets: Vec<Box<dyn Dataset>>, options: CombineOptions) -> Result<Opened> {
        match self {
            Self::Concat => concat_factory(datasets, options),
            Self::Grids => grids_factory(datasets, options),
            Self::Cutout => cutout_factory(datasets, options),
            Self::MultiEncCutout => multienccutout_factory(datasets, options),
        }
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build a [`Concat`] along the record axis.
pub fn concat_factory(datasets: Vec<Box<dyn Dataset>>, options: CombineOptions) -> Result<Opened> {
    let combination = Combination::Concat;
    let (axis, mask, subset) = take_options(combination, options)?;
    if axis != combination.default_axis() {
        return Err(ViewError::AxisMismatch {
            kind: "Concat",
            expected: combination.default_axis().to_string(),
            actual: axis.to_string(),
        });
    }
    ignore_mask(combination, mask);

    Ok(Opened {
        dataset: Box::new(Concat::new(datasets)?),
        subset,
    })
}

/// Build a [`Grids`] along the spatial axis.
pub fn grids_factory(datasets: Vec<Box<dyn Dataset>>, options: CombineOptions) -> Result<Opened> {
    let combination = Combination::Grids;
    let (axis, mask, subset) = take_options(combination, options)?;
    ignore_mask(combination, mask);

    Ok(Opened {
        dataset: Box::new(Grids::new(datasets, axis)?),
        subset,
    })
}

/// Build a [`Cutout`] of a local domain into a global one.
pub fn cutout_factory(datasets: Vec<Box<dyn Dataset>>, options: CombineOptions) -> Result<Opened> {
    let (axis, mask, subset) = take_options(Combination::Cutout, options)?;
    let mask = mask_config(mask)?;

    Ok(Opened {
        dataset: Box::new(Cutout::new(datasets, axis, &mask)?),
        subset,
    })
}

/// Build a [`MultiEncCutout`] of a local domain into a global one.
pub fn multienccutout_factory(
    datasets: Vec<Box<dyn Dataset>>,
    options: CombineOptions,
) -> Result<Opened> {
    let (axis, mask, subset) = take_options(Combination::MultiEncCutout, options)?;
    let mask = mask_config(mask)?;

    Ok(Opened {
        dataset: Box::new(MultiEncCutout::new(datasets, axis, &mask)?),
        subset,
    })
}

type TakenOptions = (JoinAxis, Option<MaskConfig>, BTreeMap<String, serde_json::Value>);

/// Split options into what construction consumes and what the caller keeps.
fn take_options(combination: Combination, options: CombineOptions) -> Result<TakenOptions> {
    if options.ensemble.is_some() && combination != Combination::Concat {
        return Err(ViewError::ExclusiveOptions {
            first: "ensemble".to_string(),
            second: combination.to_string(),
        });
    }
    if options.ensemble.is_some() {
        return Err(ViewError::NotImplemented(
            "ensemble combinations are not supported".to_string(),
        ));
    }

    let axis = options.axis.unwrap_or_else(|| combination.default_axis());
    Ok((axis, options.mask, options.subset))
}

fn mask_config(mask: Option<MaskConfig>) -> Result<MaskConfig> {
    let mask = mask.unwrap_or_else(MaskConfig::from_env);
    mask.validate().map_err(ViewError::InvalidConfig)?;
    Ok(mask)
}

fn ignore_mask(combination: Combination, mask: Option<MaskConfig>) {
    if mask.is_some() {
        warn!(
            combination = %combination,
            "Ignoring 'mask' option; it only applies to cutouts"
        );
    }
}
