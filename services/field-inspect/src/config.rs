//! Configuration loading for field-inspect.
//!
//! A description names synthetic leaf datasets and one combination request:
//!
//! ```yaml
//! datasets:
//!   lam:
//!     bbox: "0,40,10,50"
//!     resolution: 0.5
//!     start: 2024-01-01T00:00:00Z
//!     records: 4
//!     variables: [t2m, msl, u10, v10]
//!   globe:
//!     bbox: "-180,-90,170,90"
//!     resolution: ${GLOBE_RES:-10}
//!     start: 2024-01-01T00:00:00Z
//!     records: 4
//!     variables: [t2m, msl]
//!
//! combine:
//!   multienccutout: [lam, globe]
//!   mask:
//!     buffer_degrees: 0.25
//!
//! forecast:
//!   step_hours: 6
//! ```
//!
//! A combination's children are either dataset names or nested combination
//! requests. Supports environment variable substitution using ${VAR} syntax.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, info, warn};

use field_common::{BoundingBox, GridSpec, TimeLayout};
use field_views::{Combination, CombineOptions, Dataset, MemoryDataset};

/// Root configuration loaded from a description file.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectConfig {
    pub datasets: BTreeMap<String, LeafConfig>,
    pub combine: Value,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

/// A synthetic leaf dataset on a regular lat/lon grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafConfig {
    /// Area covered, as "min_lon,min_lat,max_lon,max_lat".
    pub bbox: String,
    /// Grid spacing in degrees.
    pub resolution: f64,
    /// Valid time of the first record.
    pub start: DateTime<Utc>,
    /// Number of records.
    pub records: usize,
    #[serde(default = "default_frequency_hours")]
    pub frequency_hours: i64,
    /// Variable names; a single `var_0` when empty.
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default = "default_members")]
    pub members: usize,
    /// Added to every value, to tell leaves apart in the output.
    #[serde(default)]
    pub offset: f32,
}

fn default_frequency_hours() -> i64 {
    6
}

fn default_members() -> usize {
    1
}

/// Which forecast time coordinates the records carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// No time coordinates at all.
    pub constant: bool,
    /// Forecast step of every record, in hours.
    pub step_hours: Option<i64>,
    /// Base date shared by every record.
    pub base: Option<DateTime<Utc>>,
}

impl ForecastConfig {
    /// Layout matching the configured coordinates.
    pub fn layout(&self) -> Result<TimeLayout> {
        let (dates, times, steps) = if self.constant {
            (0, 0, 0)
        } else {
            (
                usize::from(self.base.is_some()),
                1,
                usize::from(self.step_hours.is_some()),
            )
        };
        Ok(TimeLayout::from_coordinates(dates, times, steps)?)
    }

    pub fn step(&self) -> Option<Duration> {
        self.step_hours.map(Duration::hours)
    }
}

/// Load and validate a description file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<InspectConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;

    let expanded = shellexpand::env(&content)
        .with_context(|| format!("Failed to expand environment variables in {:?}", path.as_ref()))?;

    let config: InspectConfig = serde_yaml::from_str(&expanded)
        .with_context(|| format!("Failed to parse config YAML from {:?}", path.as_ref()))?;

    validate_config(&config)?;
    info!(
        path = ?path.as_ref(),
        datasets = config.datasets.len(),
        "Loaded description"
    );
    Ok(config)
}

fn validate_config(config: &InspectConfig) -> Result<()> {
    anyhow::ensure!(!config.datasets.is_empty(), "No datasets defined");

    for (name, leaf) in &config.datasets {
        anyhow::ensure!(
            leaf.resolution > 0.0,
            "Dataset {}: resolution must be > 0",
            name
        );
        anyhow::ensure!(leaf.records > 0, "Dataset {}: records must be > 0", name);
        anyhow::ensure!(
            leaf.frequency_hours > 0,
            "Dataset {}: frequency_hours must be > 0",
            name
        );
        anyhow::ensure!(leaf.members > 0, "Dataset {}: members must be > 0", name);

        let mut seen = HashSet::new();
        for variable in &leaf.variables {
            anyhow::ensure!(
                seen.insert(variable),
                "Dataset {}: duplicate variable {}",
                name,
                variable
            );
        }
    }

    anyhow::ensure!(
        config.combine.is_mapping() || config.combine.is_string(),
        "'combine' must be a dataset name or a mapping with one combination key"
    );

    Ok(())
}

impl LeafConfig {
    /// Build the in-memory dataset.
    ///
    /// Values are `offset + 100 * record + 10 * variable + member` plus a
    /// smooth latitude term, so the output is easy to read back.
    pub fn build(&self, name: &str) -> Result<MemoryDataset> {
        let bbox = BoundingBox::from_csv(&self.bbox)
            .with_context(|| format!("Dataset {}: bad bbox", name))?;
        let grid = GridSpec::covering(&bbox, self.resolution)
            .with_context(|| format!("Dataset {}: bad grid", name))?;

        let latitudes = grid.latitudes();
        let longitudes = grid.longitudes();
        let variables = if self.variables.is_empty() {
            vec!["var_0".to_string()]
        } else {
            self.variables.clone()
        };

        let shape = (self.records, variables.len(), self.members, grid.len());
        let data = Array4::from_shape_fn(shape, |(r, v, m, p)| {
            let smooth = latitudes[p].to_radians().cos() as f32;
            self.offset + (100 * r + 10 * v + m) as f32 + smooth
        });
        let dates = (0..self.records)
            .map(|i| self.start + Duration::hours(i as i64 * self.frequency_hours))
            .collect();

        let dataset = MemoryDataset::new(name, data, dates, latitudes, longitudes)?
            .with_variables(variables)?
            .with_resolution(grid.resolution_label());

        debug!(
            name,
            nx = grid.nx,
            ny = grid.ny,
            records = self.records,
            "Built synthetic dataset"
        );
        Ok(dataset)
    }
}

/// Build the dataset tree described by `request`.
///
/// Returns the root plus the options left for subsetting.
pub fn build_request(
    request: &Value,
    leaves: &BTreeMap<String, LeafConfig>,
) -> Result<(Box<dyn Dataset>, BTreeMap<String, serde_json::Value>)> {
    match request {
        Value::String(name) => {
            let leaf = leaves
                .get(name)
                .with_context(|| format!("Unknown dataset '{}'", name))?;
            Ok((Box::new(leaf.build(name)?), BTreeMap::new()))
        }
        Value::Mapping(mapping) => {
            let mut combination: Option<(Combination, &Value)> = None;
            let mut options = serde_yaml::Mapping::new();

            for (key, value) in mapping {
                match key.as_str().and_then(Combination::from_str) {
                    Some(kind) => {
                        if let Some((first, _)) = combination {
                            anyhow::bail!("Cannot combine with both '{}' and '{}'", first, kind);
                        }
                        combination = Some((kind, value));
                    }
                    None => {
                        options.insert(key.clone(), value.clone());
                    }
                }
            }

            let (kind, children) =
                combination.context("No combination key (concat, grids, cutout, multienccutout)")?;
            let children = children
                .as_sequence()
                .with_context(|| format!("'{}' expects a list of datasets", kind))?;

            let datasets = children
                .iter()
                .map(|child| {
                    let (dataset, subset) = build_request(child, leaves)?;
                    if !subset.is_empty() {
                        warn!(
                            options = ?subset.keys().collect::<Vec<_>>(),
                            "Ignoring subset options on a nested combination"
                        );
                    }
                    Ok(dataset)
                })
                .collect::<Result<Vec<_>>>()?;

            let options: CombineOptions = serde_yaml::from_value(Value::Mapping(options))
                .with_context(|| format!("Invalid options for '{}'", kind))?;

            let opened = kind.open(datasets, options)?;
            Ok((opened.dataset, opened.subset))
        }
        other => anyhow::bail!("Expected a dataset name or a combination, got {:?}", other),
    }
}
