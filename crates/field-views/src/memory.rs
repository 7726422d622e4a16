//! In-memory leaf dataset.

use chrono::{DateTime, Utc};
use ndarray::Array4;

use crate::dataset::Dataset;
use crate::error::{Result, ViewError};
use crate::index::Selection;
use crate::types::{Node, Shape, RANK, RECORD_AXIS, SPATIAL_AXIS, VARIABLE_AXIS};

/// A leaf dataset backed by an owned array.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    name: String,
    data: Array4<f32>,
    dates: Vec<DateTime<Utc>>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    variables: Vec<String>,
    resolution: Option<String>,
    grids: Vec<usize>,
}

impl MemoryDataset {
    /// Create a leaf; variables default to `var_0`, `var_1`, ...
    ///
    /// Fails when the dates or coordinates do not match the array's record
    /// and point axes.
    pub fn new(
        name: impl Into<String>,
        data: Array4<f32>,
        dates: Vec<DateTime<Utc>>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let dim = data.dim();
        let shape = [dim.0, dim.1, dim.2, dim.3];

        if dates.len() != shape[RECORD_AXIS] {
            return Err(ViewError::invalid_leaf(
                name,
                format!("{} dates for {} records", dates.len(), shape[RECORD_AXIS]),
            ));
        }
        if latitudes.len() != shape[SPATIAL_AXIS] || longitudes.len() != shape[SPATIAL_AXIS] {
            return Err(ViewError::invalid_leaf(
                name,
                format!(
                    "{} latitudes and {} longitudes for {} points",
                    latitudes.len(),
                    longitudes.len(),
                    shape[SPATIAL_AXIS]
                ),
            ));
        }

        let variables = (0..shape[VARIABLE_AXIS])
            .map(|i| format!("var_{}", i))
            .collect();

        Ok(Self {
            name,
            data,
            dates,
            latitudes,
            longitudes,
            variables,
            resolution: None,
            grids: vec![shape[SPATIAL_AXIS]],
        })
    }

    /// Name the variables.
    pub fn with_variables(mut self, variables: Vec<String>) -> Result<Self> {
        if variables.len() != self.data.dim().1 {
            return Err(ViewError::invalid_leaf(
                &self.name,
                format!(
                    "{} variable names for {} variables",
                    variables.len(),
                    self.data.dim().1
                ),
            ));
        }
        self.variables = variables;
        Ok(self)
    }

    /// Set the resolution label.
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    /// Declare the spatial axis as several sub-grids.
    pub fn with_grids(mut self, grids: Vec<usize>) -> Result<Self> {
        let total: usize = grids.iter().sum();
        if grids.is_empty() || total != self.data.dim().3 {
            return Err(ViewError::invalid_leaf(
                &self.name,
                format!("grids {:?} do not add up to {} points", grids, self.data.dim().3),
            ));
        }
        self.grids = grids;
        Ok(self)
    }

    /// Name of this leaf.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing array.
    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }
}

impl Dataset for MemoryDataset {
    fn shape(&self) -> Shape {
        let dim = self.data.dim();
        [dim.0, dim.1, dim.2, dim.3]
    }

    fn dates(&self) -> Vec<DateTime<Utc>> {
        self.dates.clone()
    }

    fn latitudes(&self) -> Vec<f64> {
        self.latitudes.clone()
    }

    fn longitudes(&self) -> Vec<f64> {
        self.longitudes.clone()
    }

    fn variables(&self) -> Vec<String> {
        self.variables.clone()
    }

    fn resolution(&self) -> Option<String> {
        self.resolution.clone()
    }

    fn grids(&self) -> Result<Vec<usize>> {
        Ok(self.grids.clone())
    }

    fn read(&self, selection: &Selection) -> Result<Array4<f32>> {
        let shape = self.shape();
        for axis in 0..RANK {
            if selection[axis].stop > shape[axis] {
                return Err(ViewError::OutOfRange {
                    axis,
                    index: selection[axis].stop as isize - 1,
                    length: shape[axis],
                    node: Some(self.tree().label()),
                });
            }
        }

        Ok(self
            .data
            .slice_each_axis(|ax| selection[ax.axis.index()].as_ndarray())
            .to_owned())
    }

    fn tree(&self) -> Node {
        Node::new("Memory", self.shape(), Vec::new()).with_detail(&self.name)
    }
}
