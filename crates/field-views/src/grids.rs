//! Concatenation of different grids along the spatial axis.

use chrono::{DateTime, Utc};
use ndarray::Array4;

use crate::combined::{require_axis, Check, Combined};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::index::Selection;
use crate::types::{JoinAxis, Node, Shape, SPATIAL_AXIS};

const KIND: &str = "Grids";

/// Children joined end to end along the spatial axis.
///
/// Each child is already flat in space. The children must share records,
/// dates and variables but may sit on entirely different grids.
#[derive(Debug)]
pub struct Grids {
    combined: Combined,
}

impl Grids {
    /// Join `datasets` along `axis`, which must be the spatial axis.
    pub fn new(datasets: Vec<Box<dyn Dataset>>, axis: JoinAxis) -> Result<Self> {
        require_axis(KIND, JoinAxis::Single(SPATIAL_AXIS), axis)?;
        let combined = Combined::new(
            KIND,
            datasets,
            axis,
            &[Check::SubShapes, Check::Lengths, Check::Dates, Check::Variables],
        )?;
        let grids = Self { combined };
        grids.combined.log_built(grids.shape());
        Ok(grids)
    }

    /// Children, in order.
    pub fn datasets(&self) -> &[Box<dyn Dataset>] {
        self.combined.datasets()
    }
}

impl Dataset for Grids {
    fn shape(&self) -> Shape {
        self.combined.memo_shape(|| {
            let mut shape = self.combined.first().shape();
            shape[SPATIAL_AXIS] = self
                .datasets()
                .iter()
                .map(|d| d.shape()[SPATIAL_AXIS])
                .sum();
            shape
        })
    }

    fn dates(&self) -> Vec<DateTime<Utc>> {
        self.combined.first().dates()
    }

    fn latitudes(&self) -> Vec<f64> {
        self.datasets().iter().flat_map(|d| d.latitudes()).collect()
    }

    fn longitudes(&self) -> Vec<f64> {
        self.datasets().iter().flat_map(|d| d.longitudes()).collect()
    }

    fn variables(&self) -> Vec<String> {
        self.combined.first().variables()
    }

    /// The shared resolution, if every child reports the same one.
    fn resolution(&self) -> Option<String> {
        let first = self.combined.first().resolution();
        self.datasets()
            .iter()
            .all(|d| d.resolution() == first)
            .then_some(first)
            .flatten()
    }

    fn grids(&self) -> Result<Vec<usize>> {
        let mut grids = Vec::new();
        for dataset in self.datasets() {
            grids.extend(dataset.grids()?);
        }
        Ok(grids)
    }

    fn read(&self, selection: &Selection) -> Result<Array4<f32>> {
        self.combined.read_along(SPATIAL_AXIS, selection)
    }

    fn tree(&self) -> Node {
        self.combined.tree(self.shape()).with_detail("concat")
    }
}
