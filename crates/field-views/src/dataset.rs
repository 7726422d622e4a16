//! The dataset capability shared by leaves and combinators.

use std::fmt;

use chrono::{DateTime, Utc};
use ndarray::{Array4, ArrayD};

use crate::error::Result;
use crate::index::{decompose, reapply, Index, Selection};
use crate::types::{Node, Shape, RECORD_AXIS, SPATIAL_AXIS};

/// A read-only, four-dimensional gridded dataset.
///
/// Axes are always (record, variable, ensemble member, spatial point). Leaves
/// wrap data owned elsewhere; combinators own their children and compose
/// them lazily, only touching data when [`Dataset::read`] is called.
///
/// Implementations are immutable after construction, so a tree can be read
/// from several threads at once.
pub trait Dataset: Send + Sync + fmt::Debug {
    /// Shape in axis order.
    fn shape(&self) -> Shape;

    /// Number of records.
    fn len(&self) -> usize {
        self.shape()[RECORD_AXIS]
    }

    /// Check if the dataset has no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Valid time of every record, in record order.
    fn dates(&self) -> Vec<DateTime<Utc>>;

    /// Latitude of every spatial point.
    fn latitudes(&self) -> Vec<f64>;

    /// Longitude of every spatial point.
    fn longitudes(&self) -> Vec<f64>;

    /// Variable names, in variable-axis order.
    fn variables(&self) -> Vec<String>;

    /// Resolution label, when known (e.g. "0.25", "o96").
    fn resolution(&self) -> Option<String> {
        None
    }

    /// Point counts of the sub-grids making up the spatial axis.
    fn grids(&self) -> Result<Vec<usize>> {
        Ok(vec![self.shape()[SPATIAL_AXIS]])
    }

    /// Read the elements covered by `selection`, keeping all four axes.
    fn read(&self, selection: &Selection) -> Result<Array4<f32>>;

    /// Descriptive tree of this dataset and its children.
    fn tree(&self) -> Node;

    /// Read with a caller-facing index: integer axes are dropped and list
    /// axes re-selected in the given order.
    fn get(&self, index: &Index) -> Result<ArrayD<f32>> {
        get_selected(self, index)
    }
}

/// Decompose `index`, read the covering selection, then reapply the changes.
///
/// Indexing errors are labelled with the dataset they were raised on.
pub fn get_selected<D: Dataset + ?Sized>(dataset: &D, index: &Index) -> Result<ArrayD<f32>> {
    let (selection, changes) =
        decompose(index, &dataset.shape()).map_err(|e| e.at_node(|| dataset.tree().label()))?;
    let merged = dataset.read(&selection)?;
    reapply(merged, &changes)
}
