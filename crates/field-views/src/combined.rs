//! Shared machinery for datasets built from several children.
//!
//! Every combinator holds a [`Combined`]: the ordered children, the join
//! axis and the memoized composed shape. Which compatibility rules apply is
//! chosen per combinator from the [`Check`] strategies.

use ndarray::{concatenate, Array4, Axis};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{Result, ViewError};
use crate::index::{selection_shape, split_along_lengths, update_axis, Selection};
use crate::types::{JoinAxis, Node, Shape, RANK, VARIABLE_AXIS};

/// A compatibility rule applied to every pair of consecutive children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Same length on every axis except the join axes.
    SubShapes,
    /// Same number of records.
    Lengths,
    /// Same record dates.
    Dates,
    /// Same point coordinates.
    Grid,
    /// Same resolution label.
    Resolution,
    /// Same variable names, in the same order.
    Variables,
    /// The first child has at least as many variables as the second.
    LamHasMoreVariables,
}

impl Check {
    /// Name of the attribute compared, used in error messages.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::SubShapes => "shape",
            Self::Lengths => "length",
            Self::Dates => "dates",
            Self::Grid => "grid",
            Self::Resolution => "resolution",
            Self::Variables => "variables",
            Self::LamHasMoreVariables => "variable count",
        }
    }

    /// Apply this rule to two consecutive children.
    pub fn apply(
        self,
        kind: &'static str,
        axis: &JoinAxis,
        d1: &dyn Dataset,
        d2: &dyn Dataset,
    ) -> Result<()> {
        let mismatch = |detail: String| {
            Err(ViewError::incompatible(
                kind,
                d1.tree().label(),
                d2.tree().label(),
                self.attribute(),
                detail,
            ))
        };

        match self {
            Self::SubShapes => {
                let (s1, s2) = (d1.shape(), d2.shape());
                for a in (0..RANK).filter(|a| !axis.contains(*a)) {
                    if s1[a] != s2[a] {
                        return mismatch(format!(
                            "{:?} and {:?} differ on axis {} (joining on axis {})",
                            s1, s2, a, axis
                        ));
                    }
                }
            }
            Self::Lengths => {
                if d1.len() != d2.len() {
                    return mismatch(format!("{} != {}", d1.len(), d2.len()));
                }
            }
            Self::Dates => {
                let (dates1, dates2) = (d1.dates(), d2.dates());
                if dates1 != dates2 {
                    let first = dates1
                        .iter()
                        .zip(&dates2)
                        .position(|(a, b)| a != b)
                        .unwrap_or_else(|| dates1.len().min(dates2.len()));
                    return mismatch(format!(
                        "{} and {} dates, first difference at record {}",
                        dates1.len(),
                        dates2.len(),
                        first
                    ));
                }
            }
            Self::Grid => {
                if d1.latitudes() != d2.latitudes() || d1.longitudes() != d2.longitudes() {
                    return mismatch("latitudes or longitudes differ".to_string());
                }
            }
            Self::Resolution => {
                let (r1, r2) = (d1.resolution(), d2.resolution());
                if r1 != r2 {
                    return mismatch(format!("{:?} != {:?}", r1, r2));
                }
            }
            Self::Variables => {
                let (v1, v2) = (d1.variables(), d2.variables());
                if v1 != v2 {
                    return mismatch(format!("{:?} != {:?}", v1, v2));
                }
            }
            Self::LamHasMoreVariables => {
                let (n1, n2) = (d1.shape()[VARIABLE_AXIS], d2.shape()[VARIABLE_AXIS]);
                if n1 < n2 {
                    return mismatch(format!(
                        "local domain has {} variables, global domain has {}",
                        n1, n2
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Ordered children plus the axis they are joined on.
#[derive(Debug)]
pub struct Combined {
    kind: &'static str,
    datasets: Vec<Box<dyn Dataset>>,
    axis: JoinAxis,
    shape: OnceCell<Shape>,
}

impl Combined {
    /// Take ownership of `datasets` after running `checks` on every
    /// consecutive pair.
    pub fn new(
        kind: &'static str,
        datasets: Vec<Box<dyn Dataset>>,
        axis: JoinAxis,
        checks: &[Check],
    ) -> Result<Self> {
        if datasets.is_empty() {
            return Err(ViewError::EmptyCombination { kind });
        }

        for pair in datasets.windows(2) {
            for check in checks {
                check.apply(kind, &axis, pair[0].as_ref(), pair[1].as_ref())?;
            }
        }

        Ok(Self {
            kind,
            datasets,
            axis,
            shape: OnceCell::new(),
        })
    }

    /// Kind of combinator, e.g. "Concat".
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The join axis.
    pub fn axis(&self) -> JoinAxis {
        self.axis
    }

    /// Children, in order.
    pub fn datasets(&self) -> &[Box<dyn Dataset>] {
        &self.datasets
    }

    /// First child; construction guarantees there is one.
    pub fn first(&self) -> &dyn Dataset {
        self.datasets[0].as_ref()
    }

    /// Composed shape, computed by `compute` on first access.
    pub fn memo_shape(&self, compute: impl FnOnce() -> Shape) -> Shape {
        *self.shape.get_or_init(compute)
    }

    /// Tree node of this combinator with its children's trees.
    pub fn tree(&self, shape: Shape) -> Node {
        Node::new(
            self.kind,
            shape,
            self.datasets.iter().map(|d| d.tree()).collect(),
        )
    }

    /// Log the finished combinator.
    pub fn log_built(&self, shape: Shape) {
        info!(
            kind = self.kind,
            children = self.datasets.len(),
            axis = %self.axis,
            shape = ?shape,
            "Built combined dataset"
        );
    }

    /// Read `selection` by splitting `axis` over the children and joining
    /// the pieces back along it.
    pub fn read_along(&self, axis: usize, selection: &Selection) -> Result<Array4<f32>> {
        let lengths: Vec<usize> = self.datasets.iter().map(|d| d.shape()[axis]).collect();
        let parts = split_along_lengths(&selection[axis], &lengths);

        debug!(
            kind = self.kind,
            axis,
            span = %selection[axis],
            parts = ?parts,
            "Splitting read across children"
        );

        let mut pieces = Vec::new();
        for (dataset, part) in self.datasets.iter().zip(parts) {
            if let Some(span) = part {
                pieces.push(dataset.read(&update_axis(selection, axis, span))?);
            }
        }

        match pieces.len() {
            0 => {
                let shape = selection_shape(selection);
                Ok(Array4::zeros((shape[0], shape[1], shape[2], shape[3])))
            }
            1 => Ok(pieces.remove(0)),
            _ => {
                let views: Vec<_> = pieces.iter().map(|p| p.view()).collect();
                Ok(concatenate(Axis(axis), &views)?)
            }
        }
    }
}

/// Check that a combinator got exactly `expected` children.
pub fn require_children(
    kind: &'static str,
    datasets: &[Box<dyn Dataset>],
    expected: usize,
) -> Result<()> {
    if datasets.len() != expected {
        return Err(ViewError::ChildCount {
            kind,
            expected,
            actual: datasets.len(),
        });
    }
    Ok(())
}

/// Check that a combinator is joined on the axis it supports.
pub fn require_axis(kind: &'static str, expected: JoinAxis, actual: JoinAxis) -> Result<()> {
    if expected != actual {
        return Err(ViewError::AxisMismatch {
            kind,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}
