//! Fusion of a local domain into a global one.
//!
//! ```text
//!   lam points          globe points (masked)
//! ┌─────────────┐   ┌───────────────────────────┐
//! │ l0 l1 .. ln │ + │ g0 ▒▒ ▒▒ g3 g4 .. gm      │   ▒▒ = inside lam, dropped
//! └─────────────┘   └───────────────────────────┘
//!          └──────── composed spatial axis ───────┘
//!          [ l0 l1 .. ln | g0 g3 g4 .. gm ]
//! ```
//!
//! Local points always come first, followed by the retained global points
//! in their original order.

use chrono::{DateTime, Utc};
use ndarray::{concatenate, Array4, ArrayD, Axis};
use tracing::debug;

use crate::combined::{require_axis, require_children, Check, Combined};
use crate::config::MaskConfig;
use crate::dataset::{get_selected, Dataset};
use crate::error::{Result, ViewError};
use crate::index::{decompose, update_axis, Index, Selection, Span};
use crate::mask::cutout_mask;
use crate::types::{JoinAxis, Node, Shape, SPATIAL_AXIS};

const KIND: &str = "Cutout";

/// The cutout mask over the global child's points, with the retained positions.
#[derive(Debug, Clone)]
pub(crate) struct CutoutMask {
    mask: Vec<bool>,
    retained: Vec<usize>,
}

impl CutoutMask {
    /// Compute the mask of `globe` against `lam`'s footprint.
    pub(crate) fn compute(lam: &dyn Dataset, globe: &dyn Dataset, config: &MaskConfig) -> Result<Self> {
        let mask = cutout_mask(
            &lam.latitudes(),
            &lam.longitudes(),
            &globe.latitudes(),
            &globe.longitudes(),
            config,
        )?;

        let points = globe.shape()[SPATIAL_AXIS];
        if mask.len() != points {
            return Err(ViewError::Mask(format!(
                "mask has {} entries for {} global points",
                mask.len(),
                points
            )));
        }

        let retained = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();

        Ok(Self { mask, retained })
    }

    pub(crate) fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub(crate) fn retained(&self) -> &[usize] {
        &self.retained
    }

    /// Grid sizes of a cutout: the local points, then the retained global points.
    ///
    /// Cutting out of a child that is itself made of several grids is not supported.
    pub(crate) fn grids(
        &self,
        kind: &'static str,
        lam: &dyn Dataset,
        globe: &dyn Dataset,
    ) -> Result<Vec<usize>> {
        for dataset in [lam, globe] {
            if dataset.grids()?.len() > 1 {
                return Err(ViewError::NotImplemented(format!(
                    "{} of a multi-grid dataset: {}",
                    kind,
                    dataset.tree().label()
                )));
            }
        }
        Ok(vec![lam.shape()[SPATIAL_AXIS], self.retained.len()])
    }

    /// Keep only retained entries of `values`.
    pub(crate) fn filter<T: Copy>(&self, values: &[T]) -> Vec<T> {
        self.retained.iter().map(|&i| values[i]).collect()
    }

    /// Keep only retained points of a global read.
    pub(crate) fn apply(&self, globe: &Array4<f32>) -> Array4<f32> {
        globe.select(Axis(SPATIAL_AXIS), &self.retained)
    }
}

/// Reject indices that select part of a cutout's spatial axis.
pub(crate) fn require_whole_space(
    kind: &'static str,
    index: &Index,
    shape: &Shape,
    tree: impl FnOnce() -> Node,
) -> Result<()> {
    let (selection, changes) = match decompose(index, shape) {
        Ok(parts) => parts,
        Err(e) => return Err(e.at_node(|| tree().label())),
    };
    let whole = selection[SPATIAL_AXIS].is_full(shape[SPATIAL_AXIS])
        && changes.taken(SPATIAL_AXIS).is_none()
        && !changes.squeezed().contains(&SPATIAL_AXIS);

    if !whole {
        return Err(ViewError::SpatialSubset {
            kind,
            index: index.to_string(),
            tree: tree().to_string(),
        });
    }
    Ok(())
}

/// Same check on an already decomposed selection.
pub(crate) fn require_whole_span(
    kind: &'static str,
    selection: &Selection,
    shape: &Shape,
    tree: impl FnOnce() -> Node,
) -> Result<()> {
    if !selection[SPATIAL_AXIS].is_full(shape[SPATIAL_AXIS]) {
        return Err(ViewError::SpatialSubset {
            kind,
            index: selection[SPATIAL_AXIS].to_string(),
            tree: tree().to_string(),
        });
    }
    Ok(())
}

/// A local domain (`lam`) fused into a global domain (`globe`) on the spatial axis.
#[derive(Debug)]
pub struct Cutout {
    combined: Combined,
    mask: CutoutMask,
}

impl Cutout {
    /// Fuse exactly two children, local first, along the spatial axis.
    pub fn new(datasets: Vec<Box<dyn Dataset>>, axis: JoinAxis, config: &MaskConfig) -> Result<Self> {
        require_children(KIND, &datasets, 2)?;
        require_axis(KIND, JoinAxis::Single(SPATIAL_AXIS), axis)?;

        let combined = Combined::new(
            KIND,
            datasets,
            axis,
            &[Check::SubShapes, Check::Lengths, Check::Dates, Check::Variables],
        )?;
        let mask = CutoutMask::compute(
            combined.datasets()[0].as_ref(),
            combined.datasets()[1].as_ref(),
            config,
        )?;

        let cutout = Self { combined, mask };
        cutout.combined.log_built(cutout.shape());
        Ok(cutout)
    }

    /// The local, higher-priority child.
    pub fn lam(&self) -> &dyn Dataset {
        self.combined.datasets()[0].as_ref()
    }

    /// The global child.
    pub fn globe(&self) -> &dyn Dataset {
        self.combined.datasets()[1].as_ref()
    }

    /// One entry per global point; `true` where the point is retained.
    pub fn mask(&self) -> &[bool] {
        self.mask.mask()
    }
}

impl Dataset for Cutout {
    fn shape(&self) -> Shape {
        self.combined.memo_shape(|| {
            let mut shape = self.lam().shape();
            shape[SPATIAL_AXIS] += self.mask.retained().len();
            shape
        })
    }

    fn dates(&self) -> Vec<DateTime<Utc>> {
        self.lam().dates()
    }

    fn latitudes(&self) -> Vec<f64> {
        let mut latitudes = self.lam().latitudes();
        latitudes.extend(self.mask.filter(&self.globe().latitudes()));
        latitudes
    }

    fn longitudes(&self) -> Vec<f64> {
        let mut longitudes = self.lam().longitudes();
        longitudes.extend(self.mask.filter(&self.globe().longitudes()));
        longitudes
    }

    fn variables(&self) -> Vec<String> {
        self.lam().variables()
    }

    fn resolution(&self) -> Option<String> {
        self.lam().resolution()
    }

    fn grids(&self) -> Result<Vec<usize>> {
        self.mask.grids(KIND, self.lam(), self.globe())
    }

    fn read(&self, selection: &Selection) -> Result<Array4<f32>> {
        require_whole_span(KIND, selection, &self.shape(), || self.tree())?;

        let lam_points = self.lam().shape()[SPATIAL_AXIS];
        let globe_points = self.globe().shape()[SPATIAL_AXIS];

        let lam = self
            .lam()
            .read(&update_axis(selection, SPATIAL_AXIS, Span::full(lam_points)))?;
        let globe = self
            .globe()
            .read(&update_axis(selection, SPATIAL_AXIS, Span::full(globe_points)))?;
        let globe = self.mask.apply(&globe);

        debug!(
            kind = KIND,
            lam = ?lam.dim(),
            globe = ?globe.dim(),
            "Fusing local and global reads"
        );

        Ok(concatenate(Axis(SPATIAL_AXIS), &[lam.view(), globe.view()])?)
    }

    fn tree(&self) -> Node {
        self.combined.tree(self.shape())
    }

    fn get(&self, index: &Index) -> Result<ArrayD<f32>> {
        require_whole_space(KIND, index, &self.shape(), || self.tree())?;
        get_selected(self, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FootprintMethod;
    use crate::index::{DimIndex, Slice};
    use crate::memory::MemoryDataset;
    use chrono::TimeZone;
    use ndarray::Array;

    fn dataset(name: &str, lats: Vec<f64>, lons: Vec<f64>, offset: f32) -> Box<dyn Dataset> {
        let points = lats.len();
        let data = Array::from_shape_fn((2, 1, 1, points), |(r, _, _, p)| {
            offset + (r * 100 + p) as f32
        });
        let dates = (0..2)
            .map(|h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap())
            .collect();
        Box::new(MemoryDataset::new(name, data, dates, lats, lons).unwrap())
    }

    fn lam() -> Box<dyn Dataset> {
        dataset(
            "lam",
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 1.0, 0.0, 1.0],
            1000.0,
        )
    }

    fn globe() -> Box<dyn Dataset> {
        dataset(
            "globe",
            vec![-10.0, 0.5, 10.0, 0.5],
            vec![0.0, 0.5, 0.0, 20.0],
            5000.0,
        )
    }

    fn cutout() -> Cutout {
        Cutout::new(vec![lam(), globe()], JoinAxis::Single(3), &MaskConfig::default()).unwrap()
    }

    #[test]
    fn test_mask_and_shape() {
        let cutout = cutout();
        assert_eq!(cutout.mask(), &[true, false, true, true]);
        assert_eq!(cutout.shape(), [2, 1, 1, 7]);
        assert_eq!(
            cutout.longitudes(),
            vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 20.0]
        );
        assert_eq!(cutout.grids().unwrap(), vec![4, 3]);
    }

    #[test]
    fn test_read_puts_lam_first() {
        let cutout = cutout();
        let out = cutout.get(&Index::from(1)).unwrap();
        assert_eq!(out.shape(), &[1, 1, 7]);
        let values: Vec<f32> = (0..7).map(|p| out[[0, 0, p]]).collect();
        assert_eq!(
            values,
            vec![1100.0, 1101.0, 1102.0, 1103.0, 5100.0, 5102.0, 5103.0]
        );
    }

    #[test]
    fn test_spatial_subset_is_rejected() {
        let cutout = cutout();
        let index = Index::new(vec![
            DimIndex::from(..),
            DimIndex::from(..),
            DimIndex::from(..),
            DimIndex::Slice(Slice::range(0, 3)),
        ]);
        let err = cutout.get(&index).unwrap_err();
        assert!(matches!(err, ViewError::SpatialSubset { kind: "Cutout", .. }));
        assert!(err.is_indexing());
        assert!(err.to_string().contains("Cutout [2, 1, 1, 7]"));

        let int_index = Index::new(vec![DimIndex::Int(0); 4]);
        assert!(cutout.get(&int_index).is_err());
    }

    #[test]
    fn test_explicit_full_spatial_slice_is_accepted() {
        let cutout = cutout();
        let index = Index::new(vec![
            DimIndex::Int(0),
            DimIndex::from(..),
            DimIndex::from(..),
            DimIndex::Slice(Slice::range(0, 7)),
        ]);
        assert_eq!(cutout.get(&index).unwrap().shape(), &[1, 1, 7]);
    }

    #[test]
    fn test_requires_two_children_and_spatial_axis() {
        let err = Cutout::new(vec![lam()], JoinAxis::Single(3), &MaskConfig::default()).unwrap_err();
        assert!(matches!(err, ViewError::ChildCount { expected: 2, actual: 1, .. }));

        let err = Cutout::new(vec![lam(), globe()], JoinAxis::Single(1), &MaskConfig::default())
            .unwrap_err();
        assert!(matches!(err, ViewError::AxisMismatch { .. }));
    }

    #[test]
    fn test_bounding_box_footprint() {
        // Triangle: the bounding box covers (0.9, 0.9), the hull does not
        let children = || {
            vec![
                dataset("lam", vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0], 0.0),
                dataset("globe", vec![0.9, 5.0], vec![0.9, 5.0], 0.0),
            ]
        };
        let hull = Cutout::new(children(), JoinAxis::Single(3), &MaskConfig::default()).unwrap();
        assert_eq!(hull.mask(), &[true, true]);

        let config = MaskConfig {
            footprint: FootprintMethod::BoundingBox,
            buffer_degrees: 0.0,
        };
        let bbox = Cutout::new(children(), JoinAxis::Single(3), &config).unwrap();
        assert_eq!(bbox.mask(), &[false, true]);
    }

    #[test]
    fn test_multi_grid_child_not_implemented() {
        let grids = crate::grids::Grids::new(vec![lam(), globe()], JoinAxis::Single(3)).unwrap();
        let cutout = Cutout::new(
            vec![Box::new(grids), globe()],
            JoinAxis::Single(3),
            &MaskConfig::default(),
        )
        .unwrap();
        assert!(matches!(cutout.grids(), Err(ViewError::NotImplemented(_))));
    }
}
