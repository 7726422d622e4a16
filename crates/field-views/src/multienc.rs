//! Cutout over children with different variable sets.

use chrono::{DateTime, Utc};
use ndarray::{concatenate, s, Array4, ArrayD, Axis};
use tracing::debug;

use crate::combined::{require_axis, require_children, Check, Combined};
use crate::config::MaskConfig;
use crate::cutout::{require_whole_space, require_whole_span, CutoutMask};
use crate::dataset::{get_selected, Dataset};
use crate::error::Result;
use crate::index::{update_axis, Index, Selection, Span};
use crate::types::{JoinAxis, Node, Shape, SPATIAL_AXIS, VARIABLE_AXIS};

const KIND: &str = "MultiEncCutout";

/// A cutout where the global child carries fewer variables than the local one.
///
/// The result has the local child's variables. For retained global points,
/// the global child's variables fill the leading positions and the rest are
/// zero.
#[derive(Debug)]
pub struct MultiEncCutout {
    combined: Combined,
    mask: CutoutMask,
    lam_variables: usize,
    globe_variables: usize,
}

impl MultiEncCutout {
    /// Fuse exactly two children, local first, joined on `[1, 3]`.
    pub fn new(datasets: Vec<Box<dyn Dataset>>, axis: JoinAxis, config: &MaskConfig) -> Result<Self> {
        require_children(KIND, &datasets, 2)?;
        require_axis(KIND, JoinAxis::Pair([VARIABLE_AXIS, SPATIAL_AXIS]), axis)?;

        let combined = Combined::new(
            KIND,
            datasets,
            axis,
            &[
                Check::SubShapes,
                Check::Lengths,
                Check::Dates,
                Check::LamHasMoreVariables,
            ],
        )?;

        let lam = combined.datasets()[0].as_ref();
        let globe = combined.datasets()[1].as_ref();
        let mask = CutoutMask::compute(lam, globe, config)?;
        let lam_variables = lam.shape()[VARIABLE_AXIS];
        let globe_variables = globe.shape()[VARIABLE_AXIS];

        let cutout = Self {
            combined,
            mask,
            lam_variables,
            globe_variables,
        };
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

    /// Read the global child for `selection`, masked and zero-padded to the
    /// selected local variables.
    fn read_globe(&self, selection: &Selection) -> Result<Array4<f32>> {
        let variables = selection[VARIABLE_AXIS];
        let own = variables.clamp_to(self.globe_variables);
        let globe_points = self.globe().shape()[SPATIAL_AXIS];

        let globe_selection = update_axis(
            &update_axis(selection, VARIABLE_AXIS, own),
            SPATIAL_AXIS,
            Span::full(globe_points),
        );
        let globe = self.mask.apply(&self.globe().read(&globe_selection)?);

        let (records, _, members, points) = globe.dim();
        let mut padded = Array4::zeros((records, variables.count(), members, points));
        padded
            .slice_mut(s![.., ..own.count(), .., ..])
            .assign(&globe);

        debug!(
            kind = KIND,
            requested = %variables,
            from_globe = %own,
            padding = variables.count() - own.count(),
            "Padding global variables"
        );

        Ok(padded)
    }
}

impl Dataset for MultiEncCutout {
    fn shape(&self) -> Shape {
        self.combined.memo_shape(|| {
            let mut shape = self.lam().shape();
            shape[VARIABLE_AXIS] = self.lam_variables;
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
        let lam = self
            .lam()
            .read(&update_axis(selection, SPATIAL_AXIS, Span::full(lam_points)))?;
        let globe = self.read_globe(selection)?;

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
    use crate::error::ViewError;
    use crate::index::{DimIndex, Slice};
    use crate::memory::MemoryDataset;
    use chrono::TimeZone;
    use ndarray::Array;

    fn dataset(name: &str, variables: usize, lats: Vec<f64>, lons: Vec<f64>, offset: f32) -> Box<dyn Dataset> {
        let points = lats.len();
        let data = Array::from_shape_fn((2, variables, 1, points), |(r, v, _, p)| {
            offset + (r * 100 + (v + 1) * 10 + p) as f32
        });
        let dates = (0..2)
            .map(|h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap())
            .collect();
        Box::new(MemoryDataset::new(name, data, dates, lats, lons).unwrap())
    }

    fn cutout(lam_vars: usize, globe_vars: usize) -> Result<MultiEncCutout> {
        let lam = dataset("lam", lam_vars, vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 1.0, 0.0, 1.0], 1000.0);
        let globe = dataset("globe", globe_vars, vec![0.5, 20.0], vec![0.5, 20.0], 5000.0);
        MultiEncCutout::new(vec![lam, globe], JoinAxis::Pair([1, 3]), &MaskConfig::default())
    }

    #[test]
    fn test_shape_follows_lam_variables() {
        let cutout = cutout(6, 4).unwrap();
        assert_eq!(cutout.mask(), &[false, true]);
        assert_eq!(cutout.shape(), [2, 6, 1, 5]);
        assert_eq!(cutout.variables().len(), 6);
        assert_eq!(cutout.latitudes(), vec![0.0, 0.0, 1.0, 1.0, 20.0]);
    }

    #[test]
    fn test_globe_variables_are_zero_padded() {
        let cutout = cutout(6, 4).unwrap();
        let out = cutout.get(&Index::from(0)).unwrap();
        assert_eq!(out.shape(), &[6, 1, 5]);

        let lam_point: Vec<f32> = (0..6).map(|v| out[[v, 0, 0]]).collect();
        assert_eq!(lam_point, vec![1010.0, 1020.0, 1030.0, 1040.0, 1050.0, 1060.0]);

        let globe_point: Vec<f32> = (0..6).map(|v| out[[v, 0, 4]]).collect();
        assert_eq!(globe_point, vec![5011.0, 5021.0, 5031.0, 5041.0, 0.0, 0.0]);
    }

    #[test]
    fn test_variable_slice_is_clamped_for_globe() {
        let cutout = cutout(6, 4).unwrap();
        let index = Index::new(vec![
            DimIndex::Int(1),
            DimIndex::Slice(Slice::range(2, 6).with_step(2)),
        ]);
        let out = cutout.get(&index).unwrap();
        // Variables 2 and 4: the globe only has the first
        assert_eq!(out.shape(), &[2, 1, 5]);
        assert_eq!(out[[0, 0, 4]], 5131.0);
        assert_eq!(out[[1, 0, 4]], 0.0);
        assert_eq!(out[[1, 0, 0]], 1150.0);

        let index = Index::new(vec![DimIndex::Int(0), DimIndex::Int(5)]);
        let out = cutout.get(&index).unwrap();
        assert_eq!(out.shape(), &[1, 5]);
        assert_eq!(out[[0, 4]], 0.0);
    }

    #[test]
    fn test_variable_list_index() {
        let cutout = cutout(6, 4).unwrap();
        let index = Index::new(vec![DimIndex::Int(0), DimIndex::List(vec![5, 0])]);
        let out = cutout.get(&index).unwrap();
        assert_eq!(out.shape(), &[2, 1, 5]);
        assert_eq!(out[[0, 0, 4]], 0.0);
        assert_eq!(out[[1, 0, 4]], 5011.0);
    }

    #[test]
    fn test_equal_variable_counts() {
        let cutout = cutout(3, 3).unwrap();
        let out = cutout.get(&Index::from(0)).unwrap();
        assert_eq!(out[[2, 0, 4]], 5031.0);
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            cutout(4, 6),
            Err(ViewError::Incompatible {
                attribute: "variable count",
                ..
            })
        ));

        let lam = dataset("lam", 2, vec![0.0], vec![0.0], 0.0);
        let globe = dataset("globe", 2, vec![9.0], vec![9.0], 0.0);
        let err = MultiEncCutout::new(vec![lam, globe], JoinAxis::Single(3), &MaskConfig::default())
            .unwrap_err();
        assert!(matches!(err, ViewError::AxisMismatch { .. }));
    }

    #[test]
    fn test_spatial_subset_is_rejected() {
        let cutout = cutout(6, 4).unwrap();
        let index = Index::new(vec![
            DimIndex::Int(0),
            DimIndex::from(..),
            DimIndex::from(..),
            DimIndex::List(vec![0, 1]),
        ]);
        assert!(matches!(
            cutout.get(&index),
            Err(ViewError::SpatialSubset { kind: "MultiEncCutout", .. })
        ));
    }

    #[test]
    fn test_grids() {
        let cutout = cutout(6, 4).unwrap();
        assert_eq!(cutout.grids().unwrap(), vec![4, 1]);
    }

    #[test]
    fn test_multi_grid_child_not_implemented() {
        let data = Array::zeros((2, 6, 1, 4));
        let dates = (0..2)
            .map(|h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap())
            .collect();
        let lam = MemoryDataset::new(
            "lam",
            data,
            dates,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 1.0, 0.0, 1.0],
        )
        .unwrap()
        .with_grids(vec![2, 2])
        .unwrap();
        let globe = dataset("globe", 4, vec![0.5, 20.0], vec![0.5, 20.0], 5000.0);

        let cutout = MultiEncCutout::new(
            vec![Box::new(lam), globe],
            JoinAxis::Pair([1, 3]),
            &MaskConfig::default(),
        )
        .unwrap();
        let err = cutout.grids().unwrap_err();
        assert!(matches!(err, ViewError::NotImplemented(_)));
        assert!(err.to_string().contains("MultiEncCutout"), "{err}");
    }
}
