//! Concatenation along the record axis.

use chrono::{DateTime, Utc};
use ndarray::{Array4, ArrayD};
use tracing::debug;

use crate::combined::{Check, Combined};
use crate::dataset::{get_selected, Dataset};
use crate::error::Result;
use crate::index::{normalize_position, Index, Selection};
use crate::types::{JoinAxis, Node, Shape, RECORD_AXIS};

const KIND: &str = "Concat";

/// Children joined end to end along the record axis.
///
/// Record counts and dates may differ freely between children; everything
/// else (variables, grid, resolution, other axis lengths) must match.
/// Dates are the children's dates in child order, without sorting or
/// deduplication.
#[derive(Debug)]
pub struct Concat {
    combined: Combined,
}

impl Concat {
    pub fn new(datasets: Vec<Box<dyn Dataset>>) -> Result<Self> {
        let combined = Combined::new(
            KIND,
            datasets,
            JoinAxis::Single(RECORD_AXIS),
            &[Check::SubShapes, Check::Variables, Check::Grid, Check::Resolution],
        )?;
        let concat = Self { combined };
        concat.combined.log_built(concat.shape());
        Ok(concat)
    }

    /// Children, in order.
    pub fn datasets(&self) -> &[Box<dyn Dataset>] {
        self.combined.datasets()
    }
}

impl Dataset for Concat {
    fn shape(&self) -> Shape {
        self.combined.memo_shape(|| {
            let mut shape = self.combined.first().shape();
            shape[RECORD_AXIS] = self.datasets().iter().map(|d| d.len()).sum();
            shape
        })
    }

    fn dates(&self) -> Vec<DateTime<Utc>> {
        self.datasets().iter().flat_map(|d| d.dates()).collect()
    }

    fn latitudes(&self) -> Vec<f64> {
        self.combined.first().latitudes()
    }

    fn longitudes(&self) -> Vec<f64> {
        self.combined.first().longitudes()
    }

    fn variables(&self) -> Vec<String> {
        self.combined.first().variables()
    }

    fn resolution(&self) -> Option<String> {
        self.combined.first().resolution()
    }

    fn grids(&self) -> Result<Vec<usize>> {
        self.combined.first().grids()
    }

    fn read(&self, selection: &Selection) -> Result<Array4<f32>> {
        self.combined.read_along(RECORD_AXIS, selection)
    }

    fn tree(&self) -> Node {
        self.combined.tree(self.shape())
    }

    fn get(&self, index: &Index) -> Result<ArrayD<f32>> {
        let Some(i) = index.as_single_int() else {
            return get_selected(self, index);
        };

        let mut remainder = normalize_position(RECORD_AXIS, i, self.len())
            .map_err(|e| e.at_node(|| self.tree().label()))?;
        for (child, dataset) in self.datasets().iter().enumerate() {
            if remainder < dataset.len() {
                debug!(kind = KIND, index = i, child, remainder, "Delegating record");
                return dataset.get(&Index::from(remainder as isize));
            }
            remainder -= dataset.len();
        }

        // normalize_position already bounded the index by the summed lengths
        get_selected(self, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewError;
    use crate::index::DimIndex;
    use crate::memory::MemoryDataset;
    use chrono::TimeZone;
    use ndarray::Array;

    fn leaf(name: &str, first_hour: u32, records: usize) -> Box<dyn Dataset> {
        let data = Array::from_shape_fn((records, 2, 1, 3), |(r, v, _, p)| {
            (first_hour as usize * 100 + r * 100 + v * 10 + p) as f32
        });
        let dates = (0..records as u32)
            .map(|h| Utc.with_ymd_and_hms(2024, 1, 1, first_hour + h, 0, 0).unwrap())
            .collect();
        Box::new(
            MemoryDataset::new(name, data, dates, vec![0.0; 3], vec![0.0, 1.0, 2.0])
                .unwrap()
                .with_resolution("1.0"),
        )
    }

    fn three() -> Concat {
        Concat::new(vec![leaf("a", 0, 3), leaf("b", 3, 2), leaf("c", 5, 4)]).unwrap()
    }

    #[test]
    fn test_shape_and_dates() {
        let concat = three();
        assert_eq!(concat.shape(), [9, 2, 1, 3]);
        assert_eq!(concat.len(), 9);
        let hours: Vec<u32> = concat
            .dates()
            .iter()
            .map(|d| chrono::Timelike::hour(d))
            .collect();
        assert_eq!(hours, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_dates_keep_child_order() {
        let concat = Concat::new(vec![leaf("late", 5, 1), leaf("early", 0, 2)]).unwrap();
        let dates = concat.dates();
        assert!(dates[0] > dates[1]);
    }

    #[test]
    fn test_integer_index_walks_children() {
        let concat = three();
        for record in 0..9isize {
            let out = concat.get(&Index::from(record)).unwrap();
            assert_eq!(out.shape(), &[2, 1, 3]);
            assert_eq!(out[[0, 0, 0]], (record * 100) as f32);
        }
        let last = concat.get(&Index::from(-1)).unwrap();
        assert_eq!(last[[1, 0, 2]], 812.0);
        assert!(matches!(
            concat.get(&Index::from(9)),
            Err(ViewError::OutOfRange { index: 9, length: 9, .. })
        ));
    }

    #[test]
    fn test_slice_across_children() {
        let concat = three();
        let out = concat.get(&Index::from(2..6)).unwrap();
        assert_eq!(out.shape(), &[4, 2, 1, 3]);
        let firsts: Vec<f32> = (0..4).map(|r| out[[r, 0, 0, 0]]).collect();
        assert_eq!(firsts, vec![200.0, 300.0, 400.0, 500.0]);
    }

    #[test]
    fn test_list_index_reorders_records() {
        let concat = three();
        let index = Index::new(vec![DimIndex::List(vec![7, 0, 4]), DimIndex::Int(1)]);
        let out = concat.get(&index).unwrap();
        assert_eq!(out.shape(), &[3, 1, 3]);
        assert_eq!(out[[0, 0, 0]], 710.0);
        assert_eq!(out[[1, 0, 0]], 10.0);
        assert_eq!(out[[2, 0, 0]], 410.0);
    }

    #[test]
    fn test_rejects_mismatched_variables() {
        let other = MemoryDataset::new(
            "other",
            Array4::zeros((1, 2, 1, 3)),
            vec![Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()],
            vec![0.0; 3],
            vec![0.0, 1.0, 2.0],
        )
        .unwrap()
        .with_resolution("1.0")
        .with_variables(vec!["t2m".into(), "msl".into()])
        .unwrap();
        let err = Concat::new(vec![leaf("a", 0, 1), Box::new(other)]).unwrap_err();
        assert!(matches!(
            err,
            ViewError::Incompatible {
                attribute: "variables",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_mismatched_resolution() {
        let coarse = MemoryDataset::new(
            "coarse",
            Array4::zeros((1, 2, 1, 3)),
            vec![Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()],
            vec![0.0; 3],
            vec![0.0, 1.0, 2.0],
        )
        .unwrap()
        .with_resolution("2.0");
        let err = Concat::new(vec![leaf("a", 0, 1), Box::new(coarse)]).unwrap_err();
        assert!(err.to_string().contains("resolution"));
    }
}
