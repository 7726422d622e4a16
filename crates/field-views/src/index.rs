//! Index algebra for composed datasets.
//!
//! A caller indexes a dataset with an [`Index`]: up to four components, each an
//! integer, a slice or a list of integers. Combinators cannot push integers or
//! lists down to their children directly, so the index is first decomposed:
//!
//! - every axis becomes a plain [`Span`] (a normalized slice), giving a
//!   rank-preserving [`Selection`] that children understand;
//! - whatever the spans could not express goes into [`Changes`]: integer axes
//!   to squeeze and list axes to re-select.
//!
//! Children are read with the selection, their results concatenated, and
//! [`reapply`] turns the merged array into exactly what the caller asked for.

use std::fmt;
use std::ops::{Range, RangeFull};
use std::str::FromStr;

use ndarray::{Array4, ArrayD, Axis};

use crate::error::{Result, ViewError};
use crate::types::{Shape, RANK};

/// A slice with optional bounds, negative values counting from the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl Slice {
    /// Create a slice.
    pub fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Self { start, stop, step }
    }

    /// The whole axis.
    pub fn all() -> Self {
        Self::new(None, None, 1)
    }

    /// `start..stop` with step 1.
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), 1)
    }

    /// Same bounds, different step.
    pub fn with_step(self, step: isize) -> Self {
        Self { step, ..self }
    }

    /// Check if this slice selects a whole axis of any length.
    pub fn is_all(&self) -> bool {
        self.start.unwrap_or(0) == 0 && self.stop.is_none() && self.step == 1
    }

    /// Resolve against an axis of length `len`; out-of-range bounds are clamped.
    pub fn indices(&self, axis: usize, len: usize) -> Result<Span> {
        if self.step <= 0 {
            return Err(ViewError::UnsupportedIndex {
                axis,
                detail: format!("slice step must be positive, got {}", self.step),
                node: None,
            });
        }

        let clamp = |bound: isize| -> usize {
            if bound < 0 {
                (bound + len as isize).max(0) as usize
            } else {
                (bound as usize).min(len)
            }
        };

        let start = self.start.map(clamp).unwrap_or(0);
        let stop = self.stop.map(clamp).unwrap_or(len);
        Ok(Span::new(start, stop, self.step as usize))
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{}", start)?;
        }
        write!(f, ":")?;
        if let Some(stop) = self.stop {
            write!(f, "{}", stop)?;
        }
        if self.step != 1 {
            write!(f, ":{}", self.step)?;
        }
        Ok(())
    }
}

/// A resolved slice: `start <= stop`, both within the axis, `step >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl Span {
    /// Create a span; an inverted range becomes empty.
    pub fn new(start: usize, stop: usize, step: usize) -> Self {
        Self {
            start,
            stop: stop.max(start),
            step: step.max(1),
        }
    }

    /// Every position of an axis of length `len`.
    pub fn full(len: usize) -> Self {
        Self::new(0, len, 1)
    }

    /// Number of positions selected.
    pub fn count(&self) -> usize {
        (self.stop - self.start + self.step - 1) / self.step
    }

    /// Check if this span selects every position of an axis of length `len`, in order.
    pub fn is_full(&self, len: usize) -> bool {
        self.start == 0 && self.stop == len && self.step == 1
    }

    /// Restrict to positions below `len`, keeping the step.
    pub fn clamp_to(&self, len: usize) -> Self {
        Self::new(self.start.min(len), self.stop.min(len), self.step)
    }

    /// Selected positions, in order.
    pub fn positions(&self) -> impl Iterator<Item = usize> {
        (self.start..self.stop).step_by(self.step)
    }

    /// The equivalent ndarray slice.
    pub fn as_ndarray(&self) -> ndarray::Slice {
        ndarray::Slice::new(
            self.start as isize,
            Some(self.stop as isize),
            self.step as isize,
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.step == 1 {
            write!(f, "{}:{}", self.start, self.stop)
        } else {
            write!(f, "{}:{}:{}", self.start, self.stop, self.step)
        }
    }
}

/// One span per axis: the rank-preserving form of an index.
pub type Selection = [Span; RANK];

/// Selection of every element of `shape`.
pub fn full_selection(shape: &Shape) -> Selection {
    [
        Span::full(shape[0]),
        Span::full(shape[1]),
        Span::full(shape[2]),
        Span::full(shape[3]),
    ]
}

/// Shape of the array a selection produces.
pub fn selection_shape(selection: &Selection) -> Shape {
    [
        selection[0].count(),
        selection[1].count(),
        selection[2].count(),
        selection[3].count(),
    ]
}

/// One component of an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DimIndex {
    /// A single position; the axis is dropped from the result.
    Int(isize),
    /// A slice; the axis is kept.
    Slice(Slice),
    /// An ordered list of positions; the axis is kept with one entry per item.
    List(Vec<isize>),
}

impl DimIndex {
    fn is_all(&self) -> bool {
        matches!(self, Self::Slice(s) if s.is_all())
    }
}

impl From<isize> for DimIndex {
    fn from(value: isize) -> Self {
        Self::Int(value)
    }
}

impl From<Slice> for DimIndex {
    fn from(value: Slice) -> Self {
        Self::Slice(value)
    }
}

impl From<Range<isize>> for DimIndex {
    fn from(value: Range<isize>) -> Self {
        Self::Slice(Slice::range(value.start, value.end))
    }
}

impl From<RangeFull> for DimIndex {
    fn from(_: RangeFull) -> Self {
        Self::Slice(Slice::all())
    }
}

impl From<Vec<isize>> for DimIndex {
    fn from(value: Vec<isize>) -> Self {
        Self::List(value)
    }
}

impl fmt::Display for DimIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Slice(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "{:?}", items),
        }
    }
}

/// A full index: up to [`RANK`] components, missing trailing axes taken whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Index(Vec<DimIndex>);

impl Index {
    /// Create an index from its components.
    pub fn new(dims: Vec<DimIndex>) -> Self {
        Self(dims)
    }

    /// Index selecting everything.
    pub fn all() -> Self {
        Self(Vec::new())
    }

    /// Components, as given.
    pub fn dims(&self) -> &[DimIndex] {
        &self.0
    }

    /// The integer, when the index is a single integer on the first axis.
    pub fn as_single_int(&self) -> Option<isize> {
        match self.0.as_slice() {
            [DimIndex::Int(i)] => Some(*i),
            _ => None,
        }
    }

    /// Check if `axis` is selected whole (given as `:` or omitted).
    pub fn takes_all(&self, axis: usize) -> bool {
        self.0.get(axis).map_or(true, DimIndex::is_all)
    }
}

impl From<Vec<DimIndex>> for Index {
    fn from(dims: Vec<DimIndex>) -> Self {
        Self(dims)
    }
}

impl From<DimIndex> for Index {
    fn from(dim: DimIndex) -> Self {
        Self(vec![dim])
    }
}

impl From<isize> for Index {
    fn from(value: isize) -> Self {
        Self(vec![DimIndex::Int(value)])
    }
}

impl From<Slice> for Index {
    fn from(value: Slice) -> Self {
        Self(vec![DimIndex::Slice(value)])
    }
}

impl From<Range<isize>> for Index {
    fn from(value: Range<isize>) -> Self {
        Self(vec![DimIndex::from(value)])
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, dim) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", dim)?;
        }
        write!(f, ")")
    }
}

impl FromStr for Index {
    type Err = ViewError;

    /// Parse the notation used by [`Index`]'s `Display`, e.g. `2:6, ::2, [0, 1], -1`.
    /// Surrounding parentheses are optional; empty components select everything.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(s);
        if s.trim().is_empty() {
            return Ok(Self::all());
        }

        let mut dims = Vec::new();
        let mut depth = 0usize;
        let mut current = String::new();
        for ch in s.chars() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    dims.push(parse_dim(dims.len(), &current)?);
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(ch);
        }
        dims.push(parse_dim(dims.len(), &current)?);

        Ok(Self(dims))
    }
}

fn parse_dim(axis: usize, text: &str) -> Result<DimIndex> {
    let text = text.trim();
    let invalid = |detail: String| ViewError::UnsupportedIndex {
        axis,
        detail,
        node: None,
    };
    let number = |part: &str| -> Result<Option<isize>> {
        let part = part.trim();
        if part.is_empty() {
            return Ok(None);
        }
        part.parse()
            .map(Some)
            .map_err(|_| invalid(format!("'{}' is not an integer", part)))
    };

    if text.is_empty() {
        return Ok(DimIndex::Slice(Slice::all()));
    }

    if let Some(inner) = text.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| invalid(format!("unclosed list '{}'", text)))?;
        let items = inner
            .split(',')
            .filter(|item| !item.trim().is_empty())
            .map(|item| number(item)?.ok_or_else(|| invalid("empty list item".to_string())))
            .collect::<Result<Vec<_>>>()?;
        return Ok(DimIndex::List(items));
    }

    if text.contains(':') {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() > 3 {
            return Err(invalid(format!("too many ':' in '{}'", text)));
        }
        let step = match parts.get(2) {
            Some(part) => number(part)?.unwrap_or(1),
            None => 1,
        };
        return Ok(DimIndex::Slice(Slice::new(
            number(parts[0])?,
            number(parts[1])?,
            step,
        )));
    }

    number(text)?
        .map(DimIndex::Int)
        .ok_or_else(|| invalid("empty index".to_string()))
}

/// What must still be applied to a merged result to match the original index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    /// Axes indexed by a single integer, dropped at the end.
    squeeze: Vec<usize>,
    /// Axes indexed by a list: positions relative to the covering span.
    take: Vec<(usize, Vec<usize>)>,
}

impl Changes {
    /// Nothing left to apply.
    pub fn is_empty(&self) -> bool {
        self.squeeze.is_empty() && self.take.is_empty()
    }

    /// Axes that will be squeezed.
    pub fn squeezed(&self) -> &[usize] {
        &self.squeeze
    }

    /// Positions re-selected on `axis`, if that axis was indexed by a list.
    pub fn taken(&self, axis: usize) -> Option<&[usize]> {
        self.take
            .iter()
            .find(|(a, _)| *a == axis)
            .map(|(_, positions)| positions.as_slice())
    }
}

/// Resolve a possibly negative position against an axis.
pub fn normalize_position(axis: usize, index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 { index + len as isize } else { index };
    if resolved < 0 || resolved as usize >= len {
        return Err(ViewError::OutOfRange {
            axis,
            index,
            length: len,
            node: None,
        });
    }
    Ok(resolved as usize)
}

/// Split `index` on an array of `shape` into spans plus the residual changes.
pub fn decompose(index: &Index, shape: &Shape) -> Result<(Selection, Changes)> {
    let dims = index.dims();
    if dims.len() > RANK {
        return Err(ViewError::RankExceeded {
            rank: RANK,
            given: dims.len(),
            node: None,
        });
    }

    let mut selection = full_selection(shape);
    let mut changes = Changes::default();

    for (axis, dim) in dims.iter().enumerate() {
        let len = shape[axis];
        selection[axis] = match dim {
            DimIndex::Int(i) => {
                let position = normalize_position(axis, *i, len)?;
                changes.squeeze.push(axis);
                Span::new(position, position + 1, 1)
            }
            DimIndex::Slice(slice) => slice.indices(axis, len)?,
            DimIndex::List(items) => {
                if items.is_empty() {
                    return Err(ViewError::UnsupportedIndex {
                        axis,
                        detail: "empty list".to_string(),
                        node: None,
                    });
                }
                let positions = items
                    .iter()
                    .map(|&i| normalize_position(axis, i, len))
                    .collect::<Result<Vec<_>>>()?;
                let min = positions.iter().copied().min().unwrap_or(0);
                let max = positions.iter().copied().max().unwrap_or(0);
                changes
                    .take
                    .push((axis, positions.iter().map(|p| p - min).collect()));
                Span::new(min, max + 1, 1)
            }
        };
    }

    Ok((selection, changes))
}

/// Split a span over consecutive children of the given lengths.
///
/// Each entry is the part of `span` that falls in that child, in the child's
/// own coordinates, or `None` when the child is not touched. Children are
/// half-open, so a position equal to one child's end belongs to the next.
pub fn split_along_lengths(span: &Span, lengths: &[usize]) -> Vec<Option<Span>> {
    let mut result = Vec::with_capacity(lengths.len());
    let mut pos = 0;

    for &length in lengths {
        let end = pos + length;
        let mut begin = pos.max(span.start);
        let stop = end.min(span.stop);

        let mut part = None;
        if begin < stop {
            let offset = (begin - span.start) % span.step;
            if offset != 0 {
                begin += span.step - offset;
            }
            if begin < stop {
                part = Some(Span::new(begin - pos, stop - pos, span.step));
            }
        }

        result.push(part);
        pos = end;
    }

    result
}

/// Copy of `selection` with `axis` replaced by `span`.
pub fn update_axis(selection: &Selection, axis: usize, span: Span) -> Selection {
    let mut updated = *selection;
    updated[axis] = span;
    updated
}

/// Apply the residual changes to a merged, rank-preserving result.
pub fn reapply(merged: Array4<f32>, changes: &Changes) -> Result<ArrayD<f32>> {
    let mut result = merged.into_dyn();
    if changes.is_empty() {
        return Ok(result);
    }

    for (axis, positions) in &changes.take {
        result = result.select(Axis(*axis), positions);
    }

    let mut squeeze = changes.squeeze.clone();
    squeeze.sort_unstable();
    for &axis in squeeze.iter().rev() {
        let len = result.len_of(Axis(axis));
        if len != 1 {
            return Err(ViewError::UnexpectedShape(format!(
                "axis {} should have length 1 before squeezing, has {} (shape {:?})",
                axis,
                len,
                result.shape()
            )));
        }
        result = result.index_axis_move(Axis(axis), 0);
    }

    Ok(result)
}
