//! Error types for dataset composition.

use thiserror::Error;

/// Errors that can occur while building or indexing composed datasets.
#[derive(Error, Debug)]
pub enum ViewError {
    /// A combinator got the wrong number of children.
    #[error("{kind} requires {expected} datasets, got {actual}")]
    ChildCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A combinator was asked to join along an axis it does not support.
    #[error("{kind} requires axis={expected}, got axis={actual}")]
    AxisMismatch {
        kind: &'static str,
        expected: String,
        actual: String,
    },

    /// Two consecutive children failed a compatibility check.
    #[error("{kind}: incompatible {attribute} between {left} and {right}: {detail}")]
    Incompatible {
        kind: &'static str,
        left: String,
        right: String,
        attribute: &'static str,
        detail: String,
    },

    /// Two construction options cannot be combined.
    #[error("cannot use both '{first}' and '{second}'")]
    ExclusiveOptions { first: String, second: String },

    /// A combinator was built without children.
    #[error("{kind} needs at least one dataset")]
    EmptyCombination { kind: &'static str },

    /// Configuration error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// A leaf dataset's parts disagree with each other.
    #[error("invalid dataset '{name}': {detail}")]
    InvalidLeaf { name: String, detail: String },

    /// The cutout mask could not be computed.
    #[error("cutout mask error: {0}")]
    Mask(String),

    /// The index has more components than the array has axes.
    #[error("too many indices: array has rank {rank}, got {given}{}", located(.node))]
    RankExceeded {
        rank: usize,
        given: usize,
        /// Label of the dataset that was indexed, once known.
        node: Option<String>,
    },

    /// An integer or list index points outside its axis.
    #[error("index {index} is out of range for axis {axis} with length {length}{}", located(.node))]
    OutOfRange {
        axis: usize,
        index: isize,
        length: usize,
        node: Option<String>,
    },

    /// The index has a form that cannot be applied on this axis.
    #[error("unsupported index on axis {axis}: {detail}{}", located(.node))]
    UnsupportedIndex {
        axis: usize,
        detail: String,
        node: Option<String>,
    },

    /// The spatial axis of a cutout mixes two domains and is only readable as a whole.
    #[error("{kind}: no support for selecting a subset of the 1D values {index}\n{tree}")]
    SpatialSubset {
        kind: &'static str,
        index: String,
        tree: String,
    },

    /// The requested combination is not supported yet.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// An array came back with a shape the caller did not expect.
    #[error("unexpected array shape: {0}")]
    UnexpectedShape(String),
}

fn located(node: &Option<String>) -> String {
    node.as_ref().map(|n| format!(" in {}", n)).unwrap_or_default()
}

impl ViewError {
    /// Create an Incompatible error.
    pub fn incompatible(
        kind: &'static str,
        left: impl Into<String>,
        right: impl Into<String>,
        attribute: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self::Incompatible {
            kind,
            left: left.into(),
            right: right.into(),
            attribute,
            detail: detail.into(),
        }
    }

    /// Attach the label of the indexed dataset to an indexing error that has none yet.
    pub fn at_node(self, label: impl FnOnce() -> String) -> Self {
        match self {
            Self::RankExceeded {
                rank,
                given,
                node: None,
            } => Self::RankExceeded {
                rank,
                given,
                node: Some(label()),
            },
            Self::OutOfRange {
                axis,
                index,
                length,
                node: None,
            } => Self::OutOfRange {
                axis,
                index,
                length,
                node: Some(label()),
            },
            Self::UnsupportedIndex {
                axis,
                detail,
                node: None,
            } => Self::UnsupportedIndex {
                axis,
                detail,
                node: Some(label()),
            },
            other => other,
        }
    }

    /// Label of the dataset an indexing error was raised on.
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::RankExceeded { node, .. }
            | Self::OutOfRange { node, .. }
            | Self::UnsupportedIndex { node, .. } => node.as_deref(),
            _ => None,
        }
    }

    /// Create an InvalidLeaf error.
    pub fn invalid_leaf(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidLeaf {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// True for errors raised while building a tree.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::ChildCount { .. }
                | Self::AxisMismatch { .. }
                | Self::Incompatible { .. }
                | Self::ExclusiveOptions { .. }
                | Self::EmptyCombination { .. }
                | Self::InvalidConfig(_)
                | Self::InvalidLeaf { .. }
                | Self::Mask(_)
        )
    }

    /// True for errors raised by an indexing request.
    pub fn is_indexing(&self) -> bool {
        matches!(
            self,
            Self::RankExceeded { .. }
                | Self::OutOfRange { .. }
                | Self::UnsupportedIndex { .. }
                | Self::SpatialSubset { .. }
                | Self::NotImplemented(_)
        )
    }
}

impl From<ndarray::ShapeError> for ViewError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::UnexpectedShape(err.to_string())
    }
}

/// Result type for dataset view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
