//! Core types shared by every dataset view.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of axes of every dataset: (record, variable, ensemble, point).
pub const RANK: usize = 4;

/// Axis of distinct records (dates).
pub const RECORD_AXIS: usize = 0;
/// Axis of variables.
pub const VARIABLE_AXIS: usize = 1;
/// Axis of ensemble members.
pub const ENSEMBLE_AXIS: usize = 2;
/// Axis of flattened spatial points.
pub const SPATIAL_AXIS: usize = 3;

/// Shape of a dataset, in axis order.
pub type Shape = [usize; RANK];

/// The axis (or pair of axes) along which a combinator joins its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinAxis {
    Single(usize),
    Pair([usize; 2]),
}

impl JoinAxis {
    /// The axes joined, in order.
    pub fn axes(&self) -> &[usize] {
        match self {
            Self::Single(axis) => std::slice::from_ref(axis),
            Self::Pair(axes) => axes,
        }
    }

    /// Check if `axis` is one of the joined axes.
    pub fn contains(&self, axis: usize) -> bool {
        self.axes().contains(&axis)
    }

    /// The last joined axis; the one children are concatenated along.
    pub fn last(&self) -> usize {
        match self {
            Self::Single(axis) => *axis,
            Self::Pair([_, axis]) => *axis,
        }
    }
}

impl fmt::Display for JoinAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(axis) => write!(f, "{}", axis),
            Self::Pair([a, b]) => write!(f, "[{}, {}]", a, b),
        }
    }
}

/// Descriptive view of a dataset tree, for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Kind of node, e.g. "Concat" or "Memory".
    pub kind: String,
    /// Optional free-form qualifier (a leaf name, a join mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Shape of the node.
    pub shape: Shape,
    /// Children, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a node with children.
    pub fn new(kind: impl Into<String>, shape: Shape, children: Vec<Node>) -> Self {
        Self {
            kind: kind.into(),
            detail: None,
            shape,
            children,
        }
    }

    /// Attach a qualifier.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// One-line label: kind, optional detail and shape.
    pub fn label(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}({}) {:?}", self.kind, detail, self.shape),
            None => format!("{} {:?}", self.kind, self.shape),
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.label(), indent = depth * 2)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_axis_from_yaml() {
        let single: JoinAxis = serde_yaml::from_str("3").unwrap();
        assert_eq!(single, JoinAxis::Single(3));

        let pair: JoinAxis = serde_yaml::from_str("[1, 3]").unwrap();
        assert_eq!(pair, JoinAxis::Pair([1, 3]));
        assert_eq!(pair.axes(), &[1, 3]);
        assert!(pair.contains(1));
        assert!(!pair.contains(0));
        assert_eq!(pair.last(), 3);
        assert_eq!(pair.to_string(), "[1, 3]");
    }

    #[test]
    fn test_node_display() {
        let leaf = Node::new("Memory", [2, 1, 1, 4], vec![]).with_detail("a");
        let root = Node::new("Concat", [4, 1, 1, 4], vec![leaf.clone(), leaf]);
        let text = root.to_string();
        assert_eq!(
            text,
            "Concat [4, 1, 1, 4]\n  Memory(a) [2, 1, 1, 4]\n  Memory(a) [2, 1, 1, 4]\n"
        );
    }
}
