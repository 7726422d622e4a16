//! Lazy, read-only composition of gridded weather datasets
//!
//! This crate combines several four-dimensional datasets (record, variable,
//! ensemble member, spatial point) into one virtual dataset without copying
//! anything until a read is requested:
//!
//! - **Concat**: records of several datasets, end to end
//! - **Grids**: points of several grids, end to end
//! - **Cutout**: a local high-resolution domain fused into a global one
//! - **MultiEncCutout**: a cutout whose global domain has fewer variables
//!
//! # Architecture
//!
//! ```text
//! dataset.get(index)
//!      │
//!      ├─► decompose(index) ──► spans on every axis + changes
//!      │
//!      ├─► read(selection)
//!      │         │
//!      │         ├─► split join axis over children by length
//!      │         │
//!      │         ├─► child.read(local selection)   (recursive)
//!      │         │
//!      │         └─► concatenate pieces along join axis
//!      │
//!      └─► reapply(changes) ──► squeeze integer axes, re-select lists
//!               │
//!               ▼
//!          Return to caller
//! ```
//!
//! # Example
//!
//! ```ignore
//! use field_views::{Combination, CombineOptions, Dataset, Index};
//!
//! let opened = Combination::Cutout.open(vec![lam, globe], CombineOptions::default())?;
//! println!("{}", opened.dataset.tree());
//!
//! // All points of the third record
//! let values = opened.dataset.get(&Index::from(2))?;
//! ```

pub mod combined;
pub mod concat;
pub mod config;
pub mod cutout;
pub mod dataset;
pub mod error;
pub mod factory;
pub mod grids;
pub mod index;
pub mod mask;
pub mod memory;
pub mod multienc;
pub mod types;

// Re-export commonly used types at crate root
pub use combined::{Check, Combined};
pub use concat::Concat;
pub use config::{FootprintMethod, MaskConfig};
pub use cutout::Cutout;
pub use dataset::Dataset;
pub use error::{Result, ViewError};
pub use factory::{
    concat_factory, cutout_factory, grids_factory, multienccutout_factory, Combination,
    CombineOptions, Opened,
};
pub use grids::Grids;
pub use index::{decompose, reapply, split_along_lengths, DimIndex, Index, Selection, Slice, Span};
pub use mask::{cutout_mask, BoundingBoxFootprint, ConvexHullFootprint, Footprint};
pub use memory::MemoryDataset;
pub use multienc::MultiEncCutout;
pub use types::{JoinAxis, Node, Shape};
