//! lungsplit-core: left/right lung separation for chest CT label maps.
//!
//! Merged lungs show up in a label map as a single connected component per
//! axial slice. This crate detects those merges, converts the merge zone of
//! the matching CT slice into a weighted graph whose costs encode brightness
//! preference, finds the minimum-cost path between two anchor points with
//! Dijkstra's algorithm, and erodes the label map along the path until the
//! lungs separate.
//!
//! # Modules
//! - `conventions`: packed region/type label codec and the region hierarchy
//! - `volume`: flat-storage volumes, axial slices, the label-map accessor
//! - `components`: 2D connected-component labeling for merge detection
//! - `graph`: dense node/edge graph keyed by stable identifiers
//! - `cost`: exponential/sigmoid/linear intensity-to-cost mapping
//! - `builder`: image-region-to-graph construction
//! - `dijkstra`: minimum-cost path solver
//! - `splitter`: the per-slice splitting pipeline
//! - `nifti_io`: NIfTI I/O for CT volumes and label maps

pub mod builder;
pub mod components;
pub mod conventions;
pub mod cost;
pub mod dijkstra;
pub mod error;
pub mod graph;
pub mod nifti_io;
pub mod splitter;
pub mod volume;

pub use cost::CostFunction;
pub use error::{GraphError, PathError, SplitError};
pub use splitter::{detect_merge, LeftRightSplitter, SplitConfig, SplitReport};
pub use volume::{LabelMap, ScalarVolume};
