//! Error types for graph construction and label-map splitting.

use thiserror::Error;

/// Errors raised while assembling a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A node already exists at the given image index. Graphs hold exactly
    /// one node per coordinate.
    #[error("a node already exists at image index [{x}, {y}]")]
    DuplicateNode { x: usize, y: usize },

    /// An edge endpoint refers to a node identifier that was never created.
    #[error("node {id} does not exist (graph has {node_count} nodes)")]
    MissingNode { id: usize, node_count: usize },
}

/// Failures of the shortest-path search. These are per-slice conditions:
/// the splitter logs them and moves on to the next slice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The end node lies in a different connected component than the start
    /// node, so no path exists.
    #[error("end node is unreachable from the start node")]
    EndUnreachable,

    /// A start or end identifier outside the graph's node table.
    #[error("node {id} is not a valid endpoint (graph has {node_count} nodes)")]
    InvalidEndpoint { id: usize, node_count: usize },
}

/// Top-level errors of the splitting operation.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Inverted thresholds, anchors outside the volume, or mismatched
    /// volume dimensions. Fatal: the operation must not silently proceed.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The candidate region contains no pixel inside the threshold window,
    /// so there is nothing to build a graph from.
    #[error("no graph: the candidate region contains no threshold-eligible pixels")]
    EmptyGraph,

    /// Graph assembly failed; indicates a bug in the builder rather than
    /// bad input data.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
