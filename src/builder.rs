//! Image-region-to-graph construction.
//!
//! Scans a rectangular region of an intensity slice, creates one node per
//! pixel whose intensity lies within the configured threshold window, links
//! 4-adjacent node pairs, and assigns weights through the configured
//! [`CostFunction`]. The produced [`Graph`] is handed to the shortest-path
//! solver and dropped afterwards.

use crate::cost::CostFunction;
use crate::error::SplitError;
use crate::graph::Graph;
use crate::volume::{PixelIndex, Region2, ScalarSlice};

/// Builds a weighted graph from a 2D image region.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    lower_threshold: f64,
    upper_threshold: f64,
    cost: CostFunction,
}

impl GraphBuilder {
    /// Builder with an unbounded threshold window: every pixel of the
    /// region becomes a node and the cost function alone steers the path.
    pub fn new(cost: CostFunction) -> GraphBuilder {
        GraphBuilder {
            lower_threshold: f64::NEG_INFINITY,
            upper_threshold: f64::INFINITY,
            cost,
        }
    }

    /// Restrict node membership to intensities in `[lower, upper]`
    /// (inclusive).
    pub fn with_thresholds(mut self, lower: f64, upper: f64) -> GraphBuilder {
        self.lower_threshold = lower;
        self.upper_threshold = upper;
        self
    }

    /// Whether the pixel's intensity lies within the threshold window.
    pub fn is_pixel_a_node(&self, slice: &ScalarSlice, index: PixelIndex) -> bool {
        let intensity = slice.get(index);
        intensity >= self.lower_threshold && intensity <= self.upper_threshold
    }

    /// Whether two coordinates would be linked: both are nodes and
    /// grid-adjacent (4-neighbor, in-plane).
    pub fn is_an_edge(&self, slice: &ScalarSlice, a: PixelIndex, b: PixelIndex) -> bool {
        let dx = a[0].abs_diff(b[0]);
        let dy = a[1].abs_diff(b[1]);
        dx + dy == 1 && self.is_pixel_a_node(slice, a) && self.is_pixel_a_node(slice, b)
    }

    /// Build the graph for `region`.
    ///
    /// # Errors
    /// `Configuration` for an inverted threshold window or a region that
    /// reaches outside the slice; `EmptyGraph` when no pixel passes the
    /// threshold predicate.
    pub fn build(&self, slice: &ScalarSlice, region: Region2) -> Result<Graph, SplitError> {
        self.build_with(slice, region, |_| {})
    }

    /// Like [`build`](Self::build), with a post-processing hook applied to
    /// the finished graph before it is returned (e.g. to mark distinguished
    /// nodes).
    pub fn build_with<F>(
        &self,
        slice: &ScalarSlice,
        region: Region2,
        normalize: F,
    ) -> Result<Graph, SplitError>
    where
        F: FnOnce(&mut Graph),
    {
        if self.lower_threshold > self.upper_threshold {
            return Err(SplitError::Configuration(format!(
                "inverted thresholds: lower {} exceeds upper {}",
                self.lower_threshold, self.upper_threshold
            )));
        }
        let (nx, ny) = slice.dims();
        if region.max[0] >= nx || region.max[1] >= ny {
            return Err(SplitError::Configuration(format!(
                "region max [{}, {}] reaches outside the {}x{} slice",
                region.max[0], region.max[1], nx, ny
            )));
        }

        let mut graph = Graph::new();

        for y in region.min[1]..=region.max[1] {
            for x in region.min[0]..=region.max[0] {
                let index = [x, y];
                if self.is_pixel_a_node(slice, index) {
                    graph.add_node(index, self.cost.node_weight(slice.get(index)))?;
                }
            }
        }

        if graph.node_count() == 0 {
            return Err(SplitError::EmptyGraph);
        }

        // Link each node to its +x and +y neighbor; add_edge creates the
        // reverse twin, so each undirected pair is inserted exactly once.
        for y in region.min[1]..=region.max[1] {
            for x in region.min[0]..=region.max[0] {
                let here = [x, y];
                let Some(source) = graph.node_at(here) else {
                    continue;
                };
                for neighbor in [[x + 1, y], [x, y + 1]] {
                    if !region.contains(neighbor) {
                        continue;
                    }
                    if let Some(target) = graph.node_at(neighbor) {
                        let weight = self.cost.edge_weight(slice.get(here), slice.get(neighbor));
                        graph.add_edge(source, target, weight)?;
                    }
                }
            }
        }

        normalize(&mut graph);
        Ok(graph)
    }
}
