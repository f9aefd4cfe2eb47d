//! Single-source shortest path over non-negative edge weights.
//!
//! The solver mirrors the classic Dijkstra discipline: the unvisited
//! candidate with the smallest accumulated weight is finalized each round,
//! and its outgoing edges relax the neighbors. Candidate selection is a
//! linear scan over the node table, so a full run is O(V^2) in the worst
//! case; for the slice-sized graphs this crate builds that is acceptable,
//! and a priority structure would be an optimization rather than a
//! correctness requirement.

use crate::error::PathError;
use crate::graph::{Graph, NodeId};
use crate::volume::PixelIndex;

/// A reconstructed minimum-cost path, ordered start to end inclusive.
#[derive(Debug, Clone)]
pub struct MinCostPath {
    /// Node identifiers along the path.
    pub node_ids: Vec<NodeId>,
    /// Image coordinates of those nodes, in the same order.
    pub indices: Vec<PixelIndex>,
    /// The end node's final accumulated weight; equals the sum of edge
    /// weights along the path.
    pub total_weight: f64,
}

/// Computes the minimum-cost path between two nodes of a [`Graph`].
#[derive(Debug, Clone, Copy)]
pub struct MinCostPathSolver {
    start: NodeId,
    end: NodeId,
}

impl MinCostPathSolver {
    pub fn new(start: NodeId, end: NodeId) -> MinCostPathSolver {
        MinCostPathSolver { start, end }
    }

    /// Run the search and reconstruct the path.
    ///
    /// Search state stored on the graph is reset first, the search stops as
    /// soon as the end node is finalized, and edges along the winning path
    /// are marked `optimal`.
    ///
    /// # Errors
    /// `InvalidEndpoint` if either node id is outside the graph;
    /// `EndUnreachable` if the candidate set drains before the end node is
    /// reached.
    pub fn solve(&self, graph: &mut Graph) -> Result<MinCostPath, PathError> {
        let node_count = graph.node_count();
        for id in [self.start, self.end] {
            if id >= node_count {
                return Err(PathError::InvalidEndpoint { id, node_count });
            }
        }

        run_search(graph, self.start, self.end);

        if !graph.node(self.end).visited {
            return Err(PathError::EndUnreachable);
        }

        // Walk optimal predecessor edges back from the end node, marking
        // them, then flip into start-to-end order.
        let mut node_ids = vec![self.end];
        let mut current = self.end;
        while current != self.start {
            let edge_id = graph
                .node(current)
                .optimal_edge
                .ok_or(PathError::EndUnreachable)?;
            graph.edge_mut(edge_id).optimal = true;
            current = graph.edge(edge_id).source;
            node_ids.push(current);
        }
        node_ids.reverse();

        let indices = node_ids.iter().map(|&id| graph.node(id).index).collect();
        Ok(MinCostPath {
            indices,
            total_weight: graph.node(self.end).accumulated_weight,
            node_ids,
        })
    }
}

/// Dijkstra main loop. Returns the visitation order (used by tests to check
/// the monotone-accumulation invariant).
fn run_search(graph: &mut Graph, start: NodeId, end: NodeId) -> Vec<NodeId> {
    graph.reset_search_state();
    graph.node_mut(start).accumulated_weight = 0.0;
    graph.node_mut(start).added = true;

    let mut visit_order = Vec::new();

    while let Some(current) = lowest_cost_unvisited(graph) {
        graph.node_mut(current).visited = true;
        visit_order.push(current);
        if current == end {
            break;
        }

        let base = graph.node(current).accumulated_weight;
        for slot in 0..graph.node(current).outgoing.len() {
            let edge_id = graph.node(current).outgoing[slot];
            let (target, weight) = {
                let edge = graph.edge(edge_id);
                (edge.target, edge.weight)
            };
            let neighbor = graph.node_mut(target);
            if neighbor.visited {
                continue;
            }
            let candidate = base + weight;
            if candidate < neighbor.accumulated_weight {
                neighbor.accumulated_weight = candidate;
                neighbor.optimal_edge = Some(edge_id);
                neighbor.added = true;
            }
        }
    }

    visit_order
}

/// Linear scan for the unvisited candidate with the smallest accumulated
/// weight. Ties break toward the lowest identifier, which makes runs
/// deterministic.
fn lowest_cost_unvisited(graph: &Graph) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for node in graph.nodes() {
        if !node.added || node.visited {
            continue;
        }
        match best {
            Some((_, weight)) if node.accumulated_weight >= weight => {}
            _ => best = Some((node.id, node.accumulated_weight)),
        }
    }
    best.map(|(id, _)| id)
}
