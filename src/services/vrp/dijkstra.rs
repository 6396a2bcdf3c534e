//! Single-source shortest paths (Dijkstra)

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio_util::sync::CancellationToken;

use crate::services::geo::travel_time_minutes;

use super::error::VrpError;
use super::graph::Graph;

/// Heap pops between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 64;

/// Shortest distances from one source node to every node of a graph
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: usize,
    distances: Vec<f64>,
    predecessors: Vec<Option<usize>>,
}

impl ShortestPaths {
    pub fn source(&self) -> usize {
        self.source
    }

    /// Shortest distance from the source in kilometers
    pub fn distance(&self, node: usize) -> f64 {
        self.distances[node]
    }

    /// Travel time along the shortest path in minutes
    pub fn travel_time(&self, node: usize) -> f64 {
        travel_time_minutes(self.distances[node])
    }

    /// Reachable node furthest from the source, if any besides the source
    pub fn farthest(&self) -> Option<usize> {
        (0..self.distances.len())
            .filter(|&node| node != self.source && self.distances[node].is_finite())
            .max_by(|&a, &b| self.distances[a].total_cmp(&self.distances[b]))
    }

    /// Node sequence from the source to `target`, inclusive
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if !self.distances.get(target)?.is_finite() {
            return None;
        }

        let mut path = vec![target];
        let mut current = target;
        while let Some(previous) = self.predecessors[current] {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        Some(path)
    }
}

/// Frontier entry, ordered so that `BinaryHeap` pops the smallest distance
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrontierEntry {
    distance: f64,
    node: usize,
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Run Dijkstra from `source` over non-negative edge weights.
///
/// Fails with `UnreachableStop` naming the lowest unreachable node, or with
/// `Cancelled` once `cancel` fires.
pub fn shortest_paths(
    graph: &Graph,
    source: usize,
    cancel: &CancellationToken,
) -> Result<ShortestPaths, VrpError> {
    if graph.is_empty() {
        return Err(VrpError::EmptyInput);
    }

    let n = graph.len();
    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors = vec![None; n];
    let mut settled = vec![false; n];
    let mut frontier = BinaryHeap::with_capacity(n);

    distances[source] = 0.0;
    frontier.push(FrontierEntry { distance: 0.0, node: source });

    let mut pops = 0usize;
    while let Some(FrontierEntry { distance, node }) = frontier.pop() {
        pops += 1;
        if pops % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(VrpError::Cancelled);
        }

        // Stale entry superseded by a shorter path
        if settled[node] {
            continue;
        }
        settled[node] = true;

        for edge in graph.neighbors(node) {
            if settled[edge.to] {
                continue;
            }
            let candidate = distance + edge.weight;
            if candidate < distances[edge.to] {
                distances[edge.to] = candidate;
                predecessors[edge.to] = Some(node);
                frontier.push(FrontierEntry { distance: candidate, node: edge.to });
            }
        }
    }

    if let Some(stop_id) = settled.iter().position(|&s| !s) {
        return Err(VrpError::UnreachableStop { stop_id });
    }

    Ok(ShortestPaths {
        source,
        distances,
        predecessors,
    })
}
