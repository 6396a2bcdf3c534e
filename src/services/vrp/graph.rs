//! Weighted location graph
//!
//! Node 0 is the depot and node `i` is stop `i`, so node indices double as
//! stop ids in the final routes. `build` produces a complete graph; sparse
//! graphs can be assembled edge by edge with `with_nodes` + `add_edge`.

use crate::services::geo::haversine_distance;

use super::error::VrpError;
use super::problem::{Depot, VrpStop, DEPOT_ID};

/// Outgoing edge in an adjacency list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: usize,
    /// Distance in kilometers
    pub weight: f64,
}

/// Undirected weighted graph with adjacency lists and a dense weight table
#[derive(Debug, Clone)]
pub struct Graph {
    adjacency: Vec<Vec<Edge>>,
    /// Row-major `n * n`; `INFINITY` where no edge exists
    weights: Vec<f64>,
}

impl Graph {
    /// Graph with `n` nodes and no edges
    pub fn with_nodes(n: usize) -> Self {
        let mut weights = vec![f64::INFINITY; n * n];
        for i in 0..n {
            weights[i * n + i] = 0.0;
        }
        Self {
            adjacency: vec![Vec::new(); n],
            weights,
        }
    }

    /// Complete graph over the depot and all stops
    pub fn build(depot: &Depot, stops: &[VrpStop]) -> Result<Self, VrpError> {
        if stops.is_empty() {
            return Err(VrpError::EmptyInput);
        }

        let mut points = Vec::with_capacity(stops.len() + 1);
        points.push(depot.coordinates);
        points.extend(stops.iter().map(|s| s.coordinates));

        let n = points.len();
        let mut graph = Self::with_nodes(n);
        for adjacency in &mut graph.adjacency {
            adjacency.reserve(n - 1);
        }

        for i in 0..n {
            for j in (i + 1)..n {
                graph.add_edge(i, j, haversine_distance(&points[i], &points[j]));
            }
        }

        debug_assert_eq!(graph.adjacency[DEPOT_ID].len(), n - 1);
        Ok(graph)
    }

    /// Add an undirected edge; both directions get the same weight
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        let n = self.len();
        assert!(a < n && b < n, "edge ({a}, {b}) outside graph of {n} nodes");
        assert!(weight >= 0.0, "edge weights must be non-negative");

        self.adjacency[a].push(Edge { to: b, weight });
        if a != b {
            self.adjacency[b].push(Edge { to: a, weight });
        }
        self.weights[a * n + b] = weight;
        self.weights[b * n + a] = weight;
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn neighbors(&self, node: usize) -> &[Edge] {
        &self.adjacency[node]
    }

    /// Direct edge weight, `INFINITY` when the nodes are not adjacent
    pub fn weight(&self, a: usize, b: usize) -> f64 {
        self.weights[a * self.len() + b]
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }
}
