//! VRP (Vehicle Routing Problem) engine
//!
//! Pipeline for one request: complete distance graph, Dijkstra from the
//! depot, first-fit-decreasing capacity partitioning, then nearest neighbor
//! + 2-opt sequencing per vehicle.

mod config;
mod dijkstra;
mod error;
mod graph;
mod partition;
mod problem;
mod sequencer;
mod solution;

pub use config::SolverConfig;
pub use dijkstra::shortest_paths;
pub use error::VrpError;
pub use graph::Graph;
pub use partition::partition;
pub use problem::{VrpProblem, DEPOT_ID};
pub use sequencer::Sequencer;
pub use solution::{PlannedRoute, RoutePlan};

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Algorithm label reported to clients
pub const ALGORITHM: &str = "dijkstra+2opt";

/// Route optimizer abstraction (real engine, stubs in tests)
pub trait RouteOptimizer: Send + Sync {
    /// Compute a plan, checking `cancel` cooperatively
    fn optimize(&self, problem: &VrpProblem, cancel: &CancellationToken) -> Result<RoutePlan, VrpError>;

    /// Get optimizer name for logging
    fn name(&self) -> &str;
}

/// Capacitated VRP engine
#[derive(Debug, Clone, Default)]
pub struct VrpEngine {
    config: SolverConfig,
}

impl VrpEngine {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solve a problem end to end
    pub fn solve(&self, problem: &VrpProblem, cancel: &CancellationToken) -> Result<RoutePlan, VrpError> {
        let started_at = Instant::now();

        let graph = Graph::build(&problem.depot, &problem.stops)?;
        let paths = shortest_paths(&graph, DEPOT_ID, cancel)?;
        debug!(
            "Graph ready: {} nodes, {} edges, shortest paths in {} ms",
            graph.len(),
            graph.edge_count(),
            started_at.elapsed().as_millis()
        );
        if let Some(farthest) = paths.farthest() {
            debug!(
                "Farthest stop {} at {:.2} km, path {:?}",
                farthest,
                paths.distance(farthest),
                paths.path_to(farthest).unwrap_or_default()
            );
        }

        let bins = partition(&problem.stops, problem.vehicle_capacity)?;

        let sequencer = Sequencer::new(&graph, &paths, &self.config);
        let routes = bins
            .iter()
            .map(|bin| sequencer.sequence(bin, cancel))
            .collect();
        let plan = RoutePlan::from_routes(routes);

        info!(
            "VRP solved: {} stops ({} demand units), {} vehicles, {:.1} km, {:.0} min in {} ms",
            problem.stops.len(),
            problem.total_demand(),
            plan.routes.len(),
            plan.total_distance_km,
            plan.estimated_time_minutes,
            started_at.elapsed().as_millis()
        );

        Ok(plan)
    }
}

impl RouteOptimizer for VrpEngine {
    fn optimize(&self, problem: &VrpProblem, cancel: &CancellationToken) -> Result<RoutePlan, VrpError> {
        self.solve(problem, cancel)
    }

    fn name(&self) -> &str {
        "VrpEngine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geo::haversine_distance;
    use crate::types::Coordinates;

    fn new_york() -> Coordinates {
        Coordinates { lat: 40.7128, lng: -74.0060 }
    }

    fn manhattan_stops() -> Vec<(f64, f64, f64)> {
        vec![
            (40.7589, -73.9851, 4.0),
            (40.6892, -74.0445, 6.0),
            (40.7505, -73.9934, 3.0),
            (40.7061, -74.0087, 5.0),
            (40.7306, -73.9352, 2.0),
            (40.7831, -73.9712, 7.0),
            (40.6782, -73.9442, 1.0),
            (40.7484, -73.9857, 6.0),
        ]
    }

    fn solve(problem: &VrpProblem) -> RoutePlan {
        VrpEngine::default()
            .solve(problem, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_two_stops_fit_one_vehicle() {
        let problem = VrpProblem::new(
            new_york(),
            &[(40.7128, -74.0060, 5.0), (40.7589, -73.9851, 3.0)],
            1000.0,
        );

        let plan = solve(&problem);

        assert_eq!(plan.routes.len(), 1);
        assert_eq!(plan.routes[0].stops, vec![0, 1, 2, 0]);
        assert_eq!(plan.routes[0].load, 8.0);

        // Stop 1 sits on the depot, so the tour is twice the depot -> stop 2 leg
        let leg = haversine_distance(&new_york(), &problem.stops[1].coordinates);
        assert!((plan.total_distance_km - 2.0 * leg).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_demand_is_rejected() {
        let problem = VrpProblem::new(new_york(), &[(40.7589, -73.9851, 1001.0)], 1000.0);

        let result = VrpEngine::default().solve(&problem, &CancellationToken::new());

        assert_eq!(
            result.unwrap_err(),
            VrpError::CapacityExceeded { stop_id: 1, demand: 1001.0, capacity: 1000.0 }
        );
    }

    #[test]
    fn test_empty_problem_is_rejected() {
        let problem = VrpProblem::new(new_york(), &[], 1000.0);

        let result = VrpEngine::default().solve(&problem, &CancellationToken::new());

        assert_eq!(result.unwrap_err(), VrpError::EmptyInput);
    }

    #[test]
    fn test_plan_invariants_with_several_vehicles() {
        let stops = manhattan_stops();
        let capacity = 10.0;
        let problem = VrpProblem::new(new_york(), &stops, capacity);

        let plan = solve(&problem);

        assert!(plan.routes.len() >= 4);

        let mut covered = Vec::new();
        for route in &plan.routes {
            // Round trip
            assert_eq!(route.stops.first(), Some(&DEPOT_ID));
            assert_eq!(route.stops.last(), Some(&DEPOT_ID));

            // Capacity
            let demand: f64 = route.visits().iter().map(|&id| stops[id - 1].2).sum();
            assert!(demand <= capacity);

            covered.extend_from_slice(route.visits());
        }

        // Coverage without duplicates
        covered.sort_unstable();
        assert_eq!(covered, (1..=stops.len()).collect::<Vec<_>>());

        // Aggregation
        let total: f64 = plan.routes.iter().map(|r| r.distance_km).sum();
        assert!((plan.total_distance_km - total).abs() < 1e-9);
        let longest = plan
            .routes
            .iter()
            .map(|r| r.estimated_time_minutes)
            .fold(0.0, f64::max);
        assert_eq!(plan.estimated_time_minutes, longest);
    }

    #[test]
    fn test_identical_requests_produce_identical_plans() {
        let problem = VrpProblem::new(new_york(), &manhattan_stops(), 12.0);

        let first = solve(&problem);
        let second = solve(&problem);

        assert_eq!(first, second);
    }

    #[test]
    fn test_cancelled_before_start() {
        let problem = VrpProblem::new(new_york(), &manhattan_stops(), 1000.0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Small graphs finish Dijkstra before the first cancellation check,
        // so the engine still hands back a valid unrefined plan
        let plan = VrpEngine::default().solve(&problem, &cancel).unwrap();

        assert_eq!(plan.routes.len(), 1);
        assert_eq!(plan.routes[0].visits().len(), manhattan_stops().len());
    }

    #[test]
    fn test_engine_name() {
        assert_eq!(VrpEngine::default().name(), "VrpEngine");
    }
}
