//! Per-vehicle visiting order: nearest neighbor + 2-opt

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::services::geo::travel_time_minutes;

use super::config::SolverConfig;
use super::dijkstra::ShortestPaths;
use super::graph::Graph;
use super::partition::VehicleBin;
use super::problem::DEPOT_ID;
use super::solution::PlannedRoute;

/// Minimum gain for a 2-opt swap to count as an improvement (km)
const IMPROVEMENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
enum TwoOptOutcome {
    /// No improving swap left
    Converged(Vec<usize>),
    /// Cancelled mid-search; the tour is valid but partially refined
    Cancelled(Vec<usize>),
    /// Swap evaluation budget ran out before convergence
    BudgetExhausted,
}

/// Orders the stops of each vehicle bin into a depot-to-depot tour.
///
/// Legs touching the depot are priced from the depot shortest paths, so
/// `paths` must be computed from `DEPOT_ID`.
pub struct Sequencer<'a> {
    graph: &'a Graph,
    paths: &'a ShortestPaths,
    config: &'a SolverConfig,
}

impl<'a> Sequencer<'a> {
    pub fn new(graph: &'a Graph, paths: &'a ShortestPaths, config: &'a SolverConfig) -> Self {
        debug_assert_eq!(paths.source(), DEPOT_ID);
        Self { graph, paths, config }
    }

    /// Build the route for one vehicle. Never fails: budget exhaustion falls
    /// back to the nearest-neighbor tour and cancellation keeps the best
    /// tour found so far.
    pub fn sequence(&self, bin: &VehicleBin, cancel: &CancellationToken) -> PlannedRoute {
        let initial = self.nearest_neighbor(&bin.stop_ids);

        let tour = match self.two_opt(initial.clone(), cancel) {
            TwoOptOutcome::Converged(tour) => tour,
            TwoOptOutcome::Cancelled(tour) => {
                debug!("2-opt cancelled for vehicle {}", bin.vehicle_index);
                tour
            }
            TwoOptOutcome::BudgetExhausted => {
                warn!(
                    "2-opt budget exhausted for vehicle {} ({} stops), using nearest-neighbor tour",
                    bin.vehicle_index,
                    bin.stop_ids.len()
                );
                initial
            }
        };

        self.build_route(bin, tour)
    }

    /// Cost of travelling between two nodes in kilometers
    fn leg(&self, from: usize, to: usize) -> f64 {
        if from == DEPOT_ID {
            self.paths.distance(to)
        } else if to == DEPOT_ID {
            self.paths.distance(from)
        } else {
            self.graph.weight(from, to)
        }
    }

    /// Travel time between two nodes in minutes
    fn leg_minutes(&self, from: usize, to: usize) -> f64 {
        if from == DEPOT_ID {
            self.paths.travel_time(to)
        } else if to == DEPOT_ID {
            self.paths.travel_time(from)
        } else {
            travel_time_minutes(self.graph.weight(from, to))
        }
    }

    fn tour_length(&self, tour: &[usize]) -> f64 {
        tour.windows(2).map(|w| self.leg(w[0], w[1])).sum()
    }

    /// Nearest neighbor heuristic
    /// Returns the full tour `[0, ..., 0]`; ties go to the lower stop id
    fn nearest_neighbor(&self, stop_ids: &[usize]) -> Vec<usize> {
        let mut remaining = stop_ids.to_vec();
        remaining.sort_unstable();

        let mut tour = Vec::with_capacity(remaining.len() + 2);
        tour.push(DEPOT_ID);

        let mut current = DEPOT_ID;
        while !remaining.is_empty() {
            let mut best_pos = 0;
            let mut best_distance = f64::INFINITY;

            for (pos, &candidate) in remaining.iter().enumerate() {
                let distance = self.leg(current, candidate);
                if distance < best_distance {
                    best_distance = distance;
                    best_pos = pos;
                }
            }

            current = remaining.remove(best_pos);
            tour.push(current);
        }

        tour.push(DEPOT_ID);
        tour
    }

    /// 2-opt local search improvement
    fn two_opt(&self, mut tour: Vec<usize>, cancel: &CancellationToken) -> TwoOptOutcome {
        let stops = tour.len().saturating_sub(2);
        if stops < 3 {
            return TwoOptOutcome::Converged(tour);
        }

        let budget = self.config.two_opt_budget(stops);
        let mut evaluations = 0usize;

        loop {
            let mut improved = false;

            for i in 0..tour.len() - 3 {
                if cancel.is_cancelled() {
                    return TwoOptOutcome::Cancelled(tour);
                }

                for j in (i + 2)..(tour.len() - 1) {
                    if evaluations >= budget {
                        return TwoOptOutcome::BudgetExhausted;
                    }
                    evaluations += 1;

                    // Replace edges (a, b) and (c, d) with (a, c) and (b, d)
                    let (a, b, c, d) = (tour[i], tour[i + 1], tour[j], tour[j + 1]);
                    let delta = self.leg(a, c) + self.leg(b, d) - self.leg(a, b) - self.leg(c, d);

                    if delta < -IMPROVEMENT_EPSILON {
                        tour[i + 1..=j].reverse();
                        improved = true;
                    }
                }
            }

            if !improved {
                debug!("2-opt converged after {} evaluations", evaluations);
                return TwoOptOutcome::Converged(tour);
            }
        }
    }

    fn build_route(&self, bin: &VehicleBin, tour: Vec<usize>) -> PlannedRoute {
        let distance_km = self.tour_length(&tour);
        let travel_minutes: f64 = tour
            .windows(2)
            .map(|w| self.leg_minutes(w[0], w[1]))
            .sum();
        let service_minutes = self.config.service_time_minutes * bin.stop_ids.len() as f64;

        PlannedRoute {
            vehicle_index: bin.vehicle_index,
            stops: tour,
            distance_km,
            estimated_time_minutes: travel_minutes + service_minutes,
            load: bin.load,
        }
    }
}
