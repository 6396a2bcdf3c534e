//! VRP Problem types

use crate::types::Coordinates;

/// Node id reserved for the depot in graphs and routes
pub const DEPOT_ID: usize = 0;

/// VRP Problem definition
#[derive(Debug, Clone)]
pub struct VrpProblem {
    /// Starting and ending point of every route
    pub depot: Depot,
    /// Stops to visit, ids 1..=n in input order
    pub stops: Vec<VrpStop>,
    /// Capacity shared by every vehicle in the fleet
    pub vehicle_capacity: f64,
}

/// Depot (starting/ending point)
#[derive(Debug, Clone, Copy)]
pub struct Depot {
    pub coordinates: Coordinates,
}

/// A delivery stop
#[derive(Debug, Clone, Copy)]
pub struct VrpStop {
    /// Ordinal id; input position + 1 since 0 is the depot
    pub id: usize,
    pub coordinates: Coordinates,
    /// Units of vehicle capacity consumed by this stop
    pub demand: f64,
}

impl VrpProblem {
    /// Build a problem from `(lat, lng, demand)` tuples, numbering stops from 1
    pub fn new(depot: Coordinates, stops: &[(f64, f64, f64)], vehicle_capacity: f64) -> Self {
        Self {
            depot: Depot { coordinates: depot },
            stops: stops
                .iter()
                .enumerate()
                .map(|(i, &(lat, lng, demand))| VrpStop {
                    id: i + 1,
                    coordinates: Coordinates { lat, lng },
                    demand,
                })
                .collect(),
            vehicle_capacity,
        }
    }

    pub fn total_demand(&self) -> f64 {
        self.stops.iter().map(|s| s.demand).sum()
    }
}
