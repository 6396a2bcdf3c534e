//! Route plan types

/// Ordered visits of one vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub vehicle_index: usize,
    /// Stop ids, starting and ending at the depot (id 0)
    pub stops: Vec<usize>,
    pub distance_km: f64,
    /// Travel time plus per-stop service time
    pub estimated_time_minutes: f64,
    /// Demand carried by the vehicle
    pub load: f64,
}

impl PlannedRoute {
    /// Stop ids without the depot endpoints
    #[cfg(test)]
    pub fn visits(&self) -> &[usize] {
        match self.stops.len() {
            0..=2 => &[],
            len => &self.stops[1..len - 1],
        }
    }
}

/// Optimized plan for the whole fleet
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub routes: Vec<PlannedRoute>,
    /// Sum over routes; fleet distance is additive
    pub total_distance_km: f64,
    /// Maximum over routes; vehicles drive concurrently
    pub estimated_time_minutes: f64,
}

impl RoutePlan {
    pub fn from_routes(routes: Vec<PlannedRoute>) -> Self {
        let total_distance_km = routes.iter().map(|r| r.distance_km).sum();
        let estimated_time_minutes = routes
            .iter()
            .map(|r| r.estimated_time_minutes)
            .fold(0.0, f64::max);

        Self {
            routes,
            total_distance_km,
            estimated_time_minutes,
        }
    }
}
