//! HTTP message types

use serde::{Deserialize, Serialize};

use crate::services::vrp::{PlannedRoute, RoutePlan};

/// Body of `POST /api/routes/optimize`
///
/// Each stop is `[lat, lng]` or `[lat, lng, demand]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub start_lat: f64,
    pub start_lng: f64,
    pub stops: Vec<Vec<f64>>,
    /// Falls back to the configured default when omitted
    #[serde(default)]
    pub vehicle_capacity: Option<f64>,
}

/// Successful optimization response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    /// Stop ids per vehicle, each starting and ending at depot id 0
    pub routes: Vec<Vec<usize>>,
    /// Sum of route distances in kilometers
    pub total_distance: f64,
    /// Longest route duration in minutes
    pub estimated_time: f64,
    pub vehicles_used: usize,
    pub algorithm: String,
    pub route_details: Vec<RouteDetail>,
}

/// Per-vehicle breakdown of the plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDetail {
    pub vehicle_index: usize,
    pub stops: Vec<usize>,
    pub distance: f64,
    pub estimated_time: f64,
    pub load: f64,
}

impl From<&PlannedRoute> for RouteDetail {
    fn from(route: &PlannedRoute) -> Self {
        Self {
            vehicle_index: route.vehicle_index,
            stops: route.stops.clone(),
            distance: round_to(route.distance_km, 2),
            estimated_time: route.estimated_time_minutes.round(),
            load: route.load,
        }
    }
}

impl OptimizeResponse {
    pub fn from_plan(plan: &RoutePlan, algorithm: &str) -> Self {
        Self {
            routes: plan.routes.iter().map(|r| r.stops.clone()).collect(),
            total_distance: round_to(plan.total_distance_km, 2),
            estimated_time: plan.estimated_time_minutes.round(),
            vehicles_used: plan.routes.len(),
            algorithm: algorithm.to_string(),
            route_details: plan.routes.iter().map(RouteDetail::from).collect(),
        }
    }
}

/// Error body shared by every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `GET /health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

/// `GET /` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub algorithm: String,
    pub status: String,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
