//! Route optimization handler
//!
//! Admission order: rate limit, body validation, worker pool dispatch under
//! a deadline. The engine never sees a request that failed an earlier step.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::Json;
use tracing::{debug, info, warn};

use super::{AppState, RequestLimits, REQUEST_ID_HEADER};
use crate::defaults::DEFAULT_STOP_DEMAND;
use crate::error::ApiError;
use crate::services::vrp::{RoutePlan, VrpError, VrpProblem, ALGORITHM};
use crate::services::worker_pool::DispatchError;
use crate::types::{Coordinates, OptimizeRequest, OptimizeResponse};

/// Only inbound header used for client identity
pub const CLIENT_TOKEN_HEADER: &str = "x-client-token";

const ANONYMOUS_CLIENT: &str = "anonymous";

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Lifecycle of an optimize request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Admitted,
    Dispatched,
    Completed,
    TimedOut,
    UpstreamError,
    Responded,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Admitted => "admitted",
            RequestState::Dispatched => "dispatched",
            RequestState::Completed => "completed",
            RequestState::TimedOut => "timed_out",
            RequestState::UpstreamError => "upstream_error",
            RequestState::Responded => "responded",
        }
    }
}

fn transition(request_id: &str, state: RequestState) {
    debug!("[{}] {}", request_id, state.as_str());
}

/// `POST /api/routes/optimize`
pub async fn optimize(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let client = client_identity(&request);

    if !state.rate_limiter.check_and_record(&client) {
        warn!("[{}] Rate limit exceeded for client {}", request_id, client);
        return Err(ApiError::RateLimited);
    }
    transition(&request_id, RequestState::Admitted);

    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read request body: {}", e)))?;
    let payload: OptimizeRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?;
    let problem = build_problem(payload, &state.limits)?;
    let stop_count = problem.stops.len();

    let optimizer = state.optimizer.clone();
    debug!(
        "[{}] {} stops, {} pool slots free",
        request_id,
        stop_count,
        state.pool.available_slots()
    );
    transition(&request_id, RequestState::Dispatched);
    let outcome = state
        .pool
        .dispatch(move |cancel| optimizer.optimize(&problem, &cancel))
        .await;

    let (settled, result) = settle(outcome);
    transition(&request_id, settled);

    let response = result.map(|plan| {
        info!(
            "[{}] Optimized {} stops into {} routes for client {}",
            request_id,
            stop_count,
            plan.routes.len(),
            client
        );
        Json(OptimizeResponse::from_plan(&plan, ALGORITHM))
    });
    transition(&request_id, RequestState::Responded);

    response
}

/// Map a dispatch outcome to its terminal state and response
fn settle(
    outcome: Result<Result<RoutePlan, VrpError>, DispatchError>,
) -> (RequestState, Result<RoutePlan, ApiError>) {
    match outcome {
        Ok(Ok(plan)) => (RequestState::Completed, Ok(plan)),
        Ok(Err(VrpError::Cancelled)) | Err(DispatchError::TimedOut(_)) => {
            (RequestState::TimedOut, Err(ApiError::TimedOut))
        }
        Ok(Err(e)) => (RequestState::UpstreamError, Err(e.into())),
        Err(e) => (RequestState::UpstreamError, Err(e.into())),
    }
}

/// Client token if present, else peer IP, else `"anonymous"`
///
/// Tokens are caller-supplied and not authenticated, so the limit applies
/// per token: one host presenting several tokens gets a window for each.
pub fn client_identity(request: &Request) -> String {
    let token = request
        .headers()
        .get(CLIENT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = token {
        return token.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

/// Validate a request body and apply defaults
pub fn build_problem(request: OptimizeRequest, limits: &RequestLimits) -> Result<VrpProblem, ApiError> {
    let depot = Coordinates::new(request.start_lat, request.start_lng);
    if !depot.is_valid() {
        return Err(ApiError::Validation(format!(
            "Invalid start coordinates: ({}, {})",
            request.start_lat, request.start_lng
        )));
    }

    if request.stops.is_empty() {
        return Err(ApiError::Validation("No stops provided".to_string()));
    }
    if request.stops.len() > limits.max_stops {
        return Err(ApiError::Validation(format!(
            "Too many stops: {} (maximum {})",
            request.stops.len(),
            limits.max_stops
        )));
    }

    let capacity = request
        .vehicle_capacity
        .unwrap_or(limits.default_vehicle_capacity);
    if !capacity.is_finite() || capacity <= 0.0 {
        return Err(ApiError::Validation(format!(
            "vehicle_capacity must be a positive number, got {}",
            capacity
        )));
    }

    let stops = request
        .stops
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_stop(i + 1, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VrpProblem::new(depot, &stops, capacity))
}

fn parse_stop(stop_id: usize, entry: &[f64]) -> Result<(f64, f64, f64), ApiError> {
    let (lat, lng, demand) = match *entry {
        [lat, lng] => (lat, lng, DEFAULT_STOP_DEMAND),
        [lat, lng, demand] => (lat, lng, demand),
        _ => {
            return Err(ApiError::Validation(format!(
                "Stop {} must be [lat, lng] or [lat, lng, demand]",
                stop_id
            )))
        }
    };

    if !Coordinates::new(lat, lng).is_valid() {
        return Err(ApiError::Validation(format!(
            "Stop {} has invalid coordinates: ({}, {})",
            stop_id, lat, lng
        )));
    }
    if !demand.is_finite() || demand < 0.0 {
        return Err(ApiError::Validation(format!(
            "Stop {} has invalid demand: {}",
            stop_id, demand
        )));
    }

    Ok((lat, lng, demand))
}
