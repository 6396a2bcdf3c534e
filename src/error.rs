//! HTTP-facing error type

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::services::vrp::VrpError;
use crate::services::worker_pool::DispatchError;
use crate::types::ErrorBody;

const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded";
const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Every failure the gateway can report to a caller
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed, empty or out-of-range input
    #[error("{0}")]
    Validation(String),

    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,

    /// A stop needs more capacity than any vehicle has
    #[error("{0}")]
    CapacityExceeded(String),

    /// Graph connectivity fault inside the engine
    #[error("stop {0} unreachable from depot")]
    Unreachable(usize),

    #[error("request deadline expired")]
    TimedOut,

    /// Backpressure: worker pool and queue are full
    #[error("worker pool saturated")]
    PoolSaturated,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::CapacityExceeded(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::TimedOut | ApiError::PoolSaturated => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unreachable(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller; internal details stay in the logs
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation(message) | ApiError::CapacityExceeded(message) => message.clone(),
            ApiError::RateLimited => RATE_LIMITED_MESSAGE.to_string(),
            ApiError::TimedOut | ApiError::PoolSaturated => UNAVAILABLE_MESSAGE.to_string(),
            ApiError::Unreachable(_) | ApiError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(ErrorBody { error: self.public_message() })).into_response()
    }
}

impl From<VrpError> for ApiError {
    fn from(err: VrpError) -> Self {
        match err {
            VrpError::EmptyInput | VrpError::InvalidCapacity(_) => ApiError::Validation(err.to_string()),
            VrpError::CapacityExceeded { .. } => ApiError::CapacityExceeded(err.to_string()),
            VrpError::UnreachableStop { stop_id } => ApiError::Unreachable(stop_id),
            // Only deadlines and shutdown cancel jobs
            VrpError::Cancelled => ApiError::TimedOut,
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Saturated => ApiError::PoolSaturated,
            DispatchError::TimedOut(_) => ApiError::TimedOut,
            DispatchError::Failed(reason) => ApiError::Internal(reason),
        }
    }
}
