//! Service info and health check handlers

use axum::Json;

use crate::services::vrp::ALGORITHM;
use crate::types::{HealthResponse, ServiceInfo};

const SERVICE_NAME: &str = "logichain-route-gateway";

/// `GET /`
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        algorithm: ALGORITHM.to_string(),
        status: "running".to_string(),
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
