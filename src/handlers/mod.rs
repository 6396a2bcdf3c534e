//! HTTP handlers and router

pub mod health;
pub mod route;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::ApiError;
use crate::services::rate_limiter::RateLimiter;
use crate::services::vrp::{RouteOptimizer, VrpEngine, ALGORITHM};
use crate::services::worker_pool::WorkerPool;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request-shaping limits applied before a job reaches the engine
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub default_vehicle_capacity: f64,
    pub max_stops: usize,
}

/// Shared state for every request
pub struct AppState {
    pub limits: RequestLimits,
    pub rate_limiter: Arc<RateLimiter>,
    pub pool: WorkerPool,
    pub optimizer: Arc<dyn RouteOptimizer>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            limits: config.request_limits(),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limiter())),
            pool: WorkerPool::new(config.worker_pool()),
            optimizer: Arc::new(VrpEngine::new(config.solver())),
        }
    }
}

/// Build the router with request-id and tracing layers
pub fn build_router(state: Arc<AppState>) -> Router {
    with_middleware(
        Router::new()
            .route("/", get(health::root))
            .route("/health", get(health::health))
            .route("/api/routes/optimize", post(route::optimize))
            .with_state(state),
    )
}

/// Request-id, trace and panic layers shared by every route
fn with_middleware(router: Router) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(CatchPanicLayer::custom(panic_response)),
    )
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Run the gateway until Ctrl+C
pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config));
    info!("Route optimizer: {} ({})", state.optimizer.name(), ALGORITHM);
    let sweeper = state
        .rate_limiter
        .clone()
        .spawn_sweeper(state.rate_limiter.window());
    let pool = state.pool.clone();

    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        "Listening on {} ({} workers, queue {}, timeout {}s, {} req/{}s per client)",
        addr,
        config.worker_threads,
        config.worker_queue_limit,
        config.request_timeout_secs,
        config.rate_limit_max,
        config.rate_limit_window_secs
    );

    let result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    pool.shutdown();

    result.context("HTTP server failed")?;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}
