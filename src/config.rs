//! Configuration management

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{self, Context, Result};

use crate::defaults::*;
use crate::handlers::RequestLimits;
use crate::services::rate_limiter::RateLimiterConfig;
use crate::services::vrp::SolverConfig;
use crate::services::worker_pool::PoolConfig;

/// Application configuration, fixed for the process lifetime
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind the HTTP server to
    pub host: String,

    pub port: u16,

    /// Requests admitted per client per window
    pub rate_limit_max: usize,

    pub rate_limit_window_secs: u64,

    /// Optimization jobs running concurrently
    pub worker_threads: usize,

    /// Optimization jobs allowed to wait for a worker
    pub worker_queue_limit: usize,

    /// Deadline for a dispatched optimization, in seconds
    pub request_timeout_secs: u64,

    /// Capacity used when a request omits `vehicle_capacity`
    pub default_vehicle_capacity: f64,

    pub service_time_minutes: f64,

    /// Upper bound on stops per request
    pub max_stops: usize,

    pub two_opt_budget_factor: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let rate_limit_max = parse_or(&lookup, "RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX)?;
        let rate_limit_window_secs =
            parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", DEFAULT_RATE_LIMIT_WINDOW_SECS)?;

        let worker_threads = parse_or(&lookup, "WORKER_THREADS", default_worker_threads())?;
        let worker_queue_limit = parse_or(
            &lookup,
            "WORKER_QUEUE_LIMIT",
            worker_threads.saturating_mul(DEFAULT_QUEUE_FACTOR),
        )?;
        let request_timeout_secs =
            parse_or(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let default_vehicle_capacity =
            parse_or(&lookup, "DEFAULT_VEHICLE_CAPACITY", DEFAULT_VEHICLE_CAPACITY)?;
        let service_time_minutes =
            parse_or(&lookup, "SERVICE_TIME_MINUTES", DEFAULT_SERVICE_TIME_MINUTES)?;
        let max_stops = parse_or(&lookup, "MAX_STOPS", DEFAULT_MAX_STOPS)?;
        let two_opt_budget_factor =
            parse_or(&lookup, "TWO_OPT_BUDGET_FACTOR", DEFAULT_TWO_OPT_BUDGET_FACTOR)?;

        if rate_limit_max == 0 {
            anyhow::bail!("RATE_LIMIT_MAX must be at least 1");
        }
        if rate_limit_window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be at least 1");
        }
        if worker_threads == 0 {
            anyhow::bail!("WORKER_THREADS must be at least 1");
        }
        if request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }
        if !default_vehicle_capacity.is_finite() || default_vehicle_capacity <= 0.0 {
            anyhow::bail!(
                "DEFAULT_VEHICLE_CAPACITY must be a positive number (current: {})",
                default_vehicle_capacity
            );
        }
        if !service_time_minutes.is_finite() || service_time_minutes < 0.0 {
            anyhow::bail!("SERVICE_TIME_MINUTES must not be negative");
        }
        if max_stops == 0 {
            anyhow::bail!("MAX_STOPS must be at least 1");
        }

        Ok(Self {
            host,
            port,
            rate_limit_max,
            rate_limit_window_secs,
            worker_threads,
            worker_queue_limit,
            request_timeout_secs,
            default_vehicle_capacity,
            service_time_minutes,
            max_stops,
            two_opt_budget_factor,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rate_limiter(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_requests: self.rate_limit_max,
            window: Duration::from_secs(self.rate_limit_window_secs),
        }
    }

    pub fn worker_pool(&self) -> PoolConfig {
        PoolConfig {
            workers: self.worker_threads,
            queue_limit: self.worker_queue_limit,
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn solver(&self) -> SolverConfig {
        SolverConfig::new(self.service_time_minutes, self.two_opt_budget_factor)
    }

    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            default_vehicle_capacity: self.default_vehicle_capacity,
            max_stops: self.max_stops,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        _ => Ok(default),
    }
}
