//! Business logic services

pub mod geo;
pub mod rate_limiter;
pub mod vrp;
pub mod worker_pool;
