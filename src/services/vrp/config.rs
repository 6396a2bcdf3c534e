//! VRP Solver configuration

use crate::defaults::{DEFAULT_SERVICE_TIME_MINUTES, DEFAULT_TWO_OPT_BUDGET_FACTOR};

/// Configuration for the VRP solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Fixed time spent at every stop, in minutes
    pub service_time_minutes: f64,
    /// 2-opt may evaluate at most `factor * n^2` swaps per route
    pub two_opt_budget_factor: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            service_time_minutes: DEFAULT_SERVICE_TIME_MINUTES,
            two_opt_budget_factor: DEFAULT_TWO_OPT_BUDGET_FACTOR,
        }
    }
}

impl SolverConfig {
    /// Create config with custom values
    pub fn new(service_time_minutes: f64, two_opt_budget_factor: usize) -> Self {
        Self {
            service_time_minutes,
            two_opt_budget_factor,
        }
    }

    /// Swap evaluations allowed for a route with `stops` stops
    pub fn two_opt_budget(&self, stops: usize) -> usize {
        self.two_opt_budget_factor
            .saturating_mul(stops)
            .saturating_mul(stops)
    }
}
