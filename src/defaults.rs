pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_RATE_LIMIT_MAX: usize = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_QUEUE_FACTOR: usize = 4;

pub const DEFAULT_VEHICLE_CAPACITY: f64 = 1000.0;
pub const DEFAULT_STOP_DEMAND: f64 = 1.0;
pub const DEFAULT_MAX_STOPS: usize = 1000;

pub const DEFAULT_SERVICE_TIME_MINUTES: f64 = 5.0;
pub const DEFAULT_TWO_OPT_BUDGET_FACTOR: usize = 50;

/// One worker per available execution unit
pub fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
