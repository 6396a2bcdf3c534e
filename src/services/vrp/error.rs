//! Route optimization errors

use thiserror::Error;

/// Failures raised by the optimization pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VrpError {
    /// Optimization request with zero stops
    #[error("No stops provided")]
    EmptyInput,

    #[error("Vehicle capacity must be a positive number, got {0}")]
    InvalidCapacity(f64),

    /// A single stop cannot fit into any vehicle
    #[error("Stop {stop_id} demand {demand} exceeds vehicle capacity {capacity}")]
    CapacityExceeded {
        stop_id: usize,
        demand: f64,
        capacity: f64,
    },

    /// Graph is disconnected; never expected for complete graphs
    #[error("Stop {stop_id} is unreachable from the depot")]
    UnreachableStop { stop_id: usize },

    #[error("Optimization cancelled")]
    Cancelled,
}
