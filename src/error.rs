//! Error type shared by every fallible simulation operation

use thiserror::Error;

/// Errors raised by construction, packing, collision queries and ticking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// The rejection sampler could not place every circle within its budget.
    #[error("cannot pack {count} circles of radius {radius} (best attempt placed {placed})")]
    PackingInfeasible {
        count: usize,
        radius: f64,
        placed: usize,
    },
    /// Collision logic was asked about two balls that are neither siblings
    /// nor a direct parent/child pair.
    #[error("invalid collision query between depth {depth_a} and depth {depth_b}")]
    InvalidCollisionQuery { depth_a: u32, depth_b: u32 },
    /// Configuration rejected before any tick runs.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Time can only move forward.
    #[error("time step must be finite and non-negative, got {0}")]
    NegativeTimeStep(f64),
    /// Arena bounds supplied by the host are unusable.
    #[error("arena bounds must be positive, got {width}x{height}")]
    InvalidArena { width: f64, height: f64 },
}

pub type SimResult<T> = Result<T, SimError>;
