//! Nested Balls - a fractal hierarchy of bouncing circles
//!
//! Every ball may carry a cluster of smaller balls, which carry smaller balls
//! of their own, down to a fixed depth. Siblings bounce elastically off each
//! other, children bounce off the inner boundary of their parent, and the
//! outermost balls bounce off a rectangular arena.
//!
//! Core modules:
//! - `sim`: Deterministic simulation (vectors, kinematics, packing, collisions)
//! - `config`: Explicit tuning values threaded through construction
//! - `view`: Numeric state handed to an external renderer
//! - `error`: Failure modes of construction and ticking

pub mod config;
pub mod error;
pub mod sim;
pub mod view;

pub use config::{AntiOscillation, CollisionCheck, PackingMode, SimConfig};
pub use error::{SimError, SimResult};
pub use sim::{Simulation, TickInput, TickSummary, tick};
pub use view::{BallInstance, BallView};

/// Stock tuning values
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the rate the lookahead is tuned for)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default arena dimensions
    pub const ARENA_WIDTH: f64 = 1280.0;
    pub const ARENA_HEIGHT: f64 = 960.0;

    /// Inner radius of a depth-0 ball
    pub const BASE_RADIUS: f64 = 160.0;
    /// Inner radius shrinks by this factor per depth
    pub const LAYER_RATIO: f64 = 4.5;
    /// Outer radius = inner radius * this
    pub const OUTER_RADIUS_RATIO: f64 = 1.1;
    /// mass(depth) = MASS_BASE^(max_depth - depth)
    pub const MASS_BASE: f64 = 64.0;
    /// Per-tick velocity damping base for deep balls
    pub const DECELERATION: f64 = 0.997;
    /// Slight energy injection on every bounce
    pub const BOUNCE_MULTIPLIER: f64 = 1.00001;
    /// How far ahead will-collide tests look
    pub const LOOKAHEAD_DT: f64 = 1.0 / 60.0;

    /// Root speed range (units/s)
    pub const ROOT_SPEED_MIN: f64 = 20.0;
    pub const ROOT_SPEED_MAX: f64 = 50.0;
    /// Child velocity jitter range
    pub const CHILD_JITTER_MIN: f64 = 0.5;
    pub const CHILD_JITTER_MAX: f64 = 1.2;

    /// Inward nudge applied when a root sits on a wall already moving inward
    pub const BOUNDARY_NUDGE: f64 = 0.1;

    /// Packer budgets
    pub const MAX_TRIES_PER_POINT: u32 = 1000;
    pub const MAX_BATCH_RESTARTS: u32 = 100;
}
