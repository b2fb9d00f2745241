//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (child order fixed at construction)
//! - No rendering or platform dependencies

pub mod ball;
pub mod carrier;
pub mod collision;
pub mod kinematics;
pub mod packer;
pub mod state;
pub mod tick;
pub mod vector;

pub use ball::{Ball, BallBuilder, inner_radius_for_depth, mass_for_depth, outer_radius_for_depth};
pub use carrier::{carry_children, containment_correction};
pub use collision::{Pairing, classify};
pub use kinematics::{Axis, KinematicPoint};
pub use packer::{BallPacker, PackingArena};
pub use state::{RngState, Simulation};
pub use tick::{FixedTimestep, TickInput, TickSummary, tick};
pub use vector::Vector;
