//! Renderer-facing output
//!
//! The core hands out plain numbers only: centre, radii and depth per ball.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::sim::Ball;

/// What a renderer needs to draw one ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    /// Stable for the lifetime of the tree (until the next reset)
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub depth: u32,
}

impl From<&Ball> for BallView {
    fn from(ball: &Ball) -> Self {
        Self {
            id: ball.id(),
            x: ball.x(),
            y: ball.y(),
            inner_radius: ball.inner_radius(),
            outer_radius: ball.outer_radius(),
            depth: ball.depth(),
        }
    }
}

/// GPU-ready per-instance ring data
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BallInstance {
    pub center: [f32; 2],
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub depth: u32,
    pub _pad: [u32; 3],
}

impl From<&BallView> for BallInstance {
    fn from(view: &BallView) -> Self {
        Self {
            center: [view.x as f32, view.y as f32],
            inner_radius: view.inner_radius as f32,
            outer_radius: view.outer_radius as f32,
            depth: view.depth,
            _pad: [0; 3],
        }
    }
}

/// Byte view of an instance slice, ready for a vertex buffer upload
pub fn instance_bytes(instances: &[BallInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
