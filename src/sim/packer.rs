//! Non-overlapping random packing of equal circles
//!
//! Rejection sampling: each circle draws candidates uniformly in the valid
//! band until one fits. A circle that exhausts its budget throws away the
//! whole batch and the batch restarts. Packing is fallible; dense requests
//! (roughly `n * (2r)^2` near the arena area) are expected to fail.

use glam::DVec2;
use rand::Rng;

use crate::config::{PackingMode, SimConfig};
use crate::consts::{MAX_BATCH_RESTARTS, MAX_TRIES_PER_POINT};
use crate::error::{SimError, SimResult};

/// Region the circles must fit inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PackingArena {
    Circle { center: DVec2, radius: f64 },
    Rect { center: DVec2, width: f64, height: f64 },
}

impl PackingArena {
    /// Half extents of the square/rectangle candidates are drawn from,
    /// already shrunk by the circle radius
    fn candidate_half_extents(&self, radius: f64) -> DVec2 {
        match *self {
            PackingArena::Circle { radius: bound, .. } => DVec2::splat(bound - radius),
            PackingArena::Rect { width, height, .. } => {
                DVec2::new(width / 2.0 - radius, height / 2.0 - radius)
            }
        }
    }

    pub fn center(&self) -> DVec2 {
        match *self {
            PackingArena::Circle { center, .. } | PackingArena::Rect { center, .. } => center,
        }
    }

    /// Whether a circle of `radius` at `point` lies within the bound
    pub fn contains(&self, point: DVec2, radius: f64) -> bool {
        match *self {
            PackingArena::Circle { center, radius: bound } => point.distance(center) + radius <= bound,
            PackingArena::Rect {
                center,
                width,
                height,
            } => {
                let d = (point - center).abs();
                d.x + radius <= width / 2.0 && d.y + radius <= height / 2.0
            }
        }
    }
}

/// Rejection-sampling circle packer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallPacker {
    pub max_tries_per_point: u32,
    pub max_batch_restarts: u32,
    pub mode: PackingMode,
}

impl Default for BallPacker {
    fn default() -> Self {
        Self {
            max_tries_per_point: MAX_TRIES_PER_POINT,
            max_batch_restarts: MAX_BATCH_RESTARTS,
            mode: PackingMode::Strict,
        }
    }
}

impl BallPacker {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            max_tries_per_point: config.max_tries_per_point,
            max_batch_restarts: config.max_batch_restarts,
            mode: config.packing,
        }
    }

    /// Place `count` centers of circles of `radius`, pairwise at least
    /// `2 * radius` apart and inside `arena`
    pub fn pack<R: Rng>(
        &self,
        count: usize,
        radius: f64,
        arena: &PackingArena,
        rng: &mut R,
    ) -> SimResult<Vec<DVec2>> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "packing radius must be non-negative, got {radius}"
            )));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let half = arena.candidate_half_extents(radius);
        if !(half.x >= 0.0 && half.y >= 0.0) {
            // Not even one circle fits
            return self.give_up(count, radius, Vec::new());
        }

        let mut best: Vec<DVec2> = Vec::new();
        for restart in 0..self.max_batch_restarts {
            let placed = self.try_batch(count, radius, arena, half, rng);
            if placed.len() == count {
                if restart > 0 {
                    log::debug!("Packed {} circles (r={:.2}) after {} restarts", count, radius, restart);
                }
                return Ok(placed);
            }
            if placed.len() > best.len() {
                best = placed;
            }
        }

        self.give_up(count, radius, best)
    }

    fn give_up(&self, count: usize, radius: f64, best: Vec<DVec2>) -> SimResult<Vec<DVec2>> {
        match self.mode {
            PackingMode::Strict => Err(SimError::PackingInfeasible {
                count,
                radius,
                placed: best.len(),
            }),
            PackingMode::Lenient => {
                log::warn!(
                    "Packing {} circles (r={:.2}) infeasible, keeping {} placed",
                    count,
                    radius,
                    best.len()
                );
                Ok(best)
            }
        }
    }

    /// One batch; returns early with the partial placement when a circle
    /// cannot be placed within its budget
    fn try_batch<R: Rng>(
        &self,
        count: usize,
        radius: f64,
        arena: &PackingArena,
        half: DVec2,
        rng: &mut R,
    ) -> Vec<DVec2> {
        let center = arena.center();
        let min_separation = 2.0 * radius;
        let mut placed: Vec<DVec2> = Vec::with_capacity(count);

        for _ in 0..count {
            let mut accepted = None;
            for _ in 0..self.max_tries_per_point {
                let candidate = DVec2::new(
                    center.x + rng.random_range(-half.x..=half.x),
                    center.y + rng.random_range(-half.y..=half.y),
                );
                let clear = placed.iter().all(|p| p.distance(candidate) >= min_separation);
                if clear && arena.contains(candidate, radius) {
                    accepted = Some(candidate);
                    break;
                }
            }
            match accepted {
                Some(point) => placed.push(point),
                None => return placed,
            }
        }
        placed
    }
}
