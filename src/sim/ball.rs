//! Recursive ball tree and its collision engine
//!
//! Each `Ball` exclusively owns its cluster of children. Parent geometry is
//! never stored on the child; operations that need it walk down from the
//! parent and pass it along.

use std::collections::HashMap;

use glam::DVec2;
use rand::Rng;

use super::carrier::carry_children;
use super::collision::{
    Pairing, bounce_pair, classify, escapes_inner_boundary, inner_boundary_point, rims_overlap,
};
use super::kinematics::{Axis, KinematicPoint};
use super::packer::{BallPacker, PackingArena};
use super::vector::Vector;
use crate::config::{AntiOscillation, CollisionCheck, SimConfig};
use crate::error::SimResult;
use crate::view::BallView;

/// innerRadius(d) = base_radius * layer_ratio^-d
pub fn inner_radius_for_depth(config: &SimConfig, depth: u32) -> f64 {
    config.base_radius * config.layer_ratio.powf(-(depth as f64))
}

pub fn outer_radius_for_depth(config: &SimConfig, depth: u32) -> f64 {
    inner_radius_for_depth(config, depth) * config.outer_radius_ratio
}

/// Shallower balls are heavier: mass_base^(max_depth - depth)
pub fn mass_for_depth(config: &SimConfig, depth: u32) -> f64 {
    let levels_below = config.max_depth().saturating_sub(depth);
    config.mass_base.powi(levels_below as i32)
}

/// A node of the ball tree
#[derive(Debug, Clone)]
pub struct Ball {
    id: u32,
    depth: u32,
    max_depth: u32,
    inner_radius: f64,
    outer_radius: f64,
    kinematics: KinematicPoint,
    children: Vec<Ball>,
    /// Neighbor id -> ticks left before that pair may bounce again
    recent_bounces: HashMap<u32, u32>,
}

impl Ball {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn is_leaf(&self) -> bool {
        self.depth >= self.max_depth
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.kinematics.x()
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.kinematics.y()
    }

    #[inline]
    pub fn position(&self) -> DVec2 {
        self.kinematics.position
    }

    pub fn velocity(&self) -> Vector {
        self.kinematics.velocity
    }

    pub fn mass(&self) -> f64 {
        self.kinematics.mass
    }

    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }

    pub fn kinematics(&self) -> &KinematicPoint {
        &self.kinematics
    }

    pub fn children(&self) -> &[Ball] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Ball] {
        &mut self.children
    }

    pub(crate) fn set_kinematics(&mut self, kinematics: KinematicPoint) {
        self.kinematics = kinematics;
    }

    /// Number of balls below this one
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    // === Collision queries ===

    /// Touch test on current positions
    pub fn is_colliding_with(&self, other: &Ball) -> SimResult<bool> {
        self.touches_after(other, 0.0)
    }

    /// Touch test on positions `lookahead` seconds ahead
    pub fn will_collide_with(&self, other: &Ball, lookahead: f64) -> SimResult<bool> {
        self.touches_after(other, lookahead)
    }

    fn touches_after(&self, other: &Ball, dt: f64) -> SimResult<bool> {
        let a = self.kinematics.projected_position(dt);
        let b = other.kinematics.projected_position(dt);
        Ok(match classify(self.depth, other.depth)? {
            Pairing::Siblings => rims_overlap(a, self.outer_radius, b, other.outer_radius),
            Pairing::ParentOfSecond => {
                escapes_inner_boundary(b, other.outer_radius, a, self.inner_radius)
            }
            Pairing::ChildOfSecond => {
                escapes_inner_boundary(a, self.outer_radius, b, other.inner_radius)
            }
        })
    }

    /// Whether the pair is closing along its line of contact
    ///
    /// Siblings compare centres. A child is compared against the point of
    /// its parent's inner boundary that lies in the child's direction.
    pub fn is_converging_with(&self, other: &Ball) -> SimResult<bool> {
        Ok(match classify(self.depth, other.depth)? {
            Pairing::Siblings => self.kinematics.is_converging_on(&other.kinematics),
            Pairing::ParentOfSecond => other.converges_on_inner_boundary_of(self),
            Pairing::ChildOfSecond => self.converges_on_inner_boundary_of(other),
        })
    }

    fn converges_on_inner_boundary_of(&self, parent: &Ball) -> bool {
        let boundary = inner_boundary_point(&parent.kinematics, parent.inner_radius, self.position());
        self.kinematics.is_converging_on(&boundary)
    }

    fn needs_bounce_with(&self, other: &Ball, config: &SimConfig) -> SimResult<bool> {
        let touching = match config.collision_check {
            CollisionCheck::Lookahead => self.will_collide_with(other, config.lookahead_dt)?,
            CollisionCheck::Current => self.is_colliding_with(other)?,
        };
        if !touching {
            return Ok(false);
        }
        match config.anti_oscillation {
            AntiOscillation::Convergence => self.is_converging_with(other),
            AntiOscillation::Debounce { .. } => Ok(!self.recent_bounces.contains_key(&other.id)
                && !other.recent_bounces.contains_key(&self.id)),
        }
    }

    fn decay_bounce_memory(&mut self) {
        self.recent_bounces.retain(|_, ticks| {
            *ticks = ticks.saturating_sub(1);
            *ticks > 0
        });
    }

    // === Per-tick passes ===

    /// Depth-first collision pass over this ball's subtree; velocities only.
    /// Returns the number of bounces.
    pub fn resolve_collisions(&mut self, config: &SimConfig) -> SimResult<usize> {
        self.decay_bounce_memory();

        let mut bounces = 0;
        for i in 0..self.children.len() {
            if self.needs_bounce_with(&self.children[i], config)? {
                let (parent, child) = bounce_pair(
                    &self.kinematics,
                    &self.children[i].kinematics,
                    config.bounce_multiplier,
                );
                self.kinematics = parent;
                self.children[i].kinematics = child;

                if let AntiOscillation::Debounce { ticks } = config.anti_oscillation {
                    let (parent_id, child_id) = (self.id, self.children[i].id);
                    self.recent_bounces.insert(child_id, ticks);
                    self.children[i].recent_bounces.insert(parent_id, ticks);
                }
                log::trace!("Ball {} bounced inside {}", self.children[i].id, self.id);
                bounces += 1;
            }

            bounces += resolve_sibling_pairs(&mut self.children, i, config)?;
            bounces += self.children[i].resolve_collisions(config)?;
        }
        Ok(bounces)
    }

    /// Move this subtree forward by `dt`, keeping every cluster inside its
    /// parent. Returns the number of containment corrections applied.
    ///
    /// The displacement of this tick uses the current velocity; the velocity
    /// stored for the next tick is the damped one.
    pub fn advance(&mut self, dt: f64, config: &SimConfig) -> SimResult<usize> {
        let exponent = self.depth.saturating_sub(1) as i32;
        let damped = self.kinematics.velocity * config.deceleration.powi(exponent);

        self.kinematics = self.kinematics.advance(dt)?;
        let mut carried = carry_children(self);
        for child in &mut self.children {
            carried += child.advance(dt, config)?;
        }
        carried += carry_children(self);

        self.kinematics = self.kinematics.with_velocity(damped);
        Ok(carried)
    }

    /// Keep a root ball inside the `width` x `height` arena. Returns the
    /// number of velocity reflections. Nested balls never touch the arena
    /// and are left alone.
    pub(crate) fn reflect_off_bounds(&mut self, width: f64, height: f64, nudge: f64) -> usize {
        if self.depth != 0 {
            return 0;
        }
        let r = self.outer_radius;
        let mut reflections = 0;

        let crossed = self.y() - r < 0.0;
        reflections += self.bounce_off_wall(Axis::Y, crossed, -1.0, nudge) as usize;
        let crossed = self.y() + r > height;
        reflections += self.bounce_off_wall(Axis::Y, crossed, 1.0, nudge) as usize;
        let crossed = self.x() - r < 0.0;
        reflections += self.bounce_off_wall(Axis::X, crossed, -1.0, nudge) as usize;
        let crossed = self.x() + r > width;
        reflections += self.bounce_off_wall(Axis::X, crossed, 1.0, nudge) as usize;

        reflections
    }

    /// `outward` is +1 for the wall on the positive side of `axis`, -1 otherwise
    fn bounce_off_wall(&mut self, axis: Axis, crossed: bool, outward: f64, nudge: f64) -> bool {
        if !crossed {
            return false;
        }
        let v = self.kinematics.velocity;
        let along = match axis {
            Axis::X => v.x(),
            Axis::Y => v.y(),
        };
        if along * outward > 0.0 {
            self.kinematics = self.kinematics.reverse_axis(axis);
            true
        } else {
            // Already heading back in; step off the wall so it cannot stick
            let step = -outward * nudge;
            let offset = match axis {
                Axis::X => Vector::cartesian(step, 0.0),
                Axis::Y => Vector::cartesian(0.0, step),
            };
            self.translate_subtree(offset);
            false
        }
    }

    /// Move this ball and everything it carries
    pub(crate) fn translate_subtree(&mut self, offset: Vector) {
        self.kinematics = self.kinematics.translate(offset);
        for child in &mut self.children {
            child.translate_subtree(offset);
        }
    }

    // === Whole-subtree readouts ===

    /// Depth-first, parent before children
    pub fn collect_views(&self, out: &mut Vec<BallView>) {
        out.push(BallView::from(self));
        for child in &self.children {
            child.collect_views(out);
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.kinematics.kinetic_energy()
            + self.children.iter().map(Ball::kinetic_energy).sum::<f64>()
    }

    pub fn is_finite(&self) -> bool {
        self.kinematics.is_finite() && self.children.iter().all(Ball::is_finite)
    }

    /// Children (at any depth) whose rim pokes through their parent's inner
    /// boundary by more than `tolerance`
    pub fn containment_violations(&self, tolerance: f64) -> usize {
        self.children
            .iter()
            .map(|child| {
                let escaped = escapes_inner_boundary(
                    child.position(),
                    child.outer_radius,
                    self.position(),
                    self.inner_radius + tolerance,
                );
                escaped as usize + child.containment_violations(tolerance)
            })
            .sum()
    }
}

/// Sibling pass for `siblings[i]` against every later sibling; earlier
/// pairs were handled when their first member was visited
pub(crate) fn resolve_sibling_pairs(
    siblings: &mut [Ball],
    i: usize,
    config: &SimConfig,
) -> SimResult<usize> {
    let mut bounces = 0;
    for j in (i + 1)..siblings.len() {
        let (head, tail) = siblings.split_at_mut(j);
        let (a, b) = (&mut head[i], &mut tail[0]);
        if !a.needs_bounce_with(b, config)? {
            continue;
        }
        let (a_after, b_after) = bounce_pair(&a.kinematics, &b.kinematics, config.bounce_multiplier);
        a.kinematics = a_after;
        b.kinematics = b_after;
        if let AntiOscillation::Debounce { ticks } = config.anti_oscillation {
            a.recent_bounces.insert(b.id, ticks);
            b.recent_bounces.insert(a.id, ticks);
        }
        log::trace!("Balls {} and {} bounced", a.id, b.id);
        bounces += 1;
    }
    Ok(bounces)
}

/// Builds ball trees top-down, drawing every random value from one RNG
pub struct BallBuilder<'a, R: Rng> {
    config: &'a SimConfig,
    packer: BallPacker,
    rng: &'a mut R,
    next_id: u32,
}

impl<'a, R: Rng> BallBuilder<'a, R> {
    pub fn new(config: &'a SimConfig, rng: &'a mut R) -> Self {
        Self {
            config,
            packer: BallPacker::from_config(config),
            rng,
            next_id: 1,
        }
    }

    pub fn packer(&self) -> &BallPacker {
        &self.packer
    }

    pub fn rng(&mut self) -> &mut R {
        &mut *self.rng
    }

    /// Number of balls built so far
    pub fn built(&self) -> u32 {
        self.next_id - 1
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Build a ball and, unless it is a leaf, its packed cluster of children
    pub fn build(&mut self, depth: u32, position: DVec2, velocity: Vector) -> SimResult<Ball> {
        let config = self.config;
        let max_depth = config.max_depth();
        let inner_radius = inner_radius_for_depth(config, depth);

        let mut ball = Ball {
            id: self.allocate_id(),
            depth,
            max_depth,
            inner_radius,
            outer_radius: outer_radius_for_depth(config, depth),
            kinematics: KinematicPoint::new(mass_for_depth(config, depth), velocity, position),
            children: Vec::new(),
            recent_bounces: HashMap::new(),
        };
        if depth >= max_depth {
            return Ok(ball);
        }

        let arena = PackingArena::Circle {
            center: position,
            radius: inner_radius,
        };
        let child_radius = outer_radius_for_depth(config, depth + 1);
        let centers = self
            .packer
            .pack(config.children_per_ball, child_radius, &arena, &mut *self.rng)?;

        let inherited = velocity / config.layer_ratio.powi(depth as i32 + 1);
        ball.children.reserve(centers.len());
        for center in centers {
            let jitter = self
                .rng
                .random_range(config.child_jitter_min..=config.child_jitter_max);
            let child = self.build(depth + 1, center, inherited * jitter)?;
            ball.children.push(child);
        }
        Ok(ball)
    }
}
