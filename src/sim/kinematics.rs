//! Point mass with velocity and position
//!
//! `KinematicPoint` is an immutable value: every update returns a new point.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::vector::Vector;
use crate::error::{SimError, SimResult};

/// Below this the sum of two masses (or a centre distance) is treated as zero
const DEGENERATE_EPS: f64 = 1e-12;

/// Velocity axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KinematicPoint {
    pub mass: f64,
    pub velocity: Vector,
    pub position: DVec2,
}

impl KinematicPoint {
    pub fn new(mass: f64, velocity: Vector, position: DVec2) -> Self {
        Self {
            mass,
            velocity,
            position,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Move along the current velocity for `dt` seconds
    pub fn advance(&self, dt: f64) -> SimResult<Self> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(SimError::NegativeTimeStep(dt));
        }
        Ok(Self {
            position: self.projected_position(dt),
            ..*self
        })
    }

    /// Where the point will be after `dt`, without validating `dt`
    #[inline]
    pub fn projected_position(&self, dt: f64) -> DVec2 {
        self.position + self.velocity.to_dvec2() * dt
    }

    pub fn reverse_axis(&self, axis: Axis) -> Self {
        let v = self.velocity.to_dvec2();
        let flipped = match axis {
            Axis::X => DVec2::new(-v.x, v.y),
            Axis::Y => DVec2::new(v.x, -v.y),
        };
        self.with_velocity(flipped.into())
    }

    pub fn with_velocity(&self, velocity: Vector) -> Self {
        Self { velocity, ..*self }
    }

    pub fn offset_velocity(&self, delta: Vector) -> Self {
        self.with_velocity(self.velocity + delta)
    }

    pub fn scale_velocity(&self, s: f64) -> Self {
        self.with_velocity(self.velocity * s)
    }

    /// Reposition without touching velocity (containment, not physics)
    pub fn translate(&self, offset: Vector) -> Self {
        Self {
            position: self.position + offset.to_dvec2(),
            ..*self
        }
    }

    /// Direction from this point towards `other`, `None` for coincident centres
    pub fn impact_direction(&self, other: &KinematicPoint) -> Option<f64> {
        let delta = other.position - self.position;
        if delta.length_squared() < DEGENERATE_EPS * DEGENERATE_EPS || !delta.is_finite() {
            return None;
        }
        Some(delta.y.atan2(delta.x))
    }

    /// Velocity of this point after an elastic collision with `other`
    ///
    /// Only the component along the line of centres changes; the
    /// perpendicular component is kept. Both sides of a collision must be
    /// computed from their pre-collision state.
    pub fn bounce_against(&self, other: &KinematicPoint) -> Self {
        let total_mass = self.mass + other.mass;
        if total_mass.abs() < DEGENERATE_EPS {
            return *self;
        }
        let Some(theta) = self.impact_direction(other) else {
            return *self;
        };

        let s1 = self.velocity.component_along(theta);
        let s2 = other.velocity.component_along(theta);
        let s1_after = (s1 * (self.mass - other.mass) + s2 * 2.0 * other.mass) / total_mass;
        if !s1_after.is_finite() {
            return *self;
        }

        let velocity = self.velocity - Vector::polar(s1, theta) + Vector::polar(s1_after, theta);
        self.with_velocity(velocity)
    }

    /// Speed at which the two points close on each other (negative = separating)
    pub fn closing_speed(&self, other: &KinematicPoint) -> f64 {
        match self.impact_direction(other) {
            Some(theta) => {
                self.velocity.component_along(theta) - other.velocity.component_along(theta)
            }
            None => 0.0,
        }
    }

    pub fn is_converging_on(&self, other: &KinematicPoint) -> bool {
        self.closing_speed(other) > 0.0
    }

    pub fn momentum(&self) -> DVec2 {
        self.velocity.to_dvec2() * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.to_dvec2().length_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.mass.is_finite() && self.velocity.is_finite() && self.position.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point(mass: f64, vx: f64, vy: f64, x: f64, y: f64) -> KinematicPoint {
        KinematicPoint::new(mass, Vector::cartesian(vx, vy), DVec2::new(x, y))
    }

    #[test]
    fn test_advance() {
        let p = point(1.0, 10.0, -5.0, 1.0, 1.0).advance(0.5).unwrap();
        assert!((p.x() - 6.0).abs() < 1e-12);
        assert!((p.y() + 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_advance_rejects_negative_dt() {
        let p = point(1.0, 1.0, 0.0, 0.0, 0.0);
        assert_eq!(p.advance(-0.1).unwrap_err(), SimError::NegativeTimeStep(-0.1));
        assert!(p.advance(f64::NAN).is_err());
    }

    #[test]
    fn test_equal_mass_head_on_swaps() {
        let a = point(1.0, 5.0, 0.0, 0.0, 0.0);
        let b = point(1.0, -5.0, 0.0, 10.0, 0.0);

        let a_after = a.bounce_against(&b);
        let b_after = b.bounce_against(&a);

        assert!(a_after.velocity.approx_eq(&Vector::cartesian(-5.0, 0.0), 1e-9));
        assert!(b_after.velocity.approx_eq(&Vector::cartesian(5.0, 0.0), 1e-9));
    }

    #[test]
    fn test_perpendicular_component_kept() {
        let a = point(1.0, 5.0, 3.0, 0.0, 0.0);
        let b = point(1.0, 0.0, 0.0, 10.0, 0.0);

        let a_after = a.bounce_against(&b);
        assert!(a_after.velocity.approx_eq(&Vector::cartesian(0.0, 3.0), 1e-9));
        let b_after = b.bounce_against(&a);
        assert!(b_after.velocity.approx_eq(&Vector::cartesian(5.0, 0.0), 1e-9));
    }

    #[test]
    fn test_heavy_wall_reflects_light_point() {
        let light = point(1.0, 4.0, 0.0, 0.0, 0.0);
        let heavy = point(1e9, 0.0, 0.0, 1.0, 0.0);
        let after = light.bounce_against(&heavy);
        assert!((after.velocity.x() + 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_bounce_is_noop() {
        let a = point(1.0, 5.0, 0.0, 3.0, 3.0);
        let b = point(1.0, -5.0, 0.0, 3.0, 3.0);
        assert!(a.bounce_against(&b).velocity.approx_eq(&a.velocity, 0.0));

        let massless = point(0.0, 5.0, 0.0, 0.0, 0.0);
        let other = point(0.0, -5.0, 0.0, 1.0, 0.0);
        assert!(
            massless
                .bounce_against(&other)
                .velocity
                .approx_eq(&massless.velocity, 0.0)
        );
    }

    #[test]
    fn test_convergence() {
        let a = point(1.0, 5.0, 0.0, 0.0, 0.0);
        let b = point(1.0, -5.0, 0.0, 10.0, 0.0);
        assert!(a.is_converging_on(&b));
        assert!(b.is_converging_on(&a));

        let a = a.reverse_axis(Axis::X);
        let b = b.reverse_axis(Axis::X);
        assert!(!a.is_converging_on(&b));
        assert!(a.closing_speed(&b) < 0.0);
    }

    #[test]
    fn test_translate_keeps_velocity() {
        let p = point(2.0, 1.0, 1.0, 0.0, 0.0).translate(Vector::polar(2.0, 0.0));
        assert!((p.x() - 2.0).abs() < 1e-12);
        assert!(p.velocity.approx_eq(&Vector::cartesian(1.0, 1.0), 0.0));
    }

    #[test]
    fn test_velocity_updates() {
        let p = point(1.0, 1.0, 2.0, 0.0, 0.0);
        assert!(
            p.offset_velocity(Vector::cartesian(1.0, 0.0))
                .velocity
                .approx_eq(&Vector::cartesian(2.0, 2.0), 1e-12)
        );
        assert!(
            p.scale_velocity(0.5)
                .velocity
                .approx_eq(&Vector::cartesian(0.5, 1.0), 1e-12)
        );
        assert!(
            p.reverse_axis(Axis::Y)
                .velocity
                .approx_eq(&Vector::cartesian(1.0, -2.0), 1e-12)
        );
    }

    proptest! {
        #[test]
        fn prop_bounce_conserves_momentum_and_energy(
            m1 in 0.1..100.0f64, m2 in 0.1..100.0f64,
            vx1 in -100.0..100.0f64, vy1 in -100.0..100.0f64,
            vx2 in -100.0..100.0f64, vy2 in -100.0..100.0f64,
            dx in 1.0..50.0f64, dy in -50.0..50.0f64,
        ) {
            let a = point(m1, vx1, vy1, 0.0, 0.0);
            let b = point(m2, vx2, vy2, dx, dy);
            let a_after = a.bounce_against(&b);
            let b_after = b.bounce_against(&a);

            let before = a.momentum() + b.momentum();
            let after = a_after.momentum() + b_after.momentum();
            let scale = 1.0 + before.length();
            prop_assert!((before - after).length() / scale < 1e-9);

            let e_before = a.kinetic_energy() + b.kinetic_energy();
            let e_after = a_after.kinetic_energy() + b_after.kinetic_energy();
            prop_assert!((e_before - e_after).abs() / (1.0 + e_before) < 1e-9);
        }
    }
}
