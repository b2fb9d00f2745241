//! Collision detection and response between balls of adjacent depths
//!
//! Two relations exist: siblings (same depth) touch when their outer rims
//! overlap, and a child touches its parent when its outer rim crosses the
//! parent's inner boundary. Any other depth pairing is a programming error.

use glam::DVec2;

use super::kinematics::KinematicPoint;
use super::vector::Vector;
use crate::error::{SimError, SimResult};

/// How two balls relate for collision purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Same depth: rim against rim
    Siblings,
    /// First argument is the parent of the second
    ParentOfSecond,
    /// Second argument is the parent of the first
    ChildOfSecond,
}

/// Classify a pair by depth, failing fast on non-adjacent depths
pub fn classify(depth_a: u32, depth_b: u32) -> SimResult<Pairing> {
    match depth_a.abs_diff(depth_b) {
        0 => Ok(Pairing::Siblings),
        1 if depth_a < depth_b => Ok(Pairing::ParentOfSecond),
        1 => Ok(Pairing::ChildOfSecond),
        _ => Err(SimError::InvalidCollisionQuery { depth_a, depth_b }),
    }
}

/// Same-depth test: outer rims overlap
#[inline]
pub fn rims_overlap(a: DVec2, a_outer: f64, b: DVec2, b_outer: f64) -> bool {
    a.distance(b) < a_outer + b_outer
}

/// Parent/child test: the child's rim pokes through the parent's inner boundary
#[inline]
pub fn escapes_inner_boundary(child: DVec2, child_outer: f64, parent: DVec2, parent_inner: f64) -> bool {
    child.distance(parent) + child_outer > parent_inner
}

/// Point on the parent's inner boundary in the direction of `toward`, moving
/// with the parent's velocity. Containment convergence is measured against it.
pub fn inner_boundary_point(parent: &KinematicPoint, parent_inner: f64, toward: DVec2) -> KinematicPoint {
    let delta = toward - parent.position;
    let direction = delta.y.atan2(delta.x);
    parent.translate(Vector::polar(parent_inner, direction))
}

/// Elastic response for both bodies, each computed from the pre-collision
/// state of the other, then scaled by `multiplier`
pub fn bounce_pair(
    a: &KinematicPoint,
    b: &KinematicPoint,
    multiplier: f64,
) -> (KinematicPoint, KinematicPoint) {
    let a_after = a.bounce_against(b).scale_velocity(multiplier);
    let b_after = b.bounce_against(a).scale_velocity(multiplier);
    (a_after, b_after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(1, 1).unwrap(), Pairing::Siblings);
        assert_eq!(classify(0, 1).unwrap(), Pairing::ParentOfSecond);
        assert_eq!(classify(3, 2).unwrap(), Pairing::ChildOfSecond);
        assert_eq!(
            classify(2, 0).unwrap_err(),
            SimError::InvalidCollisionQuery {
                depth_a: 2,
                depth_b: 0
            }
        );
    }

    #[test]
    fn test_rims_overlap() {
        assert!(rims_overlap(DVec2::ZERO, 5.0, DVec2::new(9.0, 0.0), 5.0));
        assert!(!rims_overlap(DVec2::ZERO, 5.0, DVec2::new(10.0, 0.0), 5.0));
    }

    #[test]
    fn test_escapes_inner_boundary() {
        // Parent inner radius 100, child outer 10
        assert!(!escapes_inner_boundary(DVec2::new(80.0, 0.0), 10.0, DVec2::ZERO, 100.0));
        assert!(escapes_inner_boundary(DVec2::new(0.0, 95.0), 10.0, DVec2::ZERO, 100.0));
    }

    #[test]
    fn test_inner_boundary_point() {
        let parent = KinematicPoint::new(10.0, Vector::cartesian(1.0, 2.0), DVec2::new(5.0, 5.0));
        let p = inner_boundary_point(&parent, 20.0, DVec2::new(5.0, 15.0));
        assert!((p.position - DVec2::new(5.0, 25.0)).length() < 1e-9);
        assert!(p.velocity.approx_eq(&parent.velocity, 0.0));
    }

    #[test]
    fn test_bounce_pair_multiplier() {
        let a = KinematicPoint::new(1.0, Vector::cartesian(5.0, 0.0), DVec2::ZERO);
        let b = KinematicPoint::new(1.0, Vector::cartesian(-5.0, 0.0), DVec2::new(10.0, 0.0));
        let (a2, b2) = bounce_pair(&a, &b, 2.0);
        assert!(a2.velocity.approx_eq(&Vector::cartesian(-10.0, 0.0), 1e-9));
        assert!(b2.velocity.approx_eq(&Vector::cartesian(10.0, 0.0), 1e-9));
    }
}
