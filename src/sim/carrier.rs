//! Containment correction: pulls children back inside their parent
//!
//! This is a positional carry, not physics. A child whose rim pokes through
//! its parent's inner boundary is moved radially onto that boundary; its
//! velocity is untouched. Moving a child can push its own children out, so
//! the correction recurses after every move.

use glam::DVec2;

use super::ball::Ball;
use super::collision::escapes_inner_boundary;
use super::vector::Vector;

/// Slack below which a child counts as already on the boundary
const CARRY_TOLERANCE: f64 = 1e-9;

/// Radial displacement that puts a violating child exactly
/// `parent_inner - child_outer` away from the parent, along its current
/// direction. Zero for a child that is already contained.
pub fn containment_correction(
    parent_center: DVec2,
    parent_inner: f64,
    child_center: DVec2,
    child_outer: f64,
) -> Vector {
    if !escapes_inner_boundary(child_center, child_outer, parent_center, parent_inner + CARRY_TOLERANCE) {
        return Vector::ZERO;
    }
    let delta = child_center - parent_center;
    let direction = delta.y.atan2(delta.x);
    let desired_distance = parent_inner - child_outer;
    Vector::polar(desired_distance - delta.length(), direction)
}

/// Correction for each direct child of `parent`, in child order
pub fn corrections(parent: &Ball) -> Vec<Vector> {
    parent
        .children()
        .iter()
        .map(|child| {
            containment_correction(
                parent.position(),
                parent.inner_radius(),
                child.position(),
                child.outer_radius(),
            )
        })
        .collect()
}

/// Apply corrections to `parent`'s children, then recurse into each child.
/// Returns how many balls were moved.
pub fn carry_children(parent: &mut Ball) -> usize {
    let moves = corrections(parent);
    let mut moved = 0;
    for (child, offset) in parent.children_mut().iter_mut().zip(moves) {
        if offset.length() > 0.0 {
            let carried = child.kinematics().translate(offset);
            child.set_kinematics(carried);
            moved += 1;
        }
        moved += carry_children(child);
    }
    moved
}
