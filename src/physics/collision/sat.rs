//! The narrow phase: pairwise overlap tests
//! based on the separating axis theorem.
//!
//! Every candidate axis gets a signed clearance computed for both orderings
//! of the shapes along it. A nonnegative clearance on any axis proves the
//! shapes apart; if none is found, the axis with the shallowest overlap
//! gives the minimum translation that separates the pair.

use itertools::Itertools;

use super::{
    collider::{Collider, ColliderShape},
    Contact,
};
use crate::math as m;

/// Test two shapes for overlap.
///
/// Rotations are baked into the colliders' vertex caches beforehand,
/// so only world positions are needed here. Returns `None` if the shapes
/// are apart or within `epsilon` of touching; otherwise the returned
/// contact holds a unit normal pointing from the second shape toward the
/// first and the positive distance the first must travel along it
/// to separate the pair.
pub fn intersection_check(
    pos1: m::Vec2,
    coll1: &Collider,
    pos2: m::Vec2,
    coll2: &Collider,
    epsilon: f64,
) -> Option<Contact> {
    match (coll1.shape(), coll2.shape()) {
        (ColliderShape::Circle { r: r1 }, ColliderShape::Circle { r: r2 }) => {
            circle_circle(pos1, *r1, pos2, *r2, epsilon)
        }
        (ColliderShape::Polygon { .. }, ColliderShape::Polygon { .. }) => check_axes(
            edge_normals(coll1).chain(edge_normals(coll2)),
            pos1,
            coll1,
            pos2,
            coll2,
            epsilon,
        ),
        (ColliderShape::Circle { .. }, ColliderShape::Polygon { .. }) => check_axes(
            edge_normals(coll2).chain(nearest_vertex_axis(pos1, pos2, coll2)),
            pos1,
            coll1,
            pos2,
            coll2,
            epsilon,
        ),
        (ColliderShape::Polygon { .. }, ColliderShape::Circle { .. }) => check_axes(
            edge_normals(coll1).chain(nearest_vertex_axis(pos2, pos1, coll1)),
            pos1,
            coll1,
            pos2,
            coll2,
            epsilon,
        ),
    }
}

fn circle_circle(
    pos1: m::Vec2,
    r1: f64,
    pos2: m::Vec2,
    r2: f64,
    epsilon: f64,
) -> Option<Contact> {
    let offset = pos2 - pos1;
    let dist = offset.mag();
    let gap = dist - r1 - r2;
    if gap >= -epsilon {
        return None;
    }
    let axis = if dist > epsilon {
        m::Unit::new_unchecked(offset / dist)
    } else {
        // concentric circles have no meaningful direction; any axis separates
        m::Unit::unit_x()
    };
    Some(Contact {
        normal: -axis,
        depth: -gap,
    })
}

/// Run the axis tests, returning early on the first separating axis
/// and otherwise picking the one with the shallowest overlap.
fn check_axes(
    axes: impl Iterator<Item = m::Vec2>,
    pos1: m::Vec2,
    coll1: &Collider,
    pos2: m::Vec2,
    coll2: &Collider,
    epsilon: f64,
) -> Option<Contact> {
    let offset = pos2 - pos1;

    let mut best_gap = f64::NEG_INFINITY;
    let mut best_dir = m::Vec2::zero();

    for axis in axes {
        let (min1, max1) = project(coll1, axis);
        let (min2, max2) = project(coll2, axis);
        let dist = offset.dot(axis);
        // signed clearance between the shapes for both orderings along the axis
        let gap1 = dist - max1 + min2;
        let gap2 = -dist - max2 + min1;
        if gap1 >= -epsilon || gap2 >= -epsilon {
            return None;
        }
        // ties go to gap1 so that mirror-symmetric overlaps
        // still produce a well-defined direction
        let (gap, dir) = if gap1 >= gap2 {
            (gap1, -axis)
        } else {
            (gap2, axis)
        };
        if gap > best_gap {
            best_gap = gap;
            best_dir = dir;
        }
    }

    Some(Contact {
        normal: m::Unit::new_unchecked(best_dir),
        depth: -best_gap,
    })
}

/// Extent of a shape projected onto an axis, relative to its own position.
fn project(coll: &Collider, axis: m::Vec2) -> (f64, f64) {
    match coll.shape() {
        ColliderShape::Circle { r } => (-*r, *r),
        ColliderShape::Polygon { .. } => {
            coll.rotated_points()
                .iter()
                .fold((f64::MAX, f64::MIN), |(min, max), p| {
                    let d = p.dot(axis);
                    (min.min(d), max.max(d))
                })
        }
    }
}

/// Outward edge normals of a polygon, the candidate axes of the SAT.
/// The edges already sit at the body's rotation, so these do too.
fn edge_normals(coll: &Collider) -> impl Iterator<Item = m::Vec2> + '_ {
    coll.rotated_points()
        .iter()
        .copied()
        .circular_tuple_windows()
        .map(|(a, b)| m::right_normal((b - a).normalized()))
}

/// The axis from the polygon vertex nearest to the circle's center toward
/// that center. Edge normals alone miss overlaps in the corner regions.
fn nearest_vertex_axis(
    circle_pos: m::Vec2,
    poly_pos: m::Vec2,
    poly: &Collider,
) -> Option<m::Vec2> {
    let nearest = poly
        .rotated_points()
        .iter()
        .map(|p| poly_pos + *p)
        .min_by(|p1, p2| {
            (*p1 - circle_pos)
                .mag_sq()
                .partial_cmp(&(*p2 - circle_pos).mag_sq())
                .expect("There was a NaN somewhere")
        })?;
    let to_center = circle_pos - nearest;
    let mag = to_center.mag();
    (mag > 0.0).then(|| to_center / mag)
}
