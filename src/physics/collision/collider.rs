//! Collision shapes and their construction-time validation.

use crate::math as m;
use itertools::Itertools;

/// Error returned when a set of vertices does not form a usable polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("a polygon needs at least three vertices")]
    TooFewVertices,
    #[error("consecutive polygon vertices must not coincide")]
    DegenerateEdge,
    #[error("polygon vertices must wind counterclockwise around a convex loop")]
    NotConvex,
}

/// The physical shape of a body, in local space centered on the body's position.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum ColliderShape {
    Circle {
        r: f64,
    },
    /// A convex polygon given as a counterclockwise loop of vertices.
    Polygon {
        points: Vec<m::Vec2>,
    },
}

impl ColliderShape {
    /// Create a circle shape from a radius.
    pub fn new_circle(radius: f64) -> Self {
        assert!(radius > 0.0, "a circle must have a positive radius");
        ColliderShape::Circle { r: radius }
    }

    /// Create a rect shape with two different side lengths.
    pub fn new_rect(width: f64, height: f64) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "a rect must have positive side lengths"
        );
        let hw = width / 2.0;
        let hh = height / 2.0;
        ColliderShape::Polygon {
            points: vec![
                m::Vec2::new(-hw, -hh),
                m::Vec2::new(hw, -hh),
                m::Vec2::new(hw, hh),
                m::Vec2::new(-hw, hh),
            ],
        }
    }

    /// Create a rect shape with both sides set to the same length.
    pub fn new_square(side_length: f64) -> Self {
        ColliderShape::new_rect(side_length, side_length)
    }

    /// Create a polygon shape from an arbitrary vertex loop,
    /// checking that the loop is convex, counterclockwise,
    /// and free of zero-length edges.
    pub fn new_polygon(points: Vec<m::Vec2>) -> Result<Self, ShapeError> {
        if points.len() < 3 {
            return Err(ShapeError::TooFewVertices);
        }
        for (a, b) in points.iter().circular_tuple_windows() {
            if (*b - *a).mag_sq() < f64::EPSILON {
                return Err(ShapeError::DegenerateEdge);
            }
        }
        for (a, b, c) in points.iter().circular_tuple_windows() {
            let e1 = *b - *a;
            let e2 = *c - *b;
            if e1.wedge(e2).xy < 0.0 {
                return Err(ShapeError::NotConvex);
            }
        }
        Ok(ColliderShape::Polygon { points })
    }
}

/// A shape attached to a body, with a cached copy of the polygon vertices
/// rotated to the body's current orientation.
///
/// The cache makes repeated intersection tests against the same body cheap;
/// the body refreshes it whenever its rotation changes.
#[derive(Clone, Debug)]
pub struct Collider {
    shape: ColliderShape,
    rotated_points: Vec<m::Vec2>,
    bounding_r: f64,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        let (rotated_points, bounding_r) = match &shape {
            ColliderShape::Circle { r } => (Vec::new(), *r),
            ColliderShape::Polygon { points } => (
                points.clone(),
                points.iter().map(|p| p.mag()).fold(0.0, f64::max),
            ),
        };
        Collider {
            shape,
            rotated_points,
            bounding_r,
        }
    }

    #[inline]
    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    /// The local-space vertices rotated to the rotation most recently set
    /// on the owning body. Empty for circles.
    #[inline]
    pub fn rotated_points(&self) -> &[m::Vec2] {
        &self.rotated_points
    }

    /// Radius of the smallest circle centered on the body's position
    /// that contains the whole shape at any rotation.
    #[inline]
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_r
    }

    pub(crate) fn update_rotation(&mut self, angle: m::Angle) {
        if let ColliderShape::Polygon { points } = &self.shape {
            let rotor = m::Rotor2::from(angle);
            self.rotated_points.clear();
            self.rotated_points.extend(points.iter().map(|p| rotor * *p));
        }
    }
}
