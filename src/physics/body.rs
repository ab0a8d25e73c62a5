//! Bodies: shapes with a pose, motion state and gameplay flags.

use super::{behavior::Behavior, collision::Collider, collision::ColliderShape, BodyKey};
use crate::math as m;

/// A game object in the world: a shape at a position, plus the state
/// that controls how the collision engine treats it.
///
/// Rotation is stored in degrees and kept normalized to [0, 360).
/// The collider's rotated-vertex cache is refreshed on every rotation
/// change, so it always matches the stored angle.
#[derive(Clone, Debug)]
pub struct Body {
    collider: Collider,
    position: m::Vec2,
    rotation_deg: f64,
    velocity: m::Vec2,
    /// Whether the body moves with its velocity and takes part in resolution.
    /// Immovable bodies still block and get collision callbacks.
    pub movable: bool,
    /// Whether the body tracks health and can be destroyed by damage.
    pub destructible: bool,
    /// Unstoppable bodies pass through destructible ones without
    /// being deflected.
    pub unstoppable: bool,
    /// What kind of game object this is and its kind-specific state.
    pub behavior: Behavior,
    pub(super) health: f64,
    pub(super) max_health: f64,
    pub(super) ignores: Vec<BodyKey>,
    pub(super) dead: bool,
}

impl Body {
    fn new(shape: ColliderShape) -> Self {
        Body {
            collider: Collider::new(shape),
            position: m::Vec2::zero(),
            rotation_deg: 0.0,
            velocity: m::Vec2::zero(),
            movable: false,
            destructible: false,
            unstoppable: false,
            behavior: Behavior::Wall,
            health: 1.0,
            max_health: 1.0,
            ignores: Vec::new(),
            dead: false,
        }
    }

    /// A body that never moves, such as a wall.
    pub fn new_static(shape: ColliderShape) -> Self {
        Self::new(shape)
    }

    /// A body that moves with its own velocity
    /// and bounces off whatever it hits.
    pub fn new_kinematic(shape: ColliderShape) -> Self {
        Body {
            movable: true,
            ..Self::new(shape)
        }
    }

    /// Set the position of the body in a builder-like chain.
    pub fn with_position(mut self, position: m::Vec2) -> Self {
        self.position = position;
        self
    }

    /// Set the rotation of the body in a builder-like chain.
    pub fn with_rotation(mut self, angle: m::Angle) -> Self {
        self.set_rotation_deg(angle.deg());
        self
    }

    /// Set the velocity of the body in a builder-like chain.
    pub fn with_velocity(mut self, velocity: m::Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Give the body health and make it destructible in a builder-like chain.
    pub fn with_health(mut self, max_health: f64) -> Self {
        self.destructible = true;
        self.health = max_health;
        self.max_health = max_health;
        self
    }

    /// Set the behavior of the body in a builder-like chain.
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Add a body to the ignore list in a builder-like chain.
    /// Collisions between this body and the ignored one
    /// won't be reported in either direction.
    pub fn with_ignored(mut self, other: BodyKey) -> Self {
        self.ignores.push(other);
        self
    }

    //
    // accessors
    //

    #[inline]
    pub fn position(&self) -> m::Vec2 {
        self.position
    }

    /// The body's rotation in degrees, normalized to [0, 360).
    #[inline]
    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    #[inline]
    pub fn velocity(&self) -> m::Vec2 {
        self.velocity
    }

    #[inline]
    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    #[inline]
    pub fn health(&self) -> f64 {
        self.health
    }

    #[inline]
    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    /// Bodies whose collisions with this one are skipped.
    /// Every body ignores at least itself.
    #[inline]
    pub fn ignored(&self) -> &[BodyKey] {
        &self.ignores
    }

    /// Unit vector pointing the way the body is facing.
    #[inline]
    pub fn heading(&self) -> m::Vec2 {
        m::heading_deg(self.rotation_deg)
    }

    //
    // mutators
    //

    #[inline]
    pub fn set_position(&mut self, position: m::Vec2) {
        self.position = position;
    }

    #[inline]
    pub fn translate(&mut self, delta: m::Vec2) {
        self.position += delta;
    }

    #[inline]
    pub fn set_velocity(&mut self, velocity: m::Vec2) {
        self.velocity = velocity;
    }

    pub fn set_rotation_deg(&mut self, deg: f64) {
        self.rotation_deg = m::wrap_deg(deg);
        self.collider.update_rotation(m::Angle::Deg(self.rotation_deg));
    }

    pub fn rotate_by_deg(&mut self, delta_deg: f64) {
        self.set_rotation_deg(self.rotation_deg + delta_deg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_into_one_turn() {
        let mut body = Body::new_kinematic(ColliderShape::new_square(2.0));
        body.set_rotation_deg(365.0);
        assert_eq!(body.rotation_deg(), 5.0);
        body.set_rotation_deg(-5.0);
        assert_eq!(body.rotation_deg(), 355.0);
        body.rotate_by_deg(10.0);
        assert_eq!(body.rotation_deg(), 5.0);
    }

    #[test]
    fn heading_follows_rotation() {
        let mut body = Body::new_kinematic(ColliderShape::new_square(2.0));
        assert!((body.heading() - m::Vec2::new(1.0, 0.0)).mag() < 1e-9);
        body.set_rotation_deg(90.0);
        assert!((body.heading() - m::Vec2::new(0.0, 1.0)).mag() < 1e-9);
        body.set_rotation_deg(180.0);
        assert!((body.heading() - m::Vec2::new(-1.0, 0.0)).mag() < 1e-9);
    }

    #[test]
    fn rotating_refreshes_the_vertex_cache() {
        let mut body = Body::new_kinematic(ColliderShape::new_rect(4.0, 2.0));
        let before = body.collider().rotated_points().to_vec();
        body.rotate_by_deg(30.0);
        let after = body.collider().rotated_points().to_vec();
        assert_ne!(before, after);
        // full turn lands back where it started
        for _ in 0..11 {
            body.rotate_by_deg(30.0);
        }
        for (b, a) in before.iter().zip(body.collider().rotated_points()) {
            assert!((*b - *a).mag() < 1e-9);
        }
    }
}
