//! Collision geometry: shapes, the narrow-phase test,
//! and the contact types it produces.

pub mod collider;
pub use collider::{Collider, ColliderShape, ShapeError};

pub mod sat;
pub use sat::intersection_check;

use super::BodyKey;
use crate::math as m;

/// The minimum translation that separates two overlapping shapes.
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    /// Unit normal of the contact, pointing toward the body this contact
    /// was computed for. Moving that body along the normal separates the pair.
    pub normal: m::Unit<m::Vec2>,
    /// Distance along the normal needed to separate the pair.
    /// Always positive.
    pub depth: f64,
}

/// One overlap found by a world query: who the queried body hit and how.
#[derive(Clone, Copy, Debug)]
pub struct Collision {
    pub other: BodyKey,
    pub contact: Contact,
}
