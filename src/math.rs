//! Types, aliases and helper operations for doing math with `ultraviolet`.
//!
//! All geometry in this crate is two-dimensional and double-precision.

use std::f64::consts::PI;
pub use ultraviolet as uv;

pub type Vec2 = uv::DVec2;
pub type Rotor2 = uv::DRotor2;

/// An angle in either degrees or radians.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Angle {
    Rad(f64),
    Deg(f64),
}
impl Angle {
    /// Get the angle as degrees.
    #[inline]
    pub fn deg(&self) -> f64 {
        match self {
            Angle::Rad(rad) => rad * 180.0 / PI,
            Angle::Deg(deg) => *deg,
        }
    }

    /// Get the angle as radians.
    #[inline]
    pub fn rad(&self) -> f64 {
        match self {
            Angle::Rad(rad) => *rad,
            Angle::Deg(deg) => deg * PI / 180.0,
        }
    }
}
impl Default for Angle {
    fn default() -> Self {
        Angle::Rad(0.0)
    }
}
impl From<Angle> for Rotor2 {
    #[inline]
    fn from(ang: Angle) -> Rotor2 {
        Rotor2::from_angle(ang.rad())
    }
}

/// Normalize an angle in degrees into the range [0, 360).
#[inline]
pub fn wrap_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Unit vector along a heading given in degrees,
/// measured counterclockwise from the positive x axis.
#[inline]
pub fn heading_deg(deg: f64) -> Vec2 {
    let rad = Angle::Deg(deg).rad();
    Vec2::new(rad.cos(), rad.sin())
}

/// A wrapper type to indicate a vector should always be normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit<T>(T);

impl Unit<Vec2> {
    pub const fn new_unchecked(v: Vec2) -> Self {
        Unit(v)
    }

    pub fn unit_x() -> Self {
        Unit(Vec2::unit_x())
    }
}

impl<T> std::ops::Deref for Unit<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::Neg for Unit<T>
where
    T: std::ops::Neg,
{
    type Output = Unit<<T as std::ops::Neg>::Output>;

    fn neg(self) -> Self::Output {
        Unit(-self.0)
    }
}

// Vec2 utils

#[inline]
pub fn right_normal(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Reflect a vector against a surface with the given unit normal,
/// reversing the normal component and keeping the tangential one.
#[inline]
pub fn reflect(v: Vec2, normal: Unit<Vec2>) -> Vec2 {
    v - 2.0 * v.dot(*normal) * *normal
}
