//! Math types.
//!
//! Everything here is in tile units on a 2D plane. Kept small and
//! deterministic: no SIMD, no unsafe.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// 2D vector used for positions, orientations and velocities.
///
/// Orientations are stored raw (not normalized); their angle is recovered
/// with [`Vec2::angle`]. A missing component deserializes as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn distance(self, to: Self) -> f32 {
        (to - self).len_sq().sqrt()
    }

    /// Linear interpolation. `t` is clamped to $[0,1]$ so the result never
    /// leaves the segment.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t))
    }

    /// Angle of the vector in radians, `atan2(y, x)`.
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Sprite rotation for a raw orientation: forward is drawn 90° from the
    /// vector angle.
    pub fn sprite_rotation(self) -> f32 {
        self.angle() + FRAC_PI_2
    }

    /// Component-wise clamp into `[min, max]`.
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Scalar lerp with `t` clamped to $[0,1]$.
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    (1.0 - t) * start + t * end
}
