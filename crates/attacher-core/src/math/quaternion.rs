// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Orientations.

use std::ops::{Mul, Neg};

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use super::{Vec3, EPSILON};

/// A rotation stored as `(x, y, z, w)` with `w` the scalar part.
///
/// Orientations read from a world are unit quaternions; values built with
/// [`Quaternion::new`] are taken as-is and normalised where a rotation is
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// First imaginary component.
    pub x: f32,
    /// Second imaginary component.
    pub y: f32,
    /// Third imaginary component.
    pub z: f32,
    /// Real component.
    pub w: f32,
}

impl Quaternion {
    /// No rotation.
    pub const IDENTITY: Quaternion = Quaternion::new(0.0, 0.0, 0.0, 1.0);

    /// Builds a quaternion from raw components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis`. The axis need not be unit length.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        let axis = axis.normalize() * sin;
        Self::new(axis.x, axis.y, axis.z, cos)
    }

    #[inline]
    fn imaginary(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Four-component dot product.
    #[inline]
    pub fn dot(self, rhs: Self) -> f32 {
        self.imaginary().dot(rhs.imaginary()) + self.w * rhs.w
    }

    /// Euclidean norm of the four components.
    #[inline]
    pub fn magnitude(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit quaternion with the same rotation, or [`Quaternion::IDENTITY`]
    /// for a degenerate input.
    pub fn normalize(self) -> Self {
        let norm = self.magnitude();
        if norm > EPSILON {
            let k = norm.recip();
            Self::new(self.x * k, self.y * k, self.z * k, self.w * k)
        } else {
            Self::IDENTITY
        }
    }

    /// Negates the imaginary part.
    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Multiplicative inverse, equal to the conjugate for unit quaternions.
    pub fn inverse(self) -> Self {
        let norm_sq = self.dot(self);
        if norm_sq <= EPSILON {
            return Self::IDENTITY;
        }
        let c = self.conjugate();
        let k = norm_sq.recip();
        Self::new(c.x * k, c.y * k, c.z * k, c.w * k)
    }

    /// Returns `true` when both quaternions describe the same rotation.
    ///
    /// `q` and `-q` encode the same orientation, so the comparison uses the
    /// absolute value of the dot product.
    pub fn same_rotation(self, other: Self, epsilon: f32) -> bool {
        (self.normalize().dot(other.normalize()).abs() - 1.0).abs() < epsilon
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product: `a * b` applies `b` first, then `a`.
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        let (a, b) = (self.imaginary(), rhs.imaginary());
        let v = rhs.w * a + self.w * b + a.cross(b);
        Quaternion::new(v.x, v.y, v.z, self.w * rhs.w - a.dot(b))
    }
}

impl Mul<Vec3> for Quaternion {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        let q = self.normalize();
        let u = q.imaginary();
        let t = 2.0 * u.cross(v);
        v + q.w * t + u.cross(t)
    }
}

impl Neg for Quaternion {
    type Output = Quaternion;

    fn neg(self) -> Quaternion {
        Quaternion::new(-self.x, -self.y, -self.z, -self.w)
    }
}

/// Component-wise; use [`Quaternion::same_rotation`] when the sign is irrelevant.
impl AbsDiffEq for Quaternion {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.imaginary().abs_diff_eq(&other.imaginary(), epsilon)
            && (self.w - other.w).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{FRAC_PI_2, PI};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_axis_angle_is_unit() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 5.0, 0.0), FRAC_PI_2);
        let half = FRAC_PI_2 * 0.5;
        assert_abs_diff_eq!(q, Quaternion::new(0.0, half.sin(), 0.0, half.cos()));
        assert_abs_diff_eq!(q.magnitude(), 1.0, epsilon = EPSILON);
        assert_eq!(Quaternion::default(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_rotates_vectors() {
        let about_y = Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2);
        assert_abs_diff_eq!(about_y * Vec3::X, Vec3::new(0.0, 0.0, -1.0));
        let about_z = Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2);
        assert_abs_diff_eq!(about_z * Vec3::new(0.5, 0.0, 0.2), Vec3::new(0.0, 0.5, 0.2));
    }

    #[test]
    fn test_product_composes_rotations() {
        let quarter = Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2);
        let half = Quaternion::from_axis_angle(Vec3::Z, PI);
        assert!((quarter * quarter).same_rotation(half, EPSILON));

        // Applying `b` then `a` to a vector matches the product `a * b`.
        let a = Quaternion::from_axis_angle(Vec3::X, 0.4);
        let b = Quaternion::from_axis_angle(Vec3::new(1.0, 2.0, 3.0), 1.1);
        let v = Vec3::new(0.3, -0.7, 2.0);
        assert_abs_diff_eq!((a * b) * v, a * (b * v), epsilon = 1e-4);
    }

    #[test]
    fn test_inverse() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 2.0, 3.0), 0.7);
        assert!((q * q.inverse()).same_rotation(Quaternion::IDENTITY, EPSILON));
        assert!((q.inverse() * q).same_rotation(Quaternion::IDENTITY, EPSILON));
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).inverse(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_same_rotation_ignores_sign() {
        let q = Quaternion::from_axis_angle(Vec3::X, 0.3);
        assert!(q.same_rotation(-q, EPSILON));
        assert!(!q.same_rotation(Quaternion::IDENTITY, EPSILON));
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize(), Quaternion::IDENTITY);
    }
}
