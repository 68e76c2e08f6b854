//! Rigid transforms: a unit-quaternion rotation plus a translation.

use std::ops::Mul;

use crate::math::{Quat, Vec3};

/// A rigid (rotation + translation) transform.
///
/// Scale is deliberately absent: every query in this crate operates on rigid
/// bodies, and a scale component would silently break the distance and motion
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Create a pure translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation,
        }
    }

    /// Create a transform from a rotation and a translation.
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Map a point through this transform.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// Rotate a direction (no translation applied).
    #[inline]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// The inverse transform.
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            rotation: inv_rotation,
            translation: -(inv_rotation * self.translation),
        }
    }

    /// `self⁻¹ ∘ other`: the pose of `other` expressed in `self`'s frame.
    ///
    /// This is the relative transform the oriented traversal recomputes each
    /// outer iteration.
    pub fn relative(&self, other: &Transform) -> Self {
        self.inverse() * *other
    }
}

impl Mul for Transform {
    type Output = Transform;

    /// Composition: `(a * b).transform_point(p) == a.transform_point(b.transform_point(p))`.
    fn mul(self, rhs: Transform) -> Transform {
        Transform {
            rotation: self.rotation * rhs.rotation,
            translation: self.rotation * rhs.translation + self.translation,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_roundtrip() {
        let p = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(Transform::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn test_inverse_cancels() {
        let tf = Transform::from_rotation_translation(
            Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 0.7),
            Vec3::new(3.0, 1.0, -2.0),
        );
        let p = Vec3::new(0.5, 2.0, -1.5);
        let back = tf.inverse().transform_point(tf.transform_point(p));
        assert!((back - p).length() < 1e-12);
    }

    #[test]
    fn test_composition_order() {
        let a = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let b = Transform::from_rotation_translation(
            Quat::from_axis_angle(Vec3::Z, FRAC_PI_2),
            Vec3::ZERO,
        );
        let p = Vec3::new(1.0, 0.0, 0.0);
        // b rotates +x to +y, then a translates by +x.
        let q = (a * b).transform_point(p);
        assert!((q - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_relative_transform() {
        let tf1 = Transform::from_rotation_translation(
            Quat::from_axis_angle(Vec3::Y, 0.3),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let tf2 = Transform::from_rotation_translation(
            Quat::from_axis_angle(Vec3::X, -0.8),
            Vec3::new(-2.0, 0.5, 0.0),
        );
        let rel = tf1.relative(&tf2);
        let p = Vec3::new(0.2, 0.4, 0.6);
        let direct = tf2.transform_point(p);
        let via_rel = tf1.transform_point(rel.transform_point(p));
        assert!((direct - via_rel).length() < 1e-12);
    }
}
