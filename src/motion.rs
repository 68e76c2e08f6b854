//! Rigid motions over the unit time interval and their conservative bounds.
//!
//! A motion answers three questions: where is the body *now*, move it to a
//! later time, and how fast can any of its points possibly approach along a
//! given direction. The last answer drives the advancement step size, so it
//! must never under-estimate — an optimistic bound makes the whole query
//! unsound.

use crate::bounding::Aabb;
use crate::math::{Quat, Real, Vec3};
use crate::transform::Transform;

/// A rigid motion parameterized over `t ∈ [0, 1]`.
pub trait Motion {
    /// Pose at the current internal time. Pure: repeated calls between
    /// integrations return the same transform.
    fn current_transform(&self) -> Transform;

    /// Advance the internal time to `t` (clamped to `[0, 1]`). Callers only
    /// ever pass non-decreasing values; implementations may rely on that.
    fn integrate(&mut self, t: Real);

    /// Upper bound on the displacement of any material point currently inside
    /// `bv` (world frame) along the unit direction `dir`, from the current
    /// time to `t = 1`.
    ///
    /// The returned value is the per-unit-interval rate
    /// `max(0, v·dir + |ω|·r)`, which dominates the remaining displacement
    /// for every current time. Under-estimating here can make a query miss a
    /// contact; over-estimating only costs extra iterations.
    fn bound_motion(&self, bv: &Aabb, dir: Vec3) -> Real;
}

/// Linear interpolation between two poses: constant linear velocity, constant
/// rotation axis, uniform angular rate.
#[derive(Debug, Clone)]
pub struct InterpMotion {
    start: Transform,
    end: Transform,
    linear_velocity: Vec3,
    angular_rate: Real,
    time: Real,
}

impl InterpMotion {
    pub fn new(start: Transform, end: Transform) -> Self {
        let delta = end.rotation * start.rotation.inverse();
        let (_, angle) = delta.to_axis_angle();
        Self {
            start,
            end,
            linear_velocity: end.translation - start.translation,
            angular_rate: angle.abs(),
            time: 0.0,
        }
    }

    /// A body that does not move.
    pub fn stationary(pose: Transform) -> Self {
        Self::new(pose, pose)
    }

    fn transform_at(&self, t: Real) -> Transform {
        Transform {
            rotation: self.start.rotation.slerp(self.end.rotation, t),
            translation: self.start.translation.lerp(self.end.translation, t),
        }
    }
}

impl Motion for InterpMotion {
    fn current_transform(&self) -> Transform {
        self.transform_at(self.time)
    }

    fn integrate(&mut self, t: Real) {
        self.time = t.clamp(0.0, 1.0);
    }

    fn bound_motion(&self, bv: &Aabb, dir: Vec3) -> Real {
        let mut rate = dir.dot(self.linear_velocity);
        if self.angular_rate > 0.0 {
            // Points rotate about the moving body origin; an arc-length bound
            // over the farthest point of the box covers the rotational part.
            let center = self.transform_at(self.time).translation;
            rate += self.angular_rate * bv.outer_radius_from(center);
        }
        rate.max(0.0)
    }
}

/// Constant helical velocity: rotation about a fixed world axis combined with
/// translation along it.
#[derive(Debug, Clone)]
pub struct ScrewMotion {
    start: Transform,
    axis_origin: Vec3,
    axis: Vec3,
    linear_rate: Real,
    angular_rate: Real,
    time: Real,
}

impl ScrewMotion {
    /// `axis` is normalized internally. `linear_rate` is the translation per
    /// unit time along the axis; `angular_rate` the rotation in radians per
    /// unit time about it.
    pub fn new(
        start: Transform,
        axis_origin: Vec3,
        axis: Vec3,
        linear_rate: Real,
        angular_rate: Real,
    ) -> Self {
        Self {
            start,
            axis_origin,
            axis: axis.normalize(),
            linear_rate,
            angular_rate,
            time: 0.0,
        }
    }

    fn transform_at(&self, t: Real) -> Transform {
        let twist = Quat::from_axis_angle(self.axis, self.angular_rate * t);
        let slide = self.axis * (self.linear_rate * t);
        Transform {
            rotation: twist * self.start.rotation,
            translation: self.axis_origin
                + twist * (self.start.translation - self.axis_origin)
                + slide,
        }
    }
}

impl Motion for ScrewMotion {
    fn current_transform(&self) -> Transform {
        self.transform_at(self.time)
    }

    fn integrate(&mut self, t: Real) {
        self.time = t.clamp(0.0, 1.0);
    }

    fn bound_motion(&self, bv: &Aabb, dir: Vec3) -> Real {
        let mut rate = self.linear_rate * self.axis.dot(dir);
        if self.angular_rate != 0.0 {
            // |n · (ω × r)| ≤ |ω| · r_perp for every point of the box.
            let r_perp = bv.outer_radius_from_axis(self.axis_origin, self.axis);
            rate += self.angular_rate.abs() * r_perp;
        }
        rate.max(0.0)
    }
}
