//! Bounding volumes for BVH nodes: the common interface plus the two
//! concrete kinds the traversal supports.
//!
//! `Aabb` is the axis-aligned kind: its trees are refit into the world frame
//! each outer iteration and compared with an identity relative transform.
//! `Obb` is the oriented kind: its trees stay in their body frame and the
//! relative transform is applied inside the distance test.

use crate::math::{Mat3, Real, Vec3};
use crate::transform::Transform;

/// Operations a bounding-volume kind must provide to the traversal.
///
/// `distance_lower_bound` must never exceed the true distance between the
/// enclosed sets; an over-estimate would let the traversal prune a subtree
/// that still holds the earliest contact.
pub trait BoundingVolume: Clone + std::fmt::Debug + Send + Sync {
    /// Whether this kind is compared in the world frame (identity relative
    /// transform, trees refit per iteration) rather than through a relative
    /// transform.
    const AXIS_ALIGNED: bool;

    /// Tight-enough volume enclosing the given points.
    fn from_points(points: &[Vec3]) -> Self;

    /// Grow `self` to also enclose `other`.
    fn merge(&mut self, other: &Self);

    fn center(&self) -> Vec3;

    /// Surface area; the traversal descends the node with the larger value.
    fn size(&self) -> Real;

    /// Certified separation between the enclosed sets, with `other` mapped
    /// through `rel` into `self`'s frame: a lower bound on their distance,
    /// plus a unit direction (in `self`'s frame, pointing from `self` toward
    /// `other`) along which that separation holds. Contact requires the
    /// relative displacement along the direction to exceed the bound, which
    /// is what lets the traversal derive a safe time step for a pruned
    /// subtree. The distance is zero when the volumes overlap; the direction
    /// is then only informative.
    fn separation(&self, other: &Self, rel: &Transform) -> (Real, Vec3);

    /// Whether the enclosed sets can intersect, with `other` mapped through
    /// `rel` into `self`'s frame.
    fn overlap(&self, other: &Self, rel: &Transform) -> bool {
        self.distance_lower_bound(other, rel) <= 0.0
    }

    /// Certified lower bound on the distance between the enclosed sets, with
    /// `other` mapped through `rel` into `self`'s frame. Zero when
    /// overlapping.
    fn distance_lower_bound(&self, other: &Self, rel: &Transform) -> Real {
        self.separation(other, rel).0
    }

    /// Volume enclosing the Minkowski sum of `self` with a ball of `radius`.
    fn inflate(&self, radius: Real) -> Self;

    /// World-frame axis-aligned enclosure of this volume under `tf`. Motion
    /// bounds are evaluated against this box regardless of the BV kind.
    fn world_aabb(&self, tf: &Transform) -> Aabb;
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty box (inverted bounds); merging any box into it yields that box.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(Real::INFINITY),
        max: Vec3::splat(Real::NEG_INFINITY),
    };

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.min = aabb.min.min(*p);
            aabb.max = aabb.max.max(*p);
        }
        aabb
    }

    /// Enclosure of this box under a rigid transform.
    ///
    /// Unbounded boxes (planes, halfspaces) pass through unchanged; rotating
    /// infinite corners would produce NaNs.
    pub fn transformed(&self, tf: &Transform) -> Aabb {
        if !self.min.is_finite() || !self.max.is_finite() {
            return *self;
        }
        let rot = Mat3::from_quat(tf.rotation);
        let center = (self.min + self.max) * 0.5;
        let extent = (self.max - self.min) * 0.5;
        let world_center = tf.transform_point(center);
        let world_extent = rot.x_axis.abs() * extent.x
            + rot.y_axis.abs() * extent.y
            + rot.z_axis.abs() * extent.z;
        Aabb {
            min: world_center - world_extent,
            max: world_center + world_extent,
        }
    }

    /// Largest distance from `point` to any corner of the box. Unbounded
    /// boxes report infinity.
    pub fn outer_radius_from(&self, point: Vec3) -> Real {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Real::INFINITY;
        }
        // The farthest corner maximizes per-axis deviation independently.
        let dx = (self.min.x - point.x).abs().max((self.max.x - point.x).abs());
        let dy = (self.min.y - point.y).abs().max((self.max.y - point.y).abs());
        let dz = (self.min.z - point.z).abs().max((self.max.z - point.z).abs());
        Vec3::new(dx, dy, dz).length()
    }

    /// Largest perpendicular distance from the line `(origin, dir)` to any
    /// corner, `dir` unit length. Used by screw-motion bounds.
    pub fn outer_radius_from_axis(&self, origin: Vec3, dir: Vec3) -> Real {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Real::INFINITY;
        }
        let mut r: Real = 0.0;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let rel = corner - origin;
            r = r.max((rel - dir * rel.dot(dir)).length());
        }
        r
    }
}

impl BoundingVolume for Aabb {
    const AXIS_ALIGNED: bool = true;

    fn from_points(points: &[Vec3]) -> Self {
        Aabb::from_points(points)
    }

    fn merge(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    fn size(&self) -> Real {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    fn separation(&self, other: &Self, rel: &Transform) -> (Real, Vec3) {
        let other = if *rel == Transform::IDENTITY {
            *other
        } else {
            other.transformed(rel)
        };
        // Signed per-axis gap: positive toward other, zero where the
        // projections overlap. Its length is the exact box distance and its
        // direction the closest-points axis.
        let mut gap = Vec3::ZERO;
        for i in 0..3 {
            if other.min[i] > self.max[i] {
                gap[i] = other.min[i] - self.max[i];
            } else if self.min[i] > other.max[i] {
                gap[i] = -(self.min[i] - other.max[i]);
            }
        }
        let dist = gap.length();
        if dist > 0.0 {
            (dist, gap / dist)
        } else {
            let dir = (BoundingVolume::center(&other) - BoundingVolume::center(self))
                .normalize_or(Vec3::X);
            (0.0, dir)
        }
    }

    fn inflate(&self, radius: Real) -> Self {
        Aabb {
            min: self.min - Vec3::splat(radius),
            max: self.max + Vec3::splat(radius),
        }
    }

    fn world_aabb(&self, tf: &Transform) -> Aabb {
        self.transformed(tf)
    }
}

/// Oriented bounding box: center, orthonormal axes (matrix columns) and
/// half-extents along them.
#[derive(Debug, Clone, Copy)]
pub struct Obb {
    pub center: Vec3,
    pub axes: Mat3,
    pub half_extents: Vec3,
}

impl Obb {
    fn corner(&self, i: usize) -> Vec3 {
        let e = self.half_extents;
        let local = Vec3::new(
            if i & 1 == 0 { -e.x } else { e.x },
            if i & 2 == 0 { -e.y } else { e.y },
            if i & 4 == 0 { -e.z } else { e.z },
        );
        self.center + self.axes * local
    }

    /// Greatest separation over the fifteen candidate axes of the two boxes,
    /// with `other` already expressed in `self`'s frame, along with the unit
    /// axis achieving it (oriented from `self` toward `other`). The
    /// separation is negative when the boxes overlap on every axis.
    fn max_separation(&self, other: &Obb) -> (Real, Vec3) {
        let t = other.center - self.center;
        let mut best = Real::NEG_INFINITY;
        let mut best_axis = t.normalize_or(Vec3::X);

        let mut test = |axis: Vec3| {
            let len = axis.length();
            if len < 1e-12 {
                return;
            }
            let axis = axis / len;
            let proj_self = self.half_extents.x * self.axes.x_axis.dot(axis).abs()
                + self.half_extents.y * self.axes.y_axis.dot(axis).abs()
                + self.half_extents.z * self.axes.z_axis.dot(axis).abs();
            let proj_other = other.half_extents.x * other.axes.x_axis.dot(axis).abs()
                + other.half_extents.y * other.axes.y_axis.dot(axis).abs()
                + other.half_extents.z * other.axes.z_axis.dot(axis).abs();
            let along = t.dot(axis);
            let sep = along.abs() - proj_self - proj_other;
            if sep > best {
                best = sep;
                best_axis = if along >= 0.0 { axis } else { -axis };
            }
        };

        for a in [self.axes.x_axis, self.axes.y_axis, self.axes.z_axis] {
            test(a);
        }
        for b in [other.axes.x_axis, other.axes.y_axis, other.axes.z_axis] {
            test(b);
        }
        for a in [self.axes.x_axis, self.axes.y_axis, self.axes.z_axis] {
            for b in [other.axes.x_axis, other.axes.y_axis, other.axes.z_axis] {
                test(a.cross(b));
            }
        }
        (best, best_axis)
    }

    fn mapped(&self, rel: &Transform) -> Obb {
        Obb {
            center: rel.transform_point(self.center),
            axes: Mat3::from_quat(rel.rotation) * self.axes,
            half_extents: self.half_extents,
        }
    }
}

impl BoundingVolume for Obb {
    const AXIS_ALIGNED: bool = false;

    /// Fit with identity axes. Tighter orientations come from the mesh
    /// builder upstream; an enclosing fit is all correctness needs.
    fn from_points(points: &[Vec3]) -> Self {
        let aabb = Aabb::from_points(points);
        Obb {
            center: (aabb.min + aabb.max) * 0.5,
            axes: Mat3::IDENTITY,
            half_extents: (aabb.max - aabb.min) * 0.5,
        }
    }

    fn merge(&mut self, other: &Self) {
        // Re-fit in self's axes around both boxes' corners.
        let inv = self.axes.transpose();
        let mut min = -self.half_extents;
        let mut max = self.half_extents;
        for i in 0..8 {
            let local = inv * (other.corner(i) - self.center);
            min = min.min(local);
            max = max.max(local);
        }
        let shift = (min + max) * 0.5;
        self.center += self.axes * shift;
        self.half_extents = (max - min) * 0.5;
    }

    fn center(&self) -> Vec3 {
        self.center
    }

    fn size(&self) -> Real {
        let d = self.half_extents * 2.0;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    fn separation(&self, other: &Self, rel: &Transform) -> (Real, Vec3) {
        // The projection gap along any axis never exceeds the true distance,
        // so the best separating axis yields an admissible lower bound.
        let (sep, axis) = self.max_separation(&other.mapped(rel));
        (sep.max(0.0), axis)
    }

    fn inflate(&self, radius: Real) -> Self {
        Obb {
            center: self.center,
            axes: self.axes,
            half_extents: self.half_extents + Vec3::splat(radius),
        }
    }

    fn world_aabb(&self, tf: &Transform) -> Aabb {
        let world_axes = Mat3::from_quat(tf.rotation) * self.axes;
        let extent = world_axes.x_axis.abs() * self.half_extents.x
            + world_axes.y_axis.abs() * self.half_extents.y
            + world_axes.z_axis.abs() * self.half_extents.z;
        let center = tf.transform_point(self.center);
        Aabb {
            min: center - extent,
            max: center + extent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    #[test]
    fn test_aabb_distance_identity() {
        let a = Aabb {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let b = Aabb {
            min: Vec3::new(3.0, 0.0, 0.0),
            max: Vec3::new(4.0, 1.0, 1.0),
        };
        let d = a.distance_lower_bound(&b, &Transform::IDENTITY);
        assert!((d - 2.0).abs() < 1e-12);
        assert!(!a.overlap(&b, &Transform::IDENTITY));
    }

    #[test]
    fn test_aabb_overlap_and_inflate() {
        let a = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        let b = Aabb {
            min: Vec3::new(1.5, 0.0, 0.0),
            max: Vec3::new(2.5, 1.0, 1.0),
        };
        assert!(!a.overlap(&b, &Transform::IDENTITY));
        // Inflating by the gap (0.5) makes them touch.
        assert!(a.inflate(0.5).overlap(&b, &Transform::IDENTITY));
    }

    #[test]
    fn test_aabb_diagonal_gap() {
        let a = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        let b = Aabb {
            min: Vec3::new(2.0, 2.0, 0.0),
            max: Vec3::new(3.0, 3.0, 1.0),
        };
        let d = a.distance_lower_bound(&b, &Transform::IDENTITY);
        assert!((d - (2.0_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_obb_separation_is_lower_bound() {
        let a = Obb {
            center: Vec3::ZERO,
            axes: Mat3::IDENTITY,
            half_extents: Vec3::ONE,
        };
        let b = Obb {
            center: Vec3::new(4.0, 0.0, 0.0),
            axes: Mat3::IDENTITY,
            half_extents: Vec3::ONE,
        };
        let d = a.distance_lower_bound(&b, &Transform::IDENTITY);
        assert!((d - 2.0).abs() < 1e-12);

        // Rotate b by 45° about z: corners reach sqrt(2) toward a, so the
        // true distance shrinks and the bound must not exceed it.
        let rel = Transform::from_rotation_translation(
            Quat::from_axis_angle(Vec3::Z, std::f64::consts::FRAC_PI_4),
            Vec3::ZERO,
        );
        let d_rot = a.distance_lower_bound(&b, &rel);
        let true_dist = 4.0 - 1.0 - (2.0_f64).sqrt();
        assert!(d_rot <= true_dist + 1e-9, "{} > {}", d_rot, true_dist);
        assert!(d_rot > 0.0);
    }

    #[test]
    fn test_obb_overlap_under_relative_transform() {
        let a = Obb {
            center: Vec3::ZERO,
            axes: Mat3::IDENTITY,
            half_extents: Vec3::ONE,
        };
        let b = a;
        let rel = Transform::from_translation(Vec3::new(1.5, 0.0, 0.0));
        assert!(a.overlap(&b, &rel));
        let rel = Transform::from_translation(Vec3::new(2.5, 0.0, 0.0));
        assert!(!a.overlap(&b, &rel));
    }

    #[test]
    fn test_obb_merge_encloses_both() {
        let mut a = Obb {
            center: Vec3::ZERO,
            axes: Mat3::IDENTITY,
            half_extents: Vec3::ONE,
        };
        let b = Obb {
            center: Vec3::new(3.0, 0.0, 0.0),
            axes: Mat3::IDENTITY,
            half_extents: Vec3::splat(0.5),
        };
        a.merge(&b);
        assert!(a.center.x > 0.0);
        assert!(a.half_extents.x >= 2.25 - 1e-12);
    }

    #[test]
    fn test_outer_radius() {
        let a = Aabb {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let r = a.outer_radius_from(Vec3::ZERO);
        assert!((r - 3.0_f64.sqrt()).abs() < 1e-12);
        let r = a.outer_radius_from_axis(Vec3::ZERO, Vec3::Y);
        assert!((r - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_transformed_aabb_encloses_rotation() {
        let a = Aabb {
            min: Vec3::new(-1.0, -0.5, -0.25),
            max: Vec3::new(1.0, 0.5, 0.25),
        };
        let tf = Transform::from_rotation_translation(
            Quat::from_axis_angle(Vec3::Z, 0.3),
            Vec3::new(5.0, 0.0, 0.0),
        );
        let world = a.transformed(&tf);
        // Every transformed corner must lie inside.
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { a.min.x } else { a.max.x },
                if i & 2 == 0 { a.min.y } else { a.max.y },
                if i & 4 == 0 { a.min.z } else { a.max.z },
            );
            let p = tf.transform_point(corner);
            assert!(p.cmpge(world.min - 1e-12).all() && p.cmple(world.max + 1e-12).all());
        }
    }
}
