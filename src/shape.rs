//! Geometric primitives, their support mappings, and the runtime type tags
//! used by the dispatch table.

use crate::bounding::{Aabb, Obb};
use crate::bvh::BvhModel;
use crate::math::{Real, Vec3};
use crate::transform::Transform;

/// Coarse classification of a geometry object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Unknown,
    /// A bounding-volume hierarchy over mesh triangles.
    Bvh,
    /// A single convex primitive (or plane/halfspace).
    Primitive,
    /// Reserved; no octree geometry is currently implemented.
    Octree,
}

/// Fine-grained geometry tag. One value per primitive kind plus one per
/// supported BVH bounding-volume kind; the dispatch table is indexed by a
/// pair of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    AabbTree,
    ObbTree,
    Sphere,
    Box,
    Capsule,
    Cylinder,
    Cone,
    Convex,
    Plane,
    Halfspace,
    Triangle,
}

impl NodeType {
    /// Number of tags; the dispatch table is `COUNT × COUNT`.
    pub const COUNT: usize = 11;

    /// Stable index into the dispatch table.
    pub fn index(self) -> usize {
        match self {
            NodeType::AabbTree => 0,
            NodeType::ObbTree => 1,
            NodeType::Sphere => 2,
            NodeType::Box => 3,
            NodeType::Capsule => 4,
            NodeType::Cylinder => 5,
            NodeType::Cone => 6,
            NodeType::Convex => 7,
            NodeType::Plane => 8,
            NodeType::Halfspace => 9,
            NodeType::Triangle => 10,
        }
    }

    /// All primitive (non-BVH) tags, in table order.
    pub const PRIMITIVES: [NodeType; 9] = [
        NodeType::Sphere,
        NodeType::Box,
        NodeType::Capsule,
        NodeType::Cylinder,
        NodeType::Cone,
        NodeType::Convex,
        NodeType::Plane,
        NodeType::Halfspace,
        NodeType::Triangle,
    ];
}

/// A convex primitive, a plane, or a halfspace.
///
/// `Capsule`, `Cylinder` and `Cone` are aligned with their local Y axis.
/// `Plane` and `Halfspace` are the level set / sublevel set of `normal · x = offset`
/// in the shape's local frame; they are the only variants without a support
/// mapping and are routed to dedicated solvers by the narrowphase.
#[derive(Debug, Clone)]
pub enum Shape {
    Sphere { radius: Real },
    Box { half_extents: Vec3 },
    Capsule { radius: Real, half_height: Real },
    Cylinder { radius: Real, half_height: Real },
    Cone { radius: Real, half_height: Real },
    Convex { points: Vec<Vec3> },
    Plane { normal: Vec3, offset: Real },
    Halfspace { normal: Vec3, offset: Real },
    Triangle { a: Vec3, b: Vec3, c: Vec3 },
}

impl Shape {
    /// Runtime tag for dispatch.
    pub fn node_type(&self) -> NodeType {
        match self {
            Shape::Sphere { .. } => NodeType::Sphere,
            Shape::Box { .. } => NodeType::Box,
            Shape::Capsule { .. } => NodeType::Capsule,
            Shape::Cylinder { .. } => NodeType::Cylinder,
            Shape::Cone { .. } => NodeType::Cone,
            Shape::Convex { .. } => NodeType::Convex,
            Shape::Plane { .. } => NodeType::Plane,
            Shape::Halfspace { .. } => NodeType::Halfspace,
            Shape::Triangle { .. } => NodeType::Triangle,
        }
    }

    /// Whether this shape has a support mapping (everything except planes
    /// and halfspaces).
    pub fn is_support_mapped(&self) -> bool {
        !matches!(self, Shape::Plane { .. } | Shape::Halfspace { .. })
    }

    /// Farthest point of the shape along `direction`, in world space.
    ///
    /// `direction` need not be normalized. Planes and halfspaces are not
    /// support-mapped; the narrowphase dispatches them before reaching this.
    pub fn support(&self, direction: Vec3, tf: &Transform) -> Vec3 {
        let local_dir = tf.rotation.inverse() * direction;
        tf.transform_point(self.support_local(local_dir))
    }

    /// Support point in the shape's own frame.
    fn support_local(&self, direction: Vec3) -> Vec3 {
        let dir = direction.normalize_or_zero();
        match self {
            Shape::Sphere { radius } => dir * *radius,
            Shape::Box { half_extents } => Vec3::new(
                if dir.x >= 0.0 {
                    half_extents.x
                } else {
                    -half_extents.x
                },
                if dir.y >= 0.0 {
                    half_extents.y
                } else {
                    -half_extents.y
                },
                if dir.z >= 0.0 {
                    half_extents.z
                } else {
                    -half_extents.z
                },
            ),
            Shape::Capsule {
                radius,
                half_height,
            } => {
                let cap = if dir.y >= 0.0 {
                    Vec3::new(0.0, *half_height, 0.0)
                } else {
                    Vec3::new(0.0, -*half_height, 0.0)
                };
                cap + dir * *radius
            }
            Shape::Cylinder {
                radius,
                half_height,
            } => {
                let y = if dir.y >= 0.0 {
                    *half_height
                } else {
                    -*half_height
                };
                let xz = Vec3::new(dir.x, 0.0, dir.z);
                let xz_len = xz.length();
                let rim = if xz_len > 1e-12 {
                    xz * (*radius / xz_len)
                } else {
                    Vec3::ZERO
                };
                Vec3::new(rim.x, y, rim.z)
            }
            Shape::Cone {
                radius,
                half_height,
            } => {
                // A cone is the hull of its apex and base disk: the support is
                // whichever of the two candidates projects farther.
                let apex = Vec3::new(0.0, *half_height, 0.0);
                let xz = Vec3::new(dir.x, 0.0, dir.z);
                let xz_len = xz.length();
                let base_rim = if xz_len > 1e-12 {
                    Vec3::new(
                        dir.x / xz_len * *radius,
                        -*half_height,
                        dir.z / xz_len * *radius,
                    )
                } else {
                    Vec3::new(0.0, -*half_height, 0.0)
                };
                if apex.dot(dir) >= base_rim.dot(dir) {
                    apex
                } else {
                    base_rim
                }
            }
            Shape::Convex { points } => {
                let mut best = points.first().copied().unwrap_or(Vec3::ZERO);
                let mut best_dot = best.dot(dir);
                for p in points.iter().skip(1) {
                    let d = p.dot(dir);
                    if d > best_dot {
                        best_dot = d;
                        best = *p;
                    }
                }
                best
            }
            Shape::Triangle { a, b, c } => {
                let da = a.dot(dir);
                let db = b.dot(dir);
                let dc = c.dot(dir);
                if da >= db && da >= dc {
                    *a
                } else if db >= dc {
                    *b
                } else {
                    *c
                }
            }
            Shape::Plane { .. } | Shape::Halfspace { .. } => {
                unreachable!("planes and halfspaces are handled by dedicated solvers")
            }
        }
    }

    /// Axis-aligned bounding box in the shape's own frame. Planes and
    /// halfspaces are unbounded and report an infinite box.
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Shape::Sphere { radius } => Aabb {
                min: Vec3::splat(-radius),
                max: Vec3::splat(*radius),
            },
            Shape::Box { half_extents } => Aabb {
                min: -*half_extents,
                max: *half_extents,
            },
            Shape::Capsule {
                radius,
                half_height,
            } => {
                let e = Vec3::new(*radius, half_height + radius, *radius);
                Aabb { min: -e, max: e }
            }
            Shape::Cylinder {
                radius,
                half_height,
            }
            | Shape::Cone {
                radius,
                half_height,
            } => {
                let e = Vec3::new(*radius, *half_height, *radius);
                Aabb { min: -e, max: e }
            }
            Shape::Convex { points } => Aabb::from_points(points),
            Shape::Triangle { a, b, c } => Aabb::from_points(&[*a, *b, *c]),
            Shape::Plane { .. } | Shape::Halfspace { .. } => Aabb {
                min: Vec3::splat(Real::NEG_INFINITY),
                max: Vec3::splat(Real::INFINITY),
            },
        }
    }

    /// World-frame AABB of the shape under `tf`.
    pub fn world_aabb(&self, tf: &Transform) -> Aabb {
        self.local_aabb().transformed(tf)
    }
}

/// A geometry operand for a continuous-collision query: either a single
/// primitive or a BVH mesh with one of the supported bounding-volume kinds.
#[derive(Debug, Clone)]
pub enum Geometry {
    Shape(Shape),
    AabbMesh(BvhModel<Aabb>),
    ObbMesh(BvhModel<Obb>),
}

impl Geometry {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Geometry::Shape(_) => ObjectType::Primitive,
            Geometry::AabbMesh(_) | Geometry::ObbMesh(_) => ObjectType::Bvh,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Geometry::Shape(s) => s.node_type(),
            Geometry::AabbMesh(_) => NodeType::AabbTree,
            Geometry::ObbMesh(_) => NodeType::ObbTree,
        }
    }

    /// Axis-aligned bounds in the geometry's own frame.
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Geometry::Shape(s) => s.local_aabb(),
            Geometry::AabbMesh(m) => m.local_aabb(),
            Geometry::ObbMesh(m) => m.local_aabb(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    #[test]
    fn test_sphere_support() {
        let shape = Shape::Sphere { radius: 2.0 };
        let tf = Transform::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let s = shape.support(Vec3::Y, &tf);
        assert!((s - Vec3::new(0.0, 7.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_box_support_rotated() {
        let shape = Shape::Box {
            half_extents: Vec3::new(1.0, 2.0, 3.0),
        };
        // Quarter turn about Z: local +y maps to world -x.
        let tf = Transform::from_rotation_translation(
            Quat::from_axis_angle(Vec3::Z, std::f64::consts::FRAC_PI_2),
            Vec3::ZERO,
        );
        let s = shape.support(Vec3::new(-1.0, 0.0, 0.0), &tf);
        assert!((s.x - (-2.0)).abs() < 1e-12, "support x = {}", s.x);
    }

    #[test]
    fn test_cone_support_picks_apex() {
        let shape = Shape::Cone {
            radius: 1.0,
            half_height: 1.0,
        };
        let s = shape.support(Vec3::Y, &Transform::IDENTITY);
        assert!((s - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-12);
        let s = shape.support(Vec3::new(1.0, -1.0, 0.0), &Transform::IDENTITY);
        assert!((s - Vec3::new(1.0, -1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_capsule_local_aabb() {
        let shape = Shape::Capsule {
            radius: 0.5,
            half_height: 1.0,
        };
        let aabb = shape.local_aabb();
        assert!((aabb.max - Vec3::new(0.5, 1.5, 0.5)).length() < 1e-12);
    }

    #[test]
    fn test_node_type_indices_unique() {
        let mut seen = [false; NodeType::COUNT];
        for t in [
            NodeType::AabbTree,
            NodeType::ObbTree,
            NodeType::Sphere,
            NodeType::Box,
            NodeType::Capsule,
            NodeType::Cylinder,
            NodeType::Cone,
            NodeType::Convex,
            NodeType::Plane,
            NodeType::Halfspace,
            NodeType::Triangle,
        ] {
            let i = t.index();
            assert!(!seen[i]);
            seen[i] = true;
        }
    }
}
