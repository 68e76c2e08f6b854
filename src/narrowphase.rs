//! Static pair distance queries: GJK over support mappings, with closed-form
//! solvers for sphere pairs and for anything against a plane or halfspace.
//!
//! Distances are signed where a closed form exists (negative = penetrating).
//! The GJK path reports `0.0` for intersecting pairs; the advancement loop
//! only distinguishes `d ≤ 0` from `d > 0`, so the exact depth is never
//! needed.

use crate::math::{Real, Vec3};
use crate::shape::Shape;
use crate::transform::Transform;

/// Distance between two primitives with world-space witness points.
#[derive(Debug, Clone, Copy)]
pub struct PairDistance {
    /// Separation distance; `<= 0` means the shapes touch or overlap.
    pub distance: Real,
    /// Closest point on the first shape.
    pub point1: Vec3,
    /// Closest point on the second shape.
    pub point2: Vec3,
}

/// Distance between two shapes under the given poses.
pub fn pair_distance(s1: &Shape, tf1: &Transform, s2: &Shape, tf2: &Transform) -> PairDistance {
    match (s1, s2) {
        (Shape::Sphere { radius: r1 }, Shape::Sphere { radius: r2 }) => {
            sphere_sphere(*r1, tf1, *r2, tf2)
        }
        (Shape::Plane { .. } | Shape::Halfspace { .. }, Shape::Plane { .. } | Shape::Halfspace { .. }) => {
            flat_flat(s1, tf1, s2, tf2)
        }
        (Shape::Plane { normal, offset }, _) => {
            let r = support_vs_plane(s2, tf2, *normal, *offset, tf1, false);
            swap_points(r)
        }
        (Shape::Halfspace { normal, offset }, _) => {
            let r = support_vs_plane(s2, tf2, *normal, *offset, tf1, true);
            swap_points(r)
        }
        (_, Shape::Plane { normal, offset }) => {
            support_vs_plane(s1, tf1, *normal, *offset, tf2, false)
        }
        (_, Shape::Halfspace { normal, offset }) => {
            support_vs_plane(s1, tf1, *normal, *offset, tf2, true)
        }
        _ => gjk_distance(s1, tf1, s2, tf2),
    }
}

fn swap_points(r: PairDistance) -> PairDistance {
    PairDistance {
        distance: r.distance,
        point1: r.point2,
        point2: r.point1,
    }
}

fn sphere_sphere(r1: Real, tf1: &Transform, r2: Real, tf2: &Transform) -> PairDistance {
    let c1 = tf1.translation;
    let c2 = tf2.translation;
    let delta = c2 - c1;
    let centers = delta.length();
    let n = if centers > 1e-12 {
        delta / centers
    } else {
        Vec3::X
    };
    PairDistance {
        distance: centers - r1 - r2,
        point1: c1 + n * r1,
        point2: c2 - n * r2,
    }
}

/// World-frame normal and offset of `normal · x = offset` posed by `tf`.
fn plane_to_world(normal: Vec3, offset: Real, tf: &Transform) -> (Vec3, Real) {
    let n = tf.rotation * normal;
    (n, offset + n.dot(tf.translation))
}

/// Support-mapped shape against a plane (`two_sided = false` makes it a
/// halfspace `n·x ≤ d`). Returns the shape's witness as `point1`.
fn support_vs_plane(
    shape: &Shape,
    tf: &Transform,
    normal: Vec3,
    offset: Real,
    plane_tf: &Transform,
    halfspace: bool,
) -> PairDistance {
    let (n, d) = plane_to_world(normal, offset, plane_tf);
    let lowest = shape.support(-n, tf);
    let lo = n.dot(lowest) - d;
    if halfspace || lo >= 0.0 {
        // Halfspace: the signed distance of the deepest point is exact.
        // Plane, shape fully above: same witness.
        return PairDistance {
            distance: lo,
            point1: lowest,
            point2: lowest - n * lo,
        };
    }
    let highest = shape.support(n, tf);
    let hi = n.dot(highest) - d;
    if hi <= 0.0 {
        // Fully below the plane.
        return PairDistance {
            distance: -hi,
            point1: highest,
            point2: highest - n * hi,
        };
    }
    // Straddling: penetrating from whichever side is shallower.
    if -lo <= hi {
        PairDistance {
            distance: lo,
            point1: lowest,
            point2: lowest - n * lo,
        }
    } else {
        PairDistance {
            distance: -hi,
            point1: highest,
            point2: highest - n * hi,
        }
    }
}

/// Plane/halfspace against plane/halfspace. These pairs are either
/// intersecting (distance zero), or parallel with a well-defined gap.
fn flat_flat(s1: &Shape, tf1: &Transform, s2: &Shape, tf2: &Transform) -> PairDistance {
    let (n1, d1, hs1) = match s1 {
        Shape::Plane { normal, offset } => {
            let (n, d) = plane_to_world(*normal, *offset, tf1);
            (n, d, false)
        }
        Shape::Halfspace { normal, offset } => {
            let (n, d) = plane_to_world(*normal, *offset, tf1);
            (n, d, true)
        }
        _ => unreachable!("flat_flat called with a bounded shape"),
    };
    let (n2, d2, hs2) = match s2 {
        Shape::Plane { normal, offset } => {
            let (n, d) = plane_to_world(*normal, *offset, tf2);
            (n, d, false)
        }
        Shape::Halfspace { normal, offset } => {
            let (n, d) = plane_to_world(*normal, *offset, tf2);
            (n, d, true)
        }
        _ => unreachable!("flat_flat called with a bounded shape"),
    };

    let cos = n1.dot(n2);
    if cos.abs() < 1.0 - 1e-9 {
        // Non-parallel flats always intersect. Pick a point on the
        // intersection line as the shared witness.
        let denom = 1.0 - cos * cos;
        let a = (d1 - d2 * cos) / denom;
        let b = (d2 - d1 * cos) / denom;
        let p = n1 * a + n2 * b;
        return PairDistance {
            distance: 0.0,
            point1: p,
            point2: p,
        };
    }

    // Parallel. Express the second flat's level along n1.
    let sign = if cos > 0.0 { 1.0 } else { -1.0 };
    let level2 = sign * d2;
    let distance = match (hs1, hs2) {
        (false, false) => (d1 - level2).abs(),
        // Halfspace vs plane: positive gap only when the plane lies outside.
        (true, false) => level2 - d1,
        (false, true) => {
            // Plane vs halfspace, with the halfspace along n2 = sign*n1:
            // gap of the plane's level above the halfspace surface.
            sign * d1 - d2
        }
        (true, true) => {
            if sign > 0.0 {
                // Same orientation: one contains the other.
                0.0
            } else {
                // Opposing halfspaces: gap between the two boundaries.
                -d2 - d1
            }
        }
    };
    let p1 = n1 * d1;
    let p2 = n1 * level2;
    PairDistance {
        distance,
        point1: p1,
        point2: p2,
    }
}

// --- GJK distance ----------------------------------------------------------

const GJK_MAX_ITERATIONS: usize = 128;
const GJK_REL_TOL: Real = 1e-12;
const GJK_ABS_TOL: Real = 1e-20;

/// A vertex of the Minkowski difference with its source points.
#[derive(Debug, Clone, Copy)]
struct SupportPoint {
    w: Vec3,
    p: Vec3,
    q: Vec3,
}

fn minkowski_support(
    s1: &Shape,
    tf1: &Transform,
    s2: &Shape,
    tf2: &Transform,
    dir: Vec3,
) -> SupportPoint {
    let p = s1.support(dir, tf1);
    let q = s2.support(-dir, tf2);
    SupportPoint { w: p - q, p, q }
}

/// GJK distance between two support-mapped shapes, tracking barycentric
/// weights so the converged simplex yields witness points on both shapes.
/// Intersecting pairs report distance `0.0`.
fn gjk_distance(s1: &Shape, tf1: &Transform, s2: &Shape, tf2: &Transform) -> PairDistance {
    debug_assert!(s1.is_support_mapped() && s2.is_support_mapped());

    let mut dir = tf2.translation - tf1.translation;
    if dir.length_squared() < 1e-12 {
        dir = Vec3::X;
    }

    let mut simplex = vec![minkowski_support(s1, tf1, s2, tf2, dir)];
    let mut lambdas = vec![1.0];
    let mut v = simplex[0].w;

    for _ in 0..GJK_MAX_ITERATIONS {
        let vlen2 = v.length_squared();
        if vlen2 < GJK_ABS_TOL {
            // Origin reached: touching or penetrating.
            return witness(&simplex, &lambdas, 0.0);
        }

        let fresh = minkowski_support(s1, tf1, s2, tf2, -v);
        // No direction can improve on the current estimate.
        if vlen2 - v.dot(fresh.w) <= GJK_REL_TOL * vlen2 {
            break;
        }
        simplex.push(fresh);

        match project_origin(&mut simplex) {
            Projection::Outside { closest, weights } => {
                v = closest;
                lambdas = weights;
            }
            Projection::Inside => {
                return witness(&simplex, &[0.25, 0.25, 0.25, 0.25], 0.0);
            }
        }
    }

    witness(&simplex, &lambdas, v.length())
}

fn witness(simplex: &[SupportPoint], lambdas: &[Real], distance: Real) -> PairDistance {
    let mut p = Vec3::ZERO;
    let mut q = Vec3::ZERO;
    for (sp, &l) in simplex.iter().zip(lambdas) {
        p += sp.p * l;
        q += sp.q * l;
    }
    PairDistance {
        distance,
        point1: p,
        point2: q,
    }
}

enum Projection {
    /// Closest point of the simplex to the origin, with the simplex reduced
    /// to its supporting vertices and matching barycentric weights.
    Outside { closest: Vec3, weights: Vec<Real> },
    /// The origin lies inside the (tetrahedral) simplex.
    Inside,
}

/// Project the origin onto the current simplex, discarding vertices that do
/// not support the closest feature.
fn project_origin(simplex: &mut Vec<SupportPoint>) -> Projection {
    match simplex.len() {
        1 => Projection::Outside {
            closest: simplex[0].w,
            weights: vec![1.0],
        },
        2 => {
            let (kept, closest, weights) = project_segment(simplex[0], simplex[1]);
            *simplex = kept;
            Projection::Outside { closest, weights }
        }
        3 => {
            let (kept, closest, weights) = project_triangle(simplex[0], simplex[1], simplex[2]);
            *simplex = kept;
            Projection::Outside { closest, weights }
        }
        4 => project_tetrahedron(simplex),
        _ => unreachable!("simplex holds at most four vertices"),
    }
}

type Reduced = (Vec<SupportPoint>, Vec3, Vec<Real>);

fn project_segment(a: SupportPoint, b: SupportPoint) -> Reduced {
    let ab = b.w - a.w;
    let len2 = ab.length_squared();
    if len2 < 1e-30 {
        return (vec![a], a.w, vec![1.0]);
    }
    let t = -a.w.dot(ab) / len2;
    if t <= 0.0 {
        (vec![a], a.w, vec![1.0])
    } else if t >= 1.0 {
        (vec![b], b.w, vec![1.0])
    } else {
        (vec![a, b], a.w + ab * t, vec![1.0 - t, t])
    }
}

fn project_triangle(a: SupportPoint, b: SupportPoint, c: SupportPoint) -> Reduced {
    let ab = b.w - a.w;
    let ac = c.w - a.w;
    let ap = -a.w;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (vec![a], a.w, vec![1.0]);
    }

    let bp = -b.w;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (vec![b], b.w, vec![1.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = d1 / (d1 - d3);
        return (vec![a, b], a.w + ab * t, vec![1.0 - t, t]);
    }

    let cp = -c.w;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (vec![c], c.w, vec![1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return (vec![a, c], a.w + ac * t, vec![1.0 - t, t]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (
            vec![b, c],
            b.w + (c.w - b.w) * t,
            vec![1.0 - t, t],
        );
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (
        vec![a, b, c],
        a.w + ab * v + ac * w,
        vec![1.0 - v - w, v, w],
    )
}

fn project_tetrahedron(simplex: &mut Vec<SupportPoint>) -> Projection {
    let [a, b, c, d] = [simplex[0], simplex[1], simplex[2], simplex[3]];

    // The origin counts as outside a face plane when it does not lie
    // strictly on the same side as the remaining vertex; an on-plane origin
    // is projected rather than claimed enclosed, which keeps degenerate
    // (near-coplanar) simplices from reporting a false contact.
    let outside = |p0: Vec3, p1: Vec3, p2: Vec3, opposite: Vec3| -> bool {
        let n = (p1 - p0).cross(p2 - p0);
        let signed_origin = -p0.dot(n);
        let signed_opposite = (opposite - p0).dot(n);
        signed_origin * signed_opposite <= 0.0
    };

    let mut best: Option<Reduced> = None;
    let mut consider = |r: Reduced| {
        let closer = match &best {
            Some((_, v, _)) => r.1.length_squared() < v.length_squared(),
            None => true,
        };
        if closer {
            best = Some(r);
        }
    };

    if outside(a.w, b.w, c.w, d.w) {
        consider(project_triangle(a, b, c));
    }
    if outside(a.w, b.w, d.w, c.w) {
        consider(project_triangle(a, b, d));
    }
    if outside(a.w, c.w, d.w, b.w) {
        consider(project_triangle(a, c, d));
    }
    if outside(b.w, c.w, d.w, a.w) {
        consider(project_triangle(b, c, d));
    }

    match best {
        Some((kept, closest, weights)) => {
            *simplex = kept;
            Projection::Outside { closest, weights }
        }
        None => Projection::Inside,
    }
}
