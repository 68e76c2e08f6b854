//! Simultaneous BVH descent with motion-aware pruning.
//!
//! The distance traversal visits node pairs of two hierarchies (or one
//! hierarchy against a primitive), tracking the smallest pair distance seen
//! and the tightest safe time step. Every visited pair — pruned or not —
//! contributes to the step bound, so pruning never hides an earlier contact.

use tracing::trace;

use crate::bounding::{Aabb, BoundingVolume};
use crate::bvh::{BvhModel, BvhNodeKind};
use crate::ccd::CcdRequest;
use crate::math::{Real, Vec3};
use crate::motion::Motion;
use crate::narrowphase::pair_distance;
use crate::shape::Shape;
use crate::transform::Transform;

/// Per-query advancement state shared between the outer loop and the
/// traversal.
pub struct AdvanceState {
    pub tf1: Transform,
    pub tf2: Transform,
    /// `tf1⁻¹ ∘ tf2`; identity for axis-aligned kinds, whose trees are refit
    /// into the world frame instead.
    pub rel: Transform,
    /// Smallest pair distance seen in the current descent.
    pub min_distance: Real,
    /// Tightest safe time step found in the current descent.
    pub delta_t: Real,
    /// Accumulated time of contact candidate.
    pub toc: Real,
    pub t_err: Real,
    pub abs_err: Real,
    pub rel_err: Real,
}

impl AdvanceState {
    pub fn new(req: &CcdRequest) -> Self {
        Self {
            tf1: Transform::IDENTITY,
            tf2: Transform::IDENTITY,
            rel: Transform::IDENTITY,
            min_distance: Real::INFINITY,
            delta_t: 1.0,
            toc: 0.0,
            t_err: req.t_err,
            abs_err: req.abs_err,
            rel_err: req.rel_err,
        }
    }

    /// Re-read both poses; `aligned` kinds keep an identity relative
    /// transform because their trees are refit instead.
    pub fn refresh_poses(&mut self, motion1: &dyn Motion, motion2: &dyn Motion, aligned: bool) {
        self.tf1 = motion1.current_transform();
        self.tf2 = motion2.current_transform();
        self.rel = if aligned {
            Transform::IDENTITY
        } else {
            self.tf1.relative(&self.tf2)
        };
    }

    /// Reset the per-descent accumulators.
    pub fn begin_descent(&mut self) {
        self.delta_t = 1.0;
        self.min_distance = Real::INFINITY;
    }

    /// Whether a node pair at distance `d` can be skipped: it cannot improve
    /// the best distance beyond the configured error slack.
    fn can_stop(&self, d: Real) -> bool {
        d > self.min_distance - self.abs_err && d * (1.0 + self.rel_err) > self.min_distance
    }

    /// Tighten the safe step from a pair at separation `d` along the world
    /// direction `n`, with the two sides bounded over `bv1` / `bv2`.
    /// `d <= 0` collapses the step: contact at the current time.
    fn tighten(
        &mut self,
        motion1: &dyn Motion,
        motion2: &dyn Motion,
        d: Real,
        bv1: &Aabb,
        bv2: &Aabb,
        n: Vec3,
    ) {
        if d <= 0.0 {
            self.delta_t = 0.0;
            return;
        }
        let bound = motion1.bound_motion(bv1, n) + motion2.bound_motion(bv2, -n);
        // A bound not exceeding the gap means this pair cannot meet within
        // the remaining interval.
        let step = if bound <= d { 1.0 } else { d / bound };
        if step < self.delta_t {
            self.delta_t = step;
        }
    }
}

/// Transform from a tree's BV frame to the world frame.
pub(crate) fn bv_frame<B: BoundingVolume>(tf: &Transform) -> Transform {
    if B::AXIS_ALIGNED {
        Transform::IDENTITY
    } else {
        *tf
    }
}

/// Triangle vertices in the world frame. Axis-aligned trees were refit, so
/// their current vertices already are world coordinates.
fn world_triangle<B: BoundingVolume>(model: &BvhModel<B>, tf: &Transform, tri: usize) -> [Vec3; 3] {
    let verts = model.triangle_vertices(tri);
    if B::AXIS_ALIGNED {
        verts
    } else {
        verts.map(|v| tf.transform_point(v))
    }
}

fn triangle_shape(verts: [Vec3; 3]) -> Shape {
    Shape::Triangle {
        a: verts[0],
        b: verts[1],
        c: verts[2],
    }
}

// --- distance traversal: tree vs tree --------------------------------------

/// Recursive mesh-vs-mesh distance descent (C5), starting from a node pair.
pub fn distance_recurse<B: BoundingVolume>(
    state: &mut AdvanceState,
    motion1: &dyn Motion,
    motion2: &dyn Motion,
    model1: &BvhModel<B>,
    model2: &BvhModel<B>,
    node1: usize,
    node2: usize,
) {
    let kind1 = model1.node(node1).kind;
    let kind2 = model2.node(node2).kind;

    if let (BvhNodeKind::Leaf { triangle: t1 }, BvhNodeKind::Leaf { triangle: t2 }) =
        (kind1, kind2)
    {
        leaf_pair(state, motion1, motion2, model1, model2, node1, node2, t1, t2);
        return;
    }

    // Descend the node with the larger volume; a leaf is never descended.
    let bv1 = &model1.node(node1).bv;
    let bv2 = &model2.node(node2).bv;
    let descend_first = !model1.is_leaf(node1)
        && (model2.is_leaf(node2) || bv1.size() >= bv2.size());

    let pairs: [(usize, usize); 2] = if descend_first {
        let BvhNodeKind::Internal { left, right } = kind1 else {
            unreachable!("descend_first implies an internal node");
        };
        [(left, node2), (right, node2)]
    } else {
        let BvhNodeKind::Internal { left, right } = kind2 else {
            unreachable!("one of the nodes must be internal");
        };
        [(node1, left), (node1, right)]
    };

    // Visit the closer pair first so its result helps prune the sibling.
    let mut scored = pairs.map(|(a, b)| {
        let (d, dir) = model1
            .node(a)
            .bv
            .separation(&model2.node(b).bv, &state.rel);
        (d, dir, a, b)
    });
    if scored[1].0 < scored[0].0 {
        scored.swap(0, 1);
    }

    for (d, dir, a, b) in scored {
        if state.can_stop(d) {
            // Pruned subtree: its BV separation still constrains the step.
            let bv_tf1 = bv_frame::<B>(&state.tf1);
            let n_world = bv_tf1.transform_vector(dir);
            let w1 = model1.node(a).bv.world_aabb(&bv_tf1);
            let w2 = model2.node(b).bv.world_aabb(&bv_frame::<B>(&state.tf2));
            state.tighten(motion1, motion2, d, &w1, &w2, n_world);
        } else {
            distance_recurse(state, motion1, motion2, model1, model2, a, b);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn leaf_pair<B: BoundingVolume>(
    state: &mut AdvanceState,
    motion1: &dyn Motion,
    motion2: &dyn Motion,
    model1: &BvhModel<B>,
    model2: &BvhModel<B>,
    node1: usize,
    node2: usize,
    tri1: usize,
    tri2: usize,
) {
    let s1 = triangle_shape(world_triangle(model1, &state.tf1, tri1));
    let s2 = triangle_shape(world_triangle(model2, &state.tf2, tri2));
    let r = pair_distance(&s1, &Transform::IDENTITY, &s2, &Transform::IDENTITY);

    if r.distance < state.min_distance {
        state.min_distance = r.distance;
    }
    if r.distance <= 0.0 {
        trace!(tri1, tri2, "leaf contact");
        state.delta_t = 0.0;
        return;
    }

    let n = (r.point2 - r.point1) / r.distance;
    let w1 = model1.node(node1).bv.world_aabb(&bv_frame::<B>(&state.tf1));
    let w2 = model2.node(node2).bv.world_aabb(&bv_frame::<B>(&state.tf2));
    state.tighten(motion1, motion2, r.distance, &w1, &w2, n);
}

// --- distance traversal: tree vs primitive ----------------------------------

/// Recursive mesh-vs-primitive distance descent. The mesh is always the first
/// operand; `shape_aabb` is the primitive's world-frame box for this
/// iteration.
pub fn distance_recurse_shape<B: BoundingVolume>(
    state: &mut AdvanceState,
    motion1: &dyn Motion,
    motion2: &dyn Motion,
    model: &BvhModel<B>,
    shape: &Shape,
    shape_aabb: &Aabb,
    node: usize,
) {
    let bv_tf = bv_frame::<B>(&state.tf1);

    match model.node(node).kind {
        BvhNodeKind::Leaf { triangle } => {
            let tri = triangle_shape(world_triangle(model, &state.tf1, triangle));
            let r = pair_distance(&tri, &Transform::IDENTITY, shape, &state.tf2);

            if r.distance < state.min_distance {
                state.min_distance = r.distance;
            }
            if r.distance <= 0.0 {
                trace!(triangle, "leaf contact");
                state.delta_t = 0.0;
                return;
            }

            let n = (r.point2 - r.point1) / r.distance;
            let w1 = model.node(node).bv.world_aabb(&bv_tf);
            state.tighten(motion1, motion2, r.distance, &w1, shape_aabb, n);
        }
        BvhNodeKind::Internal { left, right } => {
            let mut scored = [left, right].map(|child| {
                let w = model.node(child).bv.world_aabb(&bv_tf);
                let (d, dir) = w.separation(shape_aabb, &Transform::IDENTITY);
                (d, dir, child, w)
            });
            if scored[1].0 < scored[0].0 {
                scored.swap(0, 1);
            }
            for (d, dir, child, w) in scored {
                if state.can_stop(d) {
                    state.tighten(motion1, motion2, d, &w, shape_aabb, dir);
                } else {
                    distance_recurse_shape(
                        state, motion1, motion2, model, shape, shape_aabb, child,
                    );
                }
            }
        }
    }
}

// --- static overlap traversals (t = 0 entry test) ---------------------------

/// Whether two meshes, posed by `tf1` / `tf2`, intersect. Runs on the
/// model-frame trees; vertices are mapped on the fly.
pub fn collide_mesh_mesh<B: BoundingVolume>(
    model1: &BvhModel<B>,
    tf1: &Transform,
    model2: &BvhModel<B>,
    tf2: &Transform,
    node1: usize,
    node2: usize,
) -> bool {
    let bv1 = model1.node(node1).bv.world_aabb(tf1);
    let bv2 = model2.node(node2).bv.world_aabb(tf2);
    if !bv1.overlap(&bv2, &Transform::IDENTITY) {
        return false;
    }

    match (model1.node(node1).kind, model2.node(node2).kind) {
        (BvhNodeKind::Leaf { triangle: t1 }, BvhNodeKind::Leaf { triangle: t2 }) => {
            let s1 = triangle_shape(model1.triangle_vertices(t1).map(|v| tf1.transform_point(v)));
            let s2 = triangle_shape(model2.triangle_vertices(t2).map(|v| tf2.transform_point(v)));
            pair_distance(&s1, &Transform::IDENTITY, &s2, &Transform::IDENTITY).distance <= 0.0
        }
        (BvhNodeKind::Internal { left, right }, kind2) => {
            let descend_first = matches!(kind2, BvhNodeKind::Leaf { .. })
                || model1.node(node1).bv.size() >= model2.node(node2).bv.size();
            if descend_first {
                collide_mesh_mesh(model1, tf1, model2, tf2, left, node2)
                    || collide_mesh_mesh(model1, tf1, model2, tf2, right, node2)
            } else {
                let BvhNodeKind::Internal { left, right } = kind2 else {
                    unreachable!();
                };
                collide_mesh_mesh(model1, tf1, model2, tf2, node1, left)
                    || collide_mesh_mesh(model1, tf1, model2, tf2, node1, right)
            }
        }
        (BvhNodeKind::Leaf { .. }, BvhNodeKind::Internal { left, right }) => {
            collide_mesh_mesh(model1, tf1, model2, tf2, node1, left)
                || collide_mesh_mesh(model1, tf1, model2, tf2, node1, right)
        }
    }
}

/// Whether a mesh posed by `tf1` intersects a primitive posed by `tf2`.
pub fn collide_mesh_shape<B: BoundingVolume>(
    model: &BvhModel<B>,
    tf1: &Transform,
    shape: &Shape,
    tf2: &Transform,
    shape_aabb: &Aabb,
    node: usize,
) -> bool {
    let bv = model.node(node).bv.world_aabb(tf1);
    if !bv.overlap(shape_aabb, &Transform::IDENTITY) {
        return false;
    }
    match model.node(node).kind {
        BvhNodeKind::Leaf { triangle } => {
            let tri =
                triangle_shape(model.triangle_vertices(triangle).map(|v| tf1.transform_point(v)));
            pair_distance(&tri, &Transform::IDENTITY, shape, tf2).distance <= 0.0
        }
        BvhNodeKind::Internal { left, right } => {
            collide_mesh_shape(model, tf1, shape, tf2, shape_aabb, left)
                || collide_mesh_shape(model, tf1, shape, tf2, shape_aabb, right)
        }
    }
}
