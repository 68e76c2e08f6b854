//! Conservative-advancement outer loops.
//!
//! Each variant follows the same fixed-point scheme: place both objects at
//! the current time, measure separation, derive a safe time step from the
//! motion bounds, advance, repeat. A step that collapses below `t_err` means
//! contact is imminent at the accumulated time; a step that walks past the
//! end of the interval means no contact at all.

use tracing::{debug, trace};

use crate::bounding::{Aabb, BoundingVolume};
use crate::bvh::BvhModel;
use crate::ccd::traversal::{
    bv_frame, collide_mesh_mesh, collide_mesh_shape, distance_recurse, distance_recurse_shape,
    AdvanceState,
};
use crate::ccd::{CcdError, CcdRequest, CcdResult};
use crate::math::{Real, Vec3};
use crate::motion::Motion;
use crate::narrowphase::pair_distance;
use crate::shape::Shape;
use crate::transform::Transform;

/// Upper bound on the displacement magnitude (any direction) of points inside
/// `bv` over the remaining interval: the directional bound along each
/// cardinal axis dominates the matching component of any displacement vector.
fn displacement_bound(motion: &dyn Motion, bv: &Aabb) -> Real {
    let mut worst: Real = 0.0;
    for dir in [Vec3::X, Vec3::Y, Vec3::Z] {
        worst = worst.max(motion.bound_motion(bv, dir));
        worst = worst.max(motion.bound_motion(bv, -dir));
    }
    worst * 3.0_f64.sqrt()
}

/// Primitive vs primitive advancement.
pub fn advance_shape_pair(
    s1: &Shape,
    motion1: &mut dyn Motion,
    s2: &Shape,
    motion2: &mut dyn Motion,
    req: &CcdRequest,
) -> Result<CcdResult, CcdError> {
    let mut tf1 = motion1.current_transform();
    let mut tf2 = motion2.current_transform();

    if pair_distance(s1, &tf1, s2, &tf2).distance <= 0.0 {
        return Ok(CcdResult::hit(0.0));
    }

    let cap = req.iteration_cap();
    let mut toc: Real = 0.0;

    for iteration in 0..cap {
        let r = pair_distance(s1, &tf1, s2, &tf2);
        if r.distance <= 0.0 {
            debug!(toc, "contact reached during advancement");
            return Ok(CcdResult::hit(toc));
        }

        let n = (r.point2 - r.point1) / r.distance;
        let bound = motion1.bound_motion(&s1.world_aabb(&tf1), n)
            + motion2.bound_motion(&s2.world_aabb(&tf2), -n);
        let delta = if bound <= r.distance {
            if bound <= 0.0 {
                debug!(toc, distance = r.distance, "no approach along witness");
            }
            1.0
        } else {
            r.distance / bound
        };
        trace!(iteration, toc, distance = r.distance, delta, "advance");

        if delta <= req.t_err {
            return Ok(CcdResult::hit(toc));
        }
        toc += delta;
        if toc > 1.0 {
            return Ok(CcdResult::miss());
        }

        motion1.integrate(toc);
        motion2.integrate(toc);
        tf1 = motion1.current_transform();
        tf2 = motion2.current_transform();
    }
    Err(CcdError::NonConvergence { iterations: cap })
}

/// Mesh vs mesh advancement, generic over the bounding-volume kind.
///
/// Axis-aligned kinds work on query-local clones refit into the world frame
/// every iteration; oriented kinds traverse the caller's trees through the
/// relative transform.
pub fn advance_mesh_mesh<B: BoundingVolume>(
    model1: &BvhModel<B>,
    motion1: &mut dyn Motion,
    model2: &BvhModel<B>,
    motion2: &mut dyn Motion,
    req: &CcdRequest,
) -> Result<CcdResult, CcdError> {
    let tf1 = motion1.current_transform();
    let tf2 = motion2.current_transform();
    if collide_mesh_mesh(model1, &tf1, model2, &tf2, model1.root(), model2.root()) {
        return Ok(CcdResult::hit(0.0));
    }

    let mut work1 = B::AXIS_ALIGNED.then(|| model1.clone());
    let mut work2 = B::AXIS_ALIGNED.then(|| model2.clone());

    let mut state = AdvanceState::new(req);
    let cap = req.iteration_cap();

    for iteration in 0..cap {
        state.refresh_poses(&*motion1, &*motion2, B::AXIS_ALIGNED);
        if let (Some(w1), Some(w2)) = (work1.as_mut(), work2.as_mut()) {
            w1.refit_to_world(&state.tf1);
            w2.refit_to_world(&state.tf2);
        }
        let tree1 = work1.as_ref().unwrap_or(model1);
        let tree2 = work2.as_ref().unwrap_or(model2);

        // Whole-pair reject: if neither root can reach the other even after
        // growing by the total remaining motion, the interval is clear.
        let root1 = tree1
            .node(tree1.root())
            .bv
            .world_aabb(&bv_frame::<B>(&state.tf1));
        let root2 = tree2
            .node(tree2.root())
            .bv
            .world_aabb(&bv_frame::<B>(&state.tf2));
        let slack = displacement_bound(&*motion1, &root1) + displacement_bound(&*motion2, &root2);
        if !root1.inflate(slack).overlap(&root2, &Transform::IDENTITY) {
            debug!(toc = state.toc, slack, "roots unreachable within remaining motion");
            return Ok(CcdResult::miss());
        }

        state.begin_descent();
        distance_recurse(
            &mut state,
            &*motion1,
            &*motion2,
            tree1,
            tree2,
            tree1.root(),
            tree2.root(),
        );
        trace!(
            iteration,
            toc = state.toc,
            min_distance = state.min_distance,
            delta_t = state.delta_t,
            "advance"
        );

        if state.delta_t <= state.t_err {
            return Ok(CcdResult::hit(state.toc));
        }
        state.toc += state.delta_t;
        if state.toc > 1.0 {
            return Ok(CcdResult::miss());
        }

        motion1.integrate(state.toc);
        motion2.integrate(state.toc);
    }
    Err(CcdError::NonConvergence { iterations: cap })
}

/// Mesh vs primitive advancement. The mesh is always the first operand; the
/// result is order-independent, so the transpose entry routes here with the
/// operands swapped.
pub fn advance_mesh_shape<B: BoundingVolume>(
    model: &BvhModel<B>,
    motion1: &mut dyn Motion,
    shape: &Shape,
    motion2: &mut dyn Motion,
    req: &CcdRequest,
) -> Result<CcdResult, CcdError> {
    let tf1 = motion1.current_transform();
    let tf2 = motion2.current_transform();
    let shape_aabb = shape.world_aabb(&tf2);
    if collide_mesh_shape(model, &tf1, shape, &tf2, &shape_aabb, model.root()) {
        return Ok(CcdResult::hit(0.0));
    }

    let mut work = B::AXIS_ALIGNED.then(|| model.clone());

    let mut state = AdvanceState::new(req);
    let cap = req.iteration_cap();

    for iteration in 0..cap {
        state.refresh_poses(&*motion1, &*motion2, B::AXIS_ALIGNED);
        if let Some(w) = work.as_mut() {
            w.refit_to_world(&state.tf1);
        }
        let tree = work.as_ref().unwrap_or(model);
        let shape_aabb = shape.world_aabb(&state.tf2);

        let root = tree
            .node(tree.root())
            .bv
            .world_aabb(&bv_frame::<B>(&state.tf1));
        let slack = displacement_bound(&*motion1, &root) + displacement_bound(&*motion2, &shape_aabb);
        if slack.is_finite() && !root.inflate(slack).overlap(&shape_aabb, &Transform::IDENTITY) {
            debug!(
                toc = state.toc,
                slack, "primitive unreachable within remaining motion"
            );
            return Ok(CcdResult::miss());
        }

        state.begin_descent();
        distance_recurse_shape(
            &mut state,
            &*motion1,
            &*motion2,
            tree,
            shape,
            &shape_aabb,
            tree.root(),
        );
        trace!(
            iteration,
            toc = state.toc,
            min_distance = state.min_distance,
            delta_t = state.delta_t,
            "advance"
        );

        if state.delta_t <= state.t_err {
            return Ok(CcdResult::hit(state.toc));
        }
        state.toc += state.delta_t;
        if state.toc > 1.0 {
            return Ok(CcdResult::miss());
        }

        motion1.integrate(state.toc);
        motion2.integrate(state.toc);
    }
    Err(CcdError::NonConvergence { iterations: cap })
}
