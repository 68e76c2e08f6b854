//! Continuous collision queries.
//!
//! [`continuous_collide`] reports whether two rigid objects moving over the
//! unit time interval touch, and if so the first time of contact. The
//! algorithm is conservative advancement: repeatedly measure the static
//! separation, bound how fast the objects can close it, and step time forward
//! by a fraction that provably cannot skip a contact.

pub mod advance;
pub mod dispatch;
pub mod traversal;

use thiserror::Error;

use crate::math::Real;
use crate::motion::Motion;
use crate::shape::{Geometry, NodeType};

/// Tolerances for a continuous-collision query.
#[derive(Debug, Clone)]
pub struct CcdRequest {
    /// Convergence tolerance on the time step: once the safe step drops to
    /// this value, contact is imminent and the query reports a hit at the
    /// accumulated time. Default: `1e-4`.
    pub t_err: Real,
    /// Absolute slack in the traversal's best-distance pruning. Default: `1e-6`.
    pub abs_err: Real,
    /// Relative slack in the traversal's best-distance pruning. Default: `1e-6`.
    pub rel_err: Real,
    /// Hard cap on outer iterations; `0` derives `⌈1/t_err⌉ + 16` from the
    /// progress guarantee. Exceeding the cap means a motion's bound broke its
    /// contract. Default: `0`.
    pub max_iterations: usize,
}

impl Default for CcdRequest {
    fn default() -> Self {
        Self {
            t_err: 1e-4,
            abs_err: 1e-6,
            rel_err: 1e-6,
            max_iterations: 0,
        }
    }
}

impl CcdRequest {
    pub(crate) fn iteration_cap(&self) -> usize {
        if self.max_iterations > 0 {
            self.max_iterations
        } else {
            (1.0 / self.t_err).ceil() as usize + 16
        }
    }
}

/// Outcome of a continuous-collision query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdResult {
    pub is_collide: bool,
    /// First time of contact in `[0, 1]`; `1.0` when no contact occurs.
    pub time_of_contact: Real,
}

impl CcdResult {
    pub(crate) fn hit(toc: Real) -> Self {
        Self {
            is_collide: true,
            time_of_contact: toc.clamp(0.0, 1.0),
        }
    }

    pub(crate) fn miss() -> Self {
        Self {
            is_collide: false,
            time_of_contact: 1.0,
        }
    }
}

/// Failure modes of a query. These are contract violations, not geometric
/// outcomes: a pair that never touches is a normal result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CcdError {
    /// No advancement specialization is registered for this tag pair.
    #[error("no continuous-collision handler for {first:?} vs {second:?}")]
    UnsupportedPair { first: NodeType, second: NodeType },
    /// The outer loop exceeded its iteration cap, which the progress
    /// guarantee rules out unless a motion bound under-approximated.
    #[error("conservative advancement did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },
}

/// Compute the time of first contact between two moving objects over
/// `t ∈ [0, 1]`.
///
/// Motions are taken by mutable reference because advancing the shared time
/// parameter integrates them in place; they are left at the final query time.
/// Geometries are only read.
///
/// # Errors
///
/// [`CcdError::UnsupportedPair`] when the tag pair has no registered handler
/// (for example a mixed AABB/OBB tree pairing);
/// [`CcdError::NonConvergence`] when a motion's bound violates its contract.
pub fn continuous_collide(
    g1: &Geometry,
    m1: &mut dyn Motion,
    g2: &Geometry,
    m2: &mut dyn Motion,
    req: &CcdRequest,
) -> Result<CcdResult, CcdError> {
    let handler = dispatch::lookup(g1.node_type(), g2.node_type()).ok_or(
        CcdError::UnsupportedPair {
            first: g1.node_type(),
            second: g2.node_type(),
        },
    )?;
    handler(g1, m1, g2, m2, req)
}
