//! Runtime dispatch over geometry tag pairs.
//!
//! A `NodeType × NodeType` table maps every supported pairing to its
//! advancement specialization. The table is built once, on first use, and
//! never mutated afterwards; absent entries surface as
//! [`CcdError::UnsupportedPair`].

use std::sync::OnceLock;

use crate::ccd::advance::{advance_mesh_mesh, advance_mesh_shape, advance_shape_pair};
use crate::ccd::{CcdError, CcdRequest, CcdResult};
use crate::motion::Motion;
use crate::shape::{Geometry, NodeType};

/// One advancement specialization.
pub type Handler = fn(
    &Geometry,
    &mut dyn Motion,
    &Geometry,
    &mut dyn Motion,
    &CcdRequest,
) -> Result<CcdResult, CcdError>;

struct DispatchTable {
    entries: [[Option<Handler>; NodeType::COUNT]; NodeType::COUNT],
}

static TABLE: OnceLock<DispatchTable> = OnceLock::new();

/// Handler for a tag pair, if one is registered. Lookups are idempotent: the
/// table is immutable after its one-time construction.
pub fn lookup(first: NodeType, second: NodeType) -> Option<Handler> {
    TABLE
        .get_or_init(build_table)
        .entries[first.index()][second.index()]
}

fn build_table() -> DispatchTable {
    let mut entries: [[Option<Handler>; NodeType::COUNT]; NodeType::COUNT] =
        [[None; NodeType::COUNT]; NodeType::COUNT];

    for a in NodeType::PRIMITIVES {
        for b in NodeType::PRIMITIVES {
            entries[a.index()][b.index()] = Some(shape_shape);
        }
    }

    for p in NodeType::PRIMITIVES {
        entries[NodeType::AabbTree.index()][p.index()] = Some(mesh_shape);
        entries[p.index()][NodeType::AabbTree.index()] = Some(shape_mesh);
        entries[NodeType::ObbTree.index()][p.index()] = Some(mesh_shape);
        entries[p.index()][NodeType::ObbTree.index()] = Some(shape_mesh);
    }

    // Tree pairs only match on the same bounding-volume kind.
    entries[NodeType::AabbTree.index()][NodeType::AabbTree.index()] = Some(mesh_mesh);
    entries[NodeType::ObbTree.index()][NodeType::ObbTree.index()] = Some(mesh_mesh);

    DispatchTable { entries }
}

fn unsupported(g1: &Geometry, g2: &Geometry) -> CcdError {
    CcdError::UnsupportedPair {
        first: g1.node_type(),
        second: g2.node_type(),
    }
}

fn shape_shape(
    g1: &Geometry,
    m1: &mut dyn Motion,
    g2: &Geometry,
    m2: &mut dyn Motion,
    req: &CcdRequest,
) -> Result<CcdResult, CcdError> {
    let (Geometry::Shape(s1), Geometry::Shape(s2)) = (g1, g2) else {
        return Err(unsupported(g1, g2));
    };
    advance_shape_pair(s1, m1, s2, m2, req)
}

fn mesh_shape(
    g1: &Geometry,
    m1: &mut dyn Motion,
    g2: &Geometry,
    m2: &mut dyn Motion,
    req: &CcdRequest,
) -> Result<CcdResult, CcdError> {
    let Geometry::Shape(shape) = g2 else {
        return Err(unsupported(g1, g2));
    };
    match g1 {
        Geometry::AabbMesh(model) => advance_mesh_shape(model, m1, shape, m2, req),
        Geometry::ObbMesh(model) => advance_mesh_shape(model, m1, shape, m2, req),
        Geometry::Shape(_) => Err(unsupported(g1, g2)),
    }
}

/// Transpose of [`mesh_shape`]; the advancement result does not depend on
/// operand order.
fn shape_mesh(
    g1: &Geometry,
    m1: &mut dyn Motion,
    g2: &Geometry,
    m2: &mut dyn Motion,
    req: &CcdRequest,
) -> Result<CcdResult, CcdError> {
    let Geometry::Shape(shape) = g1 else {
        return Err(unsupported(g1, g2));
    };
    match g2 {
        Geometry::AabbMesh(model) => advance_mesh_shape(model, m2, shape, m1, req),
        Geometry::ObbMesh(model) => advance_mesh_shape(model, m2, shape, m1, req),
        Geometry::Shape(_) => Err(unsupported(g1, g2)),
    }
}

fn mesh_mesh(
    g1: &Geometry,
    m1: &mut dyn Motion,
    g2: &Geometry,
    m2: &mut dyn Motion,
    req: &CcdRequest,
) -> Result<CcdResult, CcdError> {
    match (g1, g2) {
        (Geometry::AabbMesh(a), Geometry::AabbMesh(b)) => advance_mesh_mesh(a, m1, b, m2, req),
        (Geometry::ObbMesh(a), Geometry::ObbMesh(b)) => advance_mesh_mesh(a, m1, b, m2, req),
        _ => Err(unsupported(g1, g2)),
    }
}
