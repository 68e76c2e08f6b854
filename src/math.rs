//! Scalar and vector aliases used throughout the crate.
//!
//! Time-of-contact queries accumulate many small advancement steps, so the
//! whole crate computes in double precision.

/// Scalar type for distances, times and tolerances.
pub type Real = f64;

pub use glam::{DMat3 as Mat3, DQuat as Quat, DVec3 as Vec3};
