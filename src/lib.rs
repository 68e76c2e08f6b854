//! Swept — continuous collision detection via conservative advancement.
//!
//! Given two rigid objects and their motions over the unit time interval,
//! [`continuous_collide`] reports whether they touch and the first time of
//! contact.
//!
//! # Architecture
//!
//! A query flows through the layers bottom-up:
//!
//! 1. **math / transform** - f64 glam aliases and rigid poses
//! 2. **shape** - primitives, support mappings, runtime tags
//! 3. **bounding** - bounding-volume kinds (AABB, OBB) behind one trait
//! 4. **bvh** - triangle-mesh hierarchies with world-frame refitting
//! 5. **motion** - rigid motions and their conservative displacement bounds
//! 6. **narrowphase** - static pair distances (GJK plus closed forms)
//! 7. **ccd** - the advancement loops, the motion-aware traversal, and the
//!    dispatch table behind the public entry point
//!
//! # Example
//!
//! ```
//! use swept::{continuous_collide, CcdRequest, Geometry, InterpMotion, Shape, Transform};
//! use swept::math::Vec3;
//!
//! // Two unit spheres on a head-on course meet halfway through the interval.
//! let sphere = Geometry::Shape(Shape::Sphere { radius: 1.0 });
//! let mut m1 = InterpMotion::new(
//!     Transform::IDENTITY,
//!     Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
//! );
//! let mut m2 = InterpMotion::new(
//!     Transform::from_translation(Vec3::new(3.0, 0.0, 0.0)),
//!     Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)),
//! );
//!
//! let result =
//!     continuous_collide(&sphere, &mut m1, &sphere, &mut m2, &CcdRequest::default()).unwrap();
//! assert!(result.is_collide);
//! assert!((result.time_of_contact - 0.5).abs() < 1e-3);
//! ```

pub mod bounding;
pub mod bvh;
pub mod ccd;
pub mod math;
pub mod motion;
pub mod narrowphase;
pub mod shape;
pub mod transform;

pub use bounding::{Aabb, BoundingVolume, Obb};
pub use bvh::BvhModel;
pub use ccd::{continuous_collide, CcdError, CcdRequest, CcdResult};
pub use motion::{InterpMotion, Motion, ScrewMotion};
pub use narrowphase::{pair_distance, PairDistance};
pub use shape::{Geometry, NodeType, ObjectType, Shape};
pub use transform::Transform;
