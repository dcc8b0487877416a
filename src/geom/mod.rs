//! Geometric kernel shared by the renderer and the collision code.
//!
//! Everything here operates on the immutable portal graph: a ray or a
//! swept disc starts inside one platform and crosses boundary edges one
//! at a time, so both the column tracer and the sliding mover consume
//! the same distance-ordered crossings.

pub mod intersect;
pub mod locate;
pub mod sweep;
pub mod walk;

pub use intersect::{SegHit, segment_ray_intersect};
pub use locate::{locate_platform, platform_contains};
pub use sweep::{CrossingKind, SolidHit, cylinder_sweep};
pub use walk::{EdgeCache, Intersection, ray_walk, ray_walk_cached};
