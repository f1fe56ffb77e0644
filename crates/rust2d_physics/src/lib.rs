//! 2D collision detection for Rust2D
//!
//! This crate provides the geometric half of entity collision:
//! - Bounding volumes (axis-aligned and oriented rectangles)
//! - Boolean overlap tests, using the separating axis theorem for rotated boxes
//! - Collision filtering via layer masks
//!
//! There is no response or resolution here; callers only learn *whether*
//! two volumes overlap.

pub mod collision;
pub mod shapes;

// Re-export commonly used types
pub use collision::{aabb_vs_aabb, intersects, obb_vs_obb, CollisionFilter, CollisionLayer, Projection};
pub use shapes::{Aabb2D, BoundingVolume, Obb2D};
