//! Bounding volumes for 2D collision
//!
//! Both volumes are rectangles described by a center and half-extents
//! (the distance from the center to an edge, so the full width is
//! `2 * half_extents.x`). Half-extents are never negative.

use rust2d_math::Vec2;
use serde::{Deserialize, Serialize};

/// A 2D axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb2D {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb2D {
    /// Create an AABB centered at a position with given half-extents
    ///
    /// Negative half-extents are folded to their absolute value.
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Create an AABB from its min and max corners
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    /// Minimum corner
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    /// Maximum corner
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Full width and height
    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    /// Check if a point lies strictly inside the box
    pub fn contains(&self, point: Vec2) -> bool {
        let d = (point - self.center).abs();
        d.x < self.half_extents.x && d.y < self.half_extents.y
    }

    /// Promote to an oriented box with zero rotation
    pub fn to_obb(&self) -> Obb2D {
        Obb2D::new(self.center, self.half_extents, 0.0)
    }
}

/// A 2D oriented bounding box (rectangle rotated about its center)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obb2D {
    pub center: Vec2,
    pub half_extents: Vec2,
    /// Counter-clockwise rotation in radians
    pub angle: f32,
}

impl Obb2D {
    /// Create an oriented box
    ///
    /// Negative half-extents are folded to their absolute value.
    pub fn new(center: Vec2, half_extents: Vec2, angle: f32) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
            angle,
        }
    }

    /// The four corners in world space, counter-clockwise starting top-left
    /// (before rotation)
    pub fn vertices(&self) -> [Vec2; 4] {
        let h = self.half_extents;
        [
            Vec2::new(-h.x, h.y),
            Vec2::new(-h.x, -h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(h.x, h.y),
        ]
        .map(|corner| self.center + corner.rotated(self.angle))
    }

    /// The two unique edge normals (unit length)
    ///
    /// Opposite edges of a rectangle are parallel, so two axes cover all four edges.
    pub fn axes(&self) -> [Vec2; 2] {
        [Vec2::X.rotated(self.angle), Vec2::Y.rotated(self.angle)]
    }
}

/// A bounding volume attached to an entity
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BoundingVolume {
    /// Axis-aligned rectangle
    Aligned(Aabb2D),
    /// Rotated rectangle
    Oriented(Obb2D),
}

impl BoundingVolume {
    /// Axis-aligned volume from center and half-extents
    pub fn aligned(center: Vec2, half_extents: Vec2) -> Self {
        Self::Aligned(Aabb2D::new(center, half_extents))
    }

    /// Oriented volume from center, half-extents and rotation
    pub fn oriented(center: Vec2, half_extents: Vec2, angle: f32) -> Self {
        Self::Oriented(Obb2D::new(center, half_extents, angle))
    }

    /// Get the center of the volume
    pub fn center(&self) -> Vec2 {
        match self {
            Self::Aligned(aabb) => aabb.center,
            Self::Oriented(obb) => obb.center,
        }
    }

    /// Get the half-extents of the volume (in its own frame)
    pub fn half_extents(&self) -> Vec2 {
        match self {
            Self::Aligned(aabb) => aabb.half_extents,
            Self::Oriented(obb) => obb.half_extents,
        }
    }

    /// Move the volume to a new center, keeping size and rotation
    pub fn set_center(&mut self, center: Vec2) {
        match self {
            Self::Aligned(aabb) => aabb.center = center,
            Self::Oriented(obb) => obb.center = center,
        }
    }

    /// Create a translated copy of this volume
    pub fn translated(&self, offset: Vec2) -> Self {
        let mut moved = *self;
        moved.set_center(self.center() + offset);
        moved
    }

    /// View this volume as an oriented box (axis-aligned boxes get angle 0)
    pub fn to_obb(&self) -> Obb2D {
        match self {
            Self::Aligned(aabb) => aabb.to_obb(),
            Self::Oriented(obb) => *obb,
        }
    }

    /// Test overlap with another volume
    pub fn intersects(&self, other: &BoundingVolume) -> bool {
        crate::collision::intersects(self, other)
    }
}

impl From<Aabb2D> for BoundingVolume {
    fn from(aabb: Aabb2D) -> Self {
        Self::Aligned(aabb)
    }
}

impl From<Obb2D> for BoundingVolume {
    fn from(obb: Obb2D) -> Self {
        Self::Oriented(obb)
    }
}
