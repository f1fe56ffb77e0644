//! Overlap tests for 2D bounding volumes
//!
//! Two axis-aligned boxes use a direct per-axis distance test. Anything
//! involving an oriented box goes through the separating axis theorem:
//! each rectangle contributes its two edge normals, and the boxes are
//! disjoint iff the projections onto one of those four axes do not overlap.
//!
//! Touching edges do not count as overlap on either path.

use bitflags::bitflags;

use crate::shapes::{Aabb2D, BoundingVolume, Obb2D};
use rust2d_math::Vec2;

bitflags! {
    /// Collision layers for filtering which entities are tested against each other
    ///
    /// Each layer is a bit in a 32-bit mask; an entity can sit on several layers.
    /// Bits above `DEFAULT` are free for the game to name.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CollisionLayer: u32 {
        /// Default layer for most entities
        const DEFAULT = 1 << 0;
        /// Every layer
        const ALL = 0xFFFFFFFF;
    }
}

/// Which layers an entity is on and which layers it wants to hear about
///
/// Two entities A and B are tested only if
/// `(A.layer & B.mask) != 0` and `(B.layer & A.mask) != 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    /// Which layer(s) this entity belongs to
    pub layer: CollisionLayer,
    /// Which layer(s) this entity can collide with
    pub mask: CollisionLayer,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            layer: CollisionLayer::DEFAULT,
            mask: CollisionLayer::ALL,
        }
    }
}

impl CollisionFilter {
    /// Create a new collision filter with specified layer and mask
    pub fn new(layer: CollisionLayer, mask: CollisionLayer) -> Self {
        Self { layer, mask }
    }

    /// Check if this filter allows collision with another filter
    pub fn collides_with(&self, other: &Self) -> bool {
        self.layer.intersects(other.mask) && other.layer.intersects(self.mask)
    }
}

/// The interval covered by a shape projected onto an axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub min: f32,
    pub max: f32,
}

impl Projection {
    /// Project a set of vertices onto `axis`
    pub fn of(vertices: &[Vec2], axis: Vec2) -> Self {
        vertices.iter().fold(
            Self { min: f32::INFINITY, max: f32::NEG_INFINITY },
            |p, v| {
                let d = axis.dot(*v);
                Self { min: p.min.min(d), max: p.max.max(d) }
            },
        )
    }

    /// Strict interval overlap
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max > other.min && other.max > self.min
    }
}

/// Test two axis-aligned boxes
pub fn aabb_vs_aabb(a: &Aabb2D, b: &Aabb2D) -> bool {
    (a.center.x - b.center.x).abs() < a.half_extents.x + b.half_extents.x
        && (a.center.y - b.center.y).abs() < a.half_extents.y + b.half_extents.y
}

/// Test two oriented boxes with the separating axis theorem
pub fn obb_vs_obb(a: &Obb2D, b: &Obb2D) -> bool {
    let va = a.vertices();
    let vb = b.vertices();

    a.axes()
        .into_iter()
        .chain(b.axes())
        .all(|axis| Projection::of(&va, axis).overlaps(&Projection::of(&vb, axis)))
}

/// Test two bounding volumes for overlap
///
/// Symmetric: `intersects(a, b) == intersects(b, a)`. Mixed pairs promote
/// the axis-aligned side to an oriented box with zero rotation.
pub fn intersects(a: &BoundingVolume, b: &BoundingVolume) -> bool {
    match (a, b) {
        (BoundingVolume::Aligned(a), BoundingVolume::Aligned(b)) => aabb_vs_aabb(a, b),
        (BoundingVolume::Aligned(a), BoundingVolume::Oriented(b)) => obb_vs_obb(&a.to_obb(), b),
        (BoundingVolume::Oriented(a), BoundingVolume::Aligned(b)) => obb_vs_obb(a, &b.to_obb()),
        (BoundingVolume::Oriented(a), BoundingVolume::Oriented(b)) => obb_vs_obb(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    fn unit_box(x: f32, y: f32) -> BoundingVolume {
        BoundingVolume::aligned(Vec2::new(x, y), Vec2::ONE)
    }

    // ==================== Axis-aligned ====================

    #[test]
    fn test_aabb_overlap_within_sum_of_half_extents() {
        // distance 1 < 2
        assert!(intersects(&unit_box(0.0, 0.0), &unit_box(1.0, 0.0)));
    }

    #[test]
    fn test_aabb_separated() {
        // distance 3 >= 2
        assert!(!intersects(&unit_box(0.0, 0.0), &unit_box(3.0, 0.0)));
    }

    #[test]
    fn test_aabb_touching_edges_do_not_overlap() {
        assert!(!intersects(&unit_box(0.0, 0.0), &unit_box(2.0, 0.0)));
    }

    #[test]
    fn test_aabb_needs_both_axes() {
        // Overlaps on x, separated on y
        assert!(!intersects(&unit_box(0.0, 0.0), &unit_box(0.5, 2.5)));
    }

    // ==================== Oriented ====================

    #[test]
    fn test_rotation_reveals_overlap_missed_unrotated() {
        let a = BoundingVolume::aligned(Vec2::ZERO, Vec2::ONE);
        let b_flat = BoundingVolume::aligned(Vec2::new(2.2, 0.0), Vec2::ONE);
        let b_turned = BoundingVolume::oriented(Vec2::new(2.2, 0.0), Vec2::ONE, FRAC_PI_4);

        assert!(!intersects(&a, &b_flat));
        // The rotated corner now reaches x = 2.2 - sqrt(2) < 1
        assert!(intersects(&a, &b_turned));
    }

    #[test]
    fn test_diagonal_unit_squares_stay_apart() {
        // Side length 1, centers on the diagonal; rotation does not close the gap
        let half = Vec2::splat(0.5);
        let a = BoundingVolume::aligned(Vec2::ZERO, half);
        let b = BoundingVolume::aligned(Vec2::new(1.9, 1.9), half);
        let b_turned = BoundingVolume::oriented(Vec2::new(1.9, 1.9), half, FRAC_PI_4);

        assert!(!intersects(&a, &b));
        assert!(!intersects(&a, &b_turned));
    }

    #[test]
    fn test_rotated_box_separated_only_on_its_own_axis() {
        // A long thin box at 45 degrees sits beside a square: the square's own
        // axes see overlap, only the thin box's normal separates them.
        let square = BoundingVolume::aligned(Vec2::ZERO, Vec2::ONE);
        let plank = BoundingVolume::oriented(Vec2::new(1.8, 1.8), Vec2::new(3.0, 0.2), -FRAC_PI_4);
        assert!(!intersects(&square, &plank));
    }

    #[test]
    fn test_obb_zero_angle_matches_aabb_path() {
        let cases = [(1.0, 0.0), (2.0, 0.0), (1.5, 1.5), (1.99, -1.99), (0.0, 3.0)];
        for (x, y) in cases {
            let a = unit_box(0.0, 0.0);
            let b = unit_box(x, y);
            let expected = intersects(&a, &b);
            let promoted = obb_vs_obb(&a.to_obb(), &b.to_obb());
            assert_eq!(expected, promoted, "mismatch at ({}, {})", x, y);
        }
    }

    #[test]
    fn test_contained_box_overlaps() {
        let big = BoundingVolume::oriented(Vec2::ZERO, Vec2::splat(5.0), 0.3);
        let small = BoundingVolume::aligned(Vec2::new(0.5, 0.5), Vec2::splat(0.1));
        assert!(intersects(&big, &small));
    }

    #[test]
    fn test_intersects_is_symmetric() {
        let volumes = [
            unit_box(0.0, 0.0),
            unit_box(1.0, 0.0),
            unit_box(3.0, 0.0),
            BoundingVolume::oriented(Vec2::new(2.2, 0.0), Vec2::ONE, FRAC_PI_4),
            BoundingVolume::oriented(Vec2::new(-1.5, 1.0), Vec2::new(2.0, 0.25), 1.1),
            BoundingVolume::oriented(Vec2::new(1.8, 1.8), Vec2::new(3.0, 0.2), -FRAC_PI_4),
            BoundingVolume::aligned(Vec2::new(0.0, -2.5), Vec2::new(4.0, 0.5)),
        ];

        for a in &volumes {
            for b in &volumes {
                assert_eq!(intersects(a, b), intersects(b, a), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_projection_of_vertices() {
        let verts = [Vec2::new(-1.0, 0.0), Vec2::new(3.0, 5.0), Vec2::new(0.5, -2.0)];
        let p = Projection::of(&verts, Vec2::X);
        assert_eq!(p, Projection { min: -1.0, max: 3.0 });
    }

    // ==================== Filters ====================

    const WALLS: CollisionLayer = CollisionLayer::from_bits_retain(1 << 1);
    const SPARKS: CollisionLayer = CollisionLayer::from_bits_retain(1 << 2);

    #[test]
    fn test_default_filter_collides_with_everything() {
        let f = CollisionFilter::default();
        assert!(f.collides_with(&CollisionFilter::default()));
        assert!(f.collides_with(&CollisionFilter::new(WALLS, CollisionLayer::ALL)));
    }

    #[test]
    fn test_filter_needs_both_directions() {
        let wall = CollisionFilter::new(WALLS, CollisionLayer::ALL);
        let spark = CollisionFilter::new(SPARKS, WALLS);
        assert!(spark.collides_with(&wall));
        assert!(wall.collides_with(&spark));

        // Sparks ignore each other
        assert!(!spark.collides_with(&spark));
        // A wall that only listens for walls never hears the spark
        let deaf = CollisionFilter::new(WALLS, WALLS);
        assert!(!deaf.collides_with(&spark));
    }
}
