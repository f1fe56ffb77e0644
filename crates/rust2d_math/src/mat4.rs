//! 4x4 Matrix utilities for 2D transformations
//!
//! Matrices are column-major (`m[column][row]`) so they can be uploaded to
//! the GPU as-is. Only the operations a 2D renderer needs are provided:
//! translation, non-uniform scaling, rotation about Z and an orthographic
//! projection.

use crate::Vec2;

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Translation by (x, y) in the XY plane
pub fn translation(x: f32, y: f32) -> Mat4 {
    let mut m = IDENTITY;
    m[3][0] = x;
    m[3][1] = y;
    m
}

/// Non-uniform scale along X and Y
pub fn scaling(x: f32, y: f32) -> Mat4 {
    let mut m = IDENTITY;
    m[0][0] = x;
    m[1][1] = y;
    m
}

/// Counter-clockwise rotation about the Z axis by `angle` radians
pub fn rotation_z(angle: f32) -> Mat4 {
    let (sn, cs) = angle.sin_cos();
    let mut m = IDENTITY;
    m[0][0] = cs;
    m[0][1] = sn;
    m[1][0] = -sn;
    m[1][1] = cs;
    m
}

/// Orthographic projection of the rectangle `[left, right] x [bottom, top]`
/// onto normalized device coordinates. Depth is passed through unchanged.
pub fn ortho_2d(left: f32, right: f32, bottom: f32, top: f32) -> Mat4 {
    let mut m = IDENTITY;
    m[0][0] = 2.0 / (right - left);
    m[1][1] = 2.0 / (top - bottom);
    m[3][0] = -(right + left) / (right - left);
    m[3][1] = -(top + bottom) / (top - bottom);
    m
}

/// Model matrix for a rectangle centred at `position`, rotated by `angle`
/// and scaled by `scale` (applied in that order: scale, rotate, translate).
pub fn model(position: Vec2, angle: f32, scale: Vec2) -> Mat4 {
    mul(translation(position.x, position.y), mul(rotation_z(angle), scaling(scale.x, scale.y)))
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a point in the XY plane (z = 0, w = 1)
pub fn transform_point(m: Mat4, p: Vec2) -> Vec2 {
    Vec2::new(
        m[0][0] * p.x + m[1][0] * p.y + m[3][0],
        m[0][1] * p.x + m[1][1] * p.y + m[3][1],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.0001;

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    #[test]
    fn test_identity() {
        let p = Vec2::new(3.0, -2.0);
        assert_eq!(transform_point(IDENTITY, p), p);
    }

    #[test]
    fn test_translation() {
        let p = transform_point(translation(1.0, 2.0), Vec2::new(3.0, 4.0));
        assert_eq!(p, Vec2::new(4.0, 6.0));
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let p = transform_point(rotation_z(FRAC_PI_2), Vec2::X);
        assert!(vec_approx_eq(p, Vec2::Y), "X should become Y, got {:?}", p);
    }

    #[test]
    fn test_mul_applies_right_first() {
        // Scale then translate: (1,1) -> (2,2) -> (12,2)
        let m = mul(translation(10.0, 0.0), scaling(2.0, 2.0));
        assert_eq!(transform_point(m, Vec2::ONE), Vec2::new(12.0, 2.0));
    }

    #[test]
    fn test_model_matrix() {
        let m = model(Vec2::new(5.0, 5.0), FRAC_PI_2, Vec2::new(2.0, 1.0));
        // (1,0) scaled -> (2,0), rotated -> (0,2), translated -> (5,7)
        let p = transform_point(m, Vec2::X);
        assert!(vec_approx_eq(p, Vec2::new(5.0, 7.0)), "got {:?}", p);
    }

    #[test]
    fn test_ortho_maps_corners_to_ndc() {
        let m = ortho_2d(0.0, 640.0, 0.0, 480.0);
        assert!(vec_approx_eq(transform_point(m, Vec2::ZERO), Vec2::new(-1.0, -1.0)));
        assert!(vec_approx_eq(transform_point(m, Vec2::new(640.0, 480.0)), Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_ortho_unit_is_identity() {
        assert_eq!(ortho_2d(-1.0, 1.0, -1.0, 1.0), IDENTITY);
    }
}
