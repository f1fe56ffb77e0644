//! 2D Transform (position, rotation, scale)

use rust2d_math::{mat4, Mat4, Vec2};
use serde::{Deserialize, Serialize};

/// Position, counter-clockwise rotation (radians) and scale of a rectangle
///
/// `scale` is the half-size: the unit square `[-1, 1]²` scaled by it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Vec2,
    pub angle: f32,
    pub scale: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            scale: Vec2::ONE,
        }
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
    }

    pub fn rotate(&mut self, angle: f32) {
        self.angle += angle;
    }

    /// Blend towards `other`; `t` outside `[0, 1]` extrapolates
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            angle: self.angle + (other.angle - self.angle) * t,
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Model matrix: scale, then rotate, then translate
    pub fn to_matrix(&self) -> Mat4 {
        mat4::model(self.position, self.angle, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_midpoint() {
        let a = Transform2D::from_position(Vec2::ZERO);
        let b = Transform2D::from_position(Vec2::new(4.0, 2.0)).with_angle(1.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.position, Vec2::new(2.0, 1.0));
        assert_eq!(mid.angle, 0.5);
        assert_eq!(mid.scale, Vec2::ONE);
    }

    #[test]
    fn test_to_matrix_places_corner() {
        let t = Transform2D::from_position(Vec2::new(3.0, 0.0)).with_scale(Vec2::new(2.0, 1.0));
        let corner = mat4::transform_point(t.to_matrix(), Vec2::ONE);
        assert_eq!(corner, Vec2::new(5.0, 1.0));
    }

    #[test]
    fn test_translate_and_rotate() {
        let mut t = Transform2D::identity();
        t.translate(Vec2::X);
        t.rotate(0.25);
        assert_eq!(t.position, Vec2::X);
        assert_eq!(t.angle, 0.25);
    }
}
