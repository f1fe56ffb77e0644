//! GPU-compatible data types for the batch pipeline
//!
//! These types match the layouts in `shaders/batch.wgsl` exactly.

use bytemuck::{Pod, Zeroable};
use rust2d_math::{mat4, Mat4};

/// One rectangle in the instance buffer
///
/// Layout: 96 bytes (model matrix, color, texture region).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Model transform applied to the unit square `[-1, 1]²` (64 bytes)
    pub model: Mat4,
    /// RGBA tint (16 bytes)
    pub color: [f32; 4],
    /// Normalized texture region `(x, y, width, height)`; zero when untextured (16 bytes)
    pub region: [f32; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        // model columns
        0 => Float32x4,
        1 => Float32x4,
        2 => Float32x4,
        3 => Float32x4,
        // color
        4 => Float32x4,
        // region
        5 => Float32x4
    ];

    /// Vertex buffer layout stepping once per instance
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-submission uniforms
/// Layout: 128 bytes (must match batch.wgsl Frame)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: mat4::IDENTITY,
            projection: mat4::ortho_2d(-1.0, 1.0, -1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_instance_data_size() {
        // 16 floats model + 4 floats color + 4 floats region = 96 bytes
        assert_eq!(size_of::<InstanceData>(), 96);
    }

    #[test]
    fn test_frame_uniforms_size() {
        assert_eq!(size_of::<FrameUniforms>(), 128);
    }

    #[test]
    fn test_instance_layout_stride() {
        let layout = InstanceData::layout();
        assert_eq!(layout.array_stride, size_of::<InstanceData>() as u64);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
        // Color follows the four model columns
        assert_eq!(layout.attributes[4].offset, 64);
        assert_eq!(layout.attributes[5].offset, 80);
    }
}
