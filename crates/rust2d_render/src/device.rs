//! The graphics device capability
//!
//! [`BatchRenderer`](crate::BatchRenderer) never talks to a GPU directly.
//! Everything it needs (frame bracketing, buffer upload, program and texture
//! binding, instanced draws) goes through [`GraphicsDevice`], so the batching
//! rules can run against [`RecordingDevice`] in tests and against
//! [`WgpuDevice`](crate::WgpuDevice) in the application.

use std::cell::RefCell;
use std::rc::Rc;

use rust2d_math::Color;
use thiserror::Error;

use crate::types::{FrameUniforms, InstanceData};

/// Handle to a texture owned by a device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// How the unit square of each instance is assembled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// Two triangles (6 vertices)
    Filled,
    /// Closed line strip around the edge (5 vertices, the first repeated)
    Outline,
}

impl PrimitiveMode {
    /// Vertices per instance
    pub fn vertex_count(self) -> u32 {
        match self {
            PrimitiveMode::Filled => 6,
            PrimitiveMode::Outline => 5,
        }
    }
}

/// Shader program selected for a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Solid color
    Flat,
    /// Texture sample multiplied by color
    Textured,
}

/// Errors raised by a graphics device
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no suitable graphics adapter found")]
    NoAdapter,
    #[error("failed to create surface: {0}")]
    CreateSurface(String),
    #[error("failed to request device: {0}")]
    RequestDevice(String),
    #[error("surface lost")]
    SurfaceLost,
    #[error("out of memory")]
    OutOfMemory,
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
    #[error("texture data has {actual} bytes, expected {expected}")]
    InvalidTextureData { expected: usize, actual: usize },
}

/// Capability the batch renderer submits to
///
/// Calls arrive in this order for every non-empty flush:
/// `upload_instances`, `bind_program`, `bind_texture` (textured only),
/// `draw_instanced`. None of them wait on the GPU.
pub trait GraphicsDevice {
    /// Start a frame, clearing the target to `clear`
    fn begin_frame(&mut self, clear: Color) -> Result<(), DeviceError>;

    /// Finish the frame and present it
    fn end_frame(&mut self) -> Result<(), DeviceError>;

    /// Replace the instance buffer contents with `instances`
    fn upload_instances(&mut self, instances: &[InstanceData]) -> Result<(), DeviceError>;

    /// Select the program for following draws and set its uniforms
    fn bind_program(&mut self, program: ProgramKind, uniforms: &FrameUniforms);

    /// Bind a texture to a sampler unit
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    /// Draw `instances` copies of a `vertex_count`-vertex primitive from the uploaded buffer
    fn draw_instanced(
        &mut self,
        mode: PrimitiveMode,
        vertex_count: u32,
        instances: u32,
    ) -> Result<(), DeviceError>;

    /// Upload tightly packed RGBA8 pixels as a new texture
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId, DeviceError>;

    /// Free a texture; unknown ids are ignored
    fn release_texture(&mut self, texture: TextureId);

    /// Release every device resource. Called once at engine teardown.
    fn release(&mut self) {}
}

pub(crate) fn check_texture_data(width: u32, height: u32, rgba: &[u8]) -> Result<(), DeviceError> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(DeviceError::InvalidTextureData {
            expected,
            actual: rgba.len(),
        });
    }
    Ok(())
}

/// A call observed by [`RecordingDevice`]
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCall {
    BeginFrame(Color),
    EndFrame,
    Upload(Vec<InstanceData>),
    BindProgram(ProgramKind, FrameUniforms),
    BindTexture { unit: u32, texture: TextureId },
    Draw {
        mode: PrimitiveMode,
        vertex_count: u32,
        instances: u32,
    },
    CreateTexture { texture: TextureId, width: u32, height: u32 },
    ReleaseTexture(TextureId),
    Release,
}

/// Shared view of the calls a [`RecordingDevice`] has received
///
/// Stays readable after the device itself has been moved into a renderer.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Rc<RefCell<Vec<DeviceCall>>>);

impl CallLog {
    /// Snapshot of every call so far
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.0.borrow().clone()
    }

    /// Instance counts of every draw so far, in order
    pub fn draws(&self) -> Vec<u32> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                DeviceCall::Draw { instances, .. } => Some(*instances),
                _ => None,
            })
            .collect()
    }

    /// Number of calls matching a predicate
    pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Forget recorded calls
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, call: DeviceCall) {
        self.0.borrow_mut().push(call);
    }
}

/// Headless device that records calls instead of drawing
#[derive(Debug, Default)]
pub struct RecordingDevice {
    log: CallLog,
    next_texture: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for inspecting calls after the device has been handed off
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn begin_frame(&mut self, clear: Color) -> Result<(), DeviceError> {
        self.log.push(DeviceCall::BeginFrame(clear));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), DeviceError> {
        self.log.push(DeviceCall::EndFrame);
        Ok(())
    }

    fn upload_instances(&mut self, instances: &[InstanceData]) -> Result<(), DeviceError> {
        self.log.push(DeviceCall::Upload(instances.to_vec()));
        Ok(())
    }

    fn bind_program(&mut self, program: ProgramKind, uniforms: &FrameUniforms) {
        self.log.push(DeviceCall::BindProgram(program, *uniforms));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.log.push(DeviceCall::BindTexture { unit, texture });
    }

    fn draw_instanced(
        &mut self,
        mode: PrimitiveMode,
        vertex_count: u32,
        instances: u32,
    ) -> Result<(), DeviceError> {
        self.log.push(DeviceCall::Draw {
            mode,
            vertex_count,
            instances,
        });
        Ok(())
    }

    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId, DeviceError> {
        check_texture_data(width, height, rgba)?;
        let texture = TextureId(self.next_texture);
        self.next_texture += 1;
        self.log.push(DeviceCall::CreateTexture {
            texture,
            width,
            height,
        });
        Ok(texture)
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.log.push(DeviceCall::ReleaseTexture(texture));
    }

    fn release(&mut self) {
        self.log.push(DeviceCall::Release);
    }
}
