//! 2D Rendering Library
//!
//! Rectangles (filled or outlined, optionally textured) are drawn through a
//! [`batch::BatchRenderer`], which packs per-instance attributes into one
//! buffer and submits them as a single instanced draw for every run of
//! requests sharing the same primitive mode and texture.
//!
//! ## Key Components
//!
//! - [`device::GraphicsDevice`] - the capability the batcher submits to
//! - [`batch::BatchRenderer`] - draw batching, renderer state and text
//! - [`wgpu_device::WgpuDevice`] - GPU backend drawing to a window surface
//! - [`device::RecordingDevice`] - headless backend that records every call
//! - [`font::Font`] - bitmap fonts laid out on a texture grid
//! - [`animation::Animation`] - looping texture-region frames
//! - [`tilemap::TileMap`] - grids of tiles filling the view

pub mod animation;
pub mod batch;
pub mod device;
pub mod font;
pub mod texture;
pub mod tilemap;
pub mod types;
pub mod wgpu_device;

pub use animation::{Animation, AnimationError, Frame};
pub use batch::{BatchError, BatchKey, BatchRenderer, BatchStats};
pub use device::{
    CallLog, DeviceCall, DeviceError, GraphicsDevice, PrimitiveMode, ProgramKind, RecordingDevice,
    TextureId,
};
pub use font::{Font, Glyph};
pub use texture::{Texture, TextureRegion};
pub use tilemap::{Tile, TileLayout, TileMap, TileMapError, TileSprite};
pub use types::{FrameUniforms, InstanceData};
pub use wgpu_device::WgpuDevice;

// Re-export math types used throughout the drawing API
pub use rust2d_math::{mat4, Color, Mat4, Vec2};
