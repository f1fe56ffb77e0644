//! Draw batching
//!
//! Every rectangle is an instance of the unit square `[-1, 1]²` with its own
//! model matrix, color and texture region. Instances accumulate in a buffer
//! of fixed capacity and are submitted with one instanced draw whenever:
//!
//! - the primitive mode or texture of the next request differs from the
//!   open batch (the batch key changes)
//! - the buffer is full
//! - [`BatchRenderer::flush`] or [`BatchRenderer::end`] is called
//!
//! Callers that do not care about draw order should group draws by texture.

use rust2d_math::{mat4, Color, Mat4};
use thiserror::Error;

use crate::device::{DeviceError, GraphicsDevice, PrimitiveMode, ProgramKind, TextureId};
use crate::font::Font;
use crate::texture::{Texture, TextureRegion};
use crate::types::{FrameUniforms, InstanceData};

/// Errors raised by the batch renderer
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("begin() called while already drawing")]
    AlreadyDrawing,
    #[error("draw or flush called while not drawing")]
    NotDrawing,
    #[error("draw_string called with no font set")]
    NoFont,
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// The state shared by every instance in one submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchKey {
    pub mode: PrimitiveMode,
    pub texture: Option<TextureId>,
}

impl BatchKey {
    fn program(&self) -> ProgramKind {
        if self.texture.is_some() {
            ProgramKind::Textured
        } else {
            ProgramKind::Flat
        }
    }
}

/// Counters for the current (or last finished) `begin`/`end` bracket
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Instanced draw calls issued
    pub submissions: u32,
    /// Rectangles drawn
    pub instances: u32,
}

/// Batches rectangle draws into instanced submissions
pub struct BatchRenderer {
    device: Box<dyn GraphicsDevice>,
    capacity: usize,
    buffer: Vec<InstanceData>,
    key: Option<BatchKey>,
    drawing: bool,
    color: Color,
    view: Mat4,
    projection: Mat4,
    font: Option<Font>,
    stats: BatchStats,
}

impl BatchRenderer {
    /// Create a renderer holding at most `capacity` instances per submission
    pub fn new(device: Box<dyn GraphicsDevice>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            device,
            capacity,
            buffer: Vec::with_capacity(capacity),
            key: None,
            drawing: false,
            color: Color::WHITE,
            view: mat4::IDENTITY,
            projection: mat4::ortho_2d(-1.0, 1.0, -1.0, 1.0),
            font: None,
            stats: BatchStats::default(),
        }
    }

    /// Set the font used by [`draw_string`](Self::draw_string) (builder style)
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = Some(font);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Instances waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Key of the open batch, if any instances are pending
    pub fn open_key(&self) -> Option<BatchKey> {
        self.key
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    // --- Frame bracketing (device level) ---

    /// Start a device frame: acquire the target and clear it
    pub fn begin_frame(&mut self, clear: Color) -> Result<(), BatchError> {
        self.device.begin_frame(clear)?;
        Ok(())
    }

    /// Present the device frame
    pub fn end_frame(&mut self) -> Result<(), BatchError> {
        self.device.end_frame()?;
        Ok(())
    }

    // --- Drawing bracket ---

    /// Start accepting draws
    pub fn begin(&mut self) -> Result<(), BatchError> {
        if self.drawing {
            return Err(BatchError::AlreadyDrawing);
        }
        self.drawing = true;
        self.buffer.clear();
        self.key = None;
        self.stats = BatchStats::default();
        Ok(())
    }

    /// Flush what is pending and stop accepting draws
    pub fn end(&mut self) -> Result<(), BatchError> {
        if !self.drawing {
            return Err(BatchError::NotDrawing);
        }
        self.drawing = false;
        self.submit()
    }

    /// Submit pending instances now
    pub fn flush(&mut self) -> Result<(), BatchError> {
        if !self.drawing {
            return Err(BatchError::NotDrawing);
        }
        self.submit()
    }

    fn submit(&mut self) -> Result<(), BatchError> {
        let Some(key) = self.key.take() else {
            self.buffer.clear();
            return Ok(());
        };
        if self.buffer.is_empty() {
            return Ok(());
        }

        let count = self.buffer.len() as u32;
        // The batch is consumed even when the device rejects it
        let result = self.draw_batch(key, count);
        self.buffer.clear();
        result?;

        log::trace!("flushed {} instance(s) as {:?}", count, key);
        self.stats.submissions += 1;
        self.stats.instances += count;
        Ok(())
    }

    fn draw_batch(&mut self, key: BatchKey, count: u32) -> Result<(), DeviceError> {
        let uniforms = FrameUniforms {
            view: self.view,
            projection: self.projection,
        };

        self.device.upload_instances(&self.buffer)?;
        self.device.bind_program(key.program(), &uniforms);
        if let Some(texture) = key.texture {
            self.device.bind_texture(0, texture);
        }
        self.device.draw_instanced(key.mode, key.mode.vertex_count(), count)
    }

    fn push(&mut self, mode: PrimitiveMode, model: Mat4, region: Option<&TextureRegion>) -> Result<(), BatchError> {
        if !self.drawing {
            return Err(BatchError::NotDrawing);
        }

        let key = BatchKey {
            mode,
            texture: region.map(|r| r.texture),
        };
        if self.key.is_some_and(|open| open != key) || self.buffer.len() >= self.capacity {
            self.submit()?;
        }

        self.key = Some(key);
        self.buffer.push(InstanceData {
            model,
            color: self.color.to_array(),
            region: region.map_or([0.0; 4], TextureRegion::to_array),
        });
        Ok(())
    }

    /// Draw the unit square transformed by `model`, filled
    pub fn draw_filled_rect(&mut self, model: Mat4, region: Option<&TextureRegion>) -> Result<(), BatchError> {
        self.push(PrimitiveMode::Filled, model, region)
    }

    /// Draw the edge of the unit square transformed by `model`
    pub fn draw_outline_rect(&mut self, model: Mat4, region: Option<&TextureRegion>) -> Result<(), BatchError> {
        self.push(PrimitiveMode::Outline, model, region)
    }

    /// Draw text with the current font
    ///
    /// Glyphs are laid out left to right from the model origin, one textured
    /// rectangle each. Characters missing from the font are skipped.
    pub fn draw_string(&mut self, text: &str, model: Mat4) -> Result<(), BatchError> {
        if !self.drawing {
            return Err(BatchError::NotDrawing);
        }
        let Some(font) = self.font.take() else {
            return Err(BatchError::NoFont);
        };

        let mut cursor = 0.0;
        let mut result = Ok(());
        for glyph in text.chars().filter_map(|c| font.glyph(c)) {
            let h = glyph.half_size;
            let local = mat4::mul(mat4::translation(cursor + h.x, 0.0), mat4::scaling(h.x, h.y));
            result = self.draw_filled_rect(mat4::mul(model, local), Some(&glyph.region));
            if result.is_err() {
                break;
            }
            cursor += glyph.advance();
        }

        self.font = Some(font);
        result
    }

    // --- State ---

    pub fn color(&self) -> Color {
        self.color
    }

    /// Color applied to following draws
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Change the view matrix; pending instances are flushed with the old one
    pub fn set_view(&mut self, view: Mat4) -> Result<(), BatchError> {
        if self.drawing {
            self.submit()?;
        }
        self.view = view;
        Ok(())
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Change the projection matrix; pending instances are flushed with the old one
    pub fn set_projection(&mut self, projection: Mat4) -> Result<(), BatchError> {
        if self.drawing {
            self.submit()?;
        }
        self.projection = projection;
        Ok(())
    }

    pub fn font(&self) -> Option<&Font> {
        self.font.as_ref()
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = Some(font);
    }

    // --- Resources ---

    /// Upload RGBA8 pixels as a texture
    pub fn create_texture(
        &mut self,
        name: impl Into<String>,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<Texture, BatchError> {
        let id = self.device.create_texture(width, height, rgba)?;
        Ok(Texture::new(name, id, width, height))
    }

    pub fn release_texture(&mut self, texture: &Texture) {
        self.device.release_texture(texture.id());
    }

    /// Drop pending work and release the device
    pub fn release(&mut self) {
        self.buffer.clear();
        self.key = None;
        self.drawing = false;
        self.font = None;
        self.device.release();
    }
}
