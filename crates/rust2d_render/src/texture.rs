//! Textures and texture regions

use crate::device::TextureId;

/// A texture living on the graphics device
///
/// Cheap to clone: it is a name and a handle, the pixels stay on the device.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    name: String,
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn new(name: impl Into<String>, id: TextureId, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            id,
            width,
            height,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The whole texture
    pub fn full(&self) -> TextureRegion {
        TextureRegion::new(self.id, 0.0, 0.0, 1.0, 1.0)
    }

    /// A region given in pixels from the top-left corner
    pub fn region_px(&self, x: u32, y: u32, width: u32, height: u32) -> TextureRegion {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        TextureRegion::new(
            self.id,
            x as f32 / w,
            y as f32 / h,
            width as f32 / w,
            height as f32 / h,
        )
    }
}

/// Part of a texture in normalized coordinates (origin top-left)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureRegion {
    pub texture: TextureId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextureRegion {
    pub fn new(texture: TextureId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            texture,
            x,
            y,
            width,
            height,
        }
    }

    /// A sub-region, with coordinates relative to this region
    ///
    /// `(0, 0, 1, 1)` returns this region unchanged.
    pub fn sub_region(&self, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(
            self.texture,
            self.x + x * self.width,
            self.y + y * self.height,
            width * self.width,
            height * self.height,
        )
    }

    /// Packed for the instance buffer
    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}
