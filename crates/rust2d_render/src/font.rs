//! Bitmap fonts
//!
//! A font maps characters to glyph regions of a single texture. Glyph sizes
//! are half-extents in the units of the model matrix passed to
//! [`BatchRenderer::draw_string`](crate::BatchRenderer::draw_string), matching
//! the unit square `[-1, 1]²` that every rectangle is drawn from.

use std::collections::HashMap;

use rust2d_math::Vec2;

use crate::texture::{Texture, TextureRegion};

/// Where a character lives on the font texture and how large it is drawn
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub region: TextureRegion,
    /// Half-width and half-height
    pub half_size: Vec2,
}

impl Glyph {
    /// Horizontal distance to the next glyph
    pub fn advance(&self) -> f32 {
        self.half_size.x * 2.0
    }
}

/// A set of glyphs on one texture
#[derive(Clone, Debug)]
pub struct Font {
    name: String,
    texture: Texture,
    glyphs: HashMap<char, Glyph>,
}

impl Font {
    /// Create a font with no glyphs
    pub fn new(name: impl Into<String>, texture: Texture) -> Self {
        Self {
            name: name.into(),
            texture,
            glyphs: HashMap::new(),
        }
    }

    /// Add or replace a glyph (builder style)
    pub fn with_glyph(mut self, c: char, glyph: Glyph) -> Self {
        self.glyphs.insert(c, glyph);
        self
    }

    /// Build a font from a texture laid out as a grid of equally sized cells
    ///
    /// The i-th character of `chars` occupies the i-th cell, left to right and
    /// then top to bottom. Each glyph covers the top-left `glyph_px` pixels of
    /// its cell and is drawn with half-size `half_size`.
    pub fn from_grid(
        name: impl Into<String>,
        texture: Texture,
        cell_px: (u32, u32),
        glyph_px: (u32, u32),
        chars: &str,
        half_size: Vec2,
    ) -> Self {
        let columns = (texture.width() / cell_px.0.max(1)).max(1);
        let glyphs = chars
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let (col, row) = (i as u32 % columns, i as u32 / columns);
                let region = texture.region_px(col * cell_px.0, row * cell_px.1, glyph_px.0, glyph_px.1);
                (c, Glyph { region, half_size })
            })
            .collect();

        Self {
            name: name.into(),
            texture,
            glyphs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Look up a glyph, falling back to the uppercase form
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs
            .get(&c)
            .or_else(|| self.glyphs.get(&c.to_ascii_uppercase()))
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Total advance of a string; characters without a glyph take no space
    pub fn string_width(&self, text: &str) -> f32 {
        text.chars().filter_map(|c| self.glyph(c)).map(Glyph::advance).sum()
    }

    /// Full height of the tallest glyph in a string
    pub fn string_height(&self, text: &str) -> f32 {
        text.chars()
            .filter_map(|c| self.glyph(c))
            .map(|g| g.half_size.y * 2.0)
            .fold(0.0, f32::max)
    }
}

/// The built-in 3x5 pixel font
pub mod builtin {
    use super::*;

    /// Characters in grid order
    pub const CHARS: &str = " 0123456789:.-ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    const COLUMNS: u32 = 16;
    const CELL: (u32, u32) = (4, 6);
    const GLYPH: (u32, u32) = (3, 5);

    /// Texture size in pixels
    pub const WIDTH: u32 = COLUMNS * CELL.0;
    pub const HEIGHT: u32 = 3 * CELL.1;

    // One row per entry, top to bottom, most significant bit leftmost
    const BITMAPS: [[u8; 5]; 40] = [
        [0b000, 0b000, 0b000, 0b000, 0b000], // ' '
        [0b111, 0b101, 0b101, 0b101, 0b111], // 0
        [0b010, 0b110, 0b010, 0b010, 0b111], // 1
        [0b111, 0b001, 0b111, 0b100, 0b111], // 2
        [0b111, 0b001, 0b111, 0b001, 0b111], // 3
        [0b101, 0b101, 0b111, 0b001, 0b001], // 4
        [0b111, 0b100, 0b111, 0b001, 0b111], // 5
        [0b111, 0b100, 0b111, 0b101, 0b111], // 6
        [0b111, 0b001, 0b001, 0b001, 0b001], // 7
        [0b111, 0b101, 0b111, 0b101, 0b111], // 8
        [0b111, 0b101, 0b111, 0b001, 0b111], // 9
        [0b000, 0b010, 0b000, 0b010, 0b000], // :
        [0b000, 0b000, 0b000, 0b000, 0b010], // .
        [0b000, 0b000, 0b111, 0b000, 0b000], // -
        [0b010, 0b101, 0b111, 0b101, 0b101], // A
        [0b110, 0b101, 0b110, 0b101, 0b110], // B
        [0b011, 0b100, 0b100, 0b100, 0b011], // C
        [0b110, 0b101, 0b101, 0b101, 0b110], // D
        [0b111, 0b100, 0b110, 0b100, 0b111], // E
        [0b111, 0b100, 0b110, 0b100, 0b100], // F
        [0b011, 0b100, 0b101, 0b101, 0b011], // G
        [0b101, 0b101, 0b111, 0b101, 0b101], // H
        [0b111, 0b010, 0b010, 0b010, 0b111], // I
        [0b001, 0b001, 0b001, 0b101, 0b010], // J
        [0b101, 0b101, 0b110, 0b101, 0b101], // K
        [0b100, 0b100, 0b100, 0b100, 0b111], // L
        [0b101, 0b111, 0b111, 0b101, 0b101], // M
        [0b110, 0b101, 0b101, 0b101, 0b101], // N
        [0b010, 0b101, 0b101, 0b101, 0b010], // O
        [0b110, 0b101, 0b110, 0b100, 0b100], // P
        [0b010, 0b101, 0b101, 0b110, 0b011], // Q
        [0b110, 0b101, 0b110, 0b101, 0b101], // R
        [0b011, 0b100, 0b010, 0b001, 0b110], // S
        [0b111, 0b010, 0b010, 0b010, 0b010], // T
        [0b101, 0b101, 0b101, 0b101, 0b111], // U
        [0b101, 0b101, 0b101, 0b101, 0b010], // V
        [0b101, 0b101, 0b111, 0b111, 0b101], // W
        [0b101, 0b101, 0b010, 0b101, 0b101], // X
        [0b101, 0b101, 0b010, 0b010, 0b010], // Y
        [0b111, 0b001, 0b010, 0b100, 0b111], // Z
    ];

    /// RGBA8 pixels of the font texture: white glyphs on transparent cells
    pub fn pixels() -> Vec<u8> {
        let mut rgba = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
        for (i, rows) in BITMAPS.iter().enumerate() {
            let (cx, cy) = ((i as u32 % COLUMNS) * CELL.0, (i as u32 / COLUMNS) * CELL.1);
            for (dy, bits) in rows.iter().enumerate() {
                for dx in 0..GLYPH.0 {
                    if bits & (0b100 >> dx) != 0 {
                        let px = ((cy + dy as u32) * WIDTH + cx + dx) as usize * 4;
                        rgba[px..px + 4].copy_from_slice(&[255; 4]);
                    }
                }
            }
        }
        rgba
    }

    /// Font over a texture created from [`pixels`], drawn `half_size` large per glyph
    pub fn font(texture: Texture, half_size: Vec2) -> Font {
        Font::from_grid("rust2d.builtin", texture, CELL, GLYPH, CHARS, half_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TextureId;

    fn builtin_font() -> Font {
        let tex = Texture::new("font", TextureId(0), builtin::WIDTH, builtin::HEIGHT);
        builtin::font(tex, Vec2::new(0.5, 1.0))
    }

    #[test]
    fn test_builtin_covers_every_char() {
        let font = builtin_font();
        assert_eq!(font.glyph_count(), builtin::CHARS.chars().count());
        assert!(builtin::CHARS.chars().all(|c| font.glyph(c).is_some()));
    }

    #[test]
    fn test_lowercase_falls_back() {
        let font = builtin_font();
        assert_eq!(font.glyph('q'), font.glyph('Q'));
        assert!(font.glyph('~').is_none());
    }

    #[test]
    fn test_grid_regions() {
        let font = builtin_font();
        // '0' is the second cell of the first row
        let g = font.glyph('0').unwrap();
        assert_eq!(g.region.x, 4.0 / 64.0);
        assert_eq!(g.region.y, 0.0);
        // 'C' is index 16: first cell of the second row
        let c = font.glyph('C').unwrap();
        assert_eq!(c.region.x, 0.0);
        assert_eq!(c.region.y, 6.0 / 18.0);
    }

    #[test]
    fn test_string_metrics() {
        let font = builtin_font();
        assert_eq!(font.string_width("FPS"), 3.0);
        assert_eq!(font.string_width("A~B"), 2.0);
        assert_eq!(font.string_height("ab"), 2.0);
        assert_eq!(font.string_height(""), 0.0);
    }

    #[test]
    fn test_pixels_size_and_content() {
        let rgba = builtin::pixels();
        assert_eq!(rgba.len(), (builtin::WIDTH * builtin::HEIGHT * 4) as usize);
        // Top-left pixel of '0' (cell x = 4) is lit, the space cell is empty
        assert_eq!(&rgba[4 * 4..4 * 4 + 4], &[255; 4]);
        assert_eq!(&rgba[0..4], &[0; 4]);
    }
}
