//! Tile maps
//!
//! A [`TileMap`] lays a grid of tiles over the `[-1, 1]²` view so that
//! `visible.0 × visible.1` tiles fill it edge to edge. Row 0 is the top row.
//! Each tile is one textured rectangle; rendering groups tiles by texture so
//! a map drawn from one atlas is a single submission.

use std::collections::HashMap;

use rust2d_math::{mat4, Vec2};
use thiserror::Error;

use crate::animation::Animation;
use crate::batch::{BatchError, BatchRenderer};
use crate::texture::TextureRegion;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileMapError {
    #[error("tile map '{0}': row size must be at least 1")]
    EmptyRow(String),
    #[error("tile map '{name}': {len} tiles do not fill rows of {row_size}")]
    RaggedRows { name: String, len: usize, row_size: usize },
    #[error("tile map '{name}': no sprite for tile index {index}")]
    UnknownTile { name: String, index: u32 },
    #[error("tile map '{0}': at least one tile must be visible on each axis")]
    NothingVisible(String),
}

/// What a tile shows
#[derive(Clone, Debug, PartialEq)]
pub enum TileSprite {
    Static(TextureRegion),
    Animated(Animation),
}

impl TileSprite {
    pub fn region(&self) -> &TextureRegion {
        match self {
            TileSprite::Static(region) => region,
            TileSprite::Animated(anim) => anim.current_frame(),
        }
    }

    fn tick(&mut self) {
        if let TileSprite::Animated(anim) = self {
            anim.tick();
        }
    }
}

/// One placed tile
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub sprite: TileSprite,
    pub center: Vec2,
    pub half_size: Vec2,
}

/// Everything needed to build a [`TileMap`]
#[derive(Clone, Debug, Default)]
pub struct TileLayout {
    /// Sprite for each index used in `tiles`
    pub palette: HashMap<u32, TileSprite>,
    /// Tile indices, row by row from the top
    pub tiles: Vec<u32>,
    pub row_size: usize,
    /// Tiles that fit across and down the view
    pub visible: (u32, u32),
}

/// A grid of tiles drawn as one large rectangle
#[derive(Clone, Debug, PartialEq)]
pub struct TileMap {
    name: String,
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
    visible: (u32, u32),
}

impl TileMap {
    pub fn new(name: impl Into<String>, layout: TileLayout) -> Result<Self, TileMapError> {
        let name = name.into();
        let TileLayout { palette, tiles: indices, row_size, visible } = layout;

        if row_size == 0 {
            return Err(TileMapError::EmptyRow(name));
        }
        if indices.len() % row_size != 0 {
            return Err(TileMapError::RaggedRows { name, len: indices.len(), row_size });
        }
        if visible.0 == 0 || visible.1 == 0 {
            return Err(TileMapError::NothingVisible(name));
        }

        let half_size = Vec2::new(1.0 / visible.0 as f32, 1.0 / visible.1 as f32);
        let mut tiles = Vec::with_capacity(indices.len());
        for (i, index) in indices.iter().enumerate() {
            let Some(sprite) = palette.get(index) else {
                return Err(TileMapError::UnknownTile { name, index: *index });
            };
            let (x, y) = ((i % row_size) as f32, (i / row_size) as f32);
            // Centers step by one tile width from the left and top edges
            let center = Vec2::new(
                -1.0 + half_size.x * (2.0 * x + 1.0),
                1.0 - half_size.y * (2.0 * y + 1.0),
            );
            tiles.push(Tile { sprite: sprite.clone(), center, half_size });
        }

        Ok(Self {
            name,
            width: row_size,
            height: indices.len() / row_size,
            tiles,
            visible,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Width in tiles
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn visible(&self) -> (u32, u32) {
        self.visible
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x >= self.width {
            return None;
        }
        self.tiles.get(y * self.width + x)
    }

    /// Advance every animated tile
    pub fn tick(&mut self) {
        for tile in &mut self.tiles {
            tile.sprite.tick();
        }
    }

    /// Draw every tile with the renderer's current color, grouped by texture
    pub fn render(&self, g: &mut BatchRenderer) -> Result<(), BatchError> {
        let mut order: Vec<&Tile> = self.tiles.iter().collect();
        order.sort_by_key(|tile| tile.sprite.region().texture);
        for tile in order {
            let model = mat4::model(tile.center, 0.0, tile.half_size);
            g.draw_filled_rect(model, Some(tile.sprite.region()))?;
        }
        Ok(())
    }
}
