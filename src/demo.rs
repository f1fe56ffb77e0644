//! Demo state: spinning boxes bouncing around the screen
//!
//! Boxes flash red while they touch another box and lose one point of
//! health per new contact; a box at zero health dies and is reaped by the
//! entity world at the end of the tick.
//!
//! The floor is a tile map with a few animated tiles, and a pulsing marker
//! sits in the top-right corner. Both are registered with the engine by
//! [`register_assets`] and copied into the state on its first tick.
//!
//! Keys: `Space` adds a box, `B` toggles bounding-volume outlines,
//! `R` restarts, `Escape` quits.

use std::collections::HashMap;
use std::error::Error;
use std::f32::consts::{PI, SQRT_2};

use rust2d_core::{
    mat4, Animation, BatchRenderer, BoundingVolume, Color, Engine, Entity, EntityCommands,
    EntityWorld, GameState, Indexable, StateResult, TickContext, TileLayout, TileMap, TileSprite,
    Transform2D, Vec2,
};
use rust2d_input::KeyCode;

use crate::config::AppConfig;

/// Golden angle, spreads spawn directions evenly
const SPAWN_ANGLE: f32 = PI * (3.0 - 2.236_068);

const PALETTE: [Color; 5] = [Color::CYAN, Color::YELLOW, Color::MAGENTA, Color::ORANGE, Color::BLUE];

/// Background tile map
pub const FLOOR: &str = "demo.floor";
/// Corner marker animation
pub const PULSE: &str = "demo.pulse";

const ATLAS: &str = "demo.atlas";
const ATLAS_CELL: u32 = 8;
/// Floor, alternate floor, and the two pulse frames
const ATLAS_SHADES: [[u8; 4]; 4] = [
    [18, 18, 34, 255],
    [24, 24, 44, 255],
    [30, 60, 90, 255],
    [40, 90, 130, 255],
];
const FLOOR_SIZE: (usize, usize) = (16, 9);
/// Ticks each pulse frame is held
const PULSE_TICKS: u32 = 12;

/// RGBA8 pixels of the demo atlas: one flat cell per shade, side by side
pub fn atlas_pixels() -> Vec<u8> {
    let width = ATLAS_CELL * ATLAS_SHADES.len() as u32;
    let mut rgba = Vec::with_capacity((width * ATLAS_CELL * 4) as usize);
    for _ in 0..ATLAS_CELL {
        for x in 0..width {
            rgba.extend_from_slice(&ATLAS_SHADES[(x / ATLAS_CELL) as usize]);
        }
    }
    rgba
}

/// Upload the atlas and register the floor and pulse built from it
pub fn register_assets(engine: &mut Engine) -> Result<(), Box<dyn Error>> {
    let width = ATLAS_CELL * ATLAS_SHADES.len() as u32;
    engine.load_texture(ATLAS, width, ATLAS_CELL, &atlas_pixels())?;
    let atlas = engine.texture(ATLAS)?.clone();
    let cell = |i: u32| atlas.region_px(i * ATLAS_CELL, 0, ATLAS_CELL, ATLAS_CELL);

    let pulse = Animation::uniform(PULSE, [cell(2), cell(3)], PULSE_TICKS)?;

    let (cols, rows) = FLOOR_SIZE;
    let tiles = (0..cols * rows)
        .map(|i| {
            let (x, y) = (i % cols, i / cols);
            // A diagonal stripe of pulsing tiles over a checkerboard
            if (x + y) % 7 == 0 {
                2
            } else {
                ((x + y) % 2) as u32
            }
        })
        .collect();
    let floor = TileMap::new(
        FLOOR,
        TileLayout {
            palette: HashMap::from([
                (0, TileSprite::Static(cell(0))),
                (1, TileSprite::Static(cell(1))),
                (2, TileSprite::Animated(pulse.clone())),
            ]),
            tiles,
            row_size: cols,
            visible: (cols as u32, rows as u32),
        },
    )?;

    engine.register_animation(pulse)?;
    engine.register_tile_map(floor)?;
    Ok(())
}

/// A box that moves, spins and bounces off the edges of `[-1, 1]²`
#[derive(Clone, Debug)]
pub struct Bouncer {
    transform: Transform2D,
    previous: Transform2D,
    /// Units per tick
    velocity: Vec2,
    /// Radians per tick
    spin: f32,
    color: Color,
    health: u32,
    touching: bool,
    was_touching: bool,
}

impl Bouncer {
    pub fn new(position: Vec2, half_size: Vec2, velocity: Vec2, spin: f32, health: u32) -> Self {
        let transform = Transform2D::from_position(position).with_scale(half_size);
        Self {
            transform,
            previous: transform,
            velocity,
            spin,
            color: Color::WHITE,
            health,
            touching: false,
            was_touching: false,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// Radius of the circle enclosing the box at any angle
    fn reach(&self) -> f32 {
        self.transform.scale.x.max(self.transform.scale.y) * SQRT_2
    }

    fn bounce(&mut self) {
        let r = self.reach();
        let p = self.transform.position;
        if (p.x + r > 1.0 && self.velocity.x > 0.0) || (p.x - r < -1.0 && self.velocity.x < 0.0) {
            self.velocity.x = -self.velocity.x;
        }
        if (p.y + r > 1.0 && self.velocity.y > 0.0) || (p.y - r < -1.0 && self.velocity.y < 0.0) {
            self.velocity.y = -self.velocity.y;
        }
    }
}

impl Entity for Bouncer {
    fn bounding_volume(&self) -> Option<BoundingVolume> {
        Some(BoundingVolume::oriented(
            self.transform.position,
            self.transform.scale,
            self.transform.angle,
        ))
    }

    fn is_dead(&self) -> bool {
        self.health == 0
    }

    fn tick(&mut self, _cmds: &mut EntityCommands) {
        self.previous = self.transform;
        self.was_touching = self.touching;
        self.touching = false;

        self.transform.translate(self.velocity);
        self.transform.rotate(self.spin);
        self.bounce();
    }

    fn on_overlap(&mut self, _other: &dyn Entity, _cmds: &mut EntityCommands) {
        // Only the first tick of a contact costs health
        if !self.touching && !self.was_touching {
            self.health = self.health.saturating_sub(1);
        }
        self.touching = true;
    }

    fn render(&self, g: &mut BatchRenderer, interpolation: f64) -> StateResult {
        let t = interpolation.clamp(0.0, 1.0) as f32;
        let transform = self.previous.lerp(&self.transform, t);
        g.set_color(if self.touching { Color::RED } else { self.color });
        g.draw_filled_rect(transform.to_matrix(), None)?;
        Ok(())
    }

    fn on_death(&mut self) {
        log::debug!("Box at ({:.2}, {:.2}) destroyed", self.transform.position.x, self.transform.position.y);
    }
}

/// The state `main` runs
pub struct DemoState {
    world: EntityWorld,
    boxes: usize,
    box_health: u32,
    show_bounds: bool,
    spawned: usize,
    fps: u32,
    floor: Option<TileMap>,
    pulse: Option<Animation>,
    assets_loaded: bool,
}

impl DemoState {
    pub const ID: &'static str = "demo";

    pub fn new(config: &AppConfig) -> Self {
        Self {
            world: EntityWorld::new().with_collision(config.engine.entity_collision),
            boxes: config.demo.boxes,
            box_health: config.demo.box_health,
            show_bounds: config.debug.show_bounds,
            spawned: 0,
            fps: 0,
            floor: None,
            pulse: None,
            assets_loaded: false,
        }
    }

    pub fn world(&self) -> &EntityWorld {
        &self.world
    }

    pub fn show_bounds(&self) -> bool {
        self.show_bounds
    }

    /// Add the next box of the spawn pattern
    pub fn spawn_box(&mut self) {
        let n = self.spawned as f32;
        let direction = Vec2::X.rotated(n * SPAWN_ANGLE);
        let position = direction * (0.2 + 0.05 * (self.spawned % 8) as f32);
        let velocity = direction.perp() * 0.015;
        let spin = if self.spawned % 2 == 0 { 0.05 } else { -0.03 };
        let size = 0.04 + 0.01 * (self.spawned % 3) as f32;

        let color = PALETTE[self.spawned % PALETTE.len()];
        self.world.add(
            Bouncer::new(position, Vec2::splat(size), velocity, spin, self.box_health).with_color(color),
        );
        self.spawned += 1;
    }

    pub fn floor(&self) -> Option<&TileMap> {
        self.floor.as_ref()
    }

    pub fn pulse(&self) -> Option<&Animation> {
        self.pulse.as_ref()
    }

    fn draw_bounds(&self, g: &mut BatchRenderer) -> StateResult {
        g.set_color(Color::GREEN);
        for (_, entity) in self.world.iter() {
            if let Some(volume) = entity.bounding_volume() {
                let obb = volume.to_obb();
                g.draw_outline_rect(mat4::model(obb.center, obb.angle, obb.half_extents), None)?;
            }
        }
        Ok(())
    }

    fn draw_hud(&self, g: &mut BatchRenderer) -> StateResult {
        if g.font().is_none() {
            return Ok(());
        }
        g.set_color(Color::WHITE);
        g.draw_string(&format!("FPS: {}", self.fps), mat4::translation(-0.97, 0.93))?;
        g.draw_string(&format!("BOXES: {}", self.world.len()), mat4::translation(-0.97, 0.85))?;
        Ok(())
    }
}

impl Indexable for DemoState {
    fn registry_id(&self) -> &str {
        Self::ID
    }
}

impl GameState for DemoState {
    fn init(&mut self, previous: Option<&str>) -> StateResult {
        self.spawned = 0;
        for _ in 0..self.boxes {
            self.spawn_box();
        }
        log::info!(
            "Demo started with {} boxes (from {})",
            self.world.len(),
            previous.unwrap_or("nothing")
        );
        Ok(())
    }

    fn exit(&mut self, _next: Option<&str>) -> StateResult {
        self.world.clear();
        Ok(())
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> StateResult {
        if !self.assets_loaded {
            self.floor = ctx.tile_map(FLOOR);
            self.pulse = ctx.animation(PULSE);
            self.assets_loaded = true;
        }
        if let Some(floor) = self.floor.as_mut() {
            floor.tick();
        }
        if let Some(pulse) = self.pulse.as_mut() {
            pulse.tick();
        }

        let input = ctx.input();
        if input.was_key_pressed(KeyCode::Escape) {
            ctx.stop();
        }
        if input.was_key_pressed(KeyCode::KeyB) {
            self.show_bounds = !self.show_bounds;
        }
        if input.was_key_pressed(KeyCode::Space) {
            self.spawn_box();
        }
        if input.was_key_pressed(KeyCode::KeyR) {
            ctx.switch_state(Self::ID);
        }

        let summary = self.world.tick();
        if summary.removed > 0 {
            log::debug!("{} boxes destroyed, {} left", summary.removed, self.world.len());
        }
        self.fps = ctx.fps();
        Ok(())
    }

    fn render(&mut self, g: &mut BatchRenderer, interpolation: f64) -> StateResult {
        if let Some(floor) = &self.floor {
            g.set_color(Color::WHITE);
            floor.render(g)?;
        }
        self.world.render(g, interpolation)?;
        if self.show_bounds {
            self.draw_bounds(g)?;
        }
        if let Some(pulse) = &self.pulse {
            g.set_color(Color::WHITE);
            let marker = mat4::model(Vec2::new(0.95, 0.93), 0.0, Vec2::splat(0.02));
            g.draw_filled_rect(marker, Some(pulse.current_frame()))?;
        }
        self.draw_hud(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust2d_core::{EngineConfig, HeadlessWindow, InputState, ManualClock, Window};
    use rust2d_render::{CallLog, DeviceCall, PrimitiveMode, RecordingDevice};

    fn draws(calls: &CallLog) -> Vec<(PrimitiveMode, u32)> {
        calls
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::Draw { mode, instances, .. } => Some((mode, instances)),
                _ => None,
            })
            .collect()
    }

    /// Advances the clock by one tick per poll and closes after `frames` polls
    struct Stepping {
        clock: ManualClock,
        frames: u32,
    }

    impl Window for Stepping {
        fn poll_events(&mut self, _input: &mut InputState) {
            self.clock.advance(0.04);
            self.frames = self.frames.saturating_sub(1);
        }

        fn is_closed(&self) -> bool {
            self.frames == 0
        }
    }

    #[test]
    fn test_bounces_off_right_edge() {
        let mut b = Bouncer::new(Vec2::new(0.9, 0.0), Vec2::splat(0.05), Vec2::new(0.1, 0.0), 0.0, 1);
        let mut cmds = EntityCommands::default();
        b.tick(&mut cmds);
        assert!(b.velocity().x < 0.0);
        assert_eq!(b.velocity().y, 0.0);
    }

    #[test]
    fn test_contact_costs_health_once() {
        let mut world = EntityWorld::new();
        world.add(Bouncer::new(Vec2::ZERO, Vec2::splat(0.1), Vec2::ZERO, 0.0, 2));
        world.add(Bouncer::new(Vec2::new(0.15, 0.0), Vec2::splat(0.1), Vec2::ZERO, 0.0, 2));

        // Still boxes stay in one contact; charging every tick would kill them on the second
        for _ in 0..4 {
            let summary = world.tick();
            assert_eq!(summary.overlaps, 1);
            assert_eq!(summary.removed, 0);
        }
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_box_dies_after_last_contact() {
        let mut world = EntityWorld::new();
        world.add(Bouncer::new(Vec2::ZERO, Vec2::splat(0.1), Vec2::ZERO, 0.0, 1));
        world.add(Bouncer::new(Vec2::new(0.15, 0.0), Vec2::splat(0.1), Vec2::ZERO, 0.0, 5));

        let summary = world.tick();
        assert_eq!(summary.overlaps, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_init_spawns_configured_boxes() {
        let mut config = AppConfig::default();
        config.demo.boxes = 7;
        let mut demo = DemoState::new(&config);
        demo.init(None).unwrap();
        assert_eq!(demo.world().len(), 7);
        demo.exit(None).unwrap();
        assert!(demo.world().is_empty());
    }

    #[test]
    fn test_runs_headless() {
        let mut config = AppConfig::default();
        config.demo.boxes = 3;
        config.debug.show_bounds = true;

        let device = RecordingDevice::new();
        let calls = device.log();
        let renderer = BatchRenderer::new(Box::new(device), config.rendering.batch_capacity);
        let mut engine = Engine::new(
            EngineConfig::default(),
            Box::new(HeadlessWindow::closing_after(1)),
            renderer,
        );
        engine.register_state(DemoState::new(&config)).unwrap();
        engine.set_current_state(DemoState::ID).unwrap();
        engine.run().unwrap();

        // Boxes in one filled batch, outlines in another; no font, no text
        assert_eq!(draws(&calls), vec![(PrimitiveMode::Filled, 3), (PrimitiveMode::Outline, 3)]);
    }

    #[test]
    fn test_atlas_pixels_cover_every_cell() {
        let pixels = atlas_pixels();
        assert_eq!(pixels.len(), (ATLAS_CELL * 4 * ATLAS_CELL * 4) as usize);
        assert_eq!(&pixels[..4], &ATLAS_SHADES[0]);
        let last = pixels.len() - 4;
        assert_eq!(&pixels[last..], &ATLAS_SHADES[3]);
    }

    #[test]
    fn test_floor_and_pulse_come_from_the_engine() {
        let mut config = AppConfig::default();
        config.demo.boxes = 3;

        let device = RecordingDevice::new();
        let calls = device.log();
        let renderer = BatchRenderer::new(Box::new(device), config.rendering.batch_capacity);
        let clock = ManualClock::new(0.0);
        let window = Stepping { clock: clock.clone(), frames: 2 };
        let mut engine = Engine::new(EngineConfig::default(), Box::new(window), renderer).with_clock(clock);
        register_assets(&mut engine).unwrap();
        assert!(engine.animation(PULSE).is_ok());
        engine.register_state(DemoState::new(&config)).unwrap();
        engine.set_current_state(DemoState::ID).unwrap();
        engine.run().unwrap();

        // The first frame renders before any tick; the second has the floor
        // in one atlas batch and the marker in another after the boxes
        let tiles = (FLOOR_SIZE.0 * FLOOR_SIZE.1) as u32;
        assert_eq!(
            draws(&calls),
            vec![
                (PrimitiveMode::Filled, 3),
                (PrimitiveMode::Filled, tiles),
                (PrimitiveMode::Filled, 3),
                (PrimitiveMode::Filled, 1),
            ]
        );
    }
}
