//! Core of the Rust2D engine
//!
//! - [`Engine`] - fixed-timestep loop driving the active [`GameState`]
//! - [`GameState`] - a unit of simulation that ticks and renders
//! - [`EntityWorld`] - entities with an overlap scan and deferred removal
//! - [`Registry`] - id-keyed collection with add/remove observers
//! - [`ContextSlot`] - the active context, held through scoped guards
//! - [`Clock`] - monotonic time source (real or manual)
//! - [`Transform2D`] - position, rotation and scale with interpolation

mod clock;
mod context;
mod deferred;
mod engine;
mod entity;
mod registry;
mod state;
mod transform;
mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{ContextGuard, ContextId, ContextSlot};
pub use deferred::{DeferredAction, DeferredQueue};
pub use engine::{Engine, EngineConfig, EngineError, RunOutcome, RunState, StopHandle};
pub use entity::{Entity, EntityCommands, EntityKey, EntityWorld, TickSummary};
pub use registry::{Indexable, Registry, RegistryError};
pub use state::{GameState, StateResult, TickContext};
pub use transform::Transform2D;
pub use window::{HeadlessWindow, Window};

// Re-export commonly used types for convenience
pub use rust2d_input::InputState;
pub use rust2d_math::{mat4, Color, Mat4, Vec2};
pub use rust2d_physics::{BoundingVolume, CollisionFilter, CollisionLayer};
pub use rust2d_render::{
    Animation, BatchRenderer, Font, Texture, TextureRegion, TileLayout, TileMap, TileSprite,
};
