//! Game states
//!
//! A [`GameState`] is the unit the engine drives: it is ticked at the fixed
//! rate and rendered once per cycle. States are registered with the engine
//! by id and exactly one is active while the engine runs.

use rust2d_input::InputState;
use rust2d_render::{Animation, BatchRenderer, TileMap};

use crate::context::ContextId;
use crate::deferred::DeferredQueue;
use crate::engine::{Engine, StopHandle};
use crate::registry::{Indexable, Registry};

/// Result of a state or entity callback
///
/// Errors are not handled by the engine: the first one stops the loop and
/// is returned from [`Engine::run`].
pub type StateResult = Result<(), Box<dyn std::error::Error>>;

/// A unit of simulation driven by the engine
pub trait GameState: Indexable {
    /// Called when the state becomes active; `previous` is the state being left
    fn init(&mut self, _previous: Option<&str>) -> StateResult {
        Ok(())
    }

    /// Called when the state stops being active; `next` is `None` at shutdown
    fn exit(&mut self, _next: Option<&str>) -> StateResult {
        Ok(())
    }

    /// Advance the simulation by one fixed step
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> StateResult;

    /// Draw the current state
    ///
    /// `interpolation` is the fraction of a tick elapsed since the last one.
    /// It exceeds 1 when the engine is lagging and had to cap catch-up ticks.
    fn render(&mut self, g: &mut BatchRenderer, interpolation: f64) -> StateResult;
}

/// What a state can reach during a tick
pub struct TickContext<'a> {
    pub(crate) input: &'a InputState,
    pub(crate) deferred: &'a mut DeferredQueue,
    pub(crate) control: &'a StopHandle,
    pub(crate) context: ContextId,
    pub(crate) dt: f64,
    pub(crate) tick: u64,
    pub(crate) fps: u32,
    pub(crate) animations: &'a Registry<Animation>,
    pub(crate) tile_maps: &'a Registry<TileMap>,
}

impl<'a> TickContext<'a> {
    /// Keyboard and mouse state of the engine window
    pub fn input(&self) -> &InputState {
        self.input
    }

    /// Fixed tick length in seconds
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Ticks completed before this one
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Frames rendered during the last full second
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// A fresh copy of a registered animation, starting at its first frame
    pub fn animation(&self, name: &str) -> Option<Animation> {
        let mut animation = self.animations.get(name).ok()?.clone();
        animation.reset();
        Some(animation)
    }

    /// A copy of a registered tile map
    pub fn tile_map(&self, name: &str) -> Option<TileMap> {
        self.tile_maps.get(name).ok().cloned()
    }

    /// The context active while ticking
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Run `action` after this cycle's render, with the current context active
    pub fn defer(&mut self, action: impl FnOnce(&mut Engine) -> StateResult + 'static) {
        self.deferred.push(self.context, Box::new(action));
    }

    /// Run `action` after this cycle's render, with `context` active
    pub fn defer_in(&mut self, context: ContextId, action: impl FnOnce(&mut Engine) -> StateResult + 'static) {
        self.deferred.push(context, Box::new(action));
    }

    /// Switch to another registered state once this cycle is over
    pub fn switch_state(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.defer(move |engine| {
            engine.set_current_state(&id)?;
            Ok(())
        });
    }

    /// Stop the engine after the current cycle
    pub fn stop(&self) {
        self.control.stop();
    }

    /// Abandon the current cycle and tear down immediately
    pub fn force_quit(&self) {
        self.control.force_quit();
    }
}
