//! Fixed-timestep engine loop
//!
//! Each cycle of [`Engine::run`]:
//!
//! 1. ticks the active state while logical time is behind the clock, at most
//!    `max_catch_up_ticks` times
//! 2. renders once with the interpolation fraction
//!    `(now + dt - next_tick) / dt`, which exceeds 1 when catch-up was capped
//! 3. polls window events
//! 4. drains deferred actions in FIFO order, each with its owning context active
//! 5. updates the FPS counter once per second
//! 6. stops if a stop was requested or the window closed
//!
//! Teardown runs exactly once, whichever way the loop exits.

use log::{debug, info, warn};
use rust2d_input::InputState;
use rust2d_math::Color;
use rust2d_render::{Animation, BatchError, BatchRenderer, Font, Texture, TileMap};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::context::{ContextId, ContextSlot};
use crate::deferred::DeferredQueue;
use crate::registry::{Registry, RegistryError};
use crate::state::{GameState, StateResult, TickContext};
use crate::window::Window;

/// Runtime engine settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ticks per second
    pub tick_rate: f64,
    /// Most ticks run in one cycle before rendering anyway
    pub max_catch_up_ticks: u32,
    pub clear_color: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: 25.0,
            max_catch_up_ticks: 5,
            clear_color: Color::BLACK,
        }
    }
}

impl EngineConfig {
    /// Tick length in seconds
    pub fn tick_duration(&self) -> f64 {
        1.0 / self.tick_rate
    }

    /// Reject settings the loop cannot make progress with
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "tick_rate must be a positive number, got {}",
                self.tick_rate
            )));
        }
        if self.max_catch_up_ticks == 0 {
            return Err(EngineError::InvalidConfig(
                "max_catch_up_ticks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors from the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no active state to run")]
    NoActiveState,
    #[error("engine is already running")]
    AlreadyRunning,
    #[error("engine has been torn down")]
    TornDown,
    #[error("unknown context")]
    UnknownContext,
    #[error("the main context cannot be destroyed")]
    MainContext,
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("render error: {0}")]
    Render(#[from] BatchError),
    #[error("callback failed: {0}")]
    Callback(Box<dyn std::error::Error>),
}

/// Lifecycle of the loop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
    /// Stop requested; the current cycle finishes first
    Stopping,
}

/// How [`Engine::run`] ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Graceful stop or window close
    Stopped,
    /// [`StopHandle::force_quit`] abandoned a cycle
    ForceQuit,
}

/// Shared stop flags, cloned into tick contexts and callers
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stop: Rc<Cell<bool>>,
    force: Rc<Cell<bool>>,
}

impl StopHandle {
    /// Stop once the current cycle completes
    pub fn stop(&self) {
        self.stop.set(true);
    }

    /// Stop now, skipping the rest of the cycle. Last resort.
    pub fn force_quit(&self) {
        self.stop.set(true);
        self.force.set(true);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.get()
    }

    pub fn is_force_quit(&self) -> bool {
        self.force.get()
    }
}

/// Rolling frames-per-second counter
#[derive(Debug, Default)]
struct FpsCounter {
    frames: u32,
    window_start: f64,
    fps: u32,
}

impl FpsCounter {
    /// Count a frame; returns true when a new reading was taken
    fn frame(&mut self, now: f64) -> bool {
        self.frames += 1;
        if now - self.window_start >= 1.0 {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start = now;
            true
        } else {
            false
        }
    }
}

/// The engine: owns the window, renderer, registries and the active state
pub struct Engine {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    window: Box<dyn Window>,
    renderer: BatchRenderer,
    input: InputState,

    states: Registry<Box<dyn GameState>>,
    textures: Registry<Texture>,
    fonts: Registry<Font>,
    animations: Registry<Animation>,
    tile_maps: Registry<TileMap>,
    current_state: Option<String>,

    contexts: SlotMap<ContextId, String>,
    main_context: ContextId,
    active_context: ContextSlot,
    deferred: DeferredQueue,

    control: StopHandle,
    run_state: RunState,
    torn_down: bool,
    fps: FpsCounter,
    tick_count: u64,
}

impl Engine {
    /// Create an engine driven by the system clock
    pub fn new(config: EngineConfig, window: Box<dyn Window>, renderer: BatchRenderer) -> Self {
        let mut contexts = SlotMap::with_key();
        let main_context = contexts.insert("main".to_string());
        Self {
            config,
            clock: Box::new(SystemClock::new()),
            window,
            renderer,
            input: InputState::new(),
            states: Registry::new("states"),
            textures: Registry::new("textures"),
            fonts: Registry::new("fonts"),
            animations: Registry::new("animations"),
            tile_maps: Registry::new("tile maps"),
            current_state: None,
            contexts,
            main_context,
            active_context: ContextSlot::new(),
            deferred: DeferredQueue::new(),
            control: StopHandle::default(),
            run_state: RunState::Stopped,
            torn_down: false,
            fps: FpsCounter::default(),
            tick_count: 0,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn renderer(&self) -> &BatchRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut BatchRenderer {
        &mut self.renderer
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    // --- States ---

    /// Register a state under its id
    pub fn register_state(&mut self, state: impl GameState + 'static) -> Result<(), EngineError> {
        let state: Box<dyn GameState> = Box::new(state);
        self.states.register(state)?;
        Ok(())
    }

    pub fn states(&self) -> &Registry<Box<dyn GameState>> {
        &self.states
    }

    /// Make a registered state active
    ///
    /// The outgoing state's `exit` sees the incoming id and the incoming
    /// state's `init` sees the outgoing one.
    pub fn set_current_state(&mut self, id: &str) -> Result<(), EngineError> {
        if !self.states.contains(id) {
            return Err(RegistryError::NotFound {
                registry: self.states.name().to_string(),
                id: id.to_string(),
            }
            .into());
        }

        let previous = self.current_state.clone();
        if let Some(prev) = previous.as_deref() {
            self.states
                .get_mut(prev)?
                .exit(Some(id))
                .map_err(EngineError::Callback)?;
        }

        info!("Switching state: {} -> {}", previous.as_deref().unwrap_or("<none>"), id);
        self.current_state = Some(id.to_string());
        self.states
            .get_mut(id)?
            .init(previous.as_deref())
            .map_err(EngineError::Callback)?;
        Ok(())
    }

    /// Id of the active state
    pub fn current_state(&self) -> Option<&str> {
        self.current_state.as_deref()
    }

    // --- Resources ---

    /// Create a texture on the device and register it
    pub fn load_texture(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<(), EngineError> {
        if self.textures.contains(name) {
            return Err(RegistryError::Duplicate {
                registry: self.textures.name().to_string(),
                id: name.to_string(),
            }
            .into());
        }
        let texture = self.renderer.create_texture(name, width, height, rgba)?;
        self.textures.register(texture)?;
        Ok(())
    }

    /// Take ownership of a texture created through the renderer
    pub fn register_texture(&mut self, texture: Texture) -> Result<(), EngineError> {
        self.textures.register(texture)?;
        Ok(())
    }

    pub fn texture(&self, name: &str) -> Result<&Texture, EngineError> {
        Ok(self.textures.get(name)?)
    }

    /// Register a font; its texture is registered too if it is not yet
    pub fn register_font(&mut self, font: Font) -> Result<(), EngineError> {
        if !self.textures.contains(font.texture().name()) {
            self.textures.register(font.texture().clone())?;
        }
        self.fonts.register(font)?;
        Ok(())
    }

    pub fn font(&self, name: &str) -> Result<&Font, EngineError> {
        Ok(self.fonts.get(name)?)
    }

    /// Make a registered font the renderer's current font
    pub fn use_font(&mut self, name: &str) -> Result<(), EngineError> {
        let font = self.fonts.get(name)?.clone();
        self.renderer.set_font(font);
        Ok(())
    }

    /// Register an animation; states take copies of it to tick
    pub fn register_animation(&mut self, animation: Animation) -> Result<(), EngineError> {
        self.animations.register(animation)?;
        Ok(())
    }

    pub fn animation(&self, name: &str) -> Result<&Animation, EngineError> {
        Ok(self.animations.get(name)?)
    }

    /// Register a tile map; states take copies of it to tick and draw
    pub fn register_tile_map(&mut self, map: TileMap) -> Result<(), EngineError> {
        self.tile_maps.register(map)?;
        Ok(())
    }

    pub fn tile_map(&self, name: &str) -> Result<&TileMap, EngineError> {
        Ok(self.tile_maps.get(name)?)
    }

    // --- Contexts ---

    /// Create a context that deferred actions can run under
    pub fn create_context(&mut self, label: impl Into<String>) -> ContextId {
        self.contexts.insert(label.into())
    }

    /// Destroy a context; actions still queued for it are skipped
    pub fn destroy_context(&mut self, id: ContextId) -> Result<(), EngineError> {
        if id == self.main_context {
            return Err(EngineError::MainContext);
        }
        self.contexts
            .remove(id)
            .map(|_| ())
            .ok_or(EngineError::UnknownContext)
    }

    pub fn context_label(&self, id: ContextId) -> Option<&str> {
        self.contexts.get(id).map(String::as_str)
    }

    pub fn main_context(&self) -> ContextId {
        self.main_context
    }

    /// The context that is active right now, if the engine is running
    pub fn active_context(&self) -> Option<ContextId> {
        self.active_context.current()
    }

    // --- Deferred actions ---

    /// Queue an action for the end of the current cycle, under the active context
    pub fn defer(&mut self, action: impl FnOnce(&mut Engine) -> StateResult + 'static) {
        let owner = self.active_context.current().unwrap_or(self.main_context);
        self.deferred.push(owner, Box::new(action));
    }

    /// Queue an action for the end of the current cycle, under `context`
    pub fn defer_in(
        &mut self,
        context: ContextId,
        action: impl FnOnce(&mut Engine) -> StateResult + 'static,
    ) {
        self.deferred.push(context, Box::new(action));
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    // --- Control ---

    /// Handle for stopping the loop from outside a tick
    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    /// Stop once the current cycle completes
    pub fn stop(&mut self) {
        self.control.stop();
    }

    /// Abandon the current cycle and tear down
    ///
    /// Outside [`run`](Self::run) the teardown happens immediately.
    pub fn force_quit(&mut self) {
        self.control.force_quit();
        if self.run_state == RunState::Stopped {
            self.teardown();
        }
    }

    /// Frames rendered during the last full second
    pub fn fps(&self) -> u32 {
        self.fps.fps
    }

    /// Ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// `Stopping` from the moment any stop request lands until teardown
    pub fn run_state(&self) -> RunState {
        match self.run_state {
            RunState::Running if self.control.is_stop_requested() => RunState::Stopping,
            state => state,
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // --- Loop ---

    /// Run until stopped
    ///
    /// Fails before entering the loop if the settings are invalid or no
    /// state is active. The first error from a state callback ends the loop
    /// and is returned; teardown runs on every exit path.
    pub fn run(&mut self) -> Result<RunOutcome, EngineError> {
        if self.torn_down {
            return Err(EngineError::TornDown);
        }
        if self.run_state != RunState::Stopped {
            return Err(EngineError::AlreadyRunning);
        }
        self.config.validate()?;
        if self.current_state.is_none() {
            return Err(EngineError::NoActiveState);
        }
        if self.control.is_force_quit() {
            info!("Force quit before the first cycle");
            self.teardown();
            return Ok(RunOutcome::ForceQuit);
        }
        let state = self.current_state.as_deref().unwrap_or_default();

        info!(
            "Engine starting: state '{}', {} ticks/s, catch-up cap {}",
            state, self.config.tick_rate, self.config.max_catch_up_ticks
        );
        self.run_state = RunState::Running;

        let main = self.active_context.acquire(self.main_context);
        let result = self.run_loop();
        drop(main);

        match &result {
            Ok(outcome) => info!("Engine stopped ({:?}) after {} ticks", outcome, self.tick_count),
            Err(e) => warn!("Engine loop failed: {}", e),
        }
        self.teardown();
        result
    }

    fn run_loop(&mut self) -> Result<RunOutcome, EngineError> {
        let dt = self.config.tick_duration();
        let max_ticks = self.config.max_catch_up_ticks;
        let mut next_tick = self.clock.now();
        let mut lagging = false;
        self.fps.window_start = next_tick;

        loop {
            // 1. Catch up logical time
            let now = self.clock.now();
            let mut ticks = 0;
            while now > next_tick && ticks < max_ticks {
                self.tick_once(dt)?;
                next_tick += dt;
                ticks += 1;
                if self.control.is_force_quit() {
                    return Ok(RunOutcome::ForceQuit);
                }
            }
            if now > next_tick {
                if !lagging {
                    warn!(
                        "Simulation is lagging: {:.3}s behind after {} ticks",
                        now - next_tick,
                        ticks
                    );
                }
                lagging = true;
            } else {
                lagging = false;
            }

            // 2. Render once
            let interpolation = (self.clock.now() + dt - next_tick) / dt;
            self.render_once(interpolation)?;
            if self.control.is_force_quit() {
                return Ok(RunOutcome::ForceQuit);
            }

            // 3. Events
            self.window.poll_events(&mut self.input);
            if self.control.is_force_quit() {
                return Ok(RunOutcome::ForceQuit);
            }

            // 4. Deferred actions
            if !self.drain_deferred()? {
                return Ok(RunOutcome::ForceQuit);
            }

            // 5. FPS
            if self.fps.frame(self.clock.now()) {
                debug!("FPS: {}", self.fps.fps);
            }

            // 6. Stop?
            if self.window.is_closed() {
                info!("Window closed, stopping");
                self.control.stop();
            }
            if self.control.is_stop_requested() {
                self.run_state = RunState::Stopping;
                return Ok(RunOutcome::Stopped);
            }
        }
    }

    fn tick_once(&mut self, dt: f64) -> Result<(), EngineError> {
        let id = self.current_state.as_deref().ok_or(EngineError::NoActiveState)?;
        let state = self.states.get_mut(id)?;
        let mut ctx = TickContext {
            input: &self.input,
            deferred: &mut self.deferred,
            control: &self.control,
            context: self.active_context.current().unwrap_or(self.main_context),
            dt,
            tick: self.tick_count,
            fps: self.fps.fps,
            animations: &self.animations,
            tile_maps: &self.tile_maps,
        };
        state.tick(&mut ctx).map_err(EngineError::Callback)?;
        self.input.end_tick();
        self.tick_count += 1;
        Ok(())
    }

    fn render_once(&mut self, interpolation: f64) -> Result<(), EngineError> {
        let id = self.current_state.as_deref().ok_or(EngineError::NoActiveState)?;
        let state = self.states.get_mut(id)?;
        self.renderer.begin_frame(self.config.clear_color)?;
        self.renderer.begin()?;
        state
            .render(&mut self.renderer, interpolation)
            .map_err(EngineError::Callback)?;
        self.renderer.end()?;
        self.renderer.end_frame()?;
        Ok(())
    }

    /// Run queued actions; returns false if one of them forced a quit
    ///
    /// Actions queued while draining run in the same drain.
    fn drain_deferred(&mut self) -> Result<bool, EngineError> {
        while let Some((owner, action)) = self.deferred.pop() {
            if !self.contexts.contains_key(owner) {
                warn!("Skipping deferred action for a destroyed context");
                continue;
            }
            let guard = self.active_context.acquire(owner);
            let result = action(self);
            drop(guard);
            result.map_err(EngineError::Callback)?;
            if self.control.is_force_quit() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Exit the active state and release everything, once
    ///
    /// Resources go in reverse order of acquisition: tile maps and
    /// animations, fonts, then textures, then states, then the renderer's
    /// device and finally the window.
    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        info!("Engine teardown");

        if let Some(id) = self.current_state.take() {
            match self.states.get_mut(&id) {
                Ok(state) => {
                    if let Err(e) = state.exit(None) {
                        warn!("State '{}' failed to exit: {}", id, e);
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        self.deferred.clear();

        drop(self.tile_maps.drain());
        drop(self.animations.drain());
        drop(self.fonts.drain());
        for texture in self.textures.drain() {
            self.renderer.release_texture(&texture);
        }
        drop(self.states.drain());

        self.renderer.release();
        self.window.release();
        self.run_state = RunState::Stopped;
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::registry::Indexable;
    use crate::window::HeadlessWindow;
    use rust2d_render::{DeviceCall, RecordingDevice};
    use std::cell::RefCell;

    struct Named {
        id: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Indexable for Named {
        fn registry_id(&self) -> &str {
            self.id
        }
    }

    impl GameState for Named {
        fn init(&mut self, previous: Option<&str>) -> StateResult {
            self.log
                .borrow_mut()
                .push(format!("init {} from {:?}", self.id, previous));
            Ok(())
        }

        fn exit(&mut self, next: Option<&str>) -> StateResult {
            self.log.borrow_mut().push(format!("exit {} to {:?}", self.id, next));
            Ok(())
        }

        fn tick(&mut self, ctx: &mut TickContext<'_>) -> StateResult {
            ctx.stop();
            Ok(())
        }

        fn render(&mut self, _g: &mut BatchRenderer, _interpolation: f64) -> StateResult {
            Ok(())
        }
    }

    fn engine() -> (Engine, rust2d_render::CallLog) {
        engine_with(EngineConfig::default())
    }

    fn engine_with(config: EngineConfig) -> (Engine, rust2d_render::CallLog) {
        let device = RecordingDevice::new();
        let log = device.log();
        let renderer = BatchRenderer::new(Box::new(device), 16);
        let engine = Engine::new(config, Box::new(HeadlessWindow::closing_after(1)), renderer)
            .with_clock(ManualClock::new(0.0));
        (engine, log)
    }

    fn named(engine: &mut Engine, id: &'static str) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        engine.register_state(Named { id, log: log.clone() }).unwrap();
        engine.set_current_state(id).unwrap();
        log
    }

    #[test]
    fn test_run_without_state_fails_fast() {
        let (mut engine, calls) = engine();
        assert!(matches!(engine.run(), Err(EngineError::NoActiveState)));
        assert_eq!(engine.run_state(), RunState::Stopped);
        assert!(calls.calls().is_empty());
    }

    #[test]
    fn test_state_switch_calls_exit_then_init() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (mut engine, _) = engine();
        engine.register_state(Named { id: "menu", log: log.clone() }).unwrap();
        engine.register_state(Named { id: "play", log: log.clone() }).unwrap();

        engine.set_current_state("menu").unwrap();
        engine.set_current_state("play").unwrap();
        assert_eq!(engine.current_state(), Some("play"));
        assert_eq!(
            *log.borrow(),
            vec![
                "init menu from None",
                "exit menu to Some(\"play\")",
                "init play from Some(\"menu\")",
            ]
        );
    }

    #[test]
    fn test_switch_to_unknown_state() {
        let (mut engine, _) = engine();
        let err = engine.set_current_state("nowhere").unwrap_err();
        assert!(matches!(err, EngineError::Registry(RegistryError::NotFound { .. })));
        assert_eq!(engine.current_state(), None);
    }

    #[test]
    fn test_duplicate_state_rejected() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (mut engine, _) = engine();
        engine.register_state(Named { id: "a", log: log.clone() }).unwrap();
        assert!(matches!(
            engine.register_state(Named { id: "a", log }),
            Err(EngineError::Registry(RegistryError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_contexts() {
        let (mut engine, _) = engine();
        let main = engine.main_context();
        let tool = engine.create_context("tool");
        assert_eq!(engine.context_label(tool), Some("tool"));
        assert!(matches!(engine.destroy_context(main), Err(EngineError::MainContext)));
        engine.destroy_context(tool).unwrap();
        assert!(matches!(engine.destroy_context(tool), Err(EngineError::UnknownContext)));
        assert_eq!(engine.active_context(), None);
    }

    #[test]
    fn test_textures_released_at_teardown() {
        let (mut engine, calls) = engine();
        engine.load_texture("a", 1, 1, &[0, 0, 0, 255]).unwrap();
        engine.load_texture("b", 1, 1, &[0, 0, 0, 255]).unwrap();
        assert!(engine.load_texture("a", 1, 1, &[0, 0, 0, 255]).is_err());

        let a = engine.texture("a").unwrap().id();
        let b = engine.texture("b").unwrap().id();
        drop(engine);

        let released: Vec<_> = calls
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::ReleaseTexture(id) => Some(id),
                _ => None,
            })
            .collect();
        // Newest first
        assert_eq!(released, vec![b, a]);
        assert_eq!(calls.count(|c| matches!(c, DeviceCall::Release)), 1);
    }

    #[test]
    fn test_teardown_runs_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (mut engine, calls) = engine();
        engine.register_state(Named { id: "only", log: log.clone() }).unwrap();
        engine.set_current_state("only").unwrap();

        assert_eq!(engine.run().unwrap(), RunOutcome::Stopped);
        assert!(engine.is_torn_down());
        assert!(matches!(engine.run(), Err(EngineError::TornDown)));
        drop(engine);

        assert_eq!(calls.count(|c| matches!(c, DeviceCall::Release)), 1);
        assert_eq!(
            log.borrow().iter().filter(|l| l.starts_with("exit")).count(),
            1
        );
        assert_eq!(log.borrow().last().map(String::as_str), Some("exit only to None"));
    }

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());
        for tick_rate in [0.0, -25.0, f64::NAN, f64::INFINITY] {
            let config = EngineConfig { tick_rate, ..EngineConfig::default() };
            assert!(
                matches!(config.validate(), Err(EngineError::InvalidConfig(_))),
                "tick_rate {} accepted",
                tick_rate
            );
        }
        let config = EngineConfig { max_catch_up_ticks: 0, ..EngineConfig::default() };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_run_rejects_zero_tick_rate() {
        let (mut engine, calls) = engine_with(EngineConfig { tick_rate: 0.0, ..EngineConfig::default() });
        let log = named(&mut engine, "only");

        assert!(matches!(engine.run(), Err(EngineError::InvalidConfig(_))));
        assert_eq!(engine.tick_count(), 0);
        assert!(calls.calls().is_empty());
        assert_eq!(engine.run_state(), RunState::Stopped);
        assert_eq!(*log.borrow(), vec!["init only from None"]);
    }

    #[test]
    fn test_run_rejects_zero_catch_up() {
        let (mut engine, calls) = engine_with(EngineConfig { max_catch_up_ticks: 0, ..EngineConfig::default() });
        named(&mut engine, "only");
        assert!(matches!(engine.run(), Err(EngineError::InvalidConfig(_))));
        assert!(calls.calls().is_empty());
    }

    #[test]
    fn test_force_quit_while_stopped_tears_down() {
        let (mut engine, calls) = engine();
        let log = named(&mut engine, "only");

        engine.force_quit();
        assert!(engine.is_torn_down());
        assert_eq!(log.borrow().last().map(String::as_str), Some("exit only to None"));
        assert_eq!(calls.count(|c| matches!(c, DeviceCall::Release)), 1);
        assert!(matches!(engine.run(), Err(EngineError::TornDown)));
        assert_eq!(calls.count(|c| matches!(c, DeviceCall::BeginFrame(_))), 0);
    }

    #[test]
    fn test_handle_force_quit_before_run_skips_first_cycle() {
        let (mut engine, calls) = engine();
        named(&mut engine, "only");

        engine.stop_handle().force_quit();
        assert!(!engine.is_torn_down());
        assert_eq!(engine.run().unwrap(), RunOutcome::ForceQuit);
        assert!(engine.is_torn_down());
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(calls.count(|c| matches!(c, DeviceCall::BeginFrame(_))), 0);
        assert_eq!(calls.count(|c| matches!(c, DeviceCall::Release)), 1);
    }

    #[test]
    fn test_fps_counter() {
        let mut fps = FpsCounter::default();
        for i in 0..30 {
            assert!(!fps.frame(i as f64 * 0.03));
        }
        assert!(fps.frame(1.0));
        assert_eq!(fps.fps, 31);
    }
}
