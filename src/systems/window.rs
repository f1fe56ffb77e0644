//! Window management system
//!
//! Owns the winit event loop and the OS window. The engine drives the loop
//! itself, so events are pumped once per cycle instead of handing control
//! to `EventLoop::run_app`.

use std::sync::Arc;
use std::time::Duration;

use rust2d_core::{InputState, Window as EngineWindow};
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::config::WindowConfig;

/// Pumps allowed for the platform to create the window at startup
const STARTUP_PUMPS: usize = 100;

/// Build window attributes from config
pub fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    let mut attrs = Window::default_attributes()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    if config.fullscreen {
        attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    attrs
}

/// Receives events during a pump and buffers input for the engine
struct WindowApp {
    config: WindowConfig,
    window: Option<Arc<Window>>,
    events: Vec<WindowEvent>,
    close_requested: bool,
    error: Option<WindowError>,
}

impl WindowApp {
    fn toggle_fullscreen(&self) {
        if let Some(window) = &self.window {
            let fullscreen = if window.fullscreen().is_some() {
                None
            } else {
                Some(Fullscreen::Borderless(None))
            };
            window.set_fullscreen(fullscreen);
        }
    }
}

impl ApplicationHandler for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(window_attributes(&self.config)) {
            Ok(window) => {
                log::info!("Created window '{}'", self.config.title);
                self.window = Some(Arc::new(window));
            }
            Err(e) => {
                self.error = Some(WindowError::CreationFailed(e.to_string()));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.close_requested = true;
            }
            WindowEvent::KeyboardInput { event: ref key, .. }
                if key.physical_key == PhysicalKey::Code(KeyCode::F11)
                    && key.state == ElementState::Pressed
                    && !key.repeat =>
            {
                self.toggle_fullscreen();
            }
            other => self.events.push(other),
        }
    }
}

/// The engine's window: a winit window pumped once per cycle
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    app: WindowApp,
    window: Arc<Window>,
}

impl WinitWindow {
    /// Create the event loop and open the window
    ///
    /// Blocks until the platform has created the window.
    pub fn create(config: &WindowConfig) -> Result<Self, WindowError> {
        let mut event_loop =
            EventLoop::new().map_err(|e| WindowError::EventLoop(e.to_string()))?;
        let mut app = WindowApp {
            config: config.clone(),
            window: None,
            events: Vec::new(),
            close_requested: false,
            error: None,
        };

        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut app);
            if app.window.is_some() || app.error.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                return Err(WindowError::EventLoop(format!("exited during startup ({})", code)));
            }
        }

        if let Some(error) = app.error.take() {
            return Err(error);
        }
        let window = app.window.clone().ok_or(WindowError::NotCreated)?;

        Ok(Self {
            event_loop,
            app,
            window,
        })
    }

    /// Window handle for creating the graphics device
    pub fn handle(&self) -> Arc<Window> {
        self.window.clone()
    }
}

impl EngineWindow for WinitWindow {
    fn poll_events(&mut self, input: &mut InputState) {
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.app) {
            log::debug!("Event loop exited ({})", code);
            self.app.close_requested = true;
        }
        for event in self.app.events.drain(..) {
            input.handle_event(&event);
        }
    }

    fn is_closed(&self) -> bool {
        self.app.close_requested
    }

    fn release(&mut self) {
        self.window.set_visible(false);
        self.app.window = None;
        self.app.close_requested = true;
    }
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Event loop error: {0}")]
    EventLoop(String),
    #[error("Window creation failed: {0}")]
    CreationFailed(String),
    #[error("Platform never created the window")]
    NotCreated,
}
