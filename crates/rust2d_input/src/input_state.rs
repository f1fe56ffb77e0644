//! Keyboard and mouse state
//!
//! Edge sets (`pressed`/`released`) accumulate between ticks and are cleared
//! by [`InputState::end_tick`], which the engine calls after every tick.

use std::collections::HashSet;

use rust2d_math::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels per scroll line when the platform reports pixel deltas
const PIXELS_PER_LINE: f32 = 20.0;

/// Current keyboard and mouse state
#[derive(Clone, Debug, Default)]
pub struct InputState {
    held_keys: HashSet<KeyCode>,
    pressed_keys: HashSet<KeyCode>,
    released_keys: HashSet<KeyCode>,

    held_buttons: HashSet<MouseButton>,
    pressed_buttons: HashSet<MouseButton>,
    released_buttons: HashSet<MouseButton>,

    cursor: Vec2,
    cursor_inside: bool,
    scroll: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a window event; returns true if it was an input event
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    // Auto-repeat is not a new press
                    if !event.repeat || event.state == ElementState::Released {
                        self.process_keyboard(code, event.state);
                    }
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.process_mouse_button(*button, *state);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.process_cursor(position.x as f32, position.y as f32);
                true
            }
            WindowEvent::CursorEntered { .. } => {
                self.cursor_inside = true;
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_inside = false;
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                    MouseScrollDelta::PixelDelta(p) => {
                        (p.x as f32 / PIXELS_PER_LINE, p.y as f32 / PIXELS_PER_LINE)
                    }
                };
                self.process_scroll(x, y);
                true
            }
            WindowEvent::Focused(false) => {
                // Keys released while unfocused never report; drop them
                self.release_all();
                true
            }
            _ => false,
        }
    }

    /// Process a key transition
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.held_keys.insert(key) {
                    self.pressed_keys.insert(key);
                }
            }
            ElementState::Released => {
                if self.held_keys.remove(&key) {
                    self.released_keys.insert(key);
                }
            }
        }
    }

    /// Process a mouse button transition
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.held_buttons.insert(button) {
                    self.pressed_buttons.insert(button);
                }
            }
            ElementState::Released => {
                if self.held_buttons.remove(&button) {
                    self.released_buttons.insert(button);
                }
            }
        }
    }

    /// Cursor position in window pixels, origin top-left
    pub fn process_cursor(&mut self, x: f32, y: f32) {
        self.cursor = Vec2::new(x, y);
        self.cursor_inside = true;
    }

    /// Scroll in lines
    pub fn process_scroll(&mut self, x: f32, y: f32) {
        self.scroll += Vec2::new(x, y);
    }

    /// Release everything currently held
    pub fn release_all(&mut self) {
        self.released_keys.extend(self.held_keys.drain());
        self.released_buttons.extend(self.held_buttons.drain());
    }

    /// Clear per-tick edges and scroll
    pub fn end_tick(&mut self) {
        self.pressed_keys.clear();
        self.released_keys.clear();
        self.pressed_buttons.clear();
        self.released_buttons.clear();
        self.scroll = Vec2::ZERO;
    }

    // --- Queries ---

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.held_keys.contains(&key)
    }

    /// Pressed since the last tick
    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Released since the last tick
    pub fn was_key_released(&self, key: KeyCode) -> bool {
        self.released_keys.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.held_buttons.contains(&button)
    }

    pub fn was_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn was_button_released(&self, button: MouseButton) -> bool {
        self.released_buttons.contains(&button)
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn is_cursor_inside(&self) -> bool {
        self.cursor_inside
    }

    /// Scroll accumulated since the last tick
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// -1, 0 or 1 from a pair of opposing keys
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        (self.is_key_down(positive) as i32 - self.is_key_down(negative) as i32) as f32
    }
}
