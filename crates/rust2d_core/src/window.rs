//! Window collaborator
//!
//! The engine only needs three things from a window: delivering input
//! events, reporting that it was closed, and being released at teardown.
//! Clearing and presenting are done by the graphics device.

use rust2d_input::InputState;

/// The window the engine runs in
pub trait Window {
    /// Deliver pending events to `input`
    fn poll_events(&mut self, input: &mut InputState);

    /// Whether the user asked to close the window
    fn is_closed(&self) -> bool;

    /// Release the window. Called once at engine teardown.
    fn release(&mut self) {}
}

/// A window with no display that closes after a number of frames
#[derive(Clone, Debug, Default)]
pub struct HeadlessWindow {
    frames_left: Option<u64>,
    closed: bool,
}

impl HeadlessWindow {
    /// Never closes on its own
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes after `frames` event polls
    pub fn closing_after(frames: u64) -> Self {
        Self {
            frames_left: Some(frames),
            closed: frames == 0,
        }
    }
}

impl Window for HeadlessWindow {
    fn poll_events(&mut self, _input: &mut InputState) {
        if let Some(left) = self.frames_left.as_mut() {
            *left = left.saturating_sub(1);
            self.closed = *left == 0;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn release(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_closes_after_frames() {
        let mut window = HeadlessWindow::closing_after(2);
        let mut input = InputState::new();
        assert!(!window.is_closed());
        window.poll_events(&mut input);
        assert!(!window.is_closed());
        window.poll_events(&mut input);
        assert!(window.is_closed());
    }

    #[test]
    fn test_headless_open_forever() {
        let mut window = HeadlessWindow::new();
        let mut input = InputState::new();
        for _ in 0..100 {
            window.poll_events(&mut input);
        }
        assert!(!window.is_closed());
    }
}
