//! 2D Input Handling
//!
//! Window events are folded into an [`InputState`] that game code reads
//! during ticks. Besides which keys and buttons are held, it tracks what was
//! pressed or released since the previous tick, so a key tapped between two
//! ticks is never missed.

mod input_state;

pub use input_state::InputState;

// Re-export the key and button types states match on
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
